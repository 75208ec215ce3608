use std::fmt;

#[derive(Debug)]
pub enum FlowError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no views, duplicate view, bad tolerance, etc.).
    ConfigValidation(String),
    /// A view id that is not one of the fixed views.
    UnknownView(String),
    /// The record store document is not a mapping of keys to record arrays.
    StoreParse(String),
    /// An entry of a record array is not an object.
    NotAnObject { key: String, index: usize },
    /// CSV read error.
    Csv { file: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownView(view) => write!(
                f,
                "unknown view: {view} (expected student-costs, comprehensive-fee, revenues or athletics)"
            ),
            Self::StoreParse(msg) => write!(f, "record store parse error: {msg}"),
            Self::NotAnObject { key, index } => {
                write!(f, "store key '{key}': entry {index} is not an object")
            }
            Self::Csv { file, message } => write!(f, "CSV error in '{file}': {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for FlowError {}
