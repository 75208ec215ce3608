use std::path::Path;

use log::debug;
use serde_json::{Number, Value};

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::model::{Record, RecordStore};

impl RecordStore {
    /// Decode a JSON document mapping store keys to arrays of records.
    pub fn from_json_str(input: &str) -> Result<Self, FlowError> {
        let doc: Value = serde_json::from_str(input).map_err(|e| FlowError::StoreParse(e.to_string()))?;
        let Value::Object(top) = doc else {
            return Err(FlowError::StoreParse("top level must be an object".into()));
        };

        let mut store = RecordStore::new();
        for (key, value) in top {
            let Value::Array(items) = value else {
                return Err(FlowError::StoreParse(format!("key '{key}' must map to an array of records")));
            };
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(record) => records.push(record),
                    _ => return Err(FlowError::NotAnObject { key, index }),
                }
            }
            debug!("loaded {} record(s) under '{key}'", records.len());
            store.insert(key, records);
        }
        Ok(store)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, FlowError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| FlowError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&input)
    }
}

impl FlowConfig {
    /// Load the configured JSON store, then replace keys that have a CSV source.
    ///
    /// Paths are resolved against `base_dir` (the config file's directory).
    pub fn load_store(&self, base_dir: &Path) -> Result<RecordStore, FlowError> {
        let mut store = RecordStore::from_json_path(&base_dir.join(&self.data))?;
        for (key, file) in &self.sources {
            let path = base_dir.join(file);
            let csv_data = std::fs::read_to_string(&path)
                .map_err(|e| FlowError::Io(format!("cannot read {}: {e}", path.display())))?;
            store.insert(key.clone(), load_csv_records(file, &csv_data)?);
        }
        Ok(store)
    }
}

/// Read a headered CSV into records.
///
/// Empty cells are left out of the record. Cells that parse as a finite
/// number become JSON numbers; everything else stays a string.
pub fn load_csv_records(file: &str, csv_data: &str) -> Result<Vec<Record>, FlowError> {
    let csv_err = |e: csv::Error| FlowError::Csv {
        file: file.into(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            record.insert(header.clone(), cell_value(cell));
        }
        records.push(record);
    }

    debug!("loaded {} record(s) from '{file}'", records.len());
    Ok(records)
}

fn cell_value(cell: &str) -> Value {
    if let Ok(n) = cell.parse::<i64>() {
        return Value::from(n);
    }
    match cell.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(cell.to_string()),
    }
}
