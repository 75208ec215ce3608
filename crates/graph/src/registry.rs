use std::collections::HashMap;

/// Sequential id allocation shared by the node and link extractors of one
/// assembly.
///
/// Each named sequence starts at its own base offset and hands out ids in
/// first-request order. Asking again for a key already seen returns the same
/// id, so a link extractor addressing a category from either side resolves to
/// the id its node extractor assigned.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    sequences: HashMap<String, Sequence>,
}

#[derive(Debug)]
struct Sequence {
    base: u32,
    ids: HashMap<String, u32>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `key` in `sequence`, allocating the next one on first use.
    ///
    /// The base is fixed by the first call for a sequence.
    pub fn allocate(&mut self, sequence: &str, base: u32, key: &str) -> u32 {
        let seq = self
            .sequences
            .entry(sequence.to_string())
            .or_insert_with(|| Sequence {
                base,
                ids: HashMap::new(),
            });
        let next = seq.base + seq.ids.len() as u32;
        *seq.ids.entry(key.to_string()).or_insert(next)
    }

    /// Id for `key` without allocating.
    pub fn lookup(&self, sequence: &str, key: &str) -> Option<u32> {
        self.sequences.get(sequence)?.ids.get(key).copied()
    }

    /// Number of ids handed out in `sequence`.
    pub fn allocated(&self, sequence: &str) -> usize {
        self.sequences.get(sequence).map_or(0, |s| s.ids.len())
    }
}
