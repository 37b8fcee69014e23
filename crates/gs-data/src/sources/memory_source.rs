//! Scripted in-memory upstream

use std::collections::VecDeque;

use gs_core::{PullProcessor, ReadResult, Row};

/// Replays a fixed sequence of read results.
///
/// Once the script is exhausted every read returns `EndOfStream`.
#[derive(Debug, Clone)]
pub struct VecSource {
    name: String,
    results: VecDeque<ReadResult>,
}

impl VecSource {
    pub fn new(name: impl Into<String>, results: Vec<ReadResult>) -> Self {
        Self {
            name: name.into(),
            results: results.into(),
        }
    }
    
    /// A source yielding `rows` followed by end of stream
    pub fn from_rows(name: impl Into<String>, rows: impl IntoIterator<Item = Row>) -> Self {
        Self::new(name, rows.into_iter().map(ReadResult::Row).collect())
    }
    
    /// Results not yet handed out
    pub fn remaining(&self) -> usize {
        self.results.len()
    }
}

impl PullProcessor for VecSource {
    fn read(&mut self) -> ReadResult {
        self.results.pop_front().unwrap_or(ReadResult::EndOfStream)
    }
    
    fn source_name(&self) -> &str {
        &self.name
    }
}
