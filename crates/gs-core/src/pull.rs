//! The pull protocol shared by every processor in a chain

use crate::row::Row;

/// Outcome of a single pull from a processor.
///
/// `Pending` means "nothing available right now, call again later" and is
/// never an error; `EndOfStream` means the processor will produce no further
/// rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult {
    /// A row of data
    Row(Row),
    /// Upstream has a hole it cannot fill; carries a description
    MissingData(String),
    /// No more rows will be produced
    EndOfStream,
    /// No data currently available; retry the read later
    Pending,
}

impl ReadResult {
    pub fn is_row(&self) -> bool {
        matches!(self, ReadResult::Row(_))
    }
    
    pub fn is_missing_data(&self) -> bool {
        matches!(self, ReadResult::MissingData(_))
    }
    
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadResult::EndOfStream)
    }
    
    pub fn is_pending(&self) -> bool {
        matches!(self, ReadResult::Pending)
    }
    
    /// Borrow the row, if this result carries one
    pub fn row(&self) -> Option<&Row> {
        match self {
            ReadResult::Row(row) => Some(row),
            _ => None,
        }
    }
    
    /// Take the row, if this result carries one
    pub fn into_row(self) -> Option<Row> {
        match self {
            ReadResult::Row(row) => Some(row),
            _ => None,
        }
    }
}

/// Trait for pull-based row producers.
///
/// Implementations must be callable repeatedly: each call either makes
/// forward progress or explicitly reports `Pending` / `EndOfStream`.
pub trait PullProcessor {
    /// Pull the next result
    fn read(&mut self) -> ReadResult;
    
    /// Get the source name used in log messages
    fn source_name(&self) -> &str;
}

impl<P: PullProcessor + ?Sized> PullProcessor for Box<P> {
    fn read(&mut self) -> ReadResult {
        (**self).read()
    }
    
    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}
