use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use chrono::DateTime;
use csv::{ReaderBuilder, StringRecord};
use gs_core::{PullProcessor, ReadResult, Row};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::NullConfig;
use crate::DataError;

/// CSV upstream producing one raw row per record.
///
/// The time column holds integer epoch milliseconds or RFC 3339 timestamps;
/// every other column is parsed as a decimal. Null patterns and malformed
/// cells become absent values.
pub struct CsvSource<R: Read> {
    /// CSV reader
    reader: csv::Reader<R>,
    /// Header names, in file order
    headers: Vec<String>,
    /// Index of the time column within `headers`
    time_index: usize,
    /// Name of the time column
    time_column: String,
    /// Null handling configuration
    null_config: NullConfig,
    /// Reused record buffer
    record: StringRecord,
    /// Records read so far
    records_read: usize,
    /// Source name
    source_name: String,
    finished: bool,
}

impl CsvSource<BufReader<File>> {
    /// Open a CSV file
    pub fn open(path: &Path, time_column: &str) -> Result<Self, DataError> {
        info!("Opening CSV source {:?}", path);
        let file = File::open(path)?;
        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
            .to_string();
        Self::from_reader(BufReader::new(file), time_column, source_name)
    }
}

impl<R: Read> CsvSource<R> {
    /// Wrap any reader producing headered CSV
    pub fn from_reader(reader: R, time_column: &str, source_name: impl Into<String>) -> Result<Self, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let time_index = headers
            .iter()
            .position(|h| h == time_column)
            .ok_or_else(|| DataError::MissingColumn(time_column.to_string()))?;
        
        Ok(Self {
            reader,
            headers,
            time_index,
            time_column: time_column.to_string(),
            null_config: NullConfig::default(),
            record: StringRecord::new(),
            records_read: 0,
            source_name: source_name.into(),
            finished: false,
        })
    }
    
    /// Replace the null handling configuration
    pub fn with_null_config(mut self, null_config: NullConfig) -> Self {
        self.null_config = null_config;
        self
    }
    
    /// Header names, in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
    
    /// Records read so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }
    
    /// Convert the current record into a row
    fn to_row(&self) -> Row {
        let mut row = Row::new();
        for (idx, name) in self.headers.iter().enumerate() {
            let cell = self.record.get(idx).unwrap_or("");
            if self.null_config.is_null(cell) {
                row.insert(name.as_str(), None);
                continue;
            }
            
            if idx == self.time_index {
                match parse_timestamp(cell) {
                    Some(time) => row.set_time(&self.time_column, time),
                    None => {
                        warn!(
                            "{}: record {} has unparseable time '{}'",
                            self.source_name, self.records_read, cell
                        );
                        row.insert(name.as_str(), None);
                    }
                }
                continue;
            }
            
            match Decimal::from_str(cell).or_else(|_| Decimal::from_scientific(cell)) {
                Ok(value) => row.insert(name.as_str(), Some(value)),
                Err(_) => {
                    warn!(
                        "{}: record {} column '{}' is not numeric: '{}'",
                        self.source_name, self.records_read, name, cell
                    );
                    row.insert(name.as_str(), None);
                }
            }
        }
        row
    }
}

impl<R: Read> PullProcessor for CsvSource<R> {
    fn read(&mut self) -> ReadResult {
        if self.finished {
            return ReadResult::EndOfStream;
        }
        
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.records_read += 1;
                ReadResult::Row(self.to_row())
            }
            Ok(false) => {
                info!("{}: end of input after {} records", self.source_name, self.records_read);
                self.finished = true;
                ReadResult::EndOfStream
            }
            Err(e) => {
                // The reader skips past a malformed record, so a later read continues
                let error = DataError::from(e);
                warn!("{}: failed to read record: {}", self.source_name, error);
                ReadResult::MissingData(error.to_string())
            }
        }
    }
    
    fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Parse a timestamp given as integer epoch milliseconds or RFC 3339
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<i64>() {
        return Some(millis);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}
