pub mod csv_source;
pub mod memory_source;

pub use csv_source::{parse_timestamp, CsvSource};
pub use memory_source::VecSource;
