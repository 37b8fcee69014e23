//! Relational rows flowing between pull processors

use indexmap::IndexMap;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

/// A single relational row: an ordered mapping from column name to an
/// optional decimal value.
///
/// The same type carries raw upstream rows and synchronized output rows, so
/// processors can be chained. The time column is stored like any other field
/// and read back through [`Row::time`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: IndexMap<String, Option<Decimal>>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Create a row holding only the time field
    pub fn with_time(time_column: &str, time: i64) -> Self {
        let mut row = Self::new();
        row.set_time(time_column, time);
        row
    }
    
    /// Set (or overwrite) the time field
    pub fn set_time(&mut self, time_column: &str, time: i64) {
        self.fields.insert(time_column.to_string(), Some(Decimal::from(time)));
    }
    
    /// Insert a field; `None` records the column as explicitly absent
    pub fn insert(&mut self, column: impl Into<String>, value: Option<Decimal>) {
        self.fields.insert(column.into(), value);
    }
    
    /// Builder-style insert
    pub fn with(mut self, column: impl Into<String>, value: Option<Decimal>) -> Self {
        self.insert(column, value);
        self
    }
    
    /// Value of a column, `None` when missing or absent
    pub fn get(&self, column: &str) -> Option<Decimal> {
        self.fields.get(column).copied().flatten()
    }
    
    /// Whether the column is present (even if its value is absent)
    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }
    
    /// Integral timestamp stored under `time_column`.
    ///
    /// Returns `None` when the field is missing, absent, fractional or does
    /// not fit in an `i64`.
    pub fn time(&self, time_column: &str) -> Option<i64> {
        let value = self.get(time_column)?;
        if !value.fract().is_zero() {
            return None;
        }
        value.to_i64()
    }
    
    /// Iterate over fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<Decimal>)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), *value))
    }
    
    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
    
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    
    #[test]
    fn test_time_roundtrip() {
        let row = Row::with_time("time", 1_700_000_000_000);
        assert_eq!(row.time("time"), Some(1_700_000_000_000));
        assert_eq!(row.time("missing"), None);
    }
    
    #[test]
    fn test_fractional_time_is_rejected() {
        let row = Row::new().with("time", Some(dec!(10.5)));
        assert_eq!(row.time("time"), None);
    }
    
    #[test]
    fn test_absent_values_are_present_columns() {
        let row = Row::with_time("time", 0)
            .with("a", Some(dec!(1.25)))
            .with("b", None);
        
        assert!(row.contains("b"));
        assert_eq!(row.get("b"), None);
        assert_eq!(row.get("a"), Some(dec!(1.25)));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["time", "a", "b"]);
    }
}
