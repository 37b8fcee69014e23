//! Cells that count as "no reading" in CSV input

use serde::{Deserialize, Serialize};

/// Markers loggers commonly write in place of a value
const DEFAULT_MARKERS: [&str; 6] = ["", "-", "N/A", "NaN", "null", "None"];

/// Decides which raw cells become absent values instead of parse failures.
///
/// Cells are trimmed before matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullConfig {
    /// Cell contents treated as absent
    pub markers: Vec<String>,
    /// Match markers exactly instead of ignoring ASCII case
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// Default markers plus `extra`
    pub fn with_markers<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        for marker in extra {
            config.add_marker(marker);
        }
        config
    }
    
    /// Whether `cell` holds no reading
    pub fn is_null(&self, cell: &str) -> bool {
        let cell = cell.trim();
        self.markers.iter().any(|marker| {
            if self.case_sensitive {
                cell == marker
            } else {
                cell.eq_ignore_ascii_case(marker)
            }
        })
    }
    
    /// Register another marker; duplicates are ignored
    pub fn add_marker(&mut self, marker: impl Into<String>) {
        let marker = marker.into().trim().to_string();
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
    }
}
