use regex::Regex;

/// Configuration for month location and day-row parsing.
///
/// The time pattern is `Option<Regex>`: `None` means "use the built-in
/// default". Use [`ParsingConfigBuilder`] to construct with a string pattern.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── rows.rs ──
    /// Maximum distance between token y-centres on one row (default: 3.0 pt).
    pub(crate) row_tolerance: f32,

    // ── locator.rs ──
    /// Top fraction of the page searched for month headings (default: 0.25).
    pub(crate) heading_band: f32,

    // ── strategy.rs ──
    /// Rows with all eight times needed before column centres are trusted
    /// (default: 5).
    pub(crate) min_consensus_rows: usize,
    /// Snap distance as a fraction of the narrowest column gap (default: 0.45).
    pub(crate) column_snap: f32,
    /// Pattern for a single printed time.
    pub(crate) time_re: Option<Regex>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            heading_band: 0.25,
            min_consensus_rows: 5,
            column_snap: 0.45,
            time_re: None,
        }
    }
}

impl ParsingConfig {
    pub fn row_tolerance(&self) -> f32 {
        self.row_tolerance
    }

    pub fn heading_band(&self) -> f32 {
        self.heading_band
    }
}

/// Builder for [`ParsingConfig`].
///
/// The time pattern is compiled in [`build()`](Self::build), which fails fast
/// with `regex::Error` if it is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    row_tolerance: Option<f32>,
    heading_band: Option<f32>,
    min_consensus_rows: Option<usize>,
    column_snap: Option<f32>,
    time_re: Option<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_tolerance(mut self, points: f32) -> Self {
        self.row_tolerance = Some(points);
        self
    }

    pub fn heading_band(mut self, fraction: f32) -> Self {
        self.heading_band = Some(fraction);
        self
    }

    pub fn min_consensus_rows(mut self, rows: usize) -> Self {
        self.min_consensus_rows = Some(rows);
        self
    }

    pub fn column_snap(mut self, fraction: f32) -> Self {
        self.column_snap = Some(fraction);
        self
    }

    pub fn time_regex(mut self, pattern: &str) -> Self {
        self.time_re = Some(pattern.to_string());
        self
    }

    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let defaults = ParsingConfig::default();
        Ok(ParsingConfig {
            row_tolerance: self.row_tolerance.unwrap_or(defaults.row_tolerance),
            heading_band: self
                .heading_band
                .map(|f| f.clamp(0.0, 1.0))
                .unwrap_or(defaults.heading_band),
            min_consensus_rows: self
                .min_consensus_rows
                .unwrap_or(defaults.min_consensus_rows)
                .max(1),
            column_snap: self.column_snap.unwrap_or(defaults.column_snap),
            time_re: self.time_re.as_deref().map(Regex::new).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ParsingConfigBuilder::new().build().unwrap();
        assert_eq!(config.row_tolerance, 3.0);
        assert_eq!(config.heading_band, 0.25);
        assert_eq!(config.min_consensus_rows, 5);
        assert!(config.time_re.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ParsingConfigBuilder::new()
            .row_tolerance(4.5)
            .heading_band(2.0)
            .time_regex(r"\d{1,2}[:.]\d{2}")
            .build()
            .unwrap();
        assert_eq!(config.row_tolerance(), 4.5);
        assert_eq!(config.heading_band(), 1.0);
        assert!(config.time_re.unwrap().is_match("5.21"));
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = ParsingConfigBuilder::new().time_regex(r"(\d").build();
        assert!(result.is_err());
    }
}
