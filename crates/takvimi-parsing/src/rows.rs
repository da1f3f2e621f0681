use once_cell::sync::Lazy;
use regex::Regex;

use takvimi_core::{PrayerTimes, TextToken};

use crate::config::ParsingConfig;

/// Tokens sharing a baseline, left to right.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    /// Mean y-centre of the row's tokens.
    pub y: f32,
    pub tokens: Vec<&'a TextToken>,
}

impl<'a> Row<'a> {
    pub fn words(&self) -> Vec<&'a str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn text(&self) -> String {
        self.words().join(" ")
    }

    pub fn time_count(&self, re: &Regex) -> usize {
        self.tokens.iter().filter(|t| is_time(&t.text, re)).count()
    }

    /// Carries enough times to be a day of the timetable.
    pub fn is_timetable_row(&self, re: &Regex) -> bool {
        self.time_count(re) >= PrayerTimes::REQUIRED
    }
}

/// Group tokens into rows by y-centre proximity, top to bottom.
///
/// A token joins the current row while its centre lies within `tolerance` of
/// the row's running mean.
pub fn cluster_rows(tokens: &[TextToken], tolerance: f32) -> Vec<Row<'_>> {
    let mut sorted: Vec<&TextToken> = tokens.iter().filter(|t| !t.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut rows: Vec<Row<'_>> = Vec::new();
    for token in sorted {
        let cy = token.center_y();
        match rows.last_mut() {
            Some(row) if (cy - row.y).abs() <= tolerance => {
                let n = row.tokens.len() as f32;
                row.y = (row.y * n + cy) / (n + 1.0);
                row.tokens.push(token);
            }
            _ => rows.push(Row {
                y: cy,
                tokens: vec![token],
            }),
        }
    }
    for row in &mut rows {
        row.tokens.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}

pub(crate) fn time_pattern(config: &ParsingConfig) -> &Regex {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap());
    config.time_re.as_ref().unwrap_or(&RE)
}

/// The whole token is a single time.
pub(crate) fn is_time(token: &str, re: &Regex) -> bool {
    re.find(token)
        .is_some_and(|m| m.start() == 0 && m.end() == token.len())
}
