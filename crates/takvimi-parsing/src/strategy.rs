//! Layout strategies for reading day rows off timetable pages.
//!
//! Each strategy is a pure function from the month's timetable rows to the day
//! rows it could read, or a [`Rejection`] when the layout does not fit its
//! assumptions. Completeness (every day exactly once) is checked by the caller.

use regex::Regex;

use takvimi_core::{LayoutStrategy, PrayerTimes, Rejection, TextToken};

use crate::config::ParsingConfig;
use crate::fields::{LeadingFields, split_leading};
use crate::rows::{Row, is_time, time_pattern};
use crate::text::parse_number;

/// One day as read by a strategy, before enrichment from note pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRow {
    pub day: u32,
    pub weekday: Option<String>,
    pub hijri_day: Option<u32>,
    pub note: String,
    pub times: PrayerTimes,
}

impl DayRow {
    fn from_parts(fields: LeadingFields, times: PrayerTimes, days_in_month: u32) -> Option<Self> {
        let day = fields.day.filter(|d| (1..=days_in_month).contains(d))?;
        Some(Self {
            day,
            weekday: fields.weekday,
            hijri_day: fields.hijri_day,
            note: fields.note,
            times,
        })
    }
}

/// Run a single strategy over the month's timetable rows.
pub fn run_strategy(
    strategy: LayoutStrategy,
    rows: &[Row<'_>],
    days_in_month: u32,
    config: &ParsingConfig,
) -> Result<Vec<DayRow>, Rejection> {
    match strategy {
        LayoutStrategy::ColumnBins => try_column_bins(rows, days_in_month, config),
        LayoutStrategy::PositionalRegex => try_positional_regex(rows, days_in_month, config),
        LayoutStrategy::RowReconciliation => try_row_reconciliation(rows, days_in_month, config),
    }
}

fn try_column_bins(
    rows: &[Row<'_>],
    days_in_month: u32,
    config: &ParsingConfig,
) -> Result<Vec<DayRow>, Rejection> {
    let re = time_pattern(config);
    let timed: Vec<(&Row<'_>, Vec<&TextToken>)> = rows
        .iter()
        .filter(|r| r.is_timetable_row(re))
        .map(|r| (r, r.tokens.iter().copied().filter(|t| is_time(&t.text, re)).collect()))
        .collect();
    if timed.is_empty() {
        return Err(Rejection::NoTimetableRows);
    }

    let consensus: Vec<&Vec<&TextToken>> = timed
        .iter()
        .map(|(_, times)| times)
        .filter(|times| times.len() == PrayerTimes::FIELDS)
        .collect();
    let no_consensus = Rejection::NoColumnConsensus {
        found: consensus.len(),
        needed: config.min_consensus_rows,
    };
    if consensus.len() < config.min_consensus_rows {
        return Err(no_consensus);
    }

    let mut centres = [0f32; PrayerTimes::FIELDS];
    for (k, centre) in centres.iter_mut().enumerate() {
        let xs: Vec<f32> = consensus.iter().map(|times| times[k].center_x()).collect();
        *centre = median(xs);
    }
    let min_gap = centres
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f32::INFINITY, f32::min);
    if !(min_gap.is_finite() && min_gap > 0.0) {
        return Err(no_consensus);
    }
    let snap = config.column_snap * min_gap;

    let mut out = Vec::new();
    let mut misaligned = 0;
    'rows: for (row, times) in &timed {
        let mut slots: [Option<&str>; PrayerTimes::FIELDS] = [None; PrayerTimes::FIELDS];
        for t in times {
            let cx = t.center_x();
            let (k, dist) = centres
                .iter()
                .enumerate()
                .map(|(k, c)| (k, (cx - c).abs()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, f32::INFINITY));
            if dist > snap || slots[k].is_some() {
                misaligned += 1;
                continue 'rows;
            }
            slots[k] = Some(t.text.as_str());
        }
        if slots[..PrayerTimes::REQUIRED].iter().any(Option::is_none) {
            continue;
        }

        let left_edge = centres[0] - snap;
        let leading: Vec<&str> = row
            .tokens
            .iter()
            .filter(|t| t.center_x() < left_edge && !is_time(&t.text, re))
            .map(|t| t.text.as_str())
            .collect();
        let values: Vec<&str> = slots.iter().map(|s| s.unwrap_or("")).collect();
        let Some(times) = PrayerTimes::from_ordered(&values) else {
            continue;
        };
        if let Some(day) = DayRow::from_parts(split_leading(&leading), times, days_in_month) {
            out.push(day);
        }
    }

    if misaligned > 0 {
        return Err(Rejection::MisalignedRows { count: misaligned });
    }
    Ok(out)
}

fn try_positional_regex(
    rows: &[Row<'_>],
    days_in_month: u32,
    config: &ParsingConfig,
) -> Result<Vec<DayRow>, Rejection> {
    let re = time_pattern(config);
    let out: Vec<DayRow> = rows
        .iter()
        .filter_map(|row| parse_positional(&row.text(), re, days_in_month))
        .collect();
    if out.is_empty() {
        return Err(Rejection::NoTimetableRows);
    }
    Ok(out)
}

fn try_row_reconciliation(
    rows: &[Row<'_>],
    days_in_month: u32,
    config: &ParsingConfig,
) -> Result<Vec<DayRow>, Rejection> {
    let re = time_pattern(config);
    let mut segments: Vec<Vec<&str>> = Vec::new();
    let mut last_anchor = 0;

    for row in rows {
        let words = row.words();
        let open = segments
            .last()
            .is_some_and(|s| s.iter().filter(|w| is_time(w, re)).count() < PrayerTimes::REQUIRED);
        let leading = words
            .first()
            .and_then(|w| parse_number(w))
            .filter(|n| (1..=days_in_month).contains(n));

        match leading {
            Some(n) if n > last_anchor => {
                last_anchor = n;
                segments.push(words);
            }
            // A repeated day with its own times stays a separate day so the
            // completeness check sees the conflict.
            Some(_) if !open && row.time_count(re) > 0 => segments.push(words),
            // Continuation rows only attach to a day still short of its times.
            _ if open => {
                if let Some(segment) = segments.last_mut() {
                    segment.extend(words);
                }
            }
            _ => {}
        }
    }

    let out: Vec<DayRow> = segments
        .iter()
        .filter_map(|segment| parse_positional(&segment.join(" "), re, days_in_month))
        .collect();
    if out.is_empty() {
        return Err(Rejection::NoTimetableRows);
    }
    Ok(out)
}

/// Times in order of appearance; everything else forms the leading fields.
fn parse_positional(text: &str, re: &Regex, days_in_month: u32) -> Option<DayRow> {
    let matches: Vec<regex::Match<'_>> = re.find_iter(text).collect();
    if matches.len() < PrayerTimes::REQUIRED {
        return None;
    }
    let values: Vec<&str> = matches
        .iter()
        .take(PrayerTimes::FIELDS)
        .map(|m| m.as_str())
        .collect();
    let times = PrayerTimes::from_ordered(&values)?;

    let mut remaining = String::with_capacity(text.len());
    let mut last = 0;
    for m in &matches {
        remaining.push_str(&text[last..m.start()]);
        remaining.push(' ');
        last = m.end();
    }
    remaining.push_str(&text[last..]);
    let words: Vec<&str> = remaining.split_whitespace().collect();

    DayRow::from_parts(split_leading(&words), times, days_in_month)
}

fn median(mut xs: Vec<f32>) -> f32 {
    xs.sort_by(f32::total_cmp);
    let n = xs.len();
    if n == 0 {
        return f32::NAN;
    }
    if n % 2 == 1 {
        xs[n / 2]
    } else {
        (xs[n / 2 - 1] + xs[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::cluster_rows;

    const TIMES: [&str; 8] = ["5:21", "5:41", "7:13", "11:48", "14:13", "16:22", "17:54", "9:09"];

    fn row_tokens(day: u32, y: f32, shift: f32, times: &[&str]) -> Vec<TextToken> {
        let mut tokens = vec![
            TextToken::new(day.to_string(), 20.0, y, 8.0, 8.0),
            TextToken::new("e", 40.0, y, 5.0, 8.0),
            TextToken::new("hënë", 48.0, y, 20.0, 8.0),
        ];
        for (k, t) in times.iter().enumerate() {
            tokens.push(TextToken::new(*t, 150.0 + k as f32 * 40.0 + shift, y, 20.0, 8.0));
        }
        tokens
    }

    fn page(days: u32, shift_of: impl Fn(u32) -> f32) -> Vec<TextToken> {
        (1..=days)
            .flat_map(|d| row_tokens(d, 100.0 + d as f32 * 15.0, shift_of(d), &TIMES))
            .collect()
    }

    #[test]
    fn test_column_bins_reads_aligned_rows() {
        let tokens = page(10, |_| 0.0);
        let rows = cluster_rows(&tokens, 3.0);
        let config = ParsingConfig::default();
        let days = run_strategy(LayoutStrategy::ColumnBins, &rows, 31, &config).unwrap();
        assert_eq!(days.len(), 10);
        assert_eq!(days[0].weekday.as_deref(), Some("e hënë"));
        assert_eq!(days[9].times.day_length, "9:09");
    }

    #[test]
    fn test_column_bins_rejects_jitter() {
        let tokens = page(10, |d| if d % 3 == 0 { 20.0 } else { 0.0 });
        let rows = cluster_rows(&tokens, 3.0);
        let config = ParsingConfig::default();
        let err = run_strategy(LayoutStrategy::ColumnBins, &rows, 31, &config).unwrap_err();
        assert!(matches!(err, Rejection::MisalignedRows { .. }));

        let days = run_strategy(LayoutStrategy::PositionalRegex, &rows, 31, &config).unwrap();
        assert_eq!(days.len(), 10);
    }

    #[test]
    fn test_column_bins_needs_consensus() {
        let tokens = page(3, |_| 0.0);
        let rows = cluster_rows(&tokens, 3.0);
        let err = run_strategy(LayoutStrategy::ColumnBins, &rows, 31, &ParsingConfig::default())
            .unwrap_err();
        assert_eq!(err, Rejection::NoColumnConsensus { found: 3, needed: 5 });
    }

    #[test]
    fn test_positional_leaves_missing_day_length_empty() {
        let tokens = row_tokens(4, 100.0, 0.0, &TIMES[..7]);
        let rows = cluster_rows(&tokens, 3.0);
        let days = run_strategy(LayoutStrategy::PositionalRegex, &rows, 31, &ParsingConfig::default())
            .unwrap();
        assert_eq!(days[0].day, 4);
        assert_eq!(days[0].times.night, "17:54");
        assert_eq!(days[0].times.day_length, "");
    }

    #[test]
    fn test_reconciliation_joins_wrapped_rows() {
        let mut tokens = row_tokens(1, 100.0, 0.0, &TIMES);
        // Day 2 wraps after its third time.
        tokens.extend(row_tokens(2, 115.0, 0.0, &TIMES[..3]));
        for (k, t) in TIMES[3..].iter().enumerate() {
            tokens.push(TextToken::new(*t, 150.0 + (k + 3) as f32 * 40.0, 127.0, 20.0, 8.0));
        }
        tokens.extend(row_tokens(3, 140.0, 0.0, &TIMES));
        let rows = cluster_rows(&tokens, 3.0);
        let config = ParsingConfig::default();

        let positional = run_strategy(LayoutStrategy::PositionalRegex, &rows, 31, &config).unwrap();
        assert_eq!(positional.iter().map(|d| d.day).collect::<Vec<_>>(), vec![1, 3]);

        let reconciled =
            run_strategy(LayoutStrategy::RowReconciliation, &rows, 31, &config).unwrap();
        assert_eq!(reconciled.iter().map(|d| d.day).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(reconciled[1].times.as_array(), TIMES);
    }

    #[test]
    fn test_reconciliation_keeps_repeated_day() {
        let mut tokens = page(4, |_| 0.0);
        let conflicting = ["4:00", "5:41", "7:13", "11:48", "14:13", "16:22", "17:54", "9:09"];
        tokens.extend(row_tokens(3, 300.0, 0.0, &conflicting));
        let rows = cluster_rows(&tokens, 3.0);

        let days = run_strategy(LayoutStrategy::RowReconciliation, &rows, 28, &ParsingConfig::default())
            .unwrap();
        assert_eq!(days.iter().map(|d| d.day).collect::<Vec<_>>(), vec![1, 2, 3, 4, 3]);
        assert_eq!(days[4].times.imsak, "4:00");
    }

    #[test]
    fn test_reconciliation_attaches_times_to_anchor_line() {
        let mut tokens = vec![TextToken::new("Imsaku", 150.0, 60.0, 30.0, 8.0)];
        for d in 1..=3 {
            let y = 100.0 + d as f32 * 20.0;
            tokens.extend(row_tokens(d, y, 0.0, &[]));
            for (k, t) in TIMES.iter().enumerate() {
                tokens.push(TextToken::new(*t, 150.0 + k as f32 * 40.0, y + 6.0, 20.0, 8.0));
            }
        }
        let rows = cluster_rows(&tokens, 3.0);
        let config = ParsingConfig::default();

        assert_eq!(
            run_strategy(LayoutStrategy::PositionalRegex, &rows, 28, &config).unwrap_err(),
            Rejection::NoTimetableRows
        );
        let days = run_strategy(LayoutStrategy::RowReconciliation, &rows, 28, &config).unwrap();
        assert_eq!(days.iter().map(|d| d.day).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(days[2].weekday.as_deref(), Some("e hënë"));
        assert_eq!(days[2].times.as_array(), TIMES);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), 2.5);
    }
}
