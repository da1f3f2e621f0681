use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use takvimi_core::{
    DayGap, DayRecord, ExtractionError, LayoutStrategy, Month, MonthRecord, PageLayout, Rejection,
    StrategyAttempt, Year,
};

use crate::config::ParsingConfig;
use crate::fields::split_leading;
use crate::rows::{Row, cluster_rows, time_pattern};
use crate::strategy::{DayRow, run_strategy};
use crate::text::WEEKDAYS;

/// A complete month and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMonth {
    pub record: MonthRecord,
    pub strategy: LayoutStrategy,
}

/// Note text (and lunar day, when printed) read from a note page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PageNote {
    hijri_day: Option<u32>,
    note: String,
}

/// Parse one month from the pages of its range.
///
/// Timetable rows are read with each [`LayoutStrategy`] in order until one
/// yields every day of the month exactly once. Rows on note pages (and rows
/// without times on timetable pages) supply notes for days whose own row
/// carries none.
pub fn parse_month(
    year: Year,
    month: Month,
    pages: &[&PageLayout],
    config: &ParsingConfig,
) -> Result<ParsedMonth, ExtractionError> {
    let days_in_month = month.days_in(year);
    let re = time_pattern(config);

    // Every row of the timetable pages, in reading order; reconciliation
    // needs the rows without times too, since a day number may sit on its own
    // line above the times.
    let mut page_rows: Vec<Row<'_>> = Vec::new();
    let mut timetable_rows: Vec<Row<'_>> = Vec::new();
    let mut note_rows: Vec<Row<'_>> = Vec::new();
    for page in pages {
        let rows = cluster_rows(&page.tokens, config.row_tolerance);
        if rows.iter().any(|r| r.is_timetable_row(re)) {
            for row in rows {
                page_rows.push(row.clone());
                if row.time_count(re) == 0 {
                    note_rows.push(row);
                } else {
                    timetable_rows.push(row);
                }
            }
        } else {
            note_rows.extend(rows);
        }
    }
    let notes = collect_notes(&note_rows, days_in_month);

    let mut attempts: Vec<StrategyAttempt> = Vec::new();
    for strategy in LayoutStrategy::ORDER {
        if strategy == LayoutStrategy::RowReconciliation && !counts_were_inconsistent(&attempts) {
            attempts.push(StrategyAttempt {
                strategy,
                rejection: Rejection::NotNeeded,
            });
            continue;
        }

        let rows = match strategy {
            LayoutStrategy::RowReconciliation => &page_rows,
            _ => &timetable_rows,
        };
        let outcome = run_strategy(strategy, rows, days_in_month, config)
            .and_then(|rows| complete(year, month, rows, &notes));
        match outcome {
            Ok(record) => {
                tracing::debug!(year, month = %month, strategy = %strategy, "month parsed");
                return Ok(ParsedMonth { record, strategy });
            }
            Err(rejection) => {
                tracing::debug!(
                    year,
                    month = %month,
                    strategy = %strategy,
                    reason = %rejection,
                    "strategy rejected"
                );
                attempts.push(StrategyAttempt {
                    strategy,
                    rejection,
                });
            }
        }
    }

    Err(ExtractionError::MonthExtractionFailed {
        month,
        pages: pages.iter().map(|p| p.index).collect(),
        attempts,
    })
}

/// Reconciliation only helps when earlier strategies found rows but not the
/// right set of them.
fn counts_were_inconsistent(attempts: &[StrategyAttempt]) -> bool {
    attempts.iter().any(|a| {
        matches!(
            a.rejection,
            Rejection::MissingDays(_) | Rejection::DuplicateDay(_) | Rejection::DayOutOfRange(_)
        )
    })
}

fn collect_notes(rows: &[Row<'_>], days_in_month: u32) -> BTreeMap<u32, PageNote> {
    let mut notes = BTreeMap::new();
    for row in rows {
        let fields = split_leading(&row.words());
        let Some(day) = fields.day.filter(|d| (1..=days_in_month).contains(d)) else {
            continue;
        };
        if fields.note.is_empty() && fields.hijri_day.is_none() {
            continue;
        }
        notes.entry(day).or_insert(PageNote {
            hijri_day: fields.hijri_day,
            note: fields.note,
        });
    }
    notes
}

/// Check the strategy's rows cover the month exactly once and build the record.
fn complete(
    year: Year,
    month: Month,
    rows: Vec<DayRow>,
    notes: &BTreeMap<u32, PageNote>,
) -> Result<MonthRecord, Rejection> {
    let mut by_day: BTreeMap<u32, DayRow> = BTreeMap::new();
    for row in rows {
        match by_day.get(&row.day) {
            Some(existing) if *existing == row => {}
            Some(_) => return Err(Rejection::DuplicateDay(row.day)),
            None => {
                by_day.insert(row.day, row);
            }
        }
    }

    let days = by_day.into_values().map(|row| {
        let page_note = notes.get(&row.day);
        into_record(year, month, row, page_note)
    });
    MonthRecord::from_days(year, month, days).map_err(|gap| match gap {
        DayGap::Missing(days) => Rejection::MissingDays(days),
        DayGap::Duplicate(day) => Rejection::DuplicateDay(day),
        DayGap::OutOfRange(day) => Rejection::DayOutOfRange(day),
    })
}

fn into_record(year: Year, month: Month, row: DayRow, page_note: Option<&PageNote>) -> DayRecord {
    let weekday = row
        .weekday
        .unwrap_or_else(|| weekday_of(year, month, row.day).unwrap_or_default());

    let mut note = row.note;
    if note.is_empty()
        && let Some(p) = page_note
    {
        note = p.note.clone();
    }
    if note.is_empty() && month == Month::JANUARY && row.day == 1 {
        note = format!("Viti i Ri {year}");
    }

    DayRecord {
        day: row.day,
        weekday,
        hijri_day: row.hijri_day.or(page_note.and_then(|p| p.hijri_day)),
        note,
        times: row.times,
    }
}

/// Weekday name for a date, in the calendar's printed form.
pub fn weekday_of(year: Year, month: Month, day: u32) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(year, month.number(), day)?;
    let index = date.weekday().num_days_from_monday() as usize;
    WEEKDAYS.get(index).map(|w| w.to_string())
}
