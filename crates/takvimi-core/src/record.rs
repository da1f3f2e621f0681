//! Calendar records produced by extraction and served by the API.
//!
//! Field names on the wire follow the Albanian vocabulary of the printed
//! calendar (`kohet`, `imsaku`, `dita_javes`, ...). Map keys are zero-padded
//! two-digit strings, so the ordered maps below always iterate (and
//! serialize) in calendar order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Gregorian calendar year.
pub type Year = i32;

/// A calendar month, 1 through 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(u8);

impl Month {
    pub const JANUARY: Month = Month(1);
    pub const FEBRUARY: Month = Month(2);
    pub const DECEMBER: Month = Month(12);

    /// Build a month from its number, `None` outside 1..=12.
    pub fn new(number: u32) -> Option<Self> {
        (1..=12).contains(&number).then_some(Month(number as u8))
    }

    /// Parse a one- or two-digit month key ("1", "01", "12").
    pub fn parse_key(key: &str) -> Option<Self> {
        if key.is_empty() || key.len() > 2 || !key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        key.parse().ok().and_then(Self::new)
    }

    /// All twelve months in calendar order.
    pub fn all() -> impl DoubleEndedIterator<Item = Month> + ExactSizeIterator {
        (1..=12u8).map(Month)
    }

    pub fn number(self) -> u32 {
        u32::from(self.0)
    }

    /// Zero-padded key used for map keys and file names ("01".."12").
    pub fn key(self) -> String {
        format!("{:02}", self.0)
    }

    pub fn days_in(self, year: Year) -> u32 {
        match self.0 {
            2 if is_leap_year(year) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

pub fn is_leap_year(year: Year) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Zero-padded key for a day of month ("01".."31").
pub fn day_key(day: u32) -> String {
    format!("{day:02}")
}

/// The eight daily time values, copied verbatim from the document.
///
/// An empty string marks a value the document did not provide; keys are never
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimes {
    #[serde(rename = "imsaku")]
    pub imsak: String,
    #[serde(rename = "sabahu")]
    pub dawn: String,
    #[serde(rename = "lindja_e_diellit")]
    pub sunrise: String,
    #[serde(rename = "dreka")]
    pub noon: String,
    #[serde(rename = "ikindia")]
    pub afternoon: String,
    #[serde(rename = "akshami")]
    pub sunset: String,
    #[serde(rename = "jacia")]
    pub night: String,
    #[serde(rename = "gjatesia_e_dites")]
    pub day_length: String,
}

impl PrayerTimes {
    /// Number of time fields.
    pub const FIELDS: usize = 8;
    /// Fields that must be present for a row to count as a timetable row
    /// (everything except the day length).
    pub const REQUIRED: usize = 7;

    /// Build from times in printed column order.
    ///
    /// Returns `None` when fewer than [`Self::REQUIRED`] values are given.
    /// Values beyond the eighth are ignored.
    pub fn from_ordered<S: AsRef<str>>(times: &[S]) -> Option<Self> {
        if times.len() < Self::REQUIRED {
            return None;
        }
        let at = |i: usize| times.get(i).map(|t| t.as_ref().to_string()).unwrap_or_default();
        Some(Self {
            imsak: at(0),
            dawn: at(1),
            sunrise: at(2),
            noon: at(3),
            afternoon: at(4),
            sunset: at(5),
            night: at(6),
            day_length: at(7),
        })
    }

    /// The values in printed column order.
    pub fn as_array(&self) -> [&str; Self::FIELDS] {
        [
            &self.imsak,
            &self.dawn,
            &self.sunrise,
            &self.noon,
            &self.afternoon,
            &self.sunset,
            &self.night,
            &self.day_length,
        ]
    }
}

/// One calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Day of month in the world (Gregorian) calendar.
    #[serde(rename = "data_sipas_kal_boteror")]
    pub day: u32,
    /// Weekday name as printed.
    #[serde(rename = "dita_javes")]
    pub weekday: String,
    /// Lunar (hijri) day number, when the row carried one.
    #[serde(
        rename = "data_sipas_takvimit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hijri_day: Option<u32>,
    /// Festivals and astronomical notes, verbatim. May be empty.
    #[serde(rename = "festat_fetare_dhe_shenime_te_tjera_astronomike")]
    pub note: String,
    #[serde(rename = "kohet")]
    pub times: PrayerTimes,
}

/// Why a set of days does not form a complete month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayGap {
    OutOfRange(u32),
    Duplicate(u32),
    Missing(Vec<u32>),
}

/// Every day of one month, keyed "01".."NN".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthRecord {
    days: BTreeMap<String, DayRecord>,
}

impl MonthRecord {
    /// Assemble a month, requiring exactly the days `1..=days_in_month`.
    pub fn from_days(
        year: Year,
        month: Month,
        days: impl IntoIterator<Item = DayRecord>,
    ) -> Result<Self, DayGap> {
        let last = month.days_in(year);
        let mut map = BTreeMap::new();
        for record in days {
            if record.day == 0 || record.day > last {
                return Err(DayGap::OutOfRange(record.day));
            }
            let day = record.day;
            if map.insert(day_key(day), record).is_some() {
                return Err(DayGap::Duplicate(day));
            }
        }
        let missing: Vec<u32> = (1..=last).filter(|d| !map.contains_key(&day_key(*d))).collect();
        if !missing.is_empty() {
            return Err(DayGap::Missing(missing));
        }
        Ok(Self { days: map })
    }

    pub fn get(&self, day: u32) -> Option<&DayRecord> {
        self.days.get(&day_key(day))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DayRecord)> {
        self.days.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the keys are exactly "01".. last day of the month, each key
    /// agreeing with its record's day number.
    pub fn is_complete_for(&self, year: Year, month: Month) -> bool {
        let last = month.days_in(year);
        self.days.len() == last as usize
            && (1..=last).all(|d| self.days.get(&day_key(d)).is_some_and(|r| r.day == d))
    }
}

/// All twelve months of one year, keyed "01".."12".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearRecord {
    months: BTreeMap<String, MonthRecord>,
}

impl YearRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, month: Month, record: MonthRecord) {
        self.months.insert(month.key(), record);
    }

    pub fn month(&self, month: Month) -> Option<&MonthRecord> {
        self.months.get(&month.key())
    }

    /// Months present, in ascending order.
    pub fn months(&self) -> impl Iterator<Item = (Month, &MonthRecord)> {
        self.months
            .iter()
            .filter_map(|(k, v)| Month::parse_key(k).map(|m| (m, v)))
    }

    pub fn missing_months(&self) -> Vec<Month> {
        Month::all().filter(|m| self.month(*m).is_none()).collect()
    }

    /// All twelve months present and each one complete.
    pub fn is_complete(&self, year: Year) -> bool {
        Month::all().all(|m| self.month(m).is_some_and(|r| r.is_complete_for(year, m)))
    }
}

/// Persisted and served shape of a full year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDocument {
    pub year: String,
    pub data: YearRecord,
}

impl YearDocument {
    pub fn new(year: Year, data: YearRecord) -> Self {
        Self {
            year: year.to_string(),
            data,
        }
    }
}

/// Persisted and served shape of a single month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDocument {
    pub year: String,
    pub month: String,
    pub data: MonthRecord,
}

impl MonthDocument {
    pub fn new(year: Year, month: Month, data: MonthRecord) -> Self {
        Self {
            year: year.to_string(),
            month: month.key(),
            data,
        }
    }
}
