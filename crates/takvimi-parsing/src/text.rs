//! Albanian vocabulary used to recognise headings and weekday names.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use takvimi_core::Month;

/// Month names in calendar order, diacritics folded.
const MONTH_NAMES: [&str; 12] = [
    "janar", "shkurt", "mars", "prill", "maj", "qershor", "korrik", "gusht", "shtator", "tetor",
    "nentor", "dhjetor",
];

/// Weekday names, diacritics folded.
const DAY_NAMES: [&str; 7] = ["hene", "marte", "merkure", "enjte", "premte", "shtune", "diel"];

/// Weekday names as printed, Monday first.
pub const WEEKDAYS: [&str; 7] = [
    "e hënë",
    "e martë",
    "e mërkurë",
    "e enjte",
    "e premte",
    "e shtunë",
    "e diel",
];

/// Fold a word for comparison: NFKD, drop everything outside ASCII (which
/// removes the combining marks), lowercase, and trim surrounding punctuation.
pub fn normalize(word: &str) -> String {
    let folded: String = word.nfkd().filter(|c| c.is_ascii()).collect();
    folded
        .to_lowercase()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// The month a heading word names, if any ("NËNTOR", "Nentor", "nëntor,").
pub fn month_from_word(word: &str) -> Option<Month> {
    let folded = normalize(word);
    MONTH_NAMES
        .iter()
        .position(|name| *name == folded)
        .and_then(|i| Month::new(i as u32 + 1))
}

pub fn is_day_name(word: &str) -> bool {
    DAY_NAMES.contains(&normalize(word).as_str())
}

/// The particle that precedes day names ("e hënë").
pub fn is_weekday_particle(word: &str) -> bool {
    normalize(word) == "e"
}

/// A bare day-of-month style integer ("7", "31").
pub fn parse_number(word: &str) -> Option<u32> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}$").unwrap());
    if RE.is_match(word) {
        word.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_names_fold_diacritics_and_case() {
        assert_eq!(month_from_word("NËNTOR"), Month::new(11));
        assert_eq!(month_from_word("Nentor"), Month::new(11));
        assert_eq!(month_from_word("nëntor,"), Month::new(11));
        assert_eq!(month_from_word("Janar"), Some(Month::JANUARY));
        assert_eq!(month_from_word("DHJETOR"), Some(Month::DECEMBER));
        assert_eq!(month_from_word("Imsaku"), None);
        assert_eq!(month_from_word("2025"), None);
    }

    #[test]
    fn test_weekday_vocabulary() {
        assert!(is_day_name("hënë"));
        assert!(is_day_name("Mërkurë"));
        assert!(is_day_name("shtune"));
        assert!(!is_day_name("e"));
        assert!(is_weekday_particle("e"));
        assert!(is_weekday_particle("E"));
        assert!(!is_weekday_particle("enjte"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("7"), Some(7));
        assert_eq!(parse_number("31"), Some(31));
        assert_eq!(parse_number("5:21"), None);
        assert_eq!(parse_number("2025"), None);
        assert_eq!(parse_number("e"), None);
    }
}
