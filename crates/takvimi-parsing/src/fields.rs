use crate::text::{is_day_name, is_weekday_particle, parse_number};

/// The non-time fields at the start of a day row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadingFields {
    pub day: Option<u32>,
    /// Weekday as printed, e.g. "e hënë".
    pub weekday: Option<String>,
    pub hijri_day: Option<u32>,
    /// Remaining words joined with single spaces.
    pub note: String,
}

/// Split leading words into day number, weekday, lunar day and note.
///
/// The weekday takes at most two words and must end on a day name; the lunar
/// day is only read directly after a weekday or the day number.
pub fn split_leading(words: &[&str]) -> LeadingFields {
    let mut fields = LeadingFields::default();
    let mut rest = words;

    if let Some((first, tail)) = rest.split_first()
        && let Some(day) = parse_number(first)
    {
        fields.day = Some(day);
        rest = tail;
    } else {
        fields.note = words.join(" ");
        return fields;
    }

    let weekday_len = match rest {
        [particle, name, ..] if is_weekday_particle(particle) && is_day_name(name) => 2,
        [name, ..] if is_day_name(name) => 1,
        _ => 0,
    };
    if weekday_len > 0 {
        fields.weekday = Some(rest[..weekday_len].join(" "));
        rest = &rest[weekday_len..];
    }

    if let Some((first, tail)) = rest.split_first()
        && let Some(hijri) = parse_number(first)
    {
        fields.hijri_day = Some(hijri);
        rest = tail;
    }

    fields.note = rest.join(" ");
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_leading_fields() {
        let fields = split_leading(&["1", "e", "mërkurë", "1", "Viti", "i", "Ri", "2025,", "Hëna", "e", "re"]);
        assert_eq!(fields.day, Some(1));
        assert_eq!(fields.weekday.as_deref(), Some("e mërkurë"));
        assert_eq!(fields.hijri_day, Some(1));
        assert_eq!(fields.note, "Viti i Ri 2025, Hëna e re");
    }

    #[test]
    fn test_weekday_without_particle() {
        let fields = split_leading(&["12", "Diel", "11"]);
        assert_eq!(fields.day, Some(12));
        assert_eq!(fields.weekday.as_deref(), Some("Diel"));
        assert_eq!(fields.hijri_day, Some(11));
        assert_eq!(fields.note, "");
    }

    #[test]
    fn test_dangling_particle_is_not_a_weekday() {
        let fields = split_leading(&["3", "e", "Nata"]);
        assert_eq!(fields.day, Some(3));
        assert_eq!(fields.weekday, None);
        assert_eq!(fields.note, "e Nata");
    }

    #[test]
    fn test_row_without_day_number() {
        let fields = split_leading(&["Imsaku", "Sabahu"]);
        assert_eq!(fields.day, None);
        assert_eq!(fields.note, "Imsaku Sabahu");
    }
}
