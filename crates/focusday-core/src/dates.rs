//! Calendar formatting in the app's locale.
//!
//! The stored data depends on these exact strings: `one-time` anchors are
//! compared as `"19 octombrie 2026"` literals and journal entries are keyed by
//! `"19.10.2026"`. Changing a format here orphans existing records.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "ianuarie",
    "februarie",
    "martie",
    "aprilie",
    "mai",
    "iunie",
    "iulie",
    "august",
    "septembrie",
    "octombrie",
    "noiembrie",
    "decembrie",
];

/// Weekday names, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Luni",
    "Marți",
    "Miercuri",
    "Joi",
    "Vineri",
    "Sâmbătă",
    "Duminică",
];

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// `"19 octombrie 2026"`, the anchor format written by the activity editor.
pub fn long_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), month_name(date), date.year())
}

/// `"20 octombrie"`, used by the week view headers.
pub fn short_date(date: NaiveDate) -> String {
    format!("{} {}", date.day(), month_name(date))
}

/// `"19.10.2026"`, the key under which a day's journal text is stored.
pub fn journal_key(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{}", date.day(), date.month(), date.year())
}

/// Parse a [`long_date`] string back into a date.
///
/// Returns `None` for anything that is not `<day> <month name> <year>`,
/// including the year-less `"20 octombrie"` written from the week view.
pub fn parse_long_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split_whitespace();
    let day: u32 = parts.next()?.parse().ok()?;
    let month_text = parts.next()?.to_lowercase();
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = MONTH_NAMES.iter().position(|m| *m == month_text)? as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Resolve a stored weekday name.
///
/// Accepts the localized names with or without diacritics, plus English
/// names and chrono's three-letter forms.
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    let folded: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ă' | 'â' => 'a',
            'ț' | 'ţ' => 't',
            'ș' | 'ş' => 's',
            'î' => 'i',
            other => other,
        })
        .collect();
    match folded.as_str() {
        "luni" => Some(Weekday::Mon),
        "marti" => Some(Weekday::Tue),
        "miercuri" => Some(Weekday::Wed),
        "joi" => Some(Weekday::Thu),
        "vineri" => Some(Weekday::Fri),
        "sambata" => Some(Weekday::Sat),
        "duminica" => Some(Weekday::Sun),
        other => other.parse::<Weekday>().ok(),
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// The seven days of the week containing `date`, Monday to Sunday.
pub fn week_days(date: NaiveDate) -> Vec<(&'static str, NaiveDate)> {
    let monday = week_start(date);
    (0..7)
        .map(|offset| {
            let day = monday + Duration::days(offset);
            (weekday_name(day.weekday()), day)
        })
        .collect()
}

/// Header for the week containing `date`.
///
/// `"19-25 octombrie 2026"` when the week stays within one month, otherwise
/// `"28 septembrie - 4 octombrie 2026"` (year of the Monday).
pub fn week_label(date: NaiveDate) -> String {
    let start = week_start(date);
    let end = start + Duration::days(6);
    if start.month() == end.month() {
        format!(
            "{}-{} {} {}",
            start.day(),
            end.day(),
            month_name(start),
            start.year()
        )
    } else {
        format!(
            "{} {} - {} {} {}",
            start.day(),
            month_name(start),
            end.day(),
            month_name(end),
            start.year()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn long_date_uses_localized_month() {
        assert_eq!(long_date(date(2026, 10, 19)), "19 octombrie 2026");
        assert_eq!(long_date(date(2025, 1, 5)), "5 ianuarie 2025");
    }

    #[test]
    fn journal_key_is_zero_padded() {
        assert_eq!(journal_key(date(2026, 3, 7)), "07.03.2026");
    }

    #[test]
    fn parse_long_date_inverts_formatting() {
        let d = date(2024, 2, 29);
        assert_eq!(parse_long_date(&long_date(d)), Some(d));
        assert_eq!(parse_long_date("20 octombrie"), None);
        assert_eq!(parse_long_date("31 februarie 2024"), None);
        assert_eq!(parse_long_date("1 brumar 2024"), None);
    }

    #[test]
    fn weekday_names_resolve_with_and_without_diacritics() {
        assert_eq!(weekday_from_name("Marți"), Some(Weekday::Tue));
        assert_eq!(weekday_from_name("marti"), Some(Weekday::Tue));
        assert_eq!(weekday_from_name("Sâmbătă"), Some(Weekday::Sat));
        assert_eq!(weekday_from_name("Duminica"), Some(Weekday::Sun));
        assert_eq!(weekday_from_name("friday"), Some(Weekday::Fri));
        assert_eq!(weekday_from_name("someday"), None);
    }

    #[test]
    fn week_days_start_on_monday() {
        // 2026-10-19 is a Monday.
        let days = week_days(date(2026, 10, 22));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], ("Luni", date(2026, 10, 19)));
        assert_eq!(days[6], ("Duminică", date(2026, 10, 25)));
    }

    #[test]
    fn week_label_within_and_across_months() {
        assert_eq!(week_label(date(2026, 10, 21)), "19-25 octombrie 2026");
        assert_eq!(
            week_label(date(2026, 10, 1)),
            "28 septembrie - 4 octombrie 2026"
        );
    }
}
