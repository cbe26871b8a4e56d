// Lossy canonicalization of raw attribute text
use blindmatch_core::InputError;
use chrono::NaiveDate;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Date layouts accepted on input, tried in order
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Canonical date layout fed to the hasher
const DATE_OUTPUT: &str = "%Y%m%d";

fn fold_ligature(c: char) -> Option<&'static str> {
    match c {
        'ß' => Some("ss"),
        'æ' => Some("ae"),
        'œ' => Some("oe"),
        'ø' => Some("o"),
        'ł' => Some("l"),
        'đ' => Some("d"),
        'þ' => Some("th"),
        'ı' => Some("i"),
        _ => None,
    }
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '’' | '‘' | '`' | 'ʼ')
}

/// Lowercase, strip diacritics, turn everything else into single spaces.
///
/// Apostrophes are dropped without splitting, so `O'Brien` and `OBrien`
/// normalize the same way. Digits survive only when `keep_digits` is set.
pub(crate) fn normalize_text(value: &str, keep_digits: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut gap = false;

    for c in value.nfd() {
        if is_combining_mark(c) || is_apostrophe(c) {
            continue;
        }
        for lower in c.to_lowercase() {
            if is_combining_mark(lower) {
                continue;
            }
            let keep = lower.is_alphabetic() || (keep_digits && lower.is_numeric());
            if !keep {
                gap = true;
                continue;
            }
            if gap && !out.is_empty() {
                out.push(' ');
            }
            gap = false;
            match fold_ligature(lower) {
                Some(folded) => out.push_str(folded),
                None => out.push(lower),
            }
        }
    }

    out
}

/// Parse a date in any accepted layout and render it as `YYYYMMDD`.
///
/// Blank input is `Ok(None)`: absence, not a malformed value.
pub(crate) fn normalize_date(value: &str) -> Result<Option<String>, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let parse = |range: std::ops::Range<usize>| trimmed[range].parse::<u32>().ok();
        let date = match (parse(0..4), parse(4..6), parse(6..8)) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y as i32, m, d),
            _ => None,
        };
        return date
            .map(|d| Some(d.format(DATE_OUTPUT).to_string()))
            .ok_or_else(malformed_date);
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .map(|d| Some(d.format(DATE_OUTPUT).to_string()))
        .ok_or_else(malformed_date)
}

fn malformed_date() -> InputError {
    InputError::Malformed {
        expected: "date (YYYY-MM-DD, YYYY/MM/DD, YYYYMMDD, DD.MM.YYYY or MM/DD/YYYY)".to_string(),
    }
}
