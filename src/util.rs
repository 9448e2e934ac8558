use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::{fs, io, path::Path};

/// Converts a not found error to Ok(false)
pub fn path_exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

// Helpers for serde to parse fields with quirks.

/// Dates in the practice exports are written `dd-mm-yyyy`.
pub mod dmy_date {
    use crate::dates::DMY_DASHED;
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(&date.format(DMY_DASHED))
    }

    pub fn deserialize<'de, D>(d: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: &str = Deserialize::deserialize(d)?;
        NaiveDate::parse_from_str(s.trim(), DMY_DASHED)
            .map_err(|e| de::Error::custom(format!("bad date \"{}\": {}", s, e)))
    }
}

/// Like `dmy_date`, but maps the empty string to `None`.
pub fn opt_dmy_date<'de, D>(d: D) -> Result<Option<chrono::NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let s: String = Deserialize::deserialize(d)?;
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    chrono::NaiveDate::parse_from_str(s, crate::dates::DMY_DASHED)
        .map(Some)
        .map_err(|e| Error::custom(format!("bad date \"{}\": {}", s, e)))
}

// Text helpers.

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").unwrap());

/// Remove everything that isn't an ascii digit.
pub fn digits_only(input: &str) -> String {
    NON_DIGITS.replace_all(input, "").into_owned()
}

/// Take characters `start..end` of `input`, clamping both ends to the string's length.
pub fn char_slice(input: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| {
        input
            .char_indices()
            .nth(n)
            .map(|(idx, _)| idx)
            .unwrap_or(input.len())
    };
    let (start, end) = (byte_at(start), byte_at(end));
    if start >= end {
        ""
    } else {
        &input[start..end]
    }
}

/// Capitalise the first letter of each run of letters and lower-case the rest.
///
/// Anything that isn't a letter starts a new word, so `fenton-lee` becomes `Fenton-Lee` and
/// `o'brien` becomes `O'Brien`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Print an underlined section header to the console.
pub fn header(header: &str) {
    let len = header.len();
    print!("\n{}\n", header);
    for _ in 0..len {
        print!("=");
    }
    println!("\n")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("smith"), "Smith");
        assert_eq!(title_case("fenton-lee"), "Fenton-Lee");
        assert_eq!(title_case("o'brien"), "O'Brien");
        assert_eq!(title_case("DR JONES"), "Dr Jones");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn title_case_is_stable() {
        for name in ["jt", "fenton-lee", "a/prof r feller", "McDONALD", "van der berg"] {
            let once = title_case(name);
            assert_eq!(title_case(&once), once);
        }
        assert_eq!(title_case("jt"), "Jt");
    }

    #[test]
    fn digits() {
        assert_eq!(digits_only("DOB:01/02/1960x"), "01021960");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn slicing_clamps() {
        assert_eq!(char_slice("0123456789", 4, 12), "456789");
        assert_eq!(char_slice("0123", 4, 12), "");
        assert_eq!(char_slice("12032024extra", 0, 8), "12032024");
    }
}
