//! Checks applied to the upload form before anything touches the disk.

use chrono::{Local, NaiveDate};
use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

const DATE_FORMAT: &str = "%Y%m%d";
const ACCOUNT_ID_LEN: usize = 22;

static ACCOUNT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^BG[0-9]{2}FINV9150.{10}$").expect("Invalid regex pattern"));
static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^O[0-9]{6}p\.dp[0-9]+$").expect("Invalid regex pattern"));

/// Output shapes for `convert_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `DDMMYY`
    Short,
    /// `DDMMYYYY`
    Long,
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

/// True when `input` is a `YYYYMMDD` calendar date that is today or later in
/// the server's local time zone.
pub fn validate_execution_date(input: &str) -> bool {
    validate_execution_date_on(input, Local::now().date_naive())
}

/// Same as `validate_execution_date` with an explicit reference day.
pub fn validate_execution_date_on(input: &str, today: NaiveDate) -> bool {
    match parse_date(input) {
        Some(date) => date >= today,
        None => {
            warn!("Invalid date format: {:?}", input);
            false
        }
    }
}

/// Rewrites a `YYYYMMDD` date for the batch header.
///
/// Returns `None` if `date` is not a valid `YYYYMMDD` date.
pub fn convert_date(date: &str, format: DateFormat) -> Option<String> {
    let parsed = parse_date(date)?;
    let converted = match format {
        DateFormat::Short => parsed.format("%d%m%y").to_string(),
        DateFormat::Long => parsed.format("%d%m%Y").to_string(),
    };
    debug!("Converted date {} to {:?} format: {}", date, format, converted);
    Some(converted)
}

/// Validates the ordering account.
///
/// Only identifiers issued under the `BG..FINV9150` bank/product prefix are
/// accepted; those must then pass the mod-97 check: the first four
/// characters are moved to the end, letters become `A = 10 .. Z = 35`, and the
/// resulting digit string must leave a remainder of 1. Letters are coded as
/// their distance from `A`, so lowercase ones land at 42.. and do not collapse
/// onto their uppercase codes.
pub fn validate_account_id(input: &str) -> bool {
    if input.is_empty() || input.chars().count() != ACCOUNT_ID_LEN {
        return false;
    }

    if !ACCOUNT_ID_PATTERN.is_match(input) {
        return false;
    }

    let rotated = input.chars().skip(4).chain(input.chars().take(4));
    let mut digits = String::with_capacity(ACCOUNT_ID_LEN * 2);
    for ch in rotated {
        if ch.is_ascii_alphabetic() {
            let code = ch as u32 - 'A' as u32 + 10;
            digits.push_str(&code.to_string());
        } else if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            return false;
        }
    }

    mod97(&digits) == 1
}

/// Remainder of a decimal digit string modulo 97, one digit at a time.
fn mod97(digits: &str) -> u32 {
    digits
        .bytes()
        .fold(0, |remainder, b| (remainder * 10 + u32::from(b - b'0')) % 97)
}

/// Batch files are named `O<6 digits>p.dp<sequence>`, e.g. `O123456p.dp7`.
pub fn validate_filename(input: &str) -> bool {
    FILENAME_PATTERN.is_match(input)
}
