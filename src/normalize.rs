//! Normalization helpers shared by the extractor and the upsert adapter
//!
//! Unit parsing, loose date parsing, era tagging, outcome-method
//! canonicalization and zero-guarded ratio computation.

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::MethodCode;

/// Collapse whitespace runs and trim; athlete names are unique under this form
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a height/reach string into centimeters
///
/// Prefers a centimeter-suffixed integer; falls back to a meter-suffixed
/// (possibly fractional) value converted to centimeters. The cm check must
/// run first since the meter pattern would otherwise stop short inside
/// "183 cm".
pub fn parse_length_cm(text: &str) -> Option<u32> {
    let cm_pattern = Regex::new(r"(\d+)\s*cm").unwrap();
    if let Some(caps) = cm_pattern.captures(text) {
        if let Ok(cm) = caps[1].parse::<u32>() {
            return Some(cm);
        }
    }

    let m_pattern = Regex::new(r"(\d+(?:\.\d+)?)\s*m").unwrap();
    if let Some(caps) = m_pattern.captures(text) {
        if let Ok(meters) = caps[1].parse::<f64>() {
            return Some((meters * 100.0).round() as u32);
        }
    }

    None
}

/// Parse a bout-table date in any of the formats the source uses
pub fn parse_loose_date(text: &str) -> Option<NaiveDate> {
    let cleaned = text.trim();

    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%d %B %Y",
        "%d %b %Y",
        "%B %d, %Y",
        "%b %d, %Y",
    ];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return Some(date);
        }
    }

    // Date buried in longer text, e.g. "8 June 2002 (card postponed)"
    let pattern = Regex::new(
        r"(\d{1,2})\s+(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{4})",
    )
    .unwrap();
    let caps = pattern.captures(cleaned)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    let month = match caps.get(2)?.as_str().to_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decade labels spanning a career, inclusive of both endpoint decades
///
/// A career from 1985 to 2004 yields ["80s", "90s", "00s"].
pub fn era_tags(first: NaiveDate, last: NaiveDate) -> Vec<String> {
    let start = (first.year() / 10) * 10;
    let end = (last.year() / 10) * 10;

    let mut eras = Vec::new();
    let mut decade = start;
    while decade <= end {
        let label = format!("{:02}s", decade % 100);
        if !eras.contains(&label) {
            eras.push(label);
        }
        decade += 10;
    }
    eras
}

/// Map a raw outcome-method code onto the canonical vocabulary
///
/// Unrecognized codes degrade to `Unknown` with a warning; ingestion
/// continues.
pub fn canonicalize_method(raw: &str) -> MethodCode {
    match raw.trim().to_uppercase().as_str() {
        "KO" => MethodCode::Ko,
        "TKO" | "RTD" => MethodCode::Tko,
        "SD" | "UD" | "MD" | "PTS" | "DECISION" | "TD" => MethodCode::Decision,
        "DRAW" | "TECHNICAL DRAW" => MethodCode::Draw,
        "DQ" => MethodCode::Dq,
        "NC" => MethodCode::Nc,
        other => {
            log::warn!("Unrecognized method code '{}', storing as unknown", other);
            MethodCode::Unknown
        }
    }
}

/// Win and KO ratios, both 0.0 when the denominator is zero
pub fn ratios(fights: u32, wins: u32, wins_by_ko: u32) -> (f64, f64) {
    if fights == 0 || wins == 0 {
        return (0.0, 0.0);
    }
    let win_ratio = (wins as f64 / fights as f64 * 100.0).round() / 100.0;
    let ko_ratio = (wins_by_ko as f64 / wins as f64 * 100.0).round() / 100.0;
    (win_ratio, ko_ratio)
}
