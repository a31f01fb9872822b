//! Profile-page extractor
//!
//! Turns one encyclopedia profile page into a candidate athlete record plus
//! the raw rows of its bout-history table. Extraction is failure-isolated
//! per field: a fault in one field degrades to "field absent" and is
//! recorded in the page's diagnostic list, never propagated. Only a page
//! with no recognizable profile container aborts, and then without emitting
//! a partial record.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::normalize::{era_tags, normalize_name, parse_length_cm, parse_loose_date};
use crate::{Result, RingsideError, Stance};

/// Headers that identify the bout-history table
const BOUT_HEADERS: [&str; 3] = ["Result", "Opponent", "Date"];

/// Header substrings (lowercase) that identify the record-summary table
const RECORD_HEADERS: [&str; 3] = ["fights", "wins", "losses"];

/// A diagnostic for one failed field extraction
#[derive(Debug, Clone)]
pub struct FieldFault {
    pub field: &'static str,
    pub message: String,
}

/// Aggregate win/loss figures read from the record-summary table
#[derive(Debug, Clone, Default)]
pub struct RecordSummary {
    pub fights: u32,
    pub wins: u32,
    pub losses: u32,
    pub wins_by_ko: u32,
    pub wins_by_decision: u32,
    pub wins_by_dq: u32,
    pub losses_by_ko: u32,
    pub losses_by_decision: u32,
    pub losses_by_dq: u32,
}

/// Candidate athlete record extracted from one profile page
#[derive(Debug, Clone)]
pub struct CandidateAthlete {
    pub name: String,
    pub alias: Option<String>,
    pub portrait: String,
    pub stance: Option<Stance>,
    pub height_cm: Option<u32>,
    pub reach_cm: Option<u32>,
    pub birth_date: Option<NaiveDate>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub eras: Vec<String>,
    pub record: RecordSummary,
}

/// One raw data row from the bout-history table, cells as printed
#[derive(Debug, Clone, Default)]
pub struct RawBout {
    pub result: String,
    pub opponent: String,
    pub date: String,
    pub method: String,
    pub round_time: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Everything extracted from one page
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub athlete: CandidateAthlete,
    pub bouts: Vec<RawBout>,
    pub faults: Vec<FieldFault>,
}

/// Per-field outcome: value present, legitimately absent, or faulted
type FieldOutcome<T> = std::result::Result<Option<T>, String>;

/// Merge one field outcome into the record, degrading faults to absence
fn take<T>(faults: &mut Vec<FieldFault>, field: &'static str, outcome: FieldOutcome<T>) -> Option<T> {
    match outcome {
        Ok(value) => value,
        Err(message) => {
            faults.push(FieldFault { field, message });
            None
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract just the page title, for cheap already-ingested checks
///
/// The disambiguation suffix the source appends to boxer pages is removed.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(".mw-page-title-main").unwrap();
    let title = document.select(&selector).next()?;
    let name = element_text(title).replace(" (boxer)", "");
    let name = normalize_name(&name);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Parse one profile page into a candidate record and raw bout rows
///
/// Returns `NoProfile` when the page lacks the infobox container or a
/// usable title; no partial record is emitted in that case.
pub fn parse_profile(html: &str, default_portrait: &str) -> Result<ProfilePage> {
    let document = Html::parse_document(html);
    let mut faults = Vec::new();

    let name = match page_title(html) {
        Some(name) => name,
        None => return Err(RingsideError::NoProfile),
    };

    let infobox_selector = Selector::parse(".infobox").unwrap();
    let infobox = match document.select(&infobox_selector).next() {
        Some(infobox) => infobox,
        None => {
            log::warn!("No infobox found for '{}', skipping page", name);
            return Err(RingsideError::NoProfile);
        }
    };

    let alias = take(&mut faults, "alias", extract_alias(infobox));
    let portrait = take(&mut faults, "portrait", extract_portrait(infobox))
        .unwrap_or_else(|| default_portrait.to_string());

    let mut stance = None;
    let mut birth_date = None;
    let mut height_cm = None;
    let mut reach_cm = None;

    let row_selector = Selector::parse("tr").unwrap();
    let label_selector = Selector::parse("th.infobox-label").unwrap();
    let value_selector = Selector::parse("td.infobox-data").unwrap();

    for row in infobox.select(&row_selector) {
        let label = match row.select(&label_selector).next() {
            Some(th) => element_text(th),
            None => continue,
        };
        let value = match row.select(&value_selector).next() {
            Some(td) => element_text(td),
            None => continue,
        };

        match label.as_str() {
            "Stance" => stance = take(&mut faults, "stance", extract_stance(&value)),
            "Born" => birth_date = take(&mut faults, "birth_date", extract_birth_date(&value)),
            "Height" => height_cm = take(&mut faults, "height_cm", extract_length(&value)),
            "Reach" => reach_cm = take(&mut faults, "reach_cm", extract_length(&value)),
            _ => {}
        }
    }

    // Bout history: absent table degrades to an empty row list, bio-only
    let bouts = match find_table_by_headers(&document, |headers| {
        BOUT_HEADERS.iter().all(|h| headers.iter().any(|x| x == h))
    }) {
        Some(table) => extract_bout_rows(table),
        None => {
            log::info!("No bout table found for '{}'", name);
            Vec::new()
        }
    };

    // Career span and era tags from the parseable bout dates
    let mut dates: Vec<NaiveDate> = bouts
        .iter()
        .filter_map(|bout| parse_loose_date(&bout.date))
        .collect();
    dates.sort();
    let active_from = dates.first().copied();
    let active_to = dates.last().copied();
    let eras = match (active_from, active_to) {
        (Some(first), Some(last)) => era_tags(first, last),
        _ => {
            log::info!("No parseable bout dates for '{}', skipping era tags", name);
            Vec::new()
        }
    };

    // Record summary: absent table degrades to all-zero figures
    let record = match find_table_by_headers(&document, |headers| {
        RECORD_HEADERS
            .iter()
            .all(|needle| headers.iter().any(|h| h.to_lowercase().contains(needle)))
    }) {
        Some(table) => extract_record_summary(table, &mut faults),
        None => {
            log::info!("No record table found for '{}'", name);
            RecordSummary::default()
        }
    };

    for fault in &faults {
        log::warn!("Field '{}' failed for '{}': {}", fault.field, name, fault.message);
    }

    Ok(ProfilePage {
        athlete: CandidateAthlete {
            name,
            alias,
            portrait,
            stance,
            height_cm,
            reach_cm,
            birth_date,
            active_from,
            active_to,
            eras,
            record,
        },
        bouts,
        faults,
    })
}

/// Alias: first item of a list-valued nickname cell, else the full cell
/// text, with surrounding quote characters stripped
fn extract_alias(infobox: ElementRef<'_>) -> FieldOutcome<String> {
    let cell_selector = Selector::parse("td.infobox-data.nickname").unwrap();
    let cell = match infobox.select(&cell_selector).next() {
        Some(cell) => cell,
        None => return Ok(None),
    };

    let li_selector = Selector::parse("li").unwrap();
    let raw = match cell.select(&li_selector).next() {
        Some(li) => element_text(li),
        None => element_text(cell),
    };

    let alias = raw.replace(['"', '\''], "").trim().to_string();
    if alias.is_empty() {
        Ok(None)
    } else {
        Ok(Some(alias))
    }
}

/// Portrait: the infobox image element's src, scheme-completed
fn extract_portrait(infobox: ElementRef<'_>) -> FieldOutcome<String> {
    let image_selector = Selector::parse("td.infobox-image img").unwrap();
    let image = match infobox.select(&image_selector).next() {
        Some(image) => image,
        None => return Ok(None),
    };

    let src = image
        .value()
        .attr("src")
        .ok_or_else(|| "image element has no src attribute".to_string())?;

    // The source emits protocol-relative URLs
    if let Some(rest) = src.strip_prefix("//") {
        Ok(Some(format!("https://{}", rest)))
    } else {
        Ok(Some(src.to_string()))
    }
}

/// Stance: canonical token search after removing footnote markers
fn extract_stance(value: &str) -> FieldOutcome<Stance> {
    let footnotes = Regex::new(r"\[\d+\]").unwrap();
    let cleaned = footnotes.replace_all(value, "");

    let pattern = Regex::new(r"(?i)\b(orthodox|southpaw|switch)\b").unwrap();
    match pattern.captures(&cleaned) {
        Some(caps) => Ok(Stance::parse(&caps[1])),
        None => Ok(None),
    }
}

/// Date of birth: parenthesized ISO date inside the Born value
fn extract_birth_date(value: &str) -> FieldOutcome<NaiveDate> {
    let pattern = Regex::new(r"\((\d{4}-\d{2}-\d{2})\)").unwrap();
    match pattern.captures(value) {
        Some(caps) => NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d")
            .map(Some)
            .map_err(|e| format!("malformed ISO date '{}': {}", &caps[1], e)),
        None => Ok(None),
    }
}

/// Height/reach: centimeter figure preferred, meter figure converted
fn extract_length(value: &str) -> FieldOutcome<u32> {
    Ok(parse_length_cm(value))
}

/// Find the first wikitable whose header row satisfies the predicate
fn find_table_by_headers<'a, F>(document: &'a Html, predicate: F) -> Option<ElementRef<'a>>
where
    F: Fn(&[String]) -> bool,
{
    let table_selector = Selector::parse("table.wikitable").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let header_selector = Selector::parse("th").unwrap();

    for table in document.select(&table_selector) {
        let header_row = match table.select(&row_selector).next() {
            Some(row) => row,
            None => continue,
        };
        let headers: Vec<String> = header_row.select(&header_selector).map(element_text).collect();
        if predicate(&headers) {
            return Some(table);
        }
    }
    None
}

/// Build raw bout rows from the bout-history table
///
/// A data row is accepted only when its cell count matches the header
/// count; rows with merged or irregular cells are silently dropped. Known
/// heuristic limitation inherited from the source layout.
fn extract_bout_rows(table: ElementRef<'_>) -> Vec<RawBout> {
    let row_selector = Selector::parse("tr").unwrap();
    let header_selector = Selector::parse("th").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut rows = table.select(&row_selector);
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.select(&header_selector).map(element_text).collect(),
        None => return Vec::new(),
    };

    let column = |name: &str| headers.iter().position(|h| h == name);
    let result_col = column("Result");
    let opponent_col = column("Opponent");
    let date_col = column("Date");
    let method_col = column("Type");
    let round_col = column("Round, time").or_else(|| column("Round"));
    let location_col = column("Location");
    let notes_col = column("Notes");

    let mut bouts = Vec::new();
    for row in rows {
        let cells: Vec<String> = row.select(&cell_selector).map(element_text).collect();
        if cells.len() != headers.len() {
            continue;
        }

        let at = |col: Option<usize>| col.and_then(|i| cells.get(i)).cloned();
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        bouts.push(RawBout {
            result: at(result_col).unwrap_or_default(),
            opponent: normalize_name(&at(opponent_col).unwrap_or_default()),
            date: at(date_col).unwrap_or_default(),
            method: at(method_col).unwrap_or_default(),
            round_time: non_empty(at(round_col)),
            location: non_empty(at(location_col)),
            notes: non_empty(at(notes_col)),
        });
    }
    bouts
}

/// Read aggregate figures from the record-summary table
///
/// Totals come from header cells whose text pairs a leading integer with
/// "fights"/"wins"/"losses". The by-method breakdowns are read positionally
/// from the two marker-cell classes: first cell KO, second decision,
/// optional third DQ. The source gives these cells no per-column labels, so
/// a reordered layout would silently misattribute values.
fn extract_record_summary(table: ElementRef<'_>, faults: &mut Vec<FieldFault>) -> RecordSummary {
    let mut summary = RecordSummary::default();

    let row_selector = Selector::parse("tr").unwrap();
    let header_selector = Selector::parse("th").unwrap();

    if let Some(header_row) = table.select(&row_selector).next() {
        for cell in header_row.select(&header_selector) {
            let text = element_text(cell);
            let lower = text.to_lowercase();

            let leading_int = || -> std::result::Result<u32, String> {
                text.split_whitespace()
                    .next()
                    .ok_or_else(|| format!("empty record cell '{}'", text))?
                    .parse()
                    .map_err(|_| format!("no leading integer in '{}'", text))
            };

            if lower.contains("fights") {
                match leading_int() {
                    Ok(n) => summary.fights = n,
                    Err(message) => faults.push(FieldFault { field: "fights", message }),
                }
            } else if lower.contains("wins") {
                match leading_int() {
                    Ok(n) => summary.wins = n,
                    Err(message) => faults.push(FieldFault { field: "wins", message }),
                }
            } else if lower.contains("losses") {
                match leading_int() {
                    Ok(n) => summary.losses = n,
                    Err(message) => faults.push(FieldFault { field: "losses", message }),
                }
            }
        }
    }

    if summary.fights == 0 {
        log::warn!("Record table shows 0 fights; ratios will default to 0");
    }

    let (wins_ko, wins_dec, wins_dq) = marker_cells(table, "td.table-yes2", "wins_by", faults);
    summary.wins_by_ko = wins_ko;
    summary.wins_by_decision = wins_dec;
    summary.wins_by_dq = wins_dq;

    let (losses_ko, losses_dec, losses_dq) = marker_cells(table, "td.table-no2", "losses_by", faults);
    summary.losses_by_ko = losses_ko;
    summary.losses_by_decision = losses_dec;
    summary.losses_by_dq = losses_dq;

    summary
}

/// Read up to three ordered integers from a marker-cell class
fn marker_cells(
    table: ElementRef<'_>,
    selector: &str,
    field: &'static str,
    faults: &mut Vec<FieldFault>,
) -> (u32, u32, u32) {
    let cell_selector = Selector::parse(selector).unwrap();
    let values: Vec<u32> = table
        .select(&cell_selector)
        .take(3)
        .map(|cell| {
            let text = element_text(cell);
            text.parse().unwrap_or_else(|_| {
                faults.push(FieldFault {
                    field,
                    message: format!("non-numeric marker cell '{}'", text),
                });
                0
            })
        })
        .collect();

    (
        values.first().copied().unwrap_or(0),
        values.get(1).copied().unwrap_or(0),
        values.get(2).copied().unwrap_or(0),
    )
}
