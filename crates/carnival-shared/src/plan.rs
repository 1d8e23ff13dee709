//! The per-festival plan document and its three sub-lists.
//!
//! A [`PlanDocument`] is stored remotely at
//! `users/{uid}/apps/{namespace}/carnivals/{festivalId}`. Each sub-list is
//! always written as a whole array; there is no per-element remote update.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::SCHEDULE_DATETIME_FORMAT;
use crate::error::DomainError;
use crate::types::ItemId;

/// Common shape of budget, schedule and packing entries.
pub trait PlanEntry {
    fn id(&self) -> &ItemId;
}

/// One of the three independently written sub-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanField {
    Budget,
    Schedule,
    Packing,
}

impl PlanField {
    pub const ALL: [PlanField; 3] = [Self::Budget, Self::Schedule, Self::Packing];

    /// Field name inside the remote document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Schedule => "schedule",
            Self::Packing => "packing",
        }
    }
}

impl std::fmt::Display for PlanField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub id: ItemId,
    pub name: String,
    /// May be `NaN` when the user typed something that is not a number.
    #[serde(deserialize_with = "cost_or_nan")]
    pub cost: f64,
}

impl PlanEntry for BudgetItem {
    fn id(&self) -> &ItemId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: ItemId,
    pub title: String,
    #[serde(with = "schedule_datetime")]
    pub datetime: NaiveDateTime,
    #[serde(default)]
    pub note: String,
}

impl PlanEntry for ScheduleItem {
    fn id(&self) -> &ItemId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingItem {
    pub id: ItemId,
    pub item: String,
    #[serde(default)]
    pub checked: bool,
}

impl PlanEntry for PackingItem {
    fn id(&self) -> &ItemId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Full plan for one (user, festival) pair.
///
/// Every field defaults when missing so that documents written partially
/// (or by older clients) still decode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub budget: Vec<BudgetItem>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub schedule: Vec<ScheduleItem>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub packing: Vec<PackingItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PlanDocument {
    /// An empty plan as written on first selection.
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            budget: Vec::new(),
            schedule: Vec::new(),
            packing: Vec::new(),
            created_at: Some(created_at),
        }
    }

    /// Sum of all finite costs. Entries whose cost is `NaN` are skipped.
    pub fn budget_total(&self) -> f64 {
        self.budget
            .iter()
            .map(|b| b.cost)
            .filter(|c| c.is_finite())
            .sum()
    }

    /// Schedule in display order: ascending by datetime, ties keep insertion
    /// order.
    pub fn sorted_schedule(&self) -> Vec<&ScheduleItem> {
        let mut items: Vec<_> = self.schedule.iter().collect();
        items.sort_by_key(|s| s.datetime);
        items
    }

    /// `(checked, total)` for the packing list.
    pub fn packing_progress(&self) -> (usize, usize) {
        let checked = self.packing.iter().filter(|p| p.checked).count();
        (checked, self.packing.len())
    }
}

// ---------------------------------------------------------------------------
// Input coercion
// ---------------------------------------------------------------------------

/// Coerce free text to a cost the way a browser's `parseFloat` does: the
/// longest numeric prefix wins, anything else is `NaN`.
pub fn parse_cost(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || has_digits {
            has_digits |= frac_end > frac_start;
            end = frac_end;
        }
    }

    if !has_digits {
        return f64::NAN;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a `datetime-local` value (`2026-02-16T04:00`). Seconds, fractional
/// seconds and RFC 3339 timestamps are accepted too; an offset is dropped and
/// the wall-clock time kept.
pub fn parse_schedule_datetime(text: &str) -> Result<NaiveDateTime, DomainError> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, SCHEDULE_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.naive_local()))
        .map_err(|_| DomainError::InvalidDatetime(text.to_string()))
}

/// Render an amount as dollars with thousands separators: `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$NaN".to_string();
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

// One bad row must not make the whole document undecodable, so elements
// that fail to decode are dropped.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable plan entry");
                None
            }
        })
        .collect())
}

// JSON has no NaN; it travels as null.
fn cost_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

mod schedule_datetime {
    use chrono::{NaiveDateTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::constants::SCHEDULE_DATETIME_FORMAT;

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        let text = if dt.second() == 0 {
            dt.format(SCHEDULE_DATETIME_FORMAT).to_string()
        } else {
            dt.format("%Y-%m-%dT%H:%M:%S").to_string()
        };
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(d)?;
        super::parse_schedule_datetime(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    #[test]
    fn parse_cost_like_a_browser() {
        assert_eq!(parse_cost("250"), 250.0);
        assert_eq!(parse_cost(" 12.5 "), 12.5);
        assert_eq!(parse_cost("99.99usd"), 99.99);
        assert_eq!(parse_cost("-3"), -3.0);
        assert_eq!(parse_cost(".5"), 0.5);
        assert_eq!(parse_cost("1e3"), 1000.0);
        assert!(parse_cost("abc").is_nan());
        assert!(parse_cost("").is_nan());
        assert!(parse_cost(".").is_nan());
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(250.0), "$250.00");
        assert_eq!(format_currency(2850.0), "$2,850.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-4.5), "-$4.50");
        assert_eq!(format_currency(f64::NAN), "$NaN");
    }

    #[test]
    fn decodes_document_written_by_web_client() {
        let raw = json!({
            "name": "Trinidad Carnival - February",
            "budget": [{ "id": "1", "name": "Flight", "cost": 850.0, "addedBy": { "email": "a@b.c" } }],
            "schedule": [{ "id": "2", "title": "AM Bush", "datetime": "2026-02-14T02:00", "note": "" }],
            "packing": [{ "id": "3", "item": "Passport", "checked": true }],
            "createdAt": "2025-11-01T12:00:00Z"
        });

        let doc: PlanDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.budget[0].id, ItemId::from("1"));
        assert_eq!(doc.budget_total(), 850.0);
        assert_eq!(doc.packing_progress(), (1, 1));
        assert!(doc.created_at.is_some());
    }

    #[test]
    fn partial_document_defaults_missing_lists() {
        let doc: PlanDocument = serde_json::from_value(json!({ "budget": [] })).unwrap();
        assert!(doc.name.is_empty());
        assert!(doc.schedule.is_empty());
        assert!(doc.packing.is_empty());
        assert!(doc.created_at.is_none());
    }

    #[test]
    fn nan_cost_survives_json() {
        let item = BudgetItem {
            id: ItemId::from("x"),
            name: "Mystery".into(),
            cost: f64::NAN,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["cost"], serde_json::Value::Null);

        let back: BudgetItem = serde_json::from_value(value).unwrap();
        assert!(back.cost.is_nan());
    }

    #[test]
    fn nan_costs_excluded_from_total() {
        let mut doc = PlanDocument::default();
        doc.budget.push(BudgetItem {
            id: ItemId::generate(),
            name: "Costume".into(),
            cost: 250.0,
        });
        doc.budget.push(BudgetItem {
            id: ItemId::generate(),
            name: "???".into(),
            cost: f64::NAN,
        });
        assert_eq!(doc.budget_total(), 250.0);
    }

    #[test]
    fn schedule_sorted_by_datetime() {
        let mut doc = PlanDocument::default();
        for (title, at) in [
            ("Carnival Monday", "2026-02-16T10:00"),
            ("J'ouvert", "2026-02-16T04:00"),
            ("Arrival", "2026-02-11T14:30"),
        ] {
            doc.schedule.push(ScheduleItem {
                id: ItemId::generate(),
                title: title.into(),
                datetime: parse_schedule_datetime(at).unwrap(),
                note: String::new(),
            });
        }

        let titles: Vec<_> = doc.sorted_schedule().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Arrival", "J'ouvert", "Carnival Monday"]);
    }

    #[test]
    fn schedule_datetime_keeps_input_format() {
        let item = ScheduleItem {
            id: ItemId::from("s"),
            title: "J'ouvert".into(),
            datetime: parse_schedule_datetime("2026-02-16T04:00").unwrap(),
            note: "meet at band HQ".into(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["datetime"], "2026-02-16T04:00");
    }

    #[test]
    fn accepts_fractional_seconds_and_rfc3339() {
        let expected = parse_schedule_datetime("2026-02-16T04:00").unwrap();
        assert_eq!(parse_schedule_datetime("2026-02-16T04:00:00").unwrap(), expected);
        assert_eq!(parse_schedule_datetime("2026-02-16T04:00:00.000").unwrap(), expected);
        assert_eq!(parse_schedule_datetime("2026-02-16T04:00:00-04:00").unwrap(), expected);
        assert_eq!(parse_schedule_datetime("2026-02-16T04:00:00.250Z").unwrap().minute(), 0);
    }

    #[test]
    fn bad_row_is_dropped_not_the_document() {
        let raw = json!({
            "name": "Trinidad Carnival - February",
            "budget": [{ "id": "1", "name": "Flight", "cost": 850.0 }],
            "schedule": [
                { "id": "a", "title": "AM Bush", "datetime": "whenever" },
                { "id": "b", "title": "J'ouvert", "datetime": "2026-02-16T04:00:00.000" }
            ],
            "packing": [{ "item": "no id" }, { "id": "p", "item": "Passport" }]
        });

        let doc: PlanDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.budget.len(), 1);
        assert_eq!(doc.schedule.len(), 1);
        assert_eq!(doc.schedule[0].id, ItemId::from("b"));
        assert_eq!(doc.packing.len(), 1);
    }

    #[test]
    fn invalid_datetime_rejected() {
        assert!(parse_schedule_datetime("next tuesday").is_err());
    }
}
