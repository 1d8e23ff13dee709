//! Festival start dates used for the "days to go" countdown.
//!
//! Keyed by display name, independent of the plan catalog.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownEntry {
    pub name: &'static str,
    year: i32,
    month: u32,
    day: u32,
}

impl CountdownEntry {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Days from `today` until this festival; negative once it has passed.
    pub fn days_from(&self, today: NaiveDate) -> Option<i64> {
        self.date().map(|date| days_until(date, today))
    }
}

const fn on(name: &'static str, year: i32, month: u32, day: u32) -> CountdownEntry {
    CountdownEntry {
        name,
        year,
        month,
        day,
    }
}

pub const COUNTDOWN_TABLE: &[CountdownEntry] = &[
    on("St. Kitts & Nevis (Sugar Mas)", 2025, 12, 12),
    on("Montserrat Carnival", 2025, 12, 20),
    on("St. Croix Festival", 2026, 1, 3),
    on("Carnaval Ponceno (Puerto Rico)", 2026, 2, 12),
    on("Aruba Carnival", 2026, 2, 14),
    on("Barranquilla Carnival (Colombia)", 2026, 2, 14),
    on("Martinique Carnival", 2026, 2, 15),
    on("Rio Carnival (Brazil)", 2026, 2, 15),
    on("Carnaval De Saint-Martin", 2026, 2, 15),
    on("Mas Domnik (Dominica)", 2026, 2, 16),
    on("Carriacou & Petite Martinique", 2026, 2, 16),
    on("Venezuela Carnival", 2026, 2, 16),
    on("Trinidad Carnival", 2026, 2, 16),
    on("Mashramani (Guyana)", 2026, 3, 23),
    on("St. Patrick's Festival (Montserrat)", 2026, 3, 17),
    on("Jamaica Carnival", 2026, 4, 12),
    on("St. Thomas Carnival (USVI)", 2026, 4, 24),
    on("St. Maarten Carnival", 2026, 4, 30),
    on("Guyana Independence Carnival", 2026, 5, 22),
    on("Atlanta Caribbean Carnival", 2026, 5, 23),
    on("Spicemas (Grenada)", 2026, 5, 25),
    on("Munich Carnival (Germany)", 2026, 6, 4),
    on("Bahamas Carnival", 2026, 6, 6),
    on("Bermuda Carnival", 2026, 6, 10),
    on("South Carolina Carnival", 2026, 6, 11),
    on("Caymas Carnival (Cayman Islands)", 2026, 6, 20),
    on("Philadelphia Carnival", 2026, 6, 20),
    on("Vincy Mas (St. Vincent)", 2026, 6, 26),
    on("Vienna Carnival (Austria)", 2026, 6, 26),
    on("Saint Lucia Carnival", 2026, 7, 20),
    on("Nevis Culturama Festival", 2026, 7, 23),
    on("Anguilla Summer Festival", 2026, 7, 24),
    on("Zomercarnaval (Rotterdam)", 2026, 7, 25),
    on("Crop Over (Barbados)", 2026, 8, 3),
    on("Antigua Carnival", 2026, 8, 3),
    on("Cariwest (Canada)", 2026, 8, 7),
    on("Notting Hill Carnival (UK)", 2026, 8, 30),
    on("New York Carnival", 2026, 9, 3),
    on("Miami Carnival", 2026, 10, 11),
    on("Tobago Carnival", 2026, 10, 23),
];

pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

pub fn find(name: &str) -> Option<&'static CountdownEntry> {
    COUNTDOWN_TABLE.iter().find(|e| e.name == name)
}

/// Festivals that have not started yet as of `today`, soonest first.
pub fn upcoming(today: NaiveDate) -> Vec<(&'static CountdownEntry, i64)> {
    let mut out: Vec<_> = COUNTDOWN_TABLE
        .iter()
        .filter_map(|e| e.days_from(today).map(|d| (e, d)))
        .filter(|(_, days)| *days >= 0)
        .collect();
    out.sort_by_key(|(_, days)| *days);
    out
}
