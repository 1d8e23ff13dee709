//! Static list of festivals a plan can be created for.
//!
//! The catalog is compiled in and never changes at runtime. A plan document
//! stores a snapshot of [`PlanCatalogEntry::display_name`] taken when the
//! plan is first selected.

use crate::error::DomainError;
use crate::types::FestivalId;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A selectable festival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanCatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    /// Zero-based month (0 = January).
    pub month_index: u8,
}

impl PlanCatalogEntry {
    pub fn festival_id(&self) -> FestivalId {
        FestivalId::new(self.id)
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[usize::from(self.month_index) % 12]
    }

    /// Name shown in the UI and written into new plan documents,
    /// e.g. `"Trinidad Carnival - February"`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.month_name())
    }
}

const fn entry(id: &'static str, name: &'static str, month_index: u8) -> PlanCatalogEntry {
    PlanCatalogEntry {
        id,
        name,
        month_index,
    }
}

pub const PLAN_CATALOG: &[PlanCatalogEntry] = &[
    entry("st-croix", "St. Croix Festival", 0),
    entry("trinidad", "Trinidad Carnival", 1),
    entry("rio", "Rio Carnival", 1),
    entry("barranquilla", "Barranquilla Carnival", 1),
    entry("aruba", "Aruba Carnival", 1),
    entry("martinique", "Martinique Carnival", 1),
    entry("dominica", "Mas Domnik", 1),
    entry("guyana-mashramani", "Mashramani", 2),
    entry("jamaica", "Jamaica Carnival", 3),
    entry("st-thomas", "St. Thomas Carnival", 3),
    entry("st-maarten", "St. Maarten Carnival", 3),
    entry("atlanta", "Atlanta Caribbean Carnival", 4),
    entry("grenada", "Spicemas", 4),
    entry("bahamas", "Bahamas Carnival", 5),
    entry("bermuda", "Bermuda Carnival", 5),
    entry("cayman", "Caymas Carnival", 5),
    entry("st-vincent", "Vincy Mas", 5),
    entry("st-lucia", "Saint Lucia Carnival", 6),
    entry("rotterdam", "Zomercarnaval", 6),
    entry("barbados", "Crop Over", 7),
    entry("antigua", "Antigua Carnival", 7),
    entry("cariwest", "Cariwest", 7),
    entry("notting-hill", "Notting Hill Carnival", 7),
    entry("new-york", "New York Carnival", 8),
    entry("miami", "Miami Carnival", 9),
    entry("tobago", "Tobago Carnival", 9),
    entry("st-kitts", "Sugar Mas", 11),
    entry("montserrat", "Montserrat Carnival", 11),
];

pub fn all() -> &'static [PlanCatalogEntry] {
    PLAN_CATALOG
}

pub fn find(id: &str) -> Option<&'static PlanCatalogEntry> {
    PLAN_CATALOG.iter().find(|e| e.id == id)
}

/// Resolve a festival id, failing for ids outside the catalog.
pub fn lookup(id: &FestivalId) -> Result<&'static PlanCatalogEntry, DomainError> {
    find(id.as_str()).ok_or_else(|| DomainError::UnknownFestival(id.to_string()))
}
