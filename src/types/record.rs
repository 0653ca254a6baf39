use std::sync::Arc;

use serde::Deserialize;

/// Operational status of an office, as it appears in the record data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfficeStatus {
    Operational,
    Suspended,
    Closed,
}

impl OfficeStatus {
    pub fn to_str(&self) -> &'static str {
        match self {
            OfficeStatus::Operational => "operational",
            OfficeStatus::Suspended => "suspended",
            OfficeStatus::Closed => "closed",
        }
    }
}

/// One addressable office within a district. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionRecord {
    /// Unique, stable office code (e.g. "GOA012"). Kept as `Arc<str>` to
    /// avoid repeated owned Strings across markers and events.
    pub code: Arc<str>,
    /// Display name of the region the office serves.
    pub region: String,
    pub status: OfficeStatus,
    #[serde(default)]
    pub headquarters: bool,
    /// Sub-location within the district, used for marker geocoding.
    #[serde(default)]
    pub locality: Option<String>,
}

impl RegionRecord {
    pub fn is_active(&self) -> bool {
        self.status == OfficeStatus::Operational
    }
}
