use std::hash::{Hash, Hasher};

/// Collapse a name to the form used for cache identity:
/// trimmed, lowercased, whitespace runs joined with `_`.
pub(crate) fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Identity of a district within a territory.
///
/// Keeps the display names as given (trimmed), but equality, hashing and
/// the storage key all go through the normalized form, so "North  Goa"
/// and "north goa" are the same cache entry.
#[derive(Debug, Clone)]
pub struct DistrictKey {
    territory: String,
    district: String,
    norm: String, // "{territory}_{district}", normalized
}

impl DistrictKey {
    pub fn new(territory: &str, district: &str) -> Self {
        Self {
            territory: territory.trim().to_string(),
            district: district.trim().to_string(),
            norm: format!("{}_{}", normalize(territory), normalize(district)),
        }
    }

    pub fn territory(&self) -> &str { &self.territory }

    pub fn district(&self) -> &str { &self.district }

    /// Normalized `territory_district` identity string.
    pub fn cache_id(&self) -> &str { &self.norm }

    /// Key used for the persistent tier: `prefix + territory + "_" + district`.
    pub fn storage_key(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.norm)
    }
}

impl PartialEq for DistrictKey {
    fn eq(&self, other: &Self) -> bool { self.norm == other.norm }
}

impl Eq for DistrictKey {}

impl Hash for DistrictKey {
    fn hash<H: Hasher>(&self, state: &mut H) { self.norm.hash(state) }
}
