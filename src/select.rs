//! Primary-record selection for click-to-navigate.
//!
//! When a district is clicked the map navigates to exactly one office.
//! The choice is a strict total order so the same data always navigates
//! to the same place: active offices before inactive, headquarters
//! before branch offices, then code ascending.

use crate::types::RegionRecord;

/// Pick the record a district click should navigate to.
///
/// Returns `None` for an empty list. Operates on a copied index; the
/// caller's slice is never reordered.
pub fn select_primary(records: &[RegionRecord]) -> Option<&RegionRecord> {
    let mut order: Vec<&RegionRecord> = records.iter().collect();
    order.sort_by(|a, b| {
        b.is_active()
            .cmp(&a.is_active())
            .then(b.headquarters.cmp(&a.headquarters))
            .then(a.code.cmp(&b.code))
    });
    order.first().copied()
}
