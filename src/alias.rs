//! District name reconciliation across data sources.
//!
//! Record data, boundary datasets and the geocoding service do not agree
//! on district names ("Bengaluru Urban" vs "Bangalore Urban" vs "BBMP").
//! An `AliasTable` maps every known raw variant to the one canonical id
//! used internally. Unknown names resolve to `None`, never an error, so
//! callers degrade to "no boundary available".

/// Ordered raw-name → canonical-id table for one territory.
///
/// Declaration order matters: when two raw names map to the same
/// canonical id, reverse lookup returns the first declared pair.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    pairs: Vec<(String, String)>,
}

impl AliasTable {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Map a raw district name to its canonical id.
    ///
    /// Input is trimmed and compared case-sensitively against the table.
    pub fn canonicalize(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        self.pairs
            .iter()
            .find(|(r, _)| r.as_str() == raw)
            .map(|(_, canonical)| canonical.as_str())
    }

    /// Literal inverse of [`canonicalize`](Self::canonicalize): first
    /// declared raw name for a canonical id.
    pub fn district_for_region(&self, canonical: &str) -> Option<&str> {
        let canonical = canonical.trim();
        self.pairs
            .iter()
            .find(|(_, c)| c.as_str() == canonical)
            .map(|(raw, _)| raw.as_str())
    }

    pub fn len(&self) -> usize { self.pairs.len() }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    /// Pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pairs.iter().map(|(r, c)| (r.as_str(), c.as_str()))
    }
}
