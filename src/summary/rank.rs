use crate::db::DbCountry;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Number of countries listed on the summary image.
pub const TOP_GDP_LIMIT: usize = 5;

/// The slice of a stored country the summary needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub name: String,
    pub estimated_gdp: f64,
}

impl From<&DbCountry> for SummaryEntry {
    fn from(row: &DbCountry) -> Self {
        Self {
            name: row.name.clone(),
            estimated_gdp: row.estimated_gdp,
        }
    }
}

/// Keep the first entry for each name, preserving input order.
pub fn dedup_by_name(entries: Vec<SummaryEntry>) -> Vec<SummaryEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.name.clone()))
        .collect()
}

/// Top `limit` entries by GDP descending, ties by name ascending.
///
/// Zero marks a country without an estimate. Only positive, finite GDPs are ranked.
pub fn rank_top_gdp(entries: &[SummaryEntry], limit: usize) -> Vec<SummaryEntry> {
    let mut ranked: Vec<&SummaryEntry> = entries
        .iter()
        .filter(|e| e.estimated_gdp.is_finite() && e.estimated_gdp > 0.0)
        .collect();

    ranked.sort_by(|a, b| {
        b.estimated_gdp
            .partial_cmp(&a.estimated_gdp)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    ranked.into_iter().take(limit).cloned().collect()
}
