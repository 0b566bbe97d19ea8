//! Line-item name matching against a location's product catalog.
//!
//! Matching is normalized-exact: trim, lowercase, collapse inner
//! whitespace. Unmatched names are surfaced as a structured condition so
//! callers can log them for diagnosis; they do not fail the injection
//! (payments and discounts carry the monetary totals).

use std::collections::BTreeMap;

use evsync_schemas::LineItem;

use crate::OrderItem;

/// Result of matching one event's line items against a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    pub items: Vec<OrderItem>,
    pub unmatched: Vec<String>,
}

/// Normalize a product name for catalog comparison.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Match line items against the catalog (product name → product id).
pub fn match_line_items(items: &[LineItem], catalog: &BTreeMap<String, i64>) -> CatalogMatch {
    let normalized: BTreeMap<String, i64> = catalog
        .iter()
        .map(|(name, id)| (normalize_name(name), *id))
        .collect();

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for item in items {
        match normalized.get(&normalize_name(&item.name)) {
            Some(product_id) => matched.push(OrderItem {
                product_id: *product_id,
                quantity: item.quantity,
            }),
            None => unmatched.push(item.name.clone()),
        }
    }

    CatalogMatch {
        items: matched,
        unmatched,
    }
}
