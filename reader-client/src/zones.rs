//! Best-effort address-to-zone classification.
//!
//! Zone membership is not a foreign key in the source data; customers
//! carry a free-text address and zones are matched by case-insensitive
//! substring. Precedence: the registered zone list first, then a
//! positional fallback on comma-split address segments. The behavior is
//! kept bit-for-bit compatible with the billing office's existing data.

use crate::domain::Customer;

/// Whether `address` falls in `zone` (case-insensitive substring).
pub fn address_in_zone(address: &str, zone: &str) -> bool {
    address.to_lowercase().contains(&zone.to_lowercase())
}

/// Whether `address` falls in any of `zones`.
pub fn address_in_any_zone(address: &str, zones: &[String]) -> bool {
    zones.iter().any(|z| address_in_zone(address, z))
}

/// Classify an address into a zone name.
///
/// Tries the registered `zones` first; otherwise falls back to the
/// second-to-last comma-separated segment (addresses are usually
/// "street, barangay, municipality"), then the last, then "N/A".
pub fn extract_zone(address: &str, zones: &[String]) -> String {
    if address.is_empty() {
        return "N/A".to_string();
    }

    if let Some(z) = zones.iter().find(|z| address_in_zone(address, z)) {
        return z.clone();
    }

    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    if parts.len() >= 2 {
        return parts[parts.len() - 2].to_string();
    }
    match parts.last() {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Customers whose address matches any of the route's zones.
pub fn filter_to_zones(customers: Vec<Customer>, zones: &[String]) -> Vec<Customer> {
    customers
        .into_iter()
        .filter(|c| address_in_any_zone(&c.address, zones))
        .collect()
}
