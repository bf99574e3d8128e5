//! Core data models for registry lookups
//!
//! This module contains the company record returned by the registry lookup
//! service, the lookup client itself, and the static table of test
//! registry numbers that resolve to mock companies.

pub mod lookup;
pub mod test_registry;

pub use lookup::{HttpRegistryLookup, LookupError, RegistryLookup};
pub use test_registry::{is_test_registry_number, test_company_record, TEST_COMPANIES};

use serde::{Deserialize, Serialize};

/// Required length of a real registry number
pub const REGISTRY_NUMBER_LEN: usize = 8;

/// Snapshot of a company as returned by a registry lookup
///
/// Serialized in camelCase so persisted caches stay readable by other
/// consumers of the same lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    /// Registered company name
    pub name: String,
    /// Registry code as reported by the registry
    pub registry_code: String,
    /// Human-readable company status (e.g. "Active")
    pub status: String,
    /// Normalised full address, if the registry has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Registry number the record was looked up by
    pub registry_number: String,
    /// Whether the lookup reported a match
    pub success: bool,
    /// Whether this record comes from the static test table
    #[serde(default)]
    pub is_mock: bool,
}

/// Returns true if the identifier has the shape of a real registry number
pub fn has_registry_number_shape(registry_number: &str) -> bool {
    registry_number.chars().count() == REGISTRY_NUMBER_LEN
}
