//! Static mock companies for test registry numbers
//!
//! These registry numbers never reach the lookup service. They resolve to
//! fixed records so demos and UI work can run without registry credentials.

use super::CompanyRecord;

/// A fixed mock company keyed by its test registry number
#[derive(Debug, Clone, Copy)]
pub struct TestCompany {
    /// Test registry number (also used as the registry code)
    pub registry_number: &'static str,
    /// Company name
    pub name: &'static str,
    /// Company status
    pub status: &'static str,
    /// Full address
    pub address: &'static str,
}

/// Static array of all test registry numbers and their mock companies
pub static TEST_COMPANIES: [TestCompany; 5] = [
    TestCompany {
        registry_number: "556655",
        name: "Test Company Alpha Ltd",
        status: "Active",
        address: "1234 Test Street, Tallinn 10115, Estonia",
    },
    TestCompany {
        registry_number: "989898",
        name: "Demo Corporation Beta OÜ",
        status: "Active",
        address: "5678 Demo Avenue, Tartu 50090, Estonia",
    },
    TestCompany {
        registry_number: "1235664",
        name: "Sample Business Gamma AS",
        status: "Active",
        address: "9012 Sample Road, Pärnu 80010, Estonia",
    },
    TestCompany {
        registry_number: "3636363",
        name: "Mock Enterprise Delta Ltd",
        status: "Active",
        address: "3456 Mock Boulevard, Narva 20308, Estonia",
    },
    TestCompany {
        registry_number: "12121212",
        name: "Prototype Company Epsilon OÜ",
        status: "Active",
        address: "7890 Prototype Lane, Viljandi 71020, Estonia",
    },
];

impl TestCompany {
    /// Builds the mock record served for this test company
    pub fn to_record(&self) -> CompanyRecord {
        CompanyRecord {
            name: self.name.to_string(),
            registry_code: self.registry_number.to_string(),
            status: self.status.to_string(),
            address: Some(self.address.to_string()),
            registry_number: self.registry_number.to_string(),
            success: true,
            is_mock: true,
        }
    }
}

/// Returns true if the registry number is one of the fixed test identifiers
pub fn is_test_registry_number(registry_number: &str) -> bool {
    TEST_COMPANIES
        .iter()
        .any(|company| company.registry_number == registry_number)
}

/// Looks up the mock record for a test registry number
///
/// Returns `None` for any identifier outside the test table.
pub fn test_company_record(registry_number: &str) -> Option<CompanyRecord> {
    TEST_COMPANIES
        .iter()
        .find(|company| company.registry_number == registry_number)
        .map(TestCompany::to_record)
}
