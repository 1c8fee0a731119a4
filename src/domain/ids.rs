//! Domain identifier types with validation
//!
//! Newtype wrappers for National Provider Identifiers and performance years.
//! Both validate on construction so the rest of the crate can rely on the
//! format without re-checking it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First performance year the QPP eligibility API serves
pub const MIN_PERFORMANCE_YEAR: u16 = 2017;

/// Last performance year accepted by the extractor
pub const MAX_PERFORMANCE_YEAR: u16 = 2030;

/// National Provider Identifier newtype wrapper
///
/// An NPI is exactly ten ASCII digits. Leading zeros are significant.
///
/// # Examples
///
/// ```
/// use qpp_extract::domain::ids::Npi;
/// use std::str::FromStr;
///
/// let npi = Npi::from_str("1234567890").unwrap();
/// assert_eq!(npi.as_str(), "1234567890");
/// assert!(Npi::from_str("12345").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Npi(String);

impl Npi {
    /// Creates a new Npi, trimming surrounding whitespace
    ///
    /// # Returns
    ///
    /// Returns `Ok(Npi)` if the value is exactly ten digits, `Err` otherwise
    pub fn new(npi: impl Into<String>) -> Result<Self, String> {
        let npi = npi.into();
        let trimmed = npi.trim();
        if trimmed.is_empty() {
            return Err("NPI cannot be empty".to_string());
        }
        if !is_valid_npi(trimmed) {
            return Err(format!("NPI must be exactly 10 digits, got: {trimmed}"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the NPI as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Returns true when `value` is exactly ten ASCII digits
pub fn is_valid_npi(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Npi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Npi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Npi {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Npi> for String {
    fn from(npi: Npi) -> Self {
        npi.0
    }
}

impl AsRef<str> for Npi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Performance year newtype wrapper (2017 through 2030)
///
/// # Examples
///
/// ```
/// use qpp_extract::domain::ids::PerformanceYear;
///
/// let year = PerformanceYear::new(2024).unwrap();
/// assert_eq!(year.get(), 2024);
/// assert!(PerformanceYear::new(2016).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct PerformanceYear(u16);

impl PerformanceYear {
    /// Creates a new PerformanceYear
    pub fn new(year: u16) -> Result<Self, String> {
        if !(MIN_PERFORMANCE_YEAR..=MAX_PERFORMANCE_YEAR).contains(&year) {
            return Err(format!(
                "Performance year must be between {MIN_PERFORMANCE_YEAR} and {MAX_PERFORMANCE_YEAR}, got {year}"
            ));
        }
        Ok(Self(year))
    }

    /// Returns the year as a number
    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for PerformanceYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PerformanceYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let year: u16 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid performance year: {s}"))?;
        Self::new(year)
    }
}

impl TryFrom<u16> for PerformanceYear {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PerformanceYear> for u16 {
    fn from(year: PerformanceYear) -> Self {
        year.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_npi_valid() {
        let npi = Npi::from_str("1234567890").unwrap();
        assert_eq!(npi.as_str(), "1234567890");
        assert_eq!(npi.to_string(), "1234567890");
    }

    #[test]
    fn test_npi_trims_whitespace() {
        let npi = Npi::new("  0000000000 ").unwrap();
        assert_eq!(npi.as_str(), "0000000000");
    }

    #[test_case("" ; "empty")]
    #[test_case("123456789" ; "nine digits")]
    #[test_case("12345678901" ; "eleven digits")]
    #[test_case("12345abcde" ; "letters")]
    #[test_case("1234-56789" ; "punctuation")]
    fn test_npi_invalid(value: &str) {
        assert!(Npi::new(value).is_err());
    }

    #[test]
    fn test_npi_serde_roundtrip_rejects_invalid() {
        let npi: Npi = serde_json::from_str("\"1234567890\"").unwrap();
        assert_eq!(npi.as_str(), "1234567890");
        assert!(serde_json::from_str::<Npi>("\"12\"").is_err());
    }

    #[test_case(2017 ; "lower bound")]
    #[test_case(2024 ; "typical")]
    #[test_case(2030 ; "upper bound")]
    fn test_year_valid(value: u16) {
        assert_eq!(PerformanceYear::new(value).unwrap().get(), value);
    }

    #[test_case(2016 ; "before range")]
    #[test_case(2031 ; "after range")]
    #[test_case(0 ; "zero")]
    fn test_year_invalid(value: u16) {
        assert!(PerformanceYear::new(value).is_err());
    }

    #[test]
    fn test_year_from_str() {
        assert_eq!(PerformanceYear::from_str(" 2023 ").unwrap().get(), 2023);
        assert!(PerformanceYear::from_str("twenty").is_err());
    }
}
