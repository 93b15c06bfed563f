//! Region type
//!
//! Value object for the region a clan plays in.
//! Regions are validated at construction time, so an invalid code
//! cannot exist in the system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Region is a two-letter country/area code, stored upper-case.
///
/// # Example
/// ```
/// use data_clash::domain::Region;
///
/// let region: Region = "es".parse().unwrap();
/// assert_eq!(region.code(), "ES");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

/// Errors that can occur when creating a Region
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("Region code must be exactly two letters (got '{0}')")]
    InvalidCode(String),
}

impl Region {
    pub fn new(code: &str) -> Result<Self, RegionError> {
        let code = code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RegionError::InvalidCode(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::new(s)
    }
}

impl TryFrom<String> for Region {
    type Error = RegionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Region::new(&value)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_normalized() {
        let region = Region::new(" dk ").unwrap();
        assert_eq!(region.code(), "DK");
    }

    #[test]
    fn test_region_rejects_bad_codes() {
        assert!(matches!(Region::new("DNK"), Err(RegionError::InvalidCode(_))));
        assert!(matches!(Region::new("1A"), Err(RegionError::InvalidCode(_))));
        assert!(matches!(Region::new(""), Err(RegionError::InvalidCode(_))));
    }

    #[test]
    fn test_region_deserialize_validates() {
        let ok: Result<Region, _> = serde_json::from_str(r#""fr""#);
        assert_eq!(ok.unwrap().code(), "FR");

        let bad: Result<Region, _> = serde_json::from_str(r#""france""#);
        assert!(bad.is_err());
    }
}
