//! Core value types shared by all subsystems.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IncidenceError, Result};

/// Width of an administrative region code
pub const REGION_CODE_WIDTH: usize = 4;

/// Four-character, zero-padded administrative region code (e.g. "0101")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionId(String);

impl RegionId {
    /// Parse a region code, zero-padding numeric codes to four characters
    ///
    /// Spreadsheet exports frequently drop the leading zero ("101" for
    /// "0101"), so anything of one to four digits is accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > REGION_CODE_WIDTH
            || !trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(IncidenceError::InvalidRegionCode(raw.to_string()));
        }
        Ok(Self(format!("{trimmed:0>width$}", width = REGION_CODE_WIDTH)))
    }

    /// Build a region code from an integer code
    pub fn from_code(code: i64) -> Result<Self> {
        if code < 0 {
            return Err(IncidenceError::InvalidRegionCode(code.to_string()));
        }
        Self::parse(&code.to_string())
    }

    /// The zero-padded code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading `len` characters of the code (county prefix for `len = 2`)
    #[must_use]
    pub fn prefix(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl TryFrom<String> for RegionId {
    type Error = IncidenceError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RegionId> for String {
    fn from(value: RegionId) -> Self {
        value.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar granularity of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// 53 weekly periods per year
    #[default]
    Weekly,
    /// 12 monthly periods per year
    Monthly,
}

impl PeriodKind {
    /// Number of periods per year (`P`)
    #[must_use]
    pub const fn periods(self) -> u32 {
        match self {
            Self::Weekly => 53,
            Self::Monthly => 12,
        }
    }

    /// Check that `period` lies in `1..=P`
    pub fn validate(self, period: u32) -> Result<u32> {
        if period == 0 || period > self.periods() {
            return Err(IncidenceError::InvalidPeriod {
                period,
                max: self.periods(),
            });
        }
        Ok(period)
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// How a series value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Present in the source data
    Observed,
    /// Linear interpolation between two observed neighbours
    Interpolated,
    /// Trailing gap filled with the last observed value
    ForwardFilled,
    /// Leading gap filled with the first observed value
    BackwardFilled,
    /// Missing in a series with too few observations to impute
    Unqualified,
}

impl Provenance {
    /// Stable label used in output tables
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Interpolated => "interpolated",
            Self::ForwardFilled => "forward-filled",
            Self::BackwardFilled => "backward-filled",
            Self::Unqualified => "unqualified",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one annual series: (region, year)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    /// Region code
    pub region: RegionId,
    /// Calendar year
    pub year: i32,
}

impl SeriesKey {
    /// Create a new series key
    #[must_use]
    pub fn new(region: RegionId, year: i32) -> Self {
        Self { region, year }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.year)
    }
}

/// A spatial unit of the exposure/outcome series: a region code, a place
/// name or a region-group id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpatialUnit(String);

impl SpatialUnit {
    /// Create a spatial unit from any label; surrounding whitespace is removed
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_string())
    }

    /// The unit label
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&RegionId> for SpatialUnit {
    fn from(value: &RegionId) -> Self {
        Self(value.as_str().to_string())
    }
}

impl fmt::Display for SpatialUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_codes_are_zero_padded() {
        assert_eq!(RegionId::parse("101").unwrap().as_str(), "0101");
        assert_eq!(RegionId::parse(" 6301 ").unwrap().as_str(), "6301");
        assert_eq!(RegionId::from_code(7).unwrap().as_str(), "0007");
        assert_eq!(RegionId::parse("0101").unwrap().prefix(2), "01");
    }

    #[test]
    fn malformed_region_codes_are_rejected() {
        assert!(RegionId::parse("").is_err());
        assert!(RegionId::parse("12345").is_err());
        assert!(RegionId::parse("10a1").is_err());
        assert!(RegionId::from_code(-3).is_err());
    }

    #[test]
    fn period_bounds() {
        assert_eq!(PeriodKind::Weekly.periods(), 53);
        assert_eq!(PeriodKind::Monthly.periods(), 12);
        assert!(PeriodKind::Monthly.validate(12).is_ok());
        assert!(PeriodKind::Monthly.validate(13).is_err());
        assert!(PeriodKind::Weekly.validate(0).is_err());
    }
}
