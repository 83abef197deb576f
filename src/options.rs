use std::fmt;

use crate::error::Error;

/// How the spatial column(s) encode location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialType {
    Auto,
    Point,
    Polygon,
    Address,
    Code,
}

impl SpatialType {
    pub const VALID: &'static [&'static str] = &["auto", "point", "polygon", "address", "code"];

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SpatialType::Auto),
            "point" => Ok(SpatialType::Point),
            "polygon" => Ok(SpatialType::Polygon),
            "address" => Ok(SpatialType::Address),
            "code" => Ok(SpatialType::Code),
            _ => Err(Error::unsupported("spatial type", s, Self::VALID)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialType::Auto => "auto",
            SpatialType::Point => "point",
            SpatialType::Polygon => "polygon",
            SpatialType::Address => "address",
            SpatialType::Code => "code",
        }
    }
}

impl fmt::Display for SpatialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the temporal column(s) encode instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalFormat {
    Auto,
    Iso,
    Timestamp,
    Custom,
}

impl TemporalFormat {
    pub const VALID: &'static [&'static str] = &["auto", "iso", "timestamp", "custom"];

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(TemporalFormat::Auto),
            "iso" => Ok(TemporalFormat::Iso),
            "timestamp" => Ok(TemporalFormat::Timestamp),
            "custom" => Ok(TemporalFormat::Custom),
            _ => Err(Error::unsupported("temporal format", s, Self::VALID)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalFormat::Auto => "auto",
            TemporalFormat::Iso => "iso",
            TemporalFormat::Timestamp => "timestamp",
            TemporalFormat::Custom => "custom",
        }
    }
}

impl fmt::Display for TemporalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spatial resolution for grouping records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialGranularity {
    Country,
    State,
    Province,
    Municipality,
    County,
    Grid,
    Hexgrid,
    Custom,
}

impl SpatialGranularity {
    pub const VALID: &'static [&'static str] = &[
        "country",
        "state",
        "province",
        "municipality",
        "county",
        "grid",
        "hexgrid",
        "custom",
    ];

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "country" => Ok(SpatialGranularity::Country),
            "state" => Ok(SpatialGranularity::State),
            "province" => Ok(SpatialGranularity::Province),
            "municipality" => Ok(SpatialGranularity::Municipality),
            "county" => Ok(SpatialGranularity::County),
            "grid" => Ok(SpatialGranularity::Grid),
            "hexgrid" => Ok(SpatialGranularity::Hexgrid),
            "custom" => Ok(SpatialGranularity::Custom),
            _ => Err(Error::unsupported("spatial granularity", s, Self::VALID)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialGranularity::Country => "country",
            SpatialGranularity::State => "state",
            SpatialGranularity::Province => "province",
            SpatialGranularity::Municipality => "municipality",
            SpatialGranularity::County => "county",
            SpatialGranularity::Grid => "grid",
            SpatialGranularity::Hexgrid => "hexgrid",
            SpatialGranularity::Custom => "custom",
        }
    }

    /// Administrative levels need boundary data this crate does not ship;
    /// they run the grid partition in a degraded mode.
    pub fn is_administrative(&self) -> bool {
        matches!(
            self,
            SpatialGranularity::Country
                | SpatialGranularity::State
                | SpatialGranularity::Province
                | SpatialGranularity::Municipality
                | SpatialGranularity::County
        )
    }

    pub fn is_grid(&self) -> bool {
        matches!(self, SpatialGranularity::Grid | SpatialGranularity::Hexgrid)
    }
}

impl fmt::Display for SpatialGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temporal resolution for grouping records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalGranularity {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Custom,
}

impl TemporalGranularity {
    pub const VALID: &'static [&'static str] =
        &["year", "quarter", "month", "week", "day", "hour", "custom"];

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "year" => Ok(TemporalGranularity::Year),
            "quarter" => Ok(TemporalGranularity::Quarter),
            "month" => Ok(TemporalGranularity::Month),
            "week" => Ok(TemporalGranularity::Week),
            "day" => Ok(TemporalGranularity::Day),
            "hour" => Ok(TemporalGranularity::Hour),
            "custom" => Ok(TemporalGranularity::Custom),
            _ => Err(Error::unsupported("temporal granularity", s, Self::VALID)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalGranularity::Year => "year",
            TemporalGranularity::Quarter => "quarter",
            TemporalGranularity::Month => "month",
            TemporalGranularity::Week => "week",
            TemporalGranularity::Day => "day",
            TemporalGranularity::Hour => "hour",
            TemporalGranularity::Custom => "custom",
        }
    }
}

impl fmt::Display for TemporalGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of per-column reduction functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunction {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Count,
    Std,
    Var,
    First,
    Last,
    Size,
}

impl AggFunction {
    pub const VALID: &'static [&'static str] = &[
        "sum", "mean", "median", "min", "max", "count", "std", "var", "first", "last", "size",
    ];

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(AggFunction::Sum),
            "mean" => Ok(AggFunction::Mean),
            "median" => Ok(AggFunction::Median),
            "min" => Ok(AggFunction::Min),
            "max" => Ok(AggFunction::Max),
            "count" => Ok(AggFunction::Count),
            "std" => Ok(AggFunction::Std),
            "var" => Ok(AggFunction::Var),
            "first" => Ok(AggFunction::First),
            "last" => Ok(AggFunction::Last),
            "size" => Ok(AggFunction::Size),
            _ => Err(Error::unsupported("aggregation function", s, Self::VALID)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunction::Sum => "sum",
            AggFunction::Mean => "mean",
            AggFunction::Median => "median",
            AggFunction::Min => "min",
            AggFunction::Max => "max",
            AggFunction::Count => "count",
            AggFunction::Std => "std",
            AggFunction::Var => "var",
            AggFunction::First => "first",
            AggFunction::Last => "last",
            AggFunction::Size => "size",
        }
    }
}

impl fmt::Display for AggFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consistency metrics computed over an aggregated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Completeness,
    Variance,
    Density,
}

impl Metric {
    pub const ALL: &'static [Metric] = &[Metric::Completeness, Metric::Variance, Metric::Density];
    pub const VALID: &'static [&'static str] = &["completeness", "variance", "density"];

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "completeness" => Ok(Metric::Completeness),
            "variance" => Ok(Metric::Variance),
            "density" => Ok(Metric::Density),
            _ => Err(Error::unsupported("metric", s, Self::VALID)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Completeness => "completeness",
            Metric::Variance => "variance",
            Metric::Density => "density",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(SpatialType::parse("Point").unwrap(), SpatialType::Point);
        assert_eq!(
            SpatialGranularity::parse("HEXGRID").unwrap(),
            SpatialGranularity::Hexgrid
        );
        assert_eq!(
            TemporalGranularity::parse("Quarter").unwrap(),
            TemporalGranularity::Quarter
        );
    }

    #[test]
    fn unknown_option_lists_valid_values() {
        let err = AggFunction::parse("product").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("product"));
        assert!(msg.contains("sum"));
        assert!(msg.contains("size"));
    }

    #[test]
    fn administrative_levels_are_flagged() {
        assert!(SpatialGranularity::County.is_administrative());
        assert!(!SpatialGranularity::Grid.is_administrative());
        assert!(SpatialGranularity::Hexgrid.is_grid());
    }
}
