//! # Cross-Filter Store
//!
//! Filter state shared by every chart panel. Four independent dimensions,
//! each nullable; an unset dimension constrains nothing. Charts emit filter
//! values from their selected row, the chips row removes them one at a time,
//! and `apply` evaluates the conjunction as a pure order-preserving pass.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::decision::Decision;

/// Confidence bands used by both the band filter and the split chart.
///
/// The band boundaries are defined once, here: `low < 0.08`,
/// `0.08 <= medium <= 0.10`, `high > 0.10`. The confidence histogram uses
/// its own finer bucket edges and is deliberately not derived from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub const ALL: [ConfidenceBand; 3] =
        [ConfidenceBand::Low, ConfidenceBand::Medium, ConfidenceBand::High];

    /// Band of a confidence value. Records without a confidence decode as
    /// `0.0` and therefore land in `Low`.
    pub fn of(confidence: f64) -> Self {
        if confidence < 0.08 {
            ConfidenceBand::Low
        } else if confidence <= 0.10 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::High
        }
    }

    /// Wire/chip value (`low`, `medium`, `high`).
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceBand::Low => "low",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::High => "high",
        }
    }

    /// Row label in the confidence split chart.
    pub fn chart_label(self) -> &'static str {
        match self {
            ConfidenceBand::Low => "Low (< 0.08)",
            ConfidenceBand::Medium => "Medium (0.08–0.10)",
            ConfidenceBand::High => "High (> 0.10)",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfidenceBand {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        match lowered.as_str() {
            "low" => Ok(ConfidenceBand::Low),
            "medium" => Ok(ConfidenceBand::Medium),
            "high" => Ok(ConfidenceBand::High),
            _ => Err(FilterError::InvalidBand(s.to_string())),
        }
    }
}

/// The four filterable dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Country,
    Region,
    PrimaryTransport,
    ConfidenceBand,
}

impl FilterKey {
    /// Chip display order.
    pub const ALL: [FilterKey; 4] = [
        FilterKey::Country,
        FilterKey::Region,
        FilterKey::PrimaryTransport,
        FilterKey::ConfidenceBand,
    ];

    /// Wire name, as accepted by `--filter key=value`.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Country => "country",
            FilterKey::Region => "region",
            FilterKey::PrimaryTransport => "primary_transport",
            FilterKey::ConfidenceBand => "confidence_band",
        }
    }

    /// Short human label used on filter chips.
    pub fn label(self) -> &'static str {
        match self {
            FilterKey::Country => "Country",
            FilterKey::Region => "Region",
            FilterKey::PrimaryTransport => "Transport",
            FilterKey::ConfidenceBand => "Confidence",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "country" => Ok(FilterKey::Country),
            "region" => Ok(FilterKey::Region),
            "primary_transport" => Ok(FilterKey::PrimaryTransport),
            "confidence_band" => Ok(FilterKey::ConfidenceBand),
            _ => Err(FilterError::UnknownKey(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error(
        "unknown filter key `{0}` (expected country, region, primary_transport or confidence_band)"
    )]
    UnknownKey(String),

    #[error("invalid confidence band `{0}` (expected low, medium or high)")]
    InvalidBand(String),
}

/// Active filter set. All dimensions start unset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Filters {
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_transport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence_band: Option<ConfidenceBand>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one dimension. The band value is validated; the equality
    /// dimensions accept any string.
    pub fn set(&mut self, key: FilterKey, value: &str) -> Result<(), FilterError> {
        match key {
            FilterKey::Country => self.country = Some(value.to_string()),
            FilterKey::Region => self.region = Some(value.to_string()),
            FilterKey::PrimaryTransport => self.primary_transport = Some(value.to_string()),
            FilterKey::ConfidenceBand => self.confidence_band = Some(value.parse()?),
        }
        Ok(())
    }

    /// Unset one dimension.
    pub fn remove(&mut self, key: FilterKey) {
        match key {
            FilterKey::Country => self.country = None,
            FilterKey::Region => self.region = None,
            FilterKey::PrimaryTransport => self.primary_transport = None,
            FilterKey::ConfidenceBand => self.confidence_band = None,
        }
    }

    /// Unset everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.country.is_none()
            && self.region.is_none()
            && self.primary_transport.is_none()
            && self.confidence_band.is_none()
    }

    fn value(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::Country => self.country.clone(),
            FilterKey::Region => self.region.clone(),
            FilterKey::PrimaryTransport => self.primary_transport.clone(),
            FilterKey::ConfidenceBand => self.confidence_band.map(|b| b.to_string()),
        }
    }

    /// Active `(key, value)` pairs in chip display order.
    pub fn active(&self) -> Vec<(FilterKey, String)> {
        FilterKey::ALL
            .into_iter()
            .filter_map(|key| self.value(key).map(|v| (key, v)))
            .collect()
    }

    /// Conjunction of all active dimensions. An absent record field never
    /// equals an active filter value, so partial records drop out of
    /// filtered views.
    pub fn matches(&self, decision: &Decision) -> bool {
        if let Some(want) = &self.country
            && decision.predicted_country.as_deref() != Some(want.as_str())
        {
            return false;
        }
        if let Some(want) = &self.region
            && decision.region.as_deref() != Some(want.as_str())
        {
            return false;
        }
        if let Some(want) = &self.primary_transport
            && decision.primary_transport.as_deref() != Some(want.as_str())
        {
            return false;
        }
        if let Some(band) = self.confidence_band
            && ConfidenceBand::of(decision.confidence) != band
        {
            return false;
        }
        true
    }

    /// Filter a decision list, preserving order. Pure: the input is never
    /// mutated, and an empty filter set returns the input verbatim.
    pub fn apply(&self, decisions: &[Decision]) -> Vec<Decision> {
        if decisions.is_empty() || self.is_empty() {
            return decisions.to_vec();
        }
        decisions
            .iter()
            .filter(|d| self.matches(d))
            .cloned()
            .collect()
    }
}
