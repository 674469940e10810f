//! # Routing Decision Models
//!
//! Serde models for the decision payload served by the routing backend
//! (`GET /decisions`) and for on-disk JSONL decision logs.
//!
//! Field names follow the dashboard-facing schema. The backend's older
//! column names (`supplier_country`, `continent`) are accepted as aliases
//! so both payload generations decode without a migration.

use serde::{Deserialize, Serialize};

/// One classified invoice routing decision.
///
/// Every field except `confidence` is optional: upstream classifiers emit
/// partial records, and the dashboard degrades per field (aggregations fall
/// back to `UNKNOWN`, filters never match an absent value) instead of
/// rejecting the whole record. A missing `confidence` decodes as `0.0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Decision {
    /// Invoice identifier, when the pipeline carried one through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,

    /// Predicted supplier country code (`US`, `DE`, ...).
    #[serde(
        default,
        alias = "supplier_country",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted_country: Option<String>,

    /// Routing region (`APAC`, `EMEA`, `AMER`).
    #[serde(default, alias = "continent", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Primary transport mode (`SEA`, `AIR`, `ROAD_RAIL`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_transport: Option<String>,

    /// Fallback transport mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_transport: Option<String>,

    /// Compound routing code, `<region>-<primary_transport>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_code: Option<String>,

    /// Classifier confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
}

/// Provenance block attached to every decisions payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionsMeta {
    /// Producer of the records (`routing-pipeline`, `file`).
    pub source: String,

    /// Number of decisions in the payload.
    pub count: u64,

    /// RFC 3339 generation timestamp, when the producer stamped one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// Full response body of `GET /decisions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionsPayload {
    pub meta: DecisionsMeta,
    #[serde(default)]
    pub decisions: Vec<Decision>,
}
