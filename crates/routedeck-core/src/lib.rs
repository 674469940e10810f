//! # routedeck-core
//!
//! Data layer of the routedeck dashboard: decision payload models, the
//! backend client and file source, the decisions store with its
//! watch-channel broadcast, the cross-filter store, and the chart
//! aggregations.
//!
//! The app crate (`routedeck`) owns all rendering; nothing in here touches
//! the terminal.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod decision;
pub mod filters;
pub mod observability;
pub mod source;
pub mod store;

pub use client::{DecisionsClient, FetchError};
pub use config::{DashConfig, SourceKind};
pub use decision::{Decision, DecisionsMeta, DecisionsPayload};
pub use filters::{ConfidenceBand, FilterError, FilterKey, Filters};
pub use source::{DecisionSource, FileSource, HttpSource};
pub use store::{DecisionsState, DecisionsStore, load_decisions, make_state_channel};
