//! # Chart Aggregations
//!
//! Pure single-pass aggregations feeding the six dashboard panels. Each
//! function takes the already-filtered decision list and returns plain rows;
//! rendering (bars, placeholders for empty input) stays in the app crate.
//!
//! Category rows keep first-seen order, so the panels stay visually stable
//! across re-renders of the same payload instead of reshuffling by count.

use serde::Serialize;

use crate::decision::Decision;
use crate::filters::ConfidenceBand;

/// Fallback category for records missing the grouped field.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Bucket labels of the confidence histogram, in bucket order.
pub const HISTOGRAM_LABELS: [&str; 7] = [
    "0.00–0.05",
    "0.05–0.07",
    "0.07–0.09",
    "0.09–0.11",
    "0.11–0.13",
    "0.13–0.15",
    "0.15+",
];

/// One labeled count row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

/// One transport mode with both series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportCount {
    pub mode: String,
    pub primary: u64,
    pub secondary: u64,
}

/// One confidence band with its population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandCount {
    pub band: ConfidenceBand,
    pub count: u64,
}

fn bump(rows: &mut Vec<CategoryCount>, label: &str) {
    if let Some(row) = rows.iter_mut().find(|r| r.label == label) {
        row.count += 1;
    } else {
        rows.push(CategoryCount {
            label: label.to_string(),
            count: 1,
        });
    }
}

/// Decisions per predicted country, missing country grouped as `UNKNOWN`.
pub fn country_counts(decisions: &[Decision]) -> Vec<CategoryCount> {
    let mut rows = Vec::new();
    for d in decisions {
        bump(&mut rows, d.predicted_country.as_deref().unwrap_or(UNKNOWN_LABEL));
    }
    rows
}

/// Decisions per region, grouped by raw value with an `UNKNOWN` fallback.
/// Unexpected region strings get their own row rather than being dropped.
pub fn region_counts(decisions: &[Decision]) -> Vec<CategoryCount> {
    let mut rows = Vec::new();
    for d in decisions {
        bump(&mut rows, d.region.as_deref().unwrap_or(UNKNOWN_LABEL));
    }
    rows
}

fn transport_row(rows: &mut Vec<TransportCount>, mode: &str) -> usize {
    match rows.iter().position(|r| r.mode == mode) {
        Some(idx) => idx,
        None => {
            rows.push(TransportCount {
                mode: mode.to_string(),
                primary: 0,
                secondary: 0,
            });
            rows.len() - 1
        }
    }
}

/// Decisions per transport mode, primary and secondary as separate series
/// over the union of modes. Modes seen as primary come first, then modes
/// that only ever appear as secondary; records missing a mode contribute
/// nothing to that series.
pub fn transport_counts(decisions: &[Decision]) -> Vec<TransportCount> {
    let mut rows = Vec::new();
    for d in decisions {
        if let Some(mode) = d.primary_transport.as_deref() {
            let idx = transport_row(&mut rows, mode);
            rows[idx].primary += 1;
        }
    }
    for d in decisions {
        if let Some(mode) = d.secondary_transport.as_deref() {
            let idx = transport_row(&mut rows, mode);
            rows[idx].secondary += 1;
        }
    }
    rows
}

/// Decisions per routing code, missing code grouped as `UNKNOWN`.
pub fn routing_code_counts(decisions: &[Decision]) -> Vec<CategoryCount> {
    let mut rows = Vec::new();
    for d in decisions {
        bump(&mut rows, d.routing_code.as_deref().unwrap_or(UNKNOWN_LABEL));
    }
    rows
}

/// Split a routing code into `(region, transport)` at the first hyphen.
///
/// Returns `None` for codes without a hyphen or with an empty side; callers
/// treat that as "apply no filter" so a malformed code never half-applies.
pub fn parse_routing_code(code: &str) -> Option<(&str, &str)> {
    let (region, transport) = code.split_once('-')?;
    if region.is_empty() || transport.is_empty() {
        return None;
    }
    Some((region, transport))
}

fn histogram_bucket(confidence: f64) -> usize {
    if confidence < 0.05 {
        0
    } else if confidence < 0.07 {
        1
    } else if confidence < 0.09 {
        2
    } else if confidence < 0.11 {
        3
    } else if confidence < 0.13 {
        4
    } else if confidence < 0.15 {
        5
    } else {
        6
    }
}

/// Confidence histogram over seven fixed buckets, tuned for the narrow
/// score range this classifier actually emits. All seven rows are always
/// returned, zeros included.
pub fn confidence_histogram(decisions: &[Decision]) -> Vec<CategoryCount> {
    let mut rows: Vec<CategoryCount> = HISTOGRAM_LABELS
        .iter()
        .map(|label| CategoryCount {
            label: label.to_string(),
            count: 0,
        })
        .collect();
    for d in decisions {
        rows[histogram_bucket(d.confidence)].count += 1;
    }
    rows
}

/// Population of the three confidence bands (same boundaries as the band
/// filter). All three rows are always returned, zeros included.
pub fn confidence_split(decisions: &[Decision]) -> Vec<BandCount> {
    let mut rows: Vec<BandCount> = ConfidenceBand::ALL
        .iter()
        .map(|&band| BandCount { band, count: 0 })
        .collect();
    for d in decisions {
        let idx = match ConfidenceBand::of(d.confidence) {
            ConfidenceBand::Low => 0,
            ConfidenceBand::Medium => 1,
            ConfidenceBand::High => 2,
        };
        rows[idx].count += 1;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision() -> Decision {
        Decision::default()
    }

    fn with_country(country: Option<&str>) -> Decision {
        Decision {
            predicted_country: country.map(str::to_string),
            ..decision()
        }
    }

    fn with_transport(primary: Option<&str>, secondary: Option<&str>) -> Decision {
        Decision {
            primary_transport: primary.map(str::to_string),
            secondary_transport: secondary.map(str::to_string),
            ..decision()
        }
    }

    fn with_confidence(confidence: f64) -> Decision {
        Decision {
            confidence,
            ..decision()
        }
    }

    #[test]
    fn test_country_counts_first_seen_order_with_unknown() {
        let decisions = vec![
            with_country(Some("US")),
            with_country(None),
            with_country(Some("DE")),
            with_country(Some("US")),
        ];

        let rows = country_counts(&decisions);
        assert_eq!(
            rows,
            vec![
                CategoryCount { label: "US".into(), count: 2 },
                CategoryCount { label: "UNKNOWN".into(), count: 1 },
                CategoryCount { label: "DE".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_region_counts_keep_unexpected_values() {
        let decisions = vec![
            Decision { region: Some("EMEA".into()), ..decision() },
            Decision { region: Some("LATAM".into()), ..decision() },
            Decision { region: None, ..decision() },
        ];

        let labels: Vec<_> = region_counts(&decisions)
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels, vec!["EMEA", "LATAM", "UNKNOWN"]);
    }

    #[test]
    fn test_transport_counts_dual_series_union() {
        let decisions = vec![
            with_transport(Some("SEA"), Some("AIR")),
            with_transport(Some("AIR"), Some("ROAD")),
            with_transport(None, Some("RAIL")),
        ];

        let rows = transport_counts(&decisions);
        assert_eq!(
            rows,
            vec![
                TransportCount { mode: "SEA".into(), primary: 1, secondary: 0 },
                TransportCount { mode: "AIR".into(), primary: 1, secondary: 1 },
                TransportCount { mode: "ROAD".into(), primary: 0, secondary: 1 },
                TransportCount { mode: "RAIL".into(), primary: 0, secondary: 1 },
            ]
        );
    }

    #[test]
    fn test_routing_code_counts_with_unknown() {
        let decisions = vec![
            Decision { routing_code: Some("APAC-SEA".into()), ..decision() },
            Decision { routing_code: None, ..decision() },
            Decision { routing_code: Some("APAC-SEA".into()), ..decision() },
        ];

        let rows = routing_code_counts(&decisions);
        assert_eq!(rows[0], CategoryCount { label: "APAC-SEA".into(), count: 2 });
        assert_eq!(rows[1], CategoryCount { label: "UNKNOWN".into(), count: 1 });
    }

    #[test]
    fn test_parse_routing_code() {
        assert_eq!(parse_routing_code("EMEA-SEA"), Some(("EMEA", "SEA")));
        assert_eq!(parse_routing_code("AMER-ROAD_RAIL"), Some(("AMER", "ROAD_RAIL")));
        // Split happens at the first hyphen only.
        assert_eq!(parse_routing_code("EMEA-ROAD-RAIL"), Some(("EMEA", "ROAD-RAIL")));

        assert_eq!(parse_routing_code("MALFORMED"), None);
        assert_eq!(parse_routing_code("UNKNOWN"), None);
        assert_eq!(parse_routing_code("-SEA"), None);
        assert_eq!(parse_routing_code("EMEA-"), None);
    }

    #[test]
    fn test_histogram_bucket_edges() {
        assert_eq!(histogram_bucket(0.0), 0);
        assert_eq!(histogram_bucket(0.049), 0);
        assert_eq!(histogram_bucket(0.05), 1);
        assert_eq!(histogram_bucket(0.07), 2);
        assert_eq!(histogram_bucket(0.09), 3);
        assert_eq!(histogram_bucket(0.11), 4);
        assert_eq!(histogram_bucket(0.13), 5);
        assert_eq!(histogram_bucket(0.149), 5);
        assert_eq!(histogram_bucket(0.15), 6);
        assert_eq!(histogram_bucket(0.9), 6);
    }

    #[test]
    fn test_confidence_histogram_counts_every_record_once() {
        let decisions: Vec<Decision> = [0.0, 0.05, 0.08, 0.101, 0.12, 0.31]
            .iter()
            .map(|&c| with_confidence(c))
            .collect();

        let rows = confidence_histogram(&decisions);
        assert_eq!(rows.len(), 7);
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, HISTOGRAM_LABELS);

        let total: u64 = rows.iter().map(|r| r.count).sum();
        assert_eq!(total, decisions.len() as u64);
        // Missing confidence decodes to 0.0 and lands in the first bucket.
        assert_eq!(confidence_histogram(&[decision()])[0].count, 1);
    }

    #[test]
    fn test_confidence_split_bands_and_labels() {
        let decisions: Vec<Decision> = [0.02, 0.08, 0.10, 0.15]
            .iter()
            .map(|&c| with_confidence(c))
            .collect();

        let rows = confidence_split(&decisions);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].band.chart_label(), "Low (< 0.08)");
        assert_eq!(rows[1].band.chart_label(), "Medium (0.08–0.10)");
        assert_eq!(rows[2].band.chart_label(), "High (> 0.10)");
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[2].count, 1);
    }

    #[test]
    fn test_aggregations_on_empty_input() {
        assert!(country_counts(&[]).is_empty());
        assert!(transport_counts(&[]).is_empty());
        assert!(confidence_histogram(&[]).iter().all(|r| r.count == 0));
        assert!(confidence_split(&[]).iter().all(|r| r.count == 0));
    }
}
