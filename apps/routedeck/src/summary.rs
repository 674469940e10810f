//! # Headless Summary
//!
//! One-shot rendering of the dashboard aggregates: fetch, filter, print.
//! Useful for scripting and for checking a backend without entering the TUI.

use std::sync::Arc;

use anyhow::Context;

use routedeck_core::aggregate::{self, BandCount, CategoryCount, TransportCount};
use routedeck_core::decision::{Decision, DecisionsMeta};
use routedeck_core::filters::Filters;
use routedeck_core::source::DecisionSource;

/// Fetch once, apply filters and print the aggregate view.
///
/// Unlike the TUI there is no stale-data fallback here; a failed fetch is a
/// failed run.
pub async fn run_summary(
    source: Arc<dyn DecisionSource>,
    filters: Filters,
    json: bool,
) -> anyhow::Result<()> {
    let payload = source
        .fetch()
        .await
        .with_context(|| format!("fetching decisions from {}", source.describe()))?;

    let filtered = filters.apply(&payload.decisions);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json_summary(&payload.meta, &filters, &filtered))?
        );
    } else {
        print!("{}", render_tables(&payload.meta, &filters, &filtered));
    }

    Ok(())
}

fn json_summary(
    meta: &DecisionsMeta,
    filters: &Filters,
    decisions: &[Decision],
) -> serde_json::Value {
    serde_json::json!({
        "meta": meta,
        "filters": filters,
        "filtered_count": decisions.len(),
        "countries": aggregate::country_counts(decisions),
        "regions": aggregate::region_counts(decisions),
        "transport": aggregate::transport_counts(decisions),
        "routing_codes": aggregate::routing_code_counts(decisions),
        "confidence_histogram": aggregate::confidence_histogram(decisions),
        "confidence_split": aggregate::confidence_split(decisions),
    })
}

// ---------------------------------------------------------------------------
// Text tables
// ---------------------------------------------------------------------------

fn render_tables(meta: &DecisionsMeta, filters: &Filters, decisions: &[Decision]) -> String {
    let mut out = String::new();

    out.push_str("Routing Decisions Summary\n");
    out.push_str(&format!(
        "source: {}  count: {}  showing: {}\n",
        meta.source,
        meta.count,
        decisions.len()
    ));
    if let Some(ts) = &meta.generated_at {
        out.push_str(&format!("generated: {}\n", ts));
    }
    if !filters.is_empty() {
        let parts: Vec<String> = filters
            .active()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        out.push_str(&format!("filters: {}\n", parts.join(" ")));
    }
    out.push('\n');

    push_category_table(
        &mut out,
        "Supplier Country Distribution",
        &aggregate::country_counts(decisions),
    );
    push_category_table(
        &mut out,
        "Region / Continent Distribution",
        &aggregate::region_counts(decisions),
    );
    push_transport_table(&mut out, &aggregate::transport_counts(decisions));
    push_category_table(
        &mut out,
        "Routing Code Breakdown",
        &aggregate::routing_code_counts(decisions),
    );
    push_category_table(
        &mut out,
        "Confidence Score Distribution",
        &aggregate::confidence_histogram(decisions),
    );
    push_split_table(&mut out, &aggregate::confidence_split(decisions));

    out
}

fn push_category_table(out: &mut String, title: &str, rows: &[CategoryCount]) {
    out.push_str(title);
    out.push('\n');
    if rows.iter().all(|r| r.count == 0) {
        out.push_str("  (no data)\n\n");
        return;
    }
    out.push_str(&format!("  {:<24} {:>7}\n", "CATEGORY", "COUNT"));
    for row in rows {
        out.push_str(&format!("  {:<24} {:>7}\n", row.label, row.count));
    }
    out.push('\n');
}

fn push_transport_table(out: &mut String, rows: &[TransportCount]) {
    out.push_str("Transport Mode Distribution\n");
    if rows.iter().all(|r| r.primary == 0 && r.secondary == 0) {
        out.push_str("  (no data)\n\n");
        return;
    }
    out.push_str(&format!("  {:<16} {:>8} {:>10}\n", "MODE", "PRIMARY", "SECONDARY"));
    for row in rows {
        out.push_str(&format!(
            "  {:<16} {:>8} {:>10}\n",
            row.mode, row.primary, row.secondary
        ));
    }
    out.push('\n');
}

fn push_split_table(out: &mut String, rows: &[BandCount]) {
    out.push_str("Confidence Level Split\n");
    if rows.iter().all(|r| r.count == 0) {
        out.push_str("  (no data)\n\n");
        return;
    }
    out.push_str(&format!("  {:<22} {:>7}\n", "BAND", "COUNT"));
    for row in rows {
        out.push_str(&format!("  {:<22} {:>7}\n", row.band.chart_label(), row.count));
    }
    out.push('\n');
}
