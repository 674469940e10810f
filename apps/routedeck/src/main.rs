//! # routedeck
//!
//! Terminal dashboard for invoice routing decisions produced by the
//! routing classification pipeline.

fn main() -> anyhow::Result<()> {
    routedeck::run()
}
