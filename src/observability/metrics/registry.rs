//! # Metrics Registry
//!
//! The process-global registry every metric family is registered into. The
//! reconcile loop writes to it and the `/metrics` handler reads from it; the
//! `prometheus` types are internally synchronized.

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Render every registered family in the Prometheus text exposition format
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
}
