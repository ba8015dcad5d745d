//! Registry metrics.
//!
//! # Metrics
//! - `config_registry_bootstrap_total` (counter): first-time initializations by outcome
//! - `config_registry_load_total` (counter): document loads by format, outcome
//! - `config_registry_save_total` (counter): document saves by format, outcome
//! - `config_registry_entries` (gauge): initialized configurations held by a registry

use crate::format::Format;

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

/// Record the end of a bootstrap attempt.
pub fn record_bootstrap(ok: bool) {
    metrics::counter!("config_registry_bootstrap_total", "outcome" => outcome(ok)).increment(1);
}

/// Record a document load.
pub fn record_load(format: Format, ok: bool) {
    metrics::counter!(
        "config_registry_load_total",
        "format" => format.name(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}

/// Record a document save.
pub fn record_save(format: Format, ok: bool) {
    metrics::counter!(
        "config_registry_save_total",
        "format" => format.name(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}

/// Record how many configurations a registry holds.
pub fn record_entries(count: usize) {
    metrics::gauge!("config_registry_entries").set(count as f64);
}
