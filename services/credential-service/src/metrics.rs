//! Prometheus metrics exposition
//!
//! - `credentials_issued_total` (counter): label `reason` (login, rotate)
//! - `refresh_rejected_total` (counter): label `operation` (rotate, logout)
//! - `refresh_revoked_total` (counter)
//! - `login_failures_total` (counter)
//! - `refresh_store_records` (gauge): records physically held by the store

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

pub fn record_credentials_issued(reason: &'static str) {
    metrics::counter!("credentials_issued_total", "reason" => reason).increment(1);
}

pub fn record_refresh_rejected(operation: &'static str) {
    metrics::counter!("refresh_rejected_total", "operation" => operation).increment(1);
}

pub fn record_refresh_revoked(count: usize) {
    metrics::counter!("refresh_revoked_total").increment(count as u64);
}

pub fn record_login_failure() {
    metrics::counter!("login_failures_total").increment(1);
}

pub fn set_store_records(records: usize) {
    metrics::gauge!("refresh_store_records").set(records as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_credentials_issued("login");
        record_refresh_rejected("rotate");
        record_refresh_revoked(3);
        record_login_failure();
        set_store_records(7);
    }

    /// Isolated recorder; the global one can only be installed once per process.
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn issued_and_rejected_carry_labels() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_credentials_issued("login");
        record_credentials_issued("rotate");
        record_refresh_rejected("logout");

        let output = handle.render();
        assert!(output.contains("credentials_issued_total{reason=\"login\"} 1"));
        assert!(output.contains("credentials_issued_total{reason=\"rotate\"} 1"));
        assert!(output.contains("refresh_rejected_total{operation=\"logout\"} 1"));
    }

    #[test]
    fn revoked_counter_adds_the_count() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_refresh_revoked(2);
        record_refresh_revoked(3);
        record_login_failure();

        let output = handle.render();
        assert!(output.contains("refresh_revoked_total 5"), "got:\n{output}");
        assert!(output.contains("login_failures_total 1"), "got:\n{output}");
    }

    #[test]
    fn store_gauge_reflects_last_value() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        set_store_records(10);
        set_store_records(4);

        let output = handle.render();
        assert!(output.contains("refresh_store_records 4"), "got:\n{output}");
    }
}
