use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder
///
/// Fails if a recorder is already installed (only one per process).
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "telescope_mcp_tool_calls_total",
        "Total number of tool calls by outcome"
    );
    describe_counter!(
        "telescope_mcp_rpc_requests_total",
        "Total number of JSON-RPC requests by method"
    );
    describe_histogram!(
        "telescope_mcp_tool_call_duration_seconds",
        "Tool call duration in seconds"
    );
    describe_gauge!(
        "telescope_mcp_info",
        "Server version information"
    );

    gauge!("telescope_mcp_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record a finished tool call
pub fn record_tool_call(tool: &str, outcome: &str, duration: Duration) {
    counter!(
        "telescope_mcp_tool_calls_total",
        "tool" => tool.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);

    histogram!(
        "telescope_mcp_tool_call_duration_seconds",
        "tool" => tool.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record a JSON-RPC request under one of a fixed set of method labels
pub fn record_rpc_request(method: &'static str) {
    counter!(
        "telescope_mcp_rpc_requests_total",
        "method" => method,
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_is_noop() {
        // No global recorder in unit tests; the facade drops the samples
        record_tool_call("queries", "success", Duration::from_millis(5));
        record_rpc_request("tools/call");
    }

    #[test]
    fn test_local_recorder_renders_tool_calls() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_tool_call("queries", "success", Duration::from_millis(5));
        });

        let rendered = handle.render();
        assert!(rendered.contains("telescope_mcp_tool_calls_total"));
        assert!(rendered.contains("tool=\"queries\""));
    }
}
