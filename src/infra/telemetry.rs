use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "bazari_cache_memory_hit_total",
            Unit::Count,
            "Total number of in-memory snapshot hits."
        );
        describe_counter!(
            "bazari_cache_memory_miss_total",
            Unit::Count,
            "Total number of in-memory snapshot misses (including stale reads)."
        );
        describe_counter!(
            "bazari_cache_file_hit_total",
            Unit::Count,
            "Total number of listing reads answered from the snapshot file."
        );
        describe_counter!(
            "bazari_cache_stale_served_total",
            Unit::Count,
            "Total number of listing reads served a stale payload during an outage."
        );
        describe_counter!(
            "bazari_cache_events_consumed_total",
            Unit::Count,
            "Total number of cache invalidation events consumed."
        );
        describe_counter!(
            "bazari_cache_rebuild_failed_total",
            Unit::Count,
            "Total number of snapshot rebuild attempts that failed."
        );
        describe_counter!(
            "bazari_snapshot_warm_start_total",
            Unit::Count,
            "Total number of process starts served from a fresh snapshot file."
        );
        describe_histogram!(
            "bazari_snapshot_rebuild_seconds",
            Unit::Seconds,
            "Snapshot rebuild latency in seconds."
        );
    });
}
