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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "elvis_serializer_cache_hit_total",
            Unit::Count,
            "Representations served from the cache, labelled by tier."
        );
        describe_counter!(
            "elvis_serializer_cache_miss_total",
            Unit::Count,
            "Representations computed after a cache miss, labelled by tier."
        );
        describe_counter!(
            "elvis_serializer_downprojection_total",
            Unit::Count,
            "MIN representations projected from a cached richer tier."
        );
        describe_counter!(
            "elvis_cache_evict_total",
            Unit::Count,
            "Cached representations evicted due to capacity."
        );
        describe_histogram!(
            "elvis_cache_warm_ms",
            Unit::Milliseconds,
            "Start-up warm pass latency in milliseconds."
        );
    });
}
