use opentelemetry::{KeyValue, metrics::MeterProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider},
};
use std::time::{Duration, Instant};

pub struct Metrics {
    pub requests: opentelemetry::metrics::Counter<u64>,
    pub request_duration: opentelemetry::metrics::Histogram<f64>,
}

impl Metrics {
    pub fn new(provider: &SdkMeterProvider) -> Self {
        let meter = provider.meter("toyland");

        Self {
            requests: meter
                .u64_counter("toyland_requests_total")
                .with_description("Toy requests by operation and outcome")
                .build(),
            request_duration: meter
                .f64_histogram("toyland_request_duration_milliseconds")
                .with_description("Toy request duration")
                .build(),
        }
    }

    /// Count one finished request and its duration.
    pub fn record(&self, operation: &'static str, outcome: &'static str, start: Instant) {
        self.requests.add(
            1,
            &[
                KeyValue::new("operation", operation),
                KeyValue::new("outcome", outcome),
            ],
        );

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.request_duration
            .record(duration_ms, &[KeyValue::new("operation", operation)]);
    }
}

pub fn init_metrics() -> Result<(SdkMeterProvider, Metrics), anyhow::Error> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:18888".to_string());

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "toyland".to_string());

    let resource = Resource::new(vec![KeyValue::new("service.name", service_name)]);

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()?;

    let reader = PeriodicReader::builder(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_interval(Duration::from_secs(15))
        .build();

    let provider = MeterProviderBuilder::default()
        .with_resource(resource)
        .with_reader(reader)
        .build();

    let metrics = Metrics::new(&provider);

    Ok((provider, metrics))
}

/// Metrics backed by a provider with no exporter.
pub fn detached_metrics() -> Metrics {
    Metrics::new(&MeterProviderBuilder::default().build())
}
