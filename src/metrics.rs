//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{
    Counter, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("modam_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "modam_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Counter synchronizer metrics
    pub static ref COUNTER_SYNC_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("modam_counter_sync_total", "Counter synchronizer outcomes"),
        &["counter", "path"]
    ).expect("metric can be created");

    // Board metrics
    pub static ref POSTS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "modam_posts_created_total",
        "Total number of posts created"
    ).expect("metric can be created");
    pub static ref COMMENTS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "modam_comments_created_total",
        "Total number of comments created"
    ).expect("metric can be created");

    // Diagnosis metrics
    pub static ref DIAGNOSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("modam_diagnoses_total", "Total number of mock diagnoses, by stage"),
        &["stage"]
    ).expect("metric can be created");
    pub static ref LEDGER_SIZE: IntGauge = IntGauge::new(
        "modam_diagnosis_ledger_size",
        "Current number of entries in the local diagnosis ledger"
    ).expect("metric can be created");

    // Storage metrics
    pub static ref IMAGE_UPLOADS_TOTAL: IntCounter = IntCounter::new(
        "modam_image_uploads_total",
        "Total number of image uploads"
    ).expect("metric can be created");
    pub static ref IMAGE_BYTES_UPLOADED: Counter = Counter::new(
        "modam_image_bytes_uploaded_total",
        "Total bytes of images uploaded"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("modam_errors_total", "Total number of errors"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");
}

/// Register every instrument with the global registry.
///
/// Call once at startup; registering twice panics on the duplicate.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(COUNTER_SYNC_TOTAL.clone()),
        Box::new(POSTS_CREATED_TOTAL.clone()),
        Box::new(COMMENTS_CREATED_TOTAL.clone()),
        Box::new(DIAGNOSES_TOTAL.clone()),
        Box::new(LEDGER_SIZE.clone()),
        Box::new(IMAGE_UPLOADS_TOTAL.clone()),
        Box::new(IMAGE_BYTES_UPLOADED.clone()),
        Box::new(ERRORS_TOTAL.clone()),
    ];
    for collector in collectors {
        REGISTRY
            .register(collector)
            .expect("metric can be registered");
    }

    tracing::info!("Metrics registry initialized");
}
