//! Request metrics for the forecast service
//!
//! Counts forecast requests by outcome and accumulates time spent in model
//! prediction and chart rendering. Exposed in Prometheus text format at
//! `GET /metrics`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ErrorKind;

/// Shared, lock-free metrics collector
///
/// Cloning is cheap; all clones update the same counters.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    total_requests: Arc<AtomicUsize>,
    successful_requests: Arc<AtomicUsize>,
    invalid_input: Arc<AtomicUsize>,
    invalid_computation: Arc<AtomicUsize>,
    internal_errors: Arc<AtomicUsize>,
    /// Microseconds spent in model prediction
    prediction_time_us: Arc<AtomicU64>,
    /// Microseconds spent rendering and encoding charts
    render_time_us: Arc<AtomicU64>,
    start_time: Instant,
}

impl MetricsCollector {
    /// Create a new metrics collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(AtomicUsize::new(0)),
            successful_requests: Arc::new(AtomicUsize::new(0)),
            invalid_input: Arc::new(AtomicUsize::new(0)),
            invalid_computation: Arc::new(AtomicUsize::new(0)),
            internal_errors: Arc::new(AtomicUsize::new(0)),
            prediction_time_us: Arc::new(AtomicU64::new(0)),
            render_time_us: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Record a forecast that produced a response
    #[allow(clippy::cast_possible_truncation)]
    pub fn record_success(&self, prediction: Duration, render: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.prediction_time_us
            .fetch_add(prediction.as_micros() as u64, Ordering::Relaxed);
        self.render_time_us
            .fetch_add(render.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a failed forecast by error kind
    pub fn record_failure(&self, kind: ErrorKind) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let counter = match kind {
            ErrorKind::InvalidInput => &self.invalid_input,
            ErrorKind::InvalidComputation => &self.invalid_computation,
            ErrorKind::Internal | ErrorKind::Boot => &self.internal_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let invalid_input = self.invalid_input.load(Ordering::Relaxed);
        let invalid_computation = self.invalid_computation.load(Ordering::Relaxed);
        let internal = self.internal_errors.load(Ordering::Relaxed);
        let prediction_us = self.prediction_time_us.load(Ordering::Relaxed);
        let render_us = self.render_time_us.load(Ordering::Relaxed);
        let failed = invalid_input + invalid_computation + internal;
        let per_success_ms = |us: u64| {
            if successful > 0 {
                (us as f64 / 1000.0) / successful as f64
            } else {
                0.0
            }
        };

        MetricsSnapshot {
            total_requests,
            successful_requests: successful,
            failed_requests: failed,
            invalid_input,
            invalid_computation,
            internal_errors: internal,
            prediction_time_us: prediction_us,
            render_time_us: render_us,
            uptime_secs: self.start_time.elapsed().as_secs(),
            avg_prediction_ms: per_success_ms(prediction_us),
            avg_render_ms: per_success_ms(render_us),
            error_rate: if total_requests > 0 {
                failed as f64 / total_requests as f64
            } else {
                0.0
            },
        }
    }

    /// Export metrics in Prometheus text format
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        format!(
            "# HELP pronosticar_requests_total Forecast requests received\n\
             # TYPE pronosticar_requests_total counter\n\
             pronosticar_requests_total {}\n\
             # HELP pronosticar_requests_successful Forecasts returned\n\
             # TYPE pronosticar_requests_successful counter\n\
             pronosticar_requests_successful {}\n\
             # HELP pronosticar_requests_failed Failed forecasts by kind\n\
             # TYPE pronosticar_requests_failed counter\n\
             pronosticar_requests_failed{{kind=\"invalid_input\"}} {}\n\
             pronosticar_requests_failed{{kind=\"invalid_computation\"}} {}\n\
             pronosticar_requests_failed{{kind=\"internal\"}} {}\n\
             # HELP pronosticar_prediction_time_seconds Time spent in model prediction\n\
             # TYPE pronosticar_prediction_time_seconds counter\n\
             pronosticar_prediction_time_seconds {:.6}\n\
             # HELP pronosticar_render_time_seconds Time spent rendering charts\n\
             # TYPE pronosticar_render_time_seconds counter\n\
             pronosticar_render_time_seconds {:.6}\n\
             # HELP pronosticar_error_rate Error rate (0.0-1.0)\n\
             # TYPE pronosticar_error_rate gauge\n\
             pronosticar_error_rate {:.4}\n\
             # HELP pronosticar_uptime_seconds Uptime in seconds\n\
             # TYPE pronosticar_uptime_seconds counter\n\
             pronosticar_uptime_seconds {}\n",
            s.total_requests,
            s.successful_requests,
            s.invalid_input,
            s.invalid_computation,
            s.internal_errors,
            s.prediction_time_us as f64 / 1_000_000.0,
            s.render_time_us as f64 / 1_000_000.0,
            s.error_rate,
            s.uptime_secs
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Forecast requests received
    pub total_requests: usize,
    /// Forecasts returned
    pub successful_requests: usize,
    /// Sum of all failure kinds
    pub failed_requests: usize,
    /// Requests rejected as bad input
    pub invalid_input: usize,
    /// Requests whose CPA band could not be computed
    pub invalid_computation: usize,
    /// Model or render failures
    pub internal_errors: usize,
    /// Total prediction time in microseconds
    pub prediction_time_us: u64,
    /// Total render time in microseconds
    pub render_time_us: u64,
    /// Seconds since the collector was created
    pub uptime_secs: u64,
    /// Mean prediction time per successful forecast
    pub avg_prediction_ms: f64,
    /// Mean render time per successful forecast
    pub avg_render_ms: f64,
    /// Failed fraction of all requests
    pub error_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_collector_creation() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.successful_requests, 0);
        assert_eq!(snapshot.failed_requests, 0);
        assert_eq!(snapshot.error_rate, 0.0);
        assert_eq!(snapshot.avg_render_ms, 0.0);
    }

    #[test]
    fn test_record_success_accumulates_time() {
        let metrics = MetricsCollector::new();
        metrics.record_success(Duration::from_millis(2), Duration::from_millis(30));
        metrics.record_success(Duration::from_millis(4), Duration::from_millis(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.successful_requests, 2);
        assert!((snapshot.avg_prediction_ms - 3.0).abs() < 0.01);
        assert!((snapshot.avg_render_ms - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_failures_by_kind() {
        let metrics = MetricsCollector::new();
        metrics.record_failure(ErrorKind::InvalidInput);
        metrics.record_failure(ErrorKind::InvalidInput);
        metrics.record_failure(ErrorKind::InvalidComputation);
        metrics.record_failure(ErrorKind::Internal);
        metrics.record_success(Duration::ZERO, Duration::ZERO);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 5);
        assert_eq!(snapshot.failed_requests, 4);
        assert_eq!(snapshot.invalid_input, 2);
        assert_eq!(snapshot.invalid_computation, 1);
        assert_eq!(snapshot.internal_errors, 1);
        assert!((snapshot.error_rate - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = MetricsCollector::new();
        metrics.record_success(Duration::from_millis(1), Duration::from_millis(5));
        metrics.record_failure(ErrorKind::InvalidComputation);

        let prom = metrics.to_prometheus();
        assert!(prom.contains("# TYPE pronosticar_requests_total counter"));
        assert!(prom.contains("pronosticar_requests_total 2"));
        assert!(prom.contains("pronosticar_requests_successful 1"));
        assert!(prom.contains("pronosticar_requests_failed{kind=\"invalid_computation\"} 1"));
        assert!(prom.contains("pronosticar_requests_failed{kind=\"invalid_input\"} 0"));
        assert!(prom.contains("pronosticar_error_rate 0.5000"));
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = MetricsCollector::new();
        let metrics_clone = metrics.clone();

        let handle = thread::spawn(move || {
            for _ in 0..100 {
                metrics_clone.record_success(Duration::from_micros(10), Duration::from_micros(10));
            }
        });
        for _ in 0..100 {
            metrics.record_failure(ErrorKind::InvalidInput);
        }
        handle.join().expect("thread");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 200);
        assert_eq!(snapshot.successful_requests, 100);
        assert_eq!(snapshot.invalid_input, 100);
    }
}
