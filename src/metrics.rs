use std::sync::Mutex;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

// Histogram buckets (ms) for classifier latency
static INFERENCE_LATENCY_BUCKETS: &[u64] = &[5, 10, 25, 50, 100, 250, 500, 1000, 2500, 5000];

#[derive(Default, Debug, Clone)]
pub struct Histogram { pub buckets: Vec<u64>, pub counts: Vec<u64>, pub sum: u128, pub total: u64 }

impl Histogram {
    pub fn new(buckets: &[u64]) -> Self { Self { buckets: buckets.to_vec(), counts: vec![0; buckets.len() + 1], sum: 0, total: 0 } }

    pub fn record(&mut self, v_ms: u64) {
        self.total += 1;
        self.sum += v_ms as u128;
        let slot = self.buckets.iter().position(|b| v_ms <= *b).unwrap_or(self.buckets.len());
        self.counts[slot] += 1;
    }
}

pub static INFERENCE_LATENCY: Lazy<Mutex<Histogram>> = Lazy::new(|| Mutex::new(Histogram::new(INFERENCE_LATENCY_BUCKETS)));
static STARTED_AT: Lazy<chrono::DateTime<chrono::Utc>> = Lazy::new(chrono::Utc::now);

// Request outcome counters
pub static PREDICTIONS_OK: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static VALIDATION_FAILURES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static DECODE_FAILURES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static INFERENCE_FAILURES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static OTHER_FAILURES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

/// Pins the uptime origin; call once at startup
pub fn mark_started() { Lazy::force(&STARTED_AT); }

pub fn record_inference_latency(ms: u64) { if let Ok(mut h) = INFERENCE_LATENCY.lock() { h.record(ms); } }
pub fn record_prediction_ok() { PREDICTIONS_OK.fetch_add(1, Ordering::Relaxed); }

pub fn record_failure(kind: &str) {
    let counter = match kind {
        "validation" => &VALIDATION_FAILURES,
        "decode" => &DECODE_FAILURES,
        "inference" => &INFERENCE_FAILURES,
        _ => &OTHER_FAILURES,
    };
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn export_metrics_json() -> serde_json::Value {
    let h = INFERENCE_LATENCY.lock().ok();
    serde_json::json!({
        "started_at": STARTED_AT.to_rfc3339(),
        "inference_latency_ms": h.map(|hh| serde_json::json!({
            "buckets": hh.buckets,
            "counts": hh.counts,
            "sum_ms": hh.sum,
            "total": hh.total,
        })).unwrap_or(serde_json::json!(null)),
        "requests": {
            "predictions_ok": PREDICTIONS_OK.load(Ordering::Relaxed),
            "validation_failures": VALIDATION_FAILURES.load(Ordering::Relaxed),
            "decode_failures": DECODE_FAILURES.load(Ordering::Relaxed),
            "inference_failures": INFERENCE_FAILURES.load(Ordering::Relaxed),
            "other_failures": OTHER_FAILURES.load(Ordering::Relaxed)
        }
    })
}
