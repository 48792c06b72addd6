//! Engine statistics
//!
//! Lock-free counters updated by the engine thread plus a bounded
//! latency window for percentile queries. Snapshots are serializable so
//! outer surfaces can expose them as-is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

/// Bounded window of latency samples.
pub struct LatencyWindow {
    samples: Vec<u64>,
    max_samples: usize,
}

impl LatencyWindow {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples,
        }
    }

    /// Record a sample, evicting the oldest when the window is full.
    pub fn record(&mut self, value: u64) {
        if self.samples.len() >= self.max_samples {
            self.samples.remove(0);
        }
        self.samples.push(value);
    }

    /// Percentile value (0-100) over the current window.
    pub fn percentile(&self, p: usize) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        let idx = (p as f64 / 100.0 * (sorted.len() - 1) as f64) as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn average(&self) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum / self.samples.len() as u64)
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

/// Counters owned by the engine, readable from any thread.
pub struct EngineStats {
    processed_orders: AtomicU64,
    processed_trades: AtomicU64,
    unknown_symbol_drops: AtomicU64,
    trade_ring_drops: AtomicU64,
    last_process_ns: AtomicU64,
    latency_ns: Mutex<LatencyWindow>,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            processed_orders: AtomicU64::new(0),
            processed_trades: AtomicU64::new(0),
            unknown_symbol_drops: AtomicU64::new(0),
            trade_ring_drops: AtomicU64::new(0),
            last_process_ns: AtomicU64::new(0),
            latency_ns: Mutex::new(LatencyWindow::new(1000)),
        }
    }

    /// Record one processed order and its matching latency.
    pub fn record_order(&self, latency_ns: u64) {
        self.processed_orders.fetch_add(1, Ordering::Relaxed);
        self.last_process_ns.store(latency_ns, Ordering::Relaxed);
        if let Ok(mut window) = self.latency_ns.lock() {
            window.record(latency_ns);
        }
    }

    pub fn record_trade(&self) {
        self.processed_trades.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_symbol(&self) {
        self.unknown_symbol_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trade_ring_drop(&self) {
        self.trade_ring_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed_orders(&self) -> u64 {
        self.processed_orders.load(Ordering::Relaxed)
    }

    pub fn processed_trades(&self) -> u64 {
        self.processed_trades.load(Ordering::Relaxed)
    }

    pub fn unknown_symbol_drops(&self) -> u64 {
        self.unknown_symbol_drops.load(Ordering::Relaxed)
    }

    pub fn trade_ring_drops(&self) -> u64 {
        self.trade_ring_drops.load(Ordering::Relaxed)
    }

    pub fn last_process_ns(&self) -> u64 {
        self.last_process_ns.load(Ordering::Relaxed)
    }

    /// p-th percentile of recent matching latencies, in nanoseconds.
    pub fn latency_percentile(&self, p: usize) -> Option<u64> {
        self.latency_ns.lock().ok().and_then(|window| window.percentile(p))
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the engine for status surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatistics {
    pub processed_orders: u64,
    pub processed_trades: u64,
    pub discarded_slots: u64,
    pub unknown_symbol_drops: u64,
    pub trade_ring_drops: u64,
    pub last_process_ns: u64,
    pub order_ring_size: u64,
    pub trade_ring_size: u64,
    pub symbol_count: usize,
    pub running: bool,
    pub timestamp: u64,
}

impl EngineStatistics {
    pub fn last_process_micros(&self) -> f64 {
        self.last_process_ns as f64 / 1_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_order_updates_counters() {
        let stats = EngineStats::new();
        stats.record_order(500);
        stats.record_order(1_500);

        assert_eq!(stats.processed_orders(), 2);
        assert_eq!(stats.last_process_ns(), 1_500);
    }

    #[test]
    fn test_latency_percentiles() {
        let stats = EngineStats::new();
        for i in 1..=100 {
            stats.record_order(i);
        }

        let p50 = stats.latency_percentile(50).unwrap();
        assert!((49..=51).contains(&p50));
        let p99 = stats.latency_percentile(99).unwrap();
        assert!(p99 >= 98);
    }

    #[test]
    fn test_window_eviction() {
        let mut window = LatencyWindow::new(3);
        for v in [10, 20, 30, 40] {
            window.record(v);
        }

        assert_eq!(window.count(), 3);
        assert_eq!(window.average().unwrap(), 30);
    }

    #[test]
    fn test_statistics_serializes() {
        let stats = EngineStatistics {
            processed_orders: 10,
            processed_trades: 4,
            discarded_slots: 0,
            unknown_symbol_drops: 1,
            trade_ring_drops: 0,
            last_process_ns: 2_500,
            order_ring_size: 0,
            trade_ring_size: 4,
            symbol_count: 5,
            running: true,
            timestamp: 99,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"processed_orders\":10"));
        assert!((stats.last_process_micros() - 2.5).abs() < f64::EPSILON);
    }
}
