//! Bounded per-host sample history.
//!
//! Each host owns a ring of at most `capacity` samples. Appends for one host
//! take that host's map entry exclusively, so append and eviction happen as
//! one step; hosts living in different shards never contend. Readers clone
//! whole samples out while holding a shared guard, so a half-written sample
//! is never observable.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use dashmap::DashMap;

use crate::metrics::MetricSample;

/// Default number of samples retained per host.
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Fixed-capacity, insertion-ordered sample buffers keyed by host id.
#[derive(Debug)]
pub struct MetricsStore {
    capacity: NonZeroUsize,
    series: DashMap<String, VecDeque<MetricSample>>,
}

impl MetricsStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            series: DashMap::new(),
        }
    }

    /// Maximum number of samples kept per host.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Append a sample to its host's series, evicting the oldest entries
    /// beyond capacity. Returns how many samples were evicted.
    pub fn append(&self, sample: MetricSample) -> usize {
        self.append_then(sample, |_, evicted| evicted)
    }

    /// Append a sample and run `then` on it before the host's entry is
    /// released.
    ///
    /// `then` receives the stored sample and the eviction count. Another
    /// append for the same host waits until `then` returns, so work done
    /// there observes samples in the order they were stored. `then` must not
    /// call back into this store.
    pub fn append_then<R>(&self, sample: MetricSample, then: impl FnOnce(&MetricSample, usize) -> R) -> R {
        let capacity = self.capacity.get();
        let mut series = self.series.entry(sample.host_id.clone()).or_default();
        series.push_back(sample);
        let mut evicted = 0;
        while series.len() > capacity {
            series.pop_front();
            evicted += 1;
        }
        // Capacity is non-zero, so the sample just pushed is still present.
        let stored = &series[series.len() - 1];
        then(stored, evicted)
    }

    /// Seed a host's series with previously persisted samples, oldest first.
    ///
    /// Keeps at most `capacity` of them. Existing samples for the host are
    /// replaced.
    pub fn restore(&self, host_id: &str, samples: impl IntoIterator<Item = MetricSample>) {
        let mut series: VecDeque<MetricSample> = samples.into_iter().collect();
        while series.len() > self.capacity.get() {
            series.pop_front();
        }
        if series.is_empty() {
            self.series.remove(host_id);
        } else {
            self.series.insert(host_id.to_string(), series);
        }
    }

    /// The most recent `limit` samples for `host_id`, oldest first.
    ///
    /// Unknown hosts yield an empty list.
    pub fn query(&self, host_id: &str, limit: usize) -> Vec<MetricSample> {
        match self.series.get(host_id) {
            Some(series) => {
                let skip = series.len().saturating_sub(limit);
                series.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// The newest sample for `host_id`, if any.
    pub fn latest(&self, host_id: &str) -> Option<MetricSample> {
        self.series
            .get(host_id)
            .and_then(|series| series.back().cloned())
    }

    /// Number of samples currently held for `host_id`.
    pub fn len(&self, host_id: &str) -> usize {
        self.series.get(host_id).map_or(0, |series| series.len())
    }

    /// Drop all history for a host (e.g. after it is deleted).
    pub fn remove_host(&self, host_id: &str) -> bool {
        self.series.remove(host_id).is_some()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_HISTORY_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metrics::sample_fixture;

    fn store(capacity: usize) -> MetricsStore {
        MetricsStore::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn query_returns_chronological_order() {
        let store = store(10);
        for cpu in [1.0, 2.0, 3.0] {
            store.append(sample_fixture("h1", cpu, 10.0, 10.0));
        }
        let cpus: Vec<f64> = store.query("h1", 10).iter().map(|s| s.usage.cpu.total).collect();
        assert_eq!(cpus, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let capacity = 5;
        let store = store(capacity);
        let mut evicted = 0;
        for i in 0..=capacity {
            evicted += store.append(sample_fixture("h1", i as f64, 10.0, 10.0));
        }
        assert_eq!(evicted, 1);

        let cpus: Vec<f64> = store
            .query("h1", capacity)
            .iter()
            .map(|s| s.usage.cpu.total)
            .collect();
        assert_eq!(cpus, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(store.len("h1"), capacity);
    }

    #[test]
    fn limit_selects_most_recent() {
        let store = store(10);
        for i in 0..6 {
            store.append(sample_fixture("h1", i as f64, 10.0, 10.0));
        }
        let cpus: Vec<f64> = store.query("h1", 2).iter().map(|s| s.usage.cpu.total).collect();
        assert_eq!(cpus, vec![4.0, 5.0]);
    }

    #[test]
    fn hosts_are_isolated() {
        let store = store(2);
        store.append(sample_fixture("h1", 1.0, 10.0, 10.0));
        store.append(sample_fixture("h2", 2.0, 10.0, 10.0));
        store.append(sample_fixture("h2", 3.0, 10.0, 10.0));
        store.append(sample_fixture("h2", 4.0, 10.0, 10.0));

        assert_eq!(store.len("h1"), 1);
        assert_eq!(store.len("h2"), 2);
        assert_eq!(store.latest("h1").unwrap().usage.cpu.total, 1.0);
    }

    #[test]
    fn unknown_host_is_empty() {
        let store = store(2);
        assert!(store.query("ghost", 10).is_empty());
        assert!(store.latest("ghost").is_none());
        assert!(!store.remove_host("ghost"));
    }

    #[test]
    fn same_host_append_waits_for_follow_up_work() {
        let store = Arc::new(store(10));
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let seen_by_follow_up = store.append_then(sample_fixture("h1", 1.0, 10.0, 10.0), |stored, _| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.append(sample_fixture("h1", 2.0, 10.0, 10.0));
                done_tx.send(()).unwrap();
            });
            // The second append cannot land while this entry is held.
            let blocked = done_rx.recv_timeout(std::time::Duration::from_millis(100)).is_err();
            (stored.usage.cpu.total, blocked)
        });

        assert_eq!(seen_by_follow_up, (1.0, true));
        done_rx.recv().unwrap();
        let cpus: Vec<f64> = store.query("h1", 10).iter().map(|s| s.usage.cpu.total).collect();
        assert_eq!(cpus, vec![1.0, 2.0]);
    }

    #[test]
    fn restore_keeps_most_recent_within_capacity() {
        let store = store(2);
        store.append(sample_fixture("h1", 9.0, 10.0, 10.0));
        store.restore("h1", [1.0, 2.0, 3.0].map(|cpu| sample_fixture("h1", cpu, 10.0, 10.0)));

        let cpus: Vec<f64> = store.query("h1", 10).iter().map(|s| s.usage.cpu.total).collect();
        assert_eq!(cpus, vec![2.0, 3.0]);

        store.restore("h1", std::iter::empty());
        assert_eq!(store.len("h1"), 0);
    }

    #[test]
    fn concurrent_appends_respect_capacity() {
        let store = Arc::new(store(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let host = if t % 2 == 0 { "even" } else { "odd" };
                        store.append(sample_fixture(host, (i % 100) as f64, 10.0, 10.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len("even"), 50);
        assert_eq!(store.len("odd"), 50);
    }
}
