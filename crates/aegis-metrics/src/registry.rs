use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::buckets::buckets_for;

pub type LabelSet = Vec<(String, String)>;

#[derive(Debug, Default)]
struct HistogramState {
    bucket_counts: Vec<u64>,
    sum_ms: f64,
    count: u64,
}

/// Process-wide counters and histograms behind one reader/writer lock, per
/// `spec.md` §9's "confined to one module ... readers never block writers
/// indefinitely." A read lock is held only for the duration of rendering a
/// snapshot; every mutation is a short, independent write-lock acquisition.
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<(String, LabelSet), u64>>,
    histograms: RwLock<BTreeMap<(String, LabelSet), HistogramState>>,
}

fn sorted_labels(labels: &[(&str, &str)]) -> LabelSet {
    let mut owned: LabelSet = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    owned.sort();
    owned
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            histograms: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        let key = (name.to_string(), sorted_labels(labels));
        let mut counters = self.counters.write().expect("metrics counters lock poisoned");
        *counters.entry(key).or_insert(0) += 1;
    }

    pub fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value_ms: f64) {
        let bucket_bounds = buckets_for(name);
        let key = (name.to_string(), sorted_labels(labels));
        let mut histograms = self
            .histograms
            .write()
            .expect("metrics histograms lock poisoned");
        let state = histograms.entry(key).or_insert_with(|| HistogramState {
            bucket_counts: vec![0; bucket_bounds.len()],
            sum_ms: 0.0,
            count: 0,
        });
        for (i, bound) in bucket_bounds.iter().enumerate() {
            if value_ms <= *bound as f64 {
                state.bucket_counts[i] += 1;
            }
        }
        state.sum_ms += value_ms;
        state.count += 1;
    }

    pub(crate) fn render_snapshot(&self) -> Snapshot {
        let counters = self.counters.read().expect("metrics counters lock poisoned");
        let histograms = self
            .histograms
            .read()
            .expect("metrics histograms lock poisoned");

        Snapshot {
            counters: counters
                .iter()
                .map(|((name, labels), value)| (name.clone(), labels.clone(), *value))
                .collect(),
            histograms: histograms
                .iter()
                .map(|((name, labels), state)| {
                    let bucket_bounds = buckets_for(name);
                    (
                        name.clone(),
                        labels.clone(),
                        bucket_bounds.to_vec(),
                        state.bucket_counts.clone(),
                        state.sum_ms,
                        state.count,
                    )
                })
                .collect(),
        }
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn reset(&self) {
        self.counters.write().expect("metrics counters lock poisoned").clear();
        self.histograms
            .write()
            .expect("metrics histograms lock poisoned")
            .clear();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Snapshot {
    pub counters: Vec<(String, LabelSet, u64)>,
    pub histograms: Vec<(String, LabelSet, Vec<u64>, Vec<u64>, f64, u64)>,
}
