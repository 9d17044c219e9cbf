use std::fmt::Write as _;

use crate::registry::MetricsRegistry;

fn format_labels(labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect();
    format!("{{{}}}", pairs.join(","))
}

impl MetricsRegistry {
    /// Text exposition per `spec.md` §6: sorted by metric then label-set,
    /// with `# HELP`/`# TYPE` headers, counters as `<name>{labels} <value>`,
    /// histograms as cumulative `<name>_bucket{labels,le="<bound>"}` plus a
    /// `+Inf` bucket, `_sum`, and `_count`.
    pub fn render(&self) -> String {
        let snapshot = self.render_snapshot();
        let mut out = String::new();

        let mut counter_names: Vec<&str> =
            snapshot.counters.iter().map(|(n, _, _)| n.as_str()).collect();
        counter_names.sort();
        counter_names.dedup();

        for name in &counter_names {
            let _ = writeln!(out, "# HELP {name} {name}");
            let _ = writeln!(out, "# TYPE {name} counter");
            let mut rows: Vec<&(String, Vec<(String, String)>, u64)> = snapshot
                .counters
                .iter()
                .filter(|(n, _, _)| n == name)
                .collect();
            rows.sort_by(|a, b| a.1.cmp(&b.1));
            for (_, labels, value) in rows {
                let _ = writeln!(out, "{name}{} {value}", format_labels(labels));
            }
        }

        let mut histogram_names: Vec<&str> = snapshot
            .histograms
            .iter()
            .map(|(n, _, _, _, _, _)| n.as_str())
            .collect();
        histogram_names.sort();
        histogram_names.dedup();

        for name in &histogram_names {
            let _ = writeln!(out, "# HELP {name} {name}");
            let _ = writeln!(out, "# TYPE {name} histogram");
            let mut rows: Vec<_> = snapshot
                .histograms
                .iter()
                .filter(|(n, _, _, _, _, _)| n == name)
                .collect();
            rows.sort_by(|a, b| a.1.cmp(&b.1));
            for (_, labels, bounds, counts, sum, count) in rows {
                let mut cumulative = 0u64;
                for (bound, bucket_count) in bounds.iter().zip(counts.iter()) {
                    cumulative += bucket_count;
                    let mut le_labels = labels.clone();
                    le_labels.push(("le".to_string(), bound.to_string()));
                    let _ = writeln!(
                        out,
                        "{name}_bucket{} {cumulative}",
                        format_labels(&le_labels)
                    );
                }
                let mut inf_labels = labels.clone();
                inf_labels.push(("le".to_string(), "+Inf".to_string()));
                let _ = writeln!(out, "{name}_bucket{} {count}", format_labels(&inf_labels));
                let _ = writeln!(out, "{name}_sum{} {sum}", format_labels(labels));
                let _ = writeln!(out, "{name}_count{} {count}", format_labels(labels));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MetricsRegistry;

    #[test]
    fn renders_counter_with_sorted_labels() {
        let registry = MetricsRegistry::new();
        registry.increment_counter("aegis_job_runs_total", &[("job", "rollup"), ("status", "ok")]);
        registry.increment_counter("aegis_job_runs_total", &[("job", "rollup"), ("status", "ok")]);

        let rendered = registry.render();
        assert!(rendered.contains("# TYPE aegis_job_runs_total counter"));
        assert!(rendered.contains("aegis_job_runs_total{job=\"rollup\",status=\"ok\"} 2"));
    }

    #[test]
    fn renders_histogram_with_cumulative_buckets_and_inf() {
        let registry = MetricsRegistry::new();
        registry.observe_histogram("aegis_relay_provision_latency_ms", &[], 40.0);
        registry.observe_histogram("aegis_relay_provision_latency_ms", &[], 150_000.0);

        let rendered = registry.render();
        assert!(rendered.contains("# TYPE aegis_relay_provision_latency_ms histogram"));
        assert!(rendered.contains("aegis_relay_provision_latency_ms_bucket{le=\"50\"} 1"));
        assert!(rendered.contains("aegis_relay_provision_latency_ms_bucket{le=\"+Inf\"} 2"));
        assert!(rendered.contains("aegis_relay_provision_latency_ms_count 2"));
    }

    #[test]
    fn empty_registry_renders_empty_string() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.render(), "");
    }
}
