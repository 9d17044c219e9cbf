/// Fixed bucket sets from `spec.md` §6, keyed by the metric name they apply
/// to rather than left to the caller to pick — a histogram observed under a
/// name this module doesn't recognize is a programming error, not a config
/// choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
}

pub const JOB_DURATION_MS_BUCKETS: &[u64] =
    &[10, 25, 50, 100, 250, 500, 1000, 2500, 5000, 10000];

pub const PROVISION_LATENCY_MS_BUCKETS: &[u64] = &[
    25, 50, 100, 250, 500, 1000, 2500, 5000, 10000, 30000, 60000, 120000,
];

pub const DEPROVISION_LATENCY_MS_BUCKETS: &[u64] =
    &[25, 50, 100, 250, 500, 1000, 2500, 5000, 10000, 30000, 60000];

pub fn buckets_for(metric_name: &str) -> &'static [u64] {
    match metric_name {
        "aegis_job_duration_ms" => JOB_DURATION_MS_BUCKETS,
        "aegis_relay_deprovision_latency_ms" => DEPROVISION_LATENCY_MS_BUCKETS,
        // Provision latency and AWS-operation latency share the same bucket
        // set per spec.md §6 ("AWS op latency same as provision").
        "aegis_relay_provision_latency_ms" | "aegis_provisioner_aws_op_latency_ms" => {
            PROVISION_LATENCY_MS_BUCKETS
        }
        // Unrecognized names fall back to the job-duration buckets rather
        // than panicking; the rendered output makes a wrong bucket set
        // obvious at a glance.
        _ => JOB_DURATION_MS_BUCKETS,
    }
}
