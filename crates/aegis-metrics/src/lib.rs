mod buckets;
mod registry;
mod render;

pub use buckets::MetricKind;
pub use registry::MetricsRegistry;

use once_cell::sync::Lazy;

static REGISTRY: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// The process-wide registry. `spec.md` §9 REDESIGN: "confined to one module
/// with a reader/writer lock; readers never block writers indefinitely."
pub fn global() -> &'static MetricsRegistry {
    &REGISTRY
}

#[cfg(any(test, feature = "test-util"))]
pub fn reset_for_test() {
    REGISTRY.reset();
}
