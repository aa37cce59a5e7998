//! Metrics registry assembly and exposition.
//!
//! # Responsibilities
//! - Own a Prometheus recorder that is never installed as the global recorder
//! - Attach the process collector (CPU, memory, file descriptors) and the
//!   runtime collector (tokio worker/task gauges) unless `redis-only-metrics`
//! - Render the text exposition on demand
//!
//! # Metrics
//! - `process_*` (gauges/counters from `metrics-process`)
//! - `tokio_runtime_workers` (gauge): runtime worker threads
//! - `tokio_runtime_alive_tasks` (gauge): tasks currently alive
//! - `tokio_runtime_global_queue_depth` (gauge): tasks waiting in the injection queue
//!
//! # Design Decisions
//! - Collectors refresh at render time, so a scrape always sees current values
//! - Recording is crate-private; after assembly the registry is read-only to callers

use metrics::{describe_gauge, gauge, with_local_recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

/// Gauges backed by tokio's stable runtime metrics.
#[derive(Debug, Default)]
struct RuntimeCollector;

impl RuntimeCollector {
    fn describe(&self) {
        describe_gauge!("tokio_runtime_workers", "Number of runtime worker threads.");
        describe_gauge!("tokio_runtime_alive_tasks", "Number of tasks currently alive.");
        describe_gauge!(
            "tokio_runtime_global_queue_depth",
            "Number of tasks waiting in the runtime's global queue."
        );
    }

    fn collect(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let runtime = handle.metrics();
        gauge!("tokio_runtime_workers").set(runtime.num_workers() as f64);
        gauge!("tokio_runtime_alive_tasks").set(runtime.num_alive_tasks() as f64);
        gauge!("tokio_runtime_global_queue_depth").set(runtime.global_queue_depth() as f64);
    }
}

/// Write-once metrics registry.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    process: Option<metrics_process::Collector>,
    runtime: Option<RuntimeCollector>,
}

impl MetricsRegistry {
    /// Create the registry, attaching process and runtime collectors unless
    /// `redis_only` is set.
    pub fn assemble(redis_only: bool) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let (process, runtime) = if redis_only {
            (None, None)
        } else {
            (
                Some(metrics_process::Collector::default()),
                Some(RuntimeCollector),
            )
        };

        let registry = Self {
            recorder,
            handle,
            process,
            runtime,
        };
        registry.record(|| {
            if let Some(process) = &registry.process {
                process.describe();
            }
            if let Some(runtime) = &registry.runtime {
                runtime.describe();
            }
        });

        tracing::debug!(redis_only, "Metrics registry assembled");
        registry
    }

    /// Whether the process and runtime collectors are attached.
    pub fn has_process_collectors(&self) -> bool {
        self.process.is_some()
    }

    /// Refresh collectors and render the Prometheus text exposition.
    pub fn render(&self) -> String {
        self.record(|| {
            if let Some(process) = &self.process {
                process.collect();
            }
            if let Some(runtime) = &self.runtime {
                runtime.collect();
            }
        });
        self.handle.render()
    }

    /// Run `f` with this registry as the active recorder.
    pub(crate) fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        with_local_recorder(&self.recorder, f)
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("process", &self.process.is_some())
            .field("runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}
