use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::task::JoinHandle;
use tokio::time;

use crate::acquisition::{open_source, AcquisitionDaemon, AcquisitionStats, TeleinfoSource};
use crate::aggregation::{AggregationScheduler, SharedAggregationBuffer};
use crate::config::{Config, PersistenceConfig};
use crate::persistence::{LogSink, PersistenceSink, SqliteSink};
use crate::utility::ShutdownSignal;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);

/// Represents the set of daemon tasks started from one configuration
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    shutdown: ShutdownSignal,
    buffer: Option<SharedAggregationBuffer>,
    stats: Option<Arc<AcquisitionStats>>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the sink selected by the persistence configuration.
pub fn build_sink(config: &PersistenceConfig) -> Result<Arc<dyn PersistenceSink>> {
    if !config.enabled {
        info!("Persistence disabled, records will only be logged");
        return Ok(Arc::new(LogSink));
    }
    let sink = SqliteSink::new(&config.database, config.table.as_str())
        .with_context(|| format!("Invalid persistence settings for {}", config.database))?;
    info!(
        "Persisting records to {} (table {})",
        sink.path().display(),
        sink.table()
    );
    Ok(Arc::new(sink))
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            shutdown: ShutdownSignal::new(),
            buffer: None,
            stats: None,
        }
    }

    /// Open the configured source and sink, then launch every task.
    pub fn launch(&mut self, config: &Config) -> Result<()> {
        let source = open_source(&config.acquisition)?;
        let sink = build_sink(&config.persistence)?;
        self.launch_with(config, source, sink)
    }

    /// Launch every task on an already opened source and sink.
    pub fn launch_with<S>(
        &mut self,
        config: &Config,
        source: S,
        sink: Arc<dyn PersistenceSink>,
    ) -> Result<()>
    where
        S: TeleinfoSource + 'static,
    {
        let buffer = SharedAggregationBuffer::new(
            config.aggregation.window_capacity,
            config.aggregation.overflow_policy,
        );
        self.buffer = Some(buffer.clone());

        self.start_frame_processing(source, buffer.clone());
        self.start_aggregation_scheduler(buffer, sink, config.aggregation.interval());
        self.start_heartbeat();

        Ok(())
    }

    /// Start the blocking frame-processing loop
    fn start_frame_processing<S>(&mut self, source: S, buffer: SharedAggregationBuffer)
    where
        S: TeleinfoSource + 'static,
    {
        info!("Starting frame processing task");
        let daemon = AcquisitionDaemon::new(source, buffer, self.shutdown.clone());
        self.stats = Some(daemon.stats());

        let task = tokio::task::spawn_blocking(move || daemon.run());
        self.tasks.push(task);
    }

    /// Start the periodic flush of the aggregation window
    fn start_aggregation_scheduler(
        &mut self,
        buffer: SharedAggregationBuffer,
        sink: Arc<dyn PersistenceSink>,
        interval: Duration,
    ) {
        info!("Starting aggregation scheduler every {:?}", interval);
        let scheduler = AggregationScheduler::new(buffer, sink, interval, self.shutdown.clone());

        let task = tokio::spawn(async move {
            scheduler.run().await;
            Ok(())
        });
        self.tasks.push(task);
    }

    /// Start a heartbeat task that logs acquisition counters periodically
    fn start_heartbeat(&mut self) {
        debug!("Starting heartbeat monitor");

        let shutdown = self.shutdown.clone();
        let stats = self.stats.clone();
        let buffer = self.buffer.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + HEARTBEAT_PERIOD, HEARTBEAT_PERIOD);
            while shutdown.is_running() {
                tokio::select! {
                    _ = ticker.tick() => {
                        let counters = stats.as_ref().map(|s| s.snapshot()).unwrap_or_default();
                        let pending = buffer.as_ref().map_or(0, |b| b.sample_count());
                        debug!(
                            "Daemon heartbeat: {} frames, {} committed, {} corrupted, {} incomplete, {} overflowed, {} read errors, {} samples pending",
                            counters.frames,
                            counters.committed,
                            counters.corrupted,
                            counters.incomplete,
                            counters.overflowed,
                            counters.read_errors,
                            pending
                        );
                    }
                    _ = shutdown.wait() => break,
                }
            }
            Ok(())
        });

        self.tasks.push(task);
    }

    /// Signal observed by every task of this daemon
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Aggregation buffer shared by the running tasks, once launched
    pub fn buffer(&self) -> Option<&SharedAggregationBuffer> {
        self.buffer.as_ref()
    }

    /// Frame counters of the processing task, once launched
    pub fn stats(&self) -> Option<Arc<AcquisitionStats>> {
        self.stats.clone()
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.shutdown.trigger();
    }

    /// Wait for all tasks to complete
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Task failed: {:#}", e),
                Err(e) => error!("Task panicked: {}", e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_persistence_logs_only() {
        let config = PersistenceConfig {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(build_sink(&config).unwrap().name(), "log");
    }

    #[test]
    fn test_invalid_table_is_rejected() {
        let config = PersistenceConfig {
            table: "1nvalid".to_string(),
            ..Default::default()
        };
        assert!(build_sink(&config).is_err());
    }
}
