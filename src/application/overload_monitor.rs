//! Overload Monitor - background use case
//!
//! Samples connection count, core count and resident memory on a fixed
//! interval and reports when the load ratio crosses the configured threshold.

use crate::domain::entities::{MonitorEvent, OverloadSample};
use crate::domain::errors::MonitorError;
use crate::domain::ports::{ConnectionRegistry, HostMetricsSource, OverloadReporter};
use crate::domain::services::OverloadEvaluator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Overload monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between two samples
    pub tick_interval: Duration,
    /// Load ratio above which the process is considered overloaded
    pub max_connections_allowed_ratio: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            max_connections_allowed_ratio: 1.0,
        }
    }
}

impl MonitorConfig {
    /// Set the tick interval.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the overload threshold.
    pub fn max_connections_allowed_ratio(mut self, ratio: f64) -> Self {
        self.max_connections_allowed_ratio = ratio;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.tick_interval.is_zero() {
            return Err(MonitorError::Configuration(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        OverloadEvaluator::new(self.max_connections_allowed_ratio).map(|_| ())
    }
}

/// Lifecycle state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

struct RunningTask {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Periodic overload detector.
///
/// Each tick reads the connection registry, then the host metrics, on the
/// blocking pool, computes the load ratio and hands the result to the
/// reporter. Ticks never overlap and a failing tick never stops the timer.
pub struct OverloadMonitor {
    config: MonitorConfig,
    evaluator: OverloadEvaluator,
    registry: Arc<dyn ConnectionRegistry>,
    host: Arc<dyn HostMetricsSource>,
    reporter: Arc<dyn OverloadReporter>,
    /// Held by `stop()` until the loop has exited, so every stopper and any
    /// racing `start()` waits for the same exit.
    task: Mutex<Option<RunningTask>>,
    running: AtomicBool,
}

impl OverloadMonitor {
    /// Create a monitor in the `Stopped` state.
    ///
    /// Invalid configuration is rejected here rather than on the first tick.
    pub fn new(
        config: MonitorConfig,
        registry: Arc<dyn ConnectionRegistry>,
        host: Arc<dyn HostMetricsSource>,
        reporter: Arc<dyn OverloadReporter>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let evaluator = OverloadEvaluator::new(config.max_connections_allowed_ratio)?;

        Ok(Self {
            config,
            evaluator,
            registry,
            host,
            reporter,
            task: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> MonitorState {
        let running = match self.task.try_lock() {
            Ok(task) => task.as_ref().is_some_and(|t| !t.handle.is_finished()),
            // a start or stop is in flight
            Err(_) => self.running.load(Ordering::SeqCst),
        };
        if running {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    /// Start the sampling loop. The first tick fires one full interval
    /// after this call. Starting a running monitor does nothing; starting
    /// while a `stop()` is draining waits for the old loop to exit first.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            if !previous.handle.is_finished() {
                tracing::debug!("overload monitor already running");
                *task = Some(previous);
                return;
            }
            Self::join(previous.handle).await;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = self.config.tick_interval;
        let evaluator = self.evaluator;
        let registry = self.registry.clone();
        let host = self.host.clone();
        let reporter = self.reporter.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        Self::run_tick(evaluator, &registry, &host, reporter.as_ref()).await;
                    }
                }
            }
        });

        tracing::info!(
            "overload monitor started interval={:?} threshold={}",
            period,
            self.evaluator.threshold()
        );
        *task = Some(RunningTask { stop_tx, handle });
        self.running.store(true, Ordering::SeqCst);
    }

    /// Stop the sampling loop and wait for the background task to exit.
    ///
    /// A tick already in progress is allowed to finish. Once any `stop()`
    /// call returns, the reporter receives nothing more, including when
    /// several tasks stop the monitor at once. Stopping a stopped monitor
    /// does nothing.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        let Some(running) = task.take() else {
            return;
        };

        let _ = running.stop_tx.send(());
        Self::join(running.handle).await;
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("overload monitor stopped");
    }

    /// Perform a single tick on the caller's task (for testing).
    pub async fn tick_once(&self) {
        Self::run_tick(
            self.evaluator,
            &self.registry,
            &self.host,
            self.reporter.as_ref(),
        )
        .await;
    }

    async fn join(handle: JoinHandle<()>) {
        if let Err(e) = handle.await {
            if e.is_panic() {
                tracing::error!("overload monitor task panicked: {}", e);
            }
        }
    }

    /// Metric reads may hit the OS, so they run on the blocking pool.
    async fn run_tick(
        evaluator: OverloadEvaluator,
        registry: &Arc<dyn ConnectionRegistry>,
        host: &Arc<dyn HostMetricsSource>,
        reporter: &dyn OverloadReporter,
    ) {
        let registry = registry.clone();
        let host = host.clone();
        let result = tokio::task::spawn_blocking(move || {
            evaluator.sample(registry.as_ref(), host.as_ref())
        })
        .await
        .unwrap_or_else(|e| {
            Err(MonitorError::TransientMetrics(format!(
                "metrics read aborted: {}",
                e
            )))
        });

        Self::report(result, reporter);
    }

    fn report(result: Result<OverloadSample, MonitorError>, reporter: &dyn OverloadReporter) {
        match result {
            Ok(sample) => {
                if sample.overloaded {
                    reporter.record(MonitorEvent::Overloaded(sample.clone()));
                }
                reporter.record(MonitorEvent::Sampled(sample));
            }
            Err(e) => {
                tracing::warn!("overload check skipped: {}", e);
                reporter.record(MonitorEvent::TickSkipped {
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    const MIB: u64 = 1024 * 1024;

    struct StubRegistry(AtomicUsize);

    impl ConnectionRegistry for StubRegistry {
        fn active_connection_count(&self) -> Result<usize, MonitorError> {
            Ok(self.0.load(Ordering::SeqCst))
        }
    }

    struct StubHost {
        cores: usize,
        memory: AtomicU64,
    }

    impl HostMetricsSource for StubHost {
        fn logical_core_count(&self) -> Result<usize, MonitorError> {
            Ok(self.cores)
        }

        fn resident_memory_bytes(&self) -> Result<u64, MonitorError> {
            Ok(self.memory.load(Ordering::SeqCst))
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: parking_lot::Mutex<Vec<MonitorEvent>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<MonitorEvent> {
            self.events.lock().clone()
        }
    }

    impl OverloadReporter for RecordingReporter {
        fn record(&self, event: MonitorEvent) {
            self.events.lock().push(event);
        }
    }

    fn create_monitor(
        connections: usize,
        cores: usize,
        memory: u64,
        config: MonitorConfig,
    ) -> (OverloadMonitor, Arc<RecordingReporter>, Arc<StubHost>) {
        let reporter = Arc::new(RecordingReporter::default());
        let host = Arc::new(StubHost {
            cores,
            memory: AtomicU64::new(memory),
        });
        let monitor = OverloadMonitor::new(
            config,
            Arc::new(StubRegistry(AtomicUsize::new(connections))),
            host.clone(),
            reporter.clone(),
        )
        .unwrap();
        (monitor, reporter, host)
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(5));
        assert_eq!(config.max_connections_allowed_ratio, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_monitor_config_builder() {
        let config = MonitorConfig::default()
            .tick_interval(Duration::from_millis(250))
            .max_connections_allowed_ratio(0.5);
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.max_connections_allowed_ratio, 0.5);
    }

    #[test]
    fn test_monitor_config_rejects_zero_interval() {
        let config = MonitorConfig::default().tick_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(MonitorError::Configuration(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_threshold() {
        let result = OverloadMonitor::new(
            MonitorConfig::default().max_connections_allowed_ratio(-0.5),
            Arc::new(StubRegistry(AtomicUsize::new(0))),
            Arc::new(StubHost {
                cores: 1,
                memory: AtomicU64::new(MIB),
            }),
            Arc::new(RecordingReporter::default()),
        );
        assert!(matches!(result, Err(MonitorError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_tick_once_overloaded_then_sampled() {
        let config = MonitorConfig::default().max_connections_allowed_ratio(0.5);
        let (monitor, reporter, _) = create_monitor(10, 4, 2 * MIB, config);

        monitor.tick_once().await;

        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_overloaded());
        assert!(matches!(events[1], MonitorEvent::Sampled(_)));
        assert_eq!(events[1].sample().unwrap().load_ratio, 1.25);
    }

    #[tokio::test]
    async fn test_tick_once_not_overloaded() {
        let config = MonitorConfig::default().max_connections_allowed_ratio(0.5);
        let (monitor, reporter, _) = create_monitor(1, 8, 100 * MIB, config);

        monitor.tick_once().await;

        let events = reporter.events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].sample().unwrap().overloaded);
    }

    #[tokio::test]
    async fn test_tick_once_zero_memory_skips() {
        let config = MonitorConfig::default().max_connections_allowed_ratio(0.5);
        let (monitor, reporter, _) = create_monitor(10, 4, 0, config);

        monitor.tick_once().await;

        let events = reporter.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], MonitorEvent::TickSkipped { .. }));
    }

    #[tokio::test]
    async fn test_initial_state_stopped() {
        let (monitor, _, _) = create_monitor(0, 1, MIB, MonitorConfig::default());
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let (monitor, reporter, _) = create_monitor(0, 1, MIB, MonitorConfig::default());
        monitor.stop().await;
        monitor.stop().await;
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert!(reporter.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_then_immediate_stop_reports_nothing() {
        let (monitor, reporter, _) = create_monitor(10, 4, 2 * MIB, MonitorConfig::default());

        monitor.start().await;
        assert_eq!(monitor.state(), MonitorState::Running);
        monitor.stop().await;
        assert_eq!(monitor.state(), MonitorState::Stopped);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(reporter.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fire_each_interval() {
        let config = MonitorConfig::default().tick_interval(Duration::from_secs(1));
        let (monitor, reporter, _) = create_monitor(0, 2, 64 * MIB, config);

        monitor.start().await;
        tokio::time::sleep(Duration::from_millis(3500)).await;
        monitor.stop().await;

        assert_eq!(reporter.events().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_single_loop() {
        let config = MonitorConfig::default().tick_interval(Duration::from_secs(1));
        let (monitor, reporter, _) = create_monitor(0, 2, 64 * MIB, config);

        monitor.start().await;
        monitor.start().await;
        tokio::time::sleep(Duration::from_millis(2500)).await;
        monitor.stop().await;

        assert_eq!(reporter.events().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reports_after_stop() {
        let config = MonitorConfig::default().tick_interval(Duration::from_secs(1));
        let (monitor, reporter, _) = create_monitor(0, 2, 64 * MIB, config);

        monitor.start().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        monitor.stop().await;
        let seen = reporter.events().len();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(reporter.events().len(), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degenerate_tick_keeps_timer_running() {
        let config = MonitorConfig::default().tick_interval(Duration::from_secs(1));
        let (monitor, reporter, host) = create_monitor(1, 2, 0, config);

        monitor.start().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        host.memory.store(64 * MIB, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        monitor.stop().await;

        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], MonitorEvent::TickSkipped { .. }));
        assert!(matches!(events[1], MonitorEvent::Sampled(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let config = MonitorConfig::default().tick_interval(Duration::from_secs(1));
        let (monitor, reporter, _) = create_monitor(0, 2, 64 * MIB, config);

        monitor.start().await;
        monitor.stop().await;
        monitor.start().await;
        assert_eq!(monitor.state(), MonitorState::Running);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        monitor.stop().await;

        assert_eq!(reporter.events().len(), 1);
    }
}
