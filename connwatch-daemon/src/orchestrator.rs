//! Pipeline orchestration -- assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `connwatch-daemon`.
//! It loads configuration, builds the monitor pipeline, manages
//! startup/shutdown ordering, and runs the main event loop.
//!
//! # Lifecycle
//!
//! 1. Write the PID file (refuses to start a second instance)
//! 2. Start the monitor pipeline (PID file removed on failure)
//! 3. Spawn the alert console task and the uptime updater
//! 4. Block until SIGTERM or SIGINT
//! 5. Broadcast shutdown, await tasks, stop the pipeline, remove the PID file

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use connwatch_core::config::ConnwatchConfig;
use connwatch_core::event::AlertEvent;
use connwatch_core::pipeline::{HealthStatus, Pipeline};
use connwatch_core::types::Verdict;
use connwatch_monitor::{MonitorConfig, MonitorPipeline, MonitorPipelineBuilder};

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};

/// The main daemon orchestrator.
///
/// Manages the complete lifecycle of the monitor pipeline:
/// configuration loading, channel wiring, startup, health reporting,
/// and graceful shutdown.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: ConnwatchConfig,
    /// The conn.log monitor pipeline.
    pipeline: MonitorPipeline,
    /// Alert event receiver (consumed by the console reporter task).
    alert_rx: Option<mpsc::Receiver<AlertEvent>>,
    /// Shutdown broadcast sender (signals all background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // MonitorPipeline holds a `dyn Classifier` and cannot derive Debug.
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("alert_rx", &self.alert_rx)
            .field("shutdown_tx", &self.shutdown_tx)
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Path to the `connwatch.toml` configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - The monitor pipeline fails to initialize
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = ConnwatchConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when config has already been loaded.
    pub fn build_from_config(config: ConnwatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        connwatch_core::metrics::describe_all();

        tracing::debug!("building monitor pipeline");

        let monitor_config = MonitorConfig::from_core(&config.monitor)
            .map_err(|e| anyhow::anyhow!("invalid monitor config: {}", e))?;
        let (pipeline, alert_rx) = MonitorPipelineBuilder::new()
            .config(monitor_config)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build monitor pipeline: {}", e))?;

        let (shutdown_tx, _) = broadcast::channel(16);

        record_daemon_metrics();

        tracing::info!("orchestrator initialized");

        Ok(Self {
            config,
            pipeline,
            alert_rx,
            shutdown_tx,
            start_time: Instant::now(),
        })
    }

    /// Start the pipeline and enter the main event loop.
    ///
    /// This method blocks until a shutdown signal is received.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        // Write PID file if configured
        if !self.config.general.pid_file.is_empty() {
            let path = Path::new(&self.config.general.pid_file);
            write_pid_file(path)?;
        }

        tracing::info!("starting monitor pipeline");
        if let Err(e) = self.pipeline.start().await {
            tracing::error!(error = %e, "monitor pipeline failed to start");

            // Cleanup PID file on startup failure
            if !self.config.general.pid_file.is_empty() {
                let path = Path::new(&self.config.general.pid_file);
                remove_pid_file(path);
            }
            return Err(e.into());
        }

        // Spawn alert console reporter task
        let mut alert_logger_task = if let Some(alert_rx) = self.alert_rx.take() {
            let shutdown_rx = self.shutdown_tx.subscribe();
            Some(spawn_alert_logger(alert_rx, shutdown_rx))
        } else {
            None
        };

        // Spawn uptime updater task
        let uptime_updater_task =
            spawn_uptime_updater(self.start_time, self.shutdown_tx.subscribe());

        // Log the aggregated startup health report
        let health = self.health().await;
        match serde_json::to_string(&health) {
            Ok(json) => tracing::info!(health = %json, "startup health report"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize health report"),
        }

        // Main event loop
        tracing::info!("entering main event loop");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        // Initiate shutdown
        tracing::info!("broadcasting shutdown signal to all tasks");
        let _ = self.shutdown_tx.send(());

        // Wait for alert logger to finish
        if let Some(task) = alert_logger_task.take() {
            let _ = task.await;
        }

        // Wait for uptime updater to finish
        let _ = uptime_updater_task.await;

        // Stop the pipeline
        tracing::info!("stopping monitor pipeline");
        self.pipeline.stop().await?;

        // Remove PID file
        if !self.config.general.pid_file.is_empty() {
            let path = Path::new(&self.config.general.pid_file);
            remove_pid_file(path);
        }

        Ok(())
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let status = match self.pipeline.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };
        let modules = vec![ModuleHealth {
            name: self.pipeline.name().to_owned(),
            enabled: true,
            status,
        }];

        let overall_status = aggregate_status(&modules);
        let uptime_secs = self.start_time.elapsed().as_secs();

        DaemonHealth {
            status: overall_status,
            uptime_secs,
            modules,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &ConnwatchConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the current process PID to a file.
///
/// Used to prevent duplicate daemon instances.
///
/// # Security
///
/// - Uses `create_new(true)` to atomically create file (prevents TOCTOU races)
/// - Verifies the created file is a regular file (prevents symlink attacks)
/// - Creates parent directory with restrictive permissions (0o700)
///
/// # Errors
///
/// Returns an error if the PID file cannot be written.
pub fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    // Create parent directory with restrictive permissions (0o700)
    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = fs::DirBuilder::new();
            builder.mode(0o700).recursive(true);
            builder.create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let pid = std::process::id();

    // Atomically create file only if it doesn't exist (eliminates TOCTOU race)
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            // File already exists, read the existing PID for error message
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_string());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Verify the created file is a regular file (not a symlink or other special file)
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        // Remove the non-regular file and return error
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file (possible symlink attack)",
            path.display()
        ));
    }

    // Set restrictive permissions on the PID file (0o600)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        file.set_permissions(permissions)?;
    }

    writeln!(file, "{}", pid)?;

    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on daemon shutdown.
///
/// Logs a warning but does not fail if the file cannot be removed.
pub fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        );
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}

/// Spawn a background task that reports alert events to the console log.
///
/// Malicious verdicts are logged at `error` level with the connection's
/// flow fields. Benign and other verdicts are periodic status reports
/// and are logged at `info` level.
fn spawn_alert_logger(
    mut alert_rx: mpsc::Receiver<AlertEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = alert_rx.recv() => {
                    match event {
                        Some(event) => log_alert_event(&event),
                        None => {
                            tracing::debug!("alert channel closed, exiting logger");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("alert logger shutting down");
                    break;
                }
            }
        }
    })
}

/// Write a single alert event to the console log.
fn log_alert_event(event: &AlertEvent) {
    let alert = &event.alert;
    match alert.verdict {
        Verdict::Malicious => {
            tracing::error!(
                alert_id = %alert.id,
                trace_id = %event.metadata.trace_id,
                ts = %alert.ts,
                uid = %alert.uid,
                orig_h = %alert.orig_h,
                orig_p = %alert.orig_p,
                resp_h = %alert.resp_h,
                resp_p = %alert.resp_p,
                proto = %alert.proto,
                duration = alert.duration,
                label = %alert.label,
                "malicious connection detected"
            );
        }
        Verdict::Benign | Verdict::Other => {
            tracing::info!(
                uid = %alert.uid,
                label = %alert.label,
                verdict = %alert.verdict,
                "connection status report"
            );
        }
    }
}

/// Record daemon-level metrics (build info).
///
/// This should be called once during orchestrator initialization.
fn record_daemon_metrics() {
    use connwatch_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Spawn a background task that periodically updates the uptime metric.
///
/// Updates every 10 seconds to keep the gauge fresh.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    use connwatch_core::metrics as m;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(10));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let uptime_secs = start_time.elapsed().as_secs();
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
