//! Main runtime orchestration.
//!
//! The runtime coordinates component lifecycle:
//! - Start order: instance store → controller → dispatcher → listener
//! - Shutdown order: listener → store
//!
//! An escalation signal from the dispatcher stops the runtime and makes
//! [`Runtime::run`] return an error, so the process exits non-zero.

use crate::core::config::Config;
use crate::evacuation::{exit_channel, EvacuationHandler, ExitReceiver};
use crate::net::http::HttpListener;
use crate::store::{InstanceStore, StoreEvacuationController};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a stopping listener may take to drain.
const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Component health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentHealth {
    /// Component is starting.
    Starting,
    /// Component is healthy and operational.
    Healthy,
    /// Component has failed.
    Failed,
    /// Component is stopping.
    Stopping,
    /// Component has stopped.
    Stopped,
}

/// Health status aggregated from all components.
#[derive(Debug, Clone)]
pub struct RuntimeHealth {
    /// Instance store health.
    pub store: ComponentHealth,
    /// HTTP listener health.
    pub listener: ComponentHealth,
}

impl Default for RuntimeHealth {
    fn default() -> Self {
        Self {
            store: ComponentHealth::Starting,
            listener: ComponentHealth::Starting,
        }
    }
}

impl RuntimeHealth {
    /// Check if the runtime is ready to serve requests.
    pub fn is_ready(&self) -> bool {
        self.store == ComponentHealth::Healthy && self.listener == ComponentHealth::Healthy
    }
}

/// Why [`Runtime::run`] stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// SIGINT.
    Interrupted,
    /// [`Runtime::shutdown`] was called.
    ShutdownRequested,
    /// An unrecoverable error was escalated.
    Escalated,
    /// The listener task ended on its own.
    ListenerExited,
}

/// Bulletin runtime holding all component handles.
pub struct Runtime {
    /// Configuration.
    config: Arc<Config>,

    /// Authoritative instance state.
    store: Arc<InstanceStore>,

    /// Evacuation dispatcher shared by every request.
    handler: Arc<EvacuationHandler>,

    /// Exit signals from the escalation monitor.
    exit_rx: ExitReceiver,

    /// Runtime health status.
    health: RuntimeHealth,

    /// Whether the runtime is running.
    running: Arc<AtomicBool>,

    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,

    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,

    /// Address the listener is bound to.
    local_addr: Option<SocketAddr>,

    /// Listener task handle.
    listener_handle: Option<JoinHandle<Result<()>>>,
}

impl Runtime {
    /// Create a new runtime with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (exit_sink, exit_rx) = exit_channel(config.escalation.capacity);
        let store = Arc::new(InstanceStore::new(config.evacuation_timeout()));
        let controller = Arc::new(StoreEvacuationController::new(store.clone()));
        let handler = Arc::new(EvacuationHandler::new(controller, exit_sink));

        Ok(Self {
            config: Arc::new(config),
            store,
            handler,
            exit_rx,
            health: RuntimeHealth::default(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            shutdown_rx,
            local_addr: None,
            listener_handle: None,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the instance store.
    pub fn store(&self) -> &Arc<InstanceStore> {
        &self.store
    }

    /// Get the evacuation dispatcher.
    pub fn handler(&self) -> &Arc<EvacuationHandler> {
        &self.handler
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Get the current health status.
    pub fn health(&self) -> &RuntimeHealth {
        &self.health
    }

    /// Check if the runtime is ready to serve requests.
    pub fn is_ready(&self) -> bool {
        self.health.is_ready()
    }

    /// Check if the runtime is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Start the listener.
    pub async fn start(&mut self) -> Result<()> {
        let bind_addr = self.config.bind_addr()?;
        tracing::info!(
            bind = %bind_addr,
            evacuation_timeout_secs = self.config.evacuation.timeout_seconds,
            escalation_capacity = self.config.escalation.capacity,
            "starting Bulletin runtime"
        );

        self.health.store = ComponentHealth::Healthy;

        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                self.health.listener = ComponentHealth::Failed;
                return Err(err)
                    .with_context(|| format!("failed to bind evacuation listener on {bind_addr}"));
            }
        };
        self.local_addr = Some(listener.local_addr().context("listener has no local address")?);

        let server = HttpListener::new(
            self.handler.clone(),
            self.config.listener.max_body_bytes,
            self.shutdown_rx.clone(),
        );
        self.listener_handle = Some(tokio::spawn(server.serve_on(listener)));
        self.health.listener = ComponentHealth::Healthy;

        self.running.store(true, Ordering::Release);
        tracing::info!("Bulletin runtime started");
        Ok(())
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait until an exit condition occurs.
    pub async fn wait(&mut self) -> StopReason {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let exit_rx = &mut self.exit_rx;
        let listener_handle = &mut self.listener_handle;
        let listener = async move {
            match listener_handle.as_mut() {
                Some(handle) => handle.await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("shutdown signal received (SIGINT)");
                StopReason::Interrupted
            }
            _ = async {
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            } => {
                tracing::info!("shutdown requested by component");
                StopReason::ShutdownRequested
            }
            Some(()) = exit_rx.recv() => {
                tracing::error!("unrecoverable error escalated; stopping");
                StopReason::Escalated
            }
            result = listener => {
                match result {
                    Ok(Ok(())) => tracing::info!("listener stopped"),
                    Ok(Err(e)) => tracing::error!(error = %e, "listener failed"),
                    Err(e) => tracing::error!(error = %e, "listener task panicked"),
                }
                StopReason::ListenerExited
            }
        }
    }

    /// Run the runtime until shutdown.
    ///
    /// Returns an error when stopped by an escalation or a listener failure.
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;
        let reason = self.wait().await;
        self.stop().await?;

        match reason {
            StopReason::Escalated => anyhow::bail!("stopped after unrecoverable evacuation error"),
            StopReason::ListenerExited => anyhow::bail!("evacuation listener exited unexpectedly"),
            StopReason::Interrupted | StopReason::ShutdownRequested => Ok(()),
        }
    }

    /// Stop all runtime components.
    pub async fn stop(&mut self) -> Result<()> {
        tracing::info!("stopping Bulletin runtime");
        self.running.store(false, Ordering::Release);

        // Signal shutdown to all components
        let _ = self.shutdown_tx.send(true);

        self.stop_listener().await;
        self.stop_store();

        tracing::info!("Bulletin runtime stopped");
        Ok(())
    }

    async fn stop_listener(&mut self) {
        tracing::debug!("stopping listener");
        self.health.listener = ComponentHealth::Stopping;

        if let Some(handle) = self.listener_handle.take() {
            if handle.is_finished() {
                tracing::debug!("listener already exited");
            } else {
                match tokio::time::timeout(LISTENER_STOP_TIMEOUT, handle).await {
                    Ok(Ok(Ok(()))) => tracing::info!("listener stopped"),
                    Ok(Ok(Err(e))) => tracing::warn!(error = %e, "listener stopped with error"),
                    Ok(Err(e)) => tracing::warn!(error = %e, "listener task panicked"),
                    Err(_) => tracing::warn!("listener stop timed out"),
                }
            }
        }

        self.health.listener = ComponentHealth::Stopped;
    }

    fn stop_store(&mut self) {
        self.health.store = ComponentHealth::Stopping;
        let pending = self.store.take_start_requests();
        if !pending.is_empty() {
            tracing::warn!(count = pending.len(), "discarding pending start requests");
        }
        self.health.store = ComponentHealth::Stopped;
    }
}
