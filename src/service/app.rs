//! Main application state and service coordination
//!
//! `AppState` wires the configured player repository, the Elo calculator,
//! the broadcaster and the metrics collector into one ranking store, and owns
//! the background tasks that run next to the HTTP server.

use crate::config::{validate_config, AppConfig, StorageBackend};
use crate::metrics::MetricsCollector;
use crate::ranking::{
    Broadcaster, InMemoryPlayerRepository, JsonFilePlayerRepository, PlayerRepository,
    RankingStore,
};
use crate::rating::EloCalculator;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Interval of the gauge refresh task
const GAUGE_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    Storage { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Players, matches and live updates
    store: Arc<RankingStore>,

    /// Prometheus metrics shared with the store
    metrics: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application from its configuration
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} ranking service", config.service.name);
        validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;
        info!(
            "Configuration: storage={}, k_factor={}, default_rating={}",
            config.storage.backend, config.rating.k_factor, config.rating.default_rating
        );

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let repository = Self::initialize_repository(&config)?;
        let store = RankingStore::new(
            repository,
            Arc::new(EloCalculator::from_settings(&config.rating)),
            Broadcaster::new(),
        )
        .with_metrics(metrics.clone());

        Ok(Self::from_parts(config, Arc::new(store), metrics))
    }

    /// Assemble the state around an existing store
    pub fn from_parts(
        config: AppConfig,
        store: Arc<RankingStore>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            config,
            store,
            metrics,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    fn initialize_repository(
        config: &AppConfig,
    ) -> Result<Arc<dyn PlayerRepository>, ServiceError> {
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory player storage");
                Ok(Arc::new(InMemoryPlayerRepository::new()))
            }
            StorageBackend::File => {
                info!(
                    "Using JSON file player storage at {}",
                    config.storage.path.display()
                );
                let repository = JsonFilePlayerRepository::open(&config.storage.path)
                    .map_err(|e| ServiceError::Storage {
                        message: e.to_string(),
                    })?;
                Ok(Arc::new(repository))
            }
        }
    }

    /// Mark the service as running and start background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        info!("Starting {} ranking service", self.config.service.name);

        *self.is_running.write().await = true;
        self.metrics.update_health_status(2);
        self.start_gauge_refresh().await;

        info!("✅ Ranking service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of the ranking service");

        *self.is_running.write().await = false;
        self.metrics.update_health_status(0);
        self.stop_background_tasks().await;

        let players = self.store.player_count().unwrap_or(0);
        let matches = self.store.match_count().unwrap_or(0);
        info!(
            "Final service statistics: {} players, {} matches processed",
            players, matches
        );
        info!("✅ Ranking service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn store(&self) -> Arc<RankingStore> {
        self.store.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    async fn start_gauge_refresh(&self) {
        let store = self.store.clone();
        let metrics = self.metrics.clone();
        let is_running = self.is_running.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(GAUGE_REFRESH_INTERVAL);

            while *is_running.read().await {
                interval.tick().await;

                let players = store.player_count().unwrap_or(0);
                let subscribers = store.broadcaster().subscriber_count();
                metrics.update_gauges(players, subscribers);
                debug!(
                    "Gauges refreshed: {} players, {} subscribers",
                    players, subscribers
                );
            }
        });

        self.background_tasks.lock().await.push(handle);
    }

    async fn stop_background_tasks(&self) {
        let mut tasks = self.background_tasks.lock().await;
        let task_count = tasks.len();

        if task_count == 0 {
            debug!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for task in tasks.drain(..) {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Background task ended with error: {}", e);
                }
            }
        }
    }
}
