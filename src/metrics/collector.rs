//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the elo-ranker service using
//! Prometheus metrics.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the ranking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Player and match metrics
    ranking_metrics: RankingMetrics,

    /// Live update stream metrics
    stream_metrics: StreamMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,

    started_at: Instant,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Requests rejected by the ranking core, by error kind
    pub requests_rejected_total: IntCounterVec,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,
}

/// Player and match metrics
#[derive(Clone)]
pub struct RankingMetrics {
    /// Total players registered since start
    pub players_created_total: IntCounter,

    /// Players currently known to the store
    pub players_registered: IntGauge,

    /// Matches processed, by outcome (win/draw)
    pub matches_processed_total: IntCounterVec,

    /// Distribution of ratings written by the store
    pub rating_distribution: Histogram,
}

/// Live update stream metrics
#[derive(Clone)]
pub struct StreamMetrics {
    /// Subscribers currently attached to the ranking stream
    pub active_subscribers: IntGauge,

    /// Ranking events emitted by the store, whether or not anyone listens
    pub events_emitted_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent applying a match result
    pub match_processing_duration: Histogram,

    /// Time spent registering a player
    pub player_creation_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let ranking_metrics = RankingMetrics::new(&registry)?;
        let stream_metrics = StreamMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            ranking_metrics,
            stream_metrics,
            performance_metrics,
            started_at: Instant::now(),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get player and match metrics
    pub fn ranking(&self) -> &RankingMetrics {
        &self.ranking_metrics
    }

    /// Get stream metrics
    pub fn stream(&self) -> &StreamMetrics {
        &self.stream_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a newly registered player
    pub fn record_player_created(&self, rating: i32, duration: Duration) {
        self.ranking_metrics.players_created_total.inc();
        self.ranking_metrics.players_registered.inc();
        self.ranking_metrics
            .rating_distribution
            .observe(rating as f64);
        self.performance_metrics
            .player_creation_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a processed match and the two resulting ratings
    pub fn record_match_processed(&self, is_draw: bool, ratings: [i32; 2], duration: Duration) {
        let outcome = if is_draw { "draw" } else { "win" };

        self.ranking_metrics
            .matches_processed_total
            .with_label_values(&[outcome])
            .inc();

        for rating in ratings {
            self.ranking_metrics
                .rating_distribution
                .observe(rating as f64);
        }

        self.performance_metrics
            .match_processing_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a request rejected by the ranking core
    pub fn record_rejection(&self, kind: &str) {
        self.service_metrics
            .requests_rejected_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record ranking events emitted by the store
    pub fn record_events_emitted(&self, count: u64) {
        self.stream_metrics.events_emitted_total.inc_by(count);
    }

    /// Refresh point-in-time gauges before a scrape
    pub fn update_gauges(&self, players: usize, subscribers: usize) {
        self.ranking_metrics.players_registered.set(players as i64);
        self.stream_metrics
            .active_subscribers
            .set(subscribers as i64);
        self.service_metrics
            .uptime_seconds
            .set(self.started_at.elapsed().as_secs() as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    /// Start measuring from now
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("elo_ranker_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let requests_rejected_total = IntCounterVec::new(
            Opts::new(
                "elo_ranker_requests_rejected_total",
                "Requests rejected by the ranking core",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(requests_rejected_total.clone()))?;

        let health_status = IntGauge::new(
            "elo_ranker_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        Ok(Self {
            uptime_seconds,
            requests_rejected_total,
            health_status,
        })
    }
}

impl RankingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let players_created_total = IntCounter::new(
            "elo_ranker_players_created_total",
            "Total players registered",
        )?;
        registry.register(Box::new(players_created_total.clone()))?;

        let players_registered = IntGauge::new(
            "elo_ranker_players_registered",
            "Players currently in the ranking",
        )?;
        registry.register(Box::new(players_registered.clone()))?;

        let matches_processed_total = IntCounterVec::new(
            Opts::new(
                "elo_ranker_matches_processed_total",
                "Total matches processed",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(matches_processed_total.clone()))?;

        let rating_distribution = Histogram::with_opts(
            HistogramOpts::new("elo_ranker_rating_distribution", "Player rating distribution")
                .buckets(vec![
                    800.0, 1000.0, 1100.0, 1200.0, 1300.0, 1400.0, 1600.0, 1800.0, 2000.0,
                ]),
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        Ok(Self {
            players_created_total,
            players_registered,
            matches_processed_total,
            rating_distribution,
        })
    }
}

impl StreamMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_subscribers = IntGauge::new(
            "elo_ranker_active_subscribers",
            "Clients attached to the ranking event stream",
        )?;
        registry.register(Box::new(active_subscribers.clone()))?;

        let events_emitted_total = IntCounter::new(
            "elo_ranker_events_emitted_total",
            "Ranking update events emitted, including those with no subscriber",
        )?;
        registry.register(Box::new(events_emitted_total.clone()))?;

        Ok(Self {
            active_subscribers,
            events_emitted_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let match_processing_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elo_ranker_match_processing_duration_seconds",
                "Match processing time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(match_processing_duration.clone()))?;

        let player_creation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elo_ranker_player_creation_duration_seconds",
                "Player registration time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(player_creation_duration.clone()))?;

        Ok(Self {
            match_processing_duration,
            player_creation_duration,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
