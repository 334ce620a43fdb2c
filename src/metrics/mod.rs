//! Metrics and monitoring for the elo-ranker service
//!
//! This module provides Prometheus metrics collection for player registration,
//! match processing and the live ranking stream.

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, PerformanceMetrics, RankingMetrics, ServiceMetrics,
    StreamMetrics,
};
