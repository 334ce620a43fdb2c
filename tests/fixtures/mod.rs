//! Test fixtures and fake collaborators for integration testing

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use elo_ranker::config::AppConfig;
use elo_ranker::error::{RankerError, Result};
use elo_ranker::http::create_router;
use elo_ranker::metrics::MetricsCollector;
use elo_ranker::ranking::{Broadcaster, InMemoryPlayerRepository, PlayerRepository, RankingStore};
use elo_ranker::rating::EloCalculator;
use elo_ranker::service::AppState;
use elo_ranker::types::Player;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory repository whose batch writes can be made to fail on demand
#[derive(Debug, Default)]
pub struct FlakyRepository {
    inner: InMemoryPlayerRepository,
    fail_writes: AtomicBool,
    batch_writes: AtomicUsize,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save_all` fail without writing anything
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn batch_write_count(&self) -> usize {
        self.batch_writes.load(Ordering::SeqCst)
    }
}

impl PlayerRepository for FlakyRepository {
    fn find_by_id(&self, id: &str) -> Result<Option<Player>> {
        self.inner.find_by_id(id)
    }

    fn save(&self, player: Player) -> Result<()> {
        self.inner.save(player)
    }

    fn save_all(&self, players: Vec<Player>) -> Result<()> {
        self.batch_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RankerError::Storage {
                message: "simulated write failure".to_string(),
            });
        }
        self.inner.save_all(players)
    }

    fn list_all(&self) -> Result<Vec<Player>> {
        self.inner.list_all()
    }

    fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}

/// Store backed by the given repository with default Elo settings
pub fn create_test_store(repository: Arc<dyn PlayerRepository>) -> Arc<RankingStore> {
    Arc::new(RankingStore::new(
        repository,
        Arc::new(EloCalculator::default()),
        Broadcaster::new(),
    ))
}

/// Router over a fresh in-memory service
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(AppConfig::default()).expect("Failed to create app state"));
    (create_router(state.clone()), state)
}

/// Router over a service whose store uses `repository`
pub fn create_test_app_with(repository: Arc<dyn PlayerRepository>) -> (Router, Arc<AppState>) {
    let metrics = Arc::new(MetricsCollector::new().expect("Failed to create collector"));
    let store = Arc::new(
        RankingStore::new(
            repository,
            Arc::new(EloCalculator::default()),
            Broadcaster::new(),
        )
        .with_metrics(metrics.clone()),
    );
    let state = Arc::new(AppState::from_parts(AppConfig::default(), store, metrics));
    (create_router(state.clone()), state)
}

/// Unique data file path in the system temp directory
pub fn temp_data_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "elo-ranker-it-{}-{}.json",
        name,
        elo_ranker::utils::generate_id()
    ))
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
