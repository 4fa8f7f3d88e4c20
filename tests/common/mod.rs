//! Shared stubs for API surface tests: a scripted provider, a canned
//! relational store, and state assembly over the in-process key-value store.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use printgate::cache::MemoryStore;
use printgate::config::PrintgateConfig;
use printgate::provider::{Mockup, MockupProvider, MockupRequest, TaskState};
use printgate::repository::{QueryOptions, RelationalStore};
use printgate::web::state::AppState;
use printgate::{PrintgateError, Result};

/// How the stub provider resolves mockup tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockupBehavior {
    /// Submission pending, first status check completed
    ReadyOnFirstPoll,
    /// Never leaves pending: drives the poller into its timeout
    NeverReady,
}

pub struct StubProvider {
    pub behavior: MockupBehavior,
    pub catalog_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(behavior: MockupBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            catalog_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MockupProvider for StubProvider {
    async fn create_task(&self, _request: &MockupRequest) -> Result<printgate::provider::TaskStatus> {
        Ok(printgate::provider::TaskStatus {
            task_key: "task-stub-1".to_string(),
            state: TaskState::Pending,
            mockups: vec![],
            error: None,
        })
    }

    async fn task_status(&self, task_key: &str) -> Result<printgate::provider::TaskStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let state = match self.behavior {
            MockupBehavior::ReadyOnFirstPoll => TaskState::Completed,
            MockupBehavior::NeverReady => TaskState::Pending,
        };
        Ok(printgate::provider::TaskStatus {
            task_key: task_key.to_string(),
            state,
            mockups: match state {
                TaskState::Completed => vec![Mockup {
                    placement: "front".to_string(),
                    variant_ids: vec![4012],
                    mockup_url: "https://cdn.example/mockup.jpg".to_string(),
                }],
                _ => vec![],
            },
            error: None,
        })
    }

    async fn catalog_product(&self, product_id: i64) -> Result<Value> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"id": product_id, "title": "Unisex Tee"}))
    }

    async fn catalog_variant(&self, product_id: i64, variant_id: i64) -> Result<Value> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"id": variant_id, "product_id": product_id, "size": "M"}))
    }

    fn base_url(&self) -> &str {
        "https://provider.test"
    }
}

/// Canned relational store: one project row, fetch counting
pub struct StubRelational {
    pub fetches: AtomicUsize,
    row: parking_lot::Mutex<Value>,
}

impl StubRelational {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            row: parking_lot::Mutex::new(
                json!({"id": 7, "owner_id": 3, "title": "summer tee", "status": "draft"}),
            ),
        })
    }
}

#[async_trait]
impl RelationalStore for StubRelational {
    async fn fetch_by_id(&self, _table: &str, id: i64) -> Result<Option<Value>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if id == 7 {
            Ok(Some(self.row.lock().clone()))
        } else {
            Ok(None)
        }
    }

    async fn fetch_query(&self, _table: &str, query: &QueryOptions) -> Result<Vec<Value>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let row = self.row.lock().clone();
        let owner_matches = query
            .filters
            .get("owner_id")
            .and_then(Value::as_i64)
            .is_none_or(|owner| row["owner_id"] == json!(owner));
        Ok(if owner_matches { vec![row] } else { vec![] })
    }

    async fn update(&self, _table: &str, id: i64, changes: &Value) -> Result<Option<Value>> {
        if id != 7 {
            return Ok(None);
        }
        let mut row = self.row.lock();
        if let (Value::Object(row), Value::Object(changes)) = (&mut *row, changes) {
            for (k, v) in changes {
                row.insert(k.clone(), v.clone());
            }
        }
        Ok(Some(row.clone()))
    }

    async fn insert(&self, _table: &str, data: &Value) -> Result<Value> {
        let mut row = data.clone();
        row["id"] = json!(99);
        Ok(row)
    }

    async fn delete(&self, _table: &str, id: i64) -> Result<bool> {
        Ok(id == 7)
    }
}

/// Placeholder relational store for tests that never touch the database path
pub struct NoDatabase;

#[async_trait]
impl RelationalStore for NoDatabase {
    async fn fetch_by_id(&self, table: &str, _id: i64) -> Result<Option<Value>> {
        Err(PrintgateError::internal(format!(
            "unexpected database access for table {table}"
        )))
    }

    async fn fetch_query(&self, table: &str, _query: &QueryOptions) -> Result<Vec<Value>> {
        Err(PrintgateError::internal(format!(
            "unexpected database access for table {table}"
        )))
    }

    async fn update(&self, table: &str, _id: i64, _changes: &Value) -> Result<Option<Value>> {
        Err(PrintgateError::internal(format!(
            "unexpected database access for table {table}"
        )))
    }

    async fn insert(&self, table: &str, _data: &Value) -> Result<Value> {
        Err(PrintgateError::internal(format!(
            "unexpected database access for table {table}"
        )))
    }

    async fn delete(&self, table: &str, _id: i64) -> Result<bool> {
        Err(PrintgateError::internal(format!(
            "unexpected database access for table {table}"
        )))
    }
}

pub fn test_state(
    config: PrintgateConfig,
    relational: Arc<dyn RelationalStore>,
    provider: Arc<dyn MockupProvider>,
) -> AppState {
    AppState::assemble(config, Arc::new(MemoryStore::new()), relational, provider)
}
