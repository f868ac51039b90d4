use std::sync::Arc;

use models::{Principal, TodoPayload, TodoRecord};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::pagination::PageWindow;
use crate::storage::OrderedMap;

use super::context::{Clock, IdGenerator, SystemClock, UuidGenerator};

/// Whether ownership is enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tenancy {
    /// Every read and write is scoped to the record owner.
    #[default]
    MultiTenant,
    /// Ungated: all callers see and modify all records.
    SingleTenant,
}

/// Todo business service independent of web framework.
///
/// Mutations hold `write_gate` across their whole read-check-write sequence,
/// so two concurrent callers can never interleave on the same store.
pub struct TodoService {
    map: Arc<dyn OrderedMap<TodoRecord>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    tenancy: Tenancy,
    write_gate: Mutex<()>,
}

impl TodoService {
    pub fn new(map: Arc<dyn OrderedMap<TodoRecord>>) -> Self {
        Self::with_parts(map, Arc::new(SystemClock::new()), Arc::new(UuidGenerator), Tenancy::default())
    }

    pub fn with_parts(
        map: Arc<dyn OrderedMap<TodoRecord>>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        tenancy: Tenancy,
    ) -> Self {
        Self { map, clock, ids, tenancy, write_gate: Mutex::new(()) }
    }

    pub fn with_tenancy(mut self, tenancy: Tenancy) -> Self {
        self.tenancy = tenancy;
        self
    }

    fn visible_to(&self, record: &TodoRecord, caller: &Principal) -> bool {
        self.tenancy == Tenancy::SingleTenant || record.is_owned_by(caller)
    }

    /// Fetch `id` and check that `caller` may act on it.
    async fn load_authorized(&self, caller: &Principal, id: &str) -> Result<TodoRecord, ServiceError> {
        let record = self.map.get(id).await.ok_or_else(|| ServiceError::not_found(id))?;
        if !self.visible_to(&record, caller) {
            return Err(ServiceError::not_owner(id));
        }
        Ok(record)
    }

    /// All todos of the caller, in store order.
    pub async fn list_owned(&self, caller: &Principal) -> Vec<TodoRecord> {
        self.map
            .values()
            .await
            .into_iter()
            .filter(|r| self.visible_to(r, caller))
            .collect()
    }

    /// Caller's todos carrying `tag` among store positions `[start, end)`.
    ///
    /// Positions index the whole store, not the filtered result, and a window
    /// may cover at most two positions. Paging through a tag means advancing
    /// the window over the store.
    pub async fn list_by_tag_paged(
        &self,
        caller: &Principal,
        tag: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<TodoRecord>, ServiceError> {
        let items = self.map.items().await;
        let range = PageWindow::new(start, end).validate(items.len())?;
        Ok(items[range]
            .iter()
            .map(|(_, r)| r)
            .filter(|r| r.tag == tag && self.visible_to(r, caller))
            .cloned()
            .collect())
    }

    pub async fn get(&self, caller: &Principal, id: &str) -> Result<TodoRecord, ServiceError> {
        self.load_authorized(caller, id).await
    }

    /// Create a todo owned by the caller.
    ///
    /// # Examples
    /// ```
    /// use models::{Principal, TodoPayload, TodoRecord};
    /// use service::storage::{JsonMapStore, StoreLimits};
    /// use service::todo::TodoService;
    ///
    /// let path = std::env::temp_dir().join(format!("doc_todos_{}.json", uuid::Uuid::new_v4()));
    /// let store = tokio_test::block_on(JsonMapStore::<TodoRecord>::new(&path, StoreLimits::default())).unwrap();
    /// let svc = TodoService::new(store);
    /// let alice = Principal::from("alice");
    /// let todo = tokio_test::block_on(svc.create(&alice, TodoPayload::new("Buy milk", "2 litres", "home"))).unwrap();
    /// assert_eq!(todo.owner, alice);
    /// assert!(!todo.completed);
    /// assert!(todo.updated_at.is_none());
    /// # let _ = std::fs::remove_file(path);
    /// ```
    #[instrument(skip(self, caller, payload), fields(caller = %caller))]
    pub async fn create(&self, caller: &Principal, payload: TodoPayload) -> Result<TodoRecord, ServiceError> {
        payload.validate()?;
        let _gate = self.write_gate.lock().await;
        let record = TodoRecord::new(self.ids.new_id(), caller.clone(), payload, self.clock.now());
        self.map.insert(record.id.clone(), record.clone()).await?;
        info!(id = %record.id, tag = %record.tag, "todo_created");
        Ok(record)
    }

    /// Replace title, body and tag. Validation runs before the lookup.
    #[instrument(skip(self, caller, payload), fields(caller = %caller))]
    pub async fn update(&self, caller: &Principal, id: &str, payload: TodoPayload) -> Result<TodoRecord, ServiceError> {
        payload.validate()?;
        let _gate = self.write_gate.lock().await;
        let mut record = self.load_authorized(caller, id).await?;
        record.apply(payload, self.clock.now());
        self.map.insert(record.id.clone(), record.clone()).await?;
        info!(id = %record.id, "todo_updated");
        Ok(record)
    }

    /// Remove the todo and hand it back.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub async fn delete(&self, caller: &Principal, id: &str) -> Result<TodoRecord, ServiceError> {
        let _gate = self.write_gate.lock().await;
        let record = self.load_authorized(caller, id).await?;
        self.map.remove(id).await?;
        info!(id = %record.id, "todo_deleted");
        Ok(record)
    }

    /// Mark as completed. A second call fails with `AlreadyCompleted`.
    #[instrument(skip(self, caller), fields(caller = %caller))]
    pub async fn complete(&self, caller: &Principal, id: &str) -> Result<TodoRecord, ServiceError> {
        let _gate = self.write_gate.lock().await;
        let mut record = self.load_authorized(caller, id).await?;
        if record.completed {
            return Err(ServiceError::AlreadyCompleted(id.to_string()));
        }
        record.mark_completed(self.clock.now());
        self.map.insert(record.id.clone(), record.clone()).await?;
        info!(id = %record.id, "todo_completed");
        Ok(record)
    }

    pub async fn len(&self) -> usize {
        self.map.len().await
    }
}
