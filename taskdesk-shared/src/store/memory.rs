/// In-memory storage backend
///
/// Keeps identities and tasks in `RwLock`-guarded maps. Nothing survives a
/// restart; used by the HTTP test suites and `STORAGE_BACKEND=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, TaskStore, UserStore};
use crate::models::task::{CreateTask, Task, TaskQuery, UpdateTask};
use crate::models::user::{normalize_email, CreateUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// Normalized email -> user id
    emails: HashMap<String, Uuid>,
    tasks: HashMap<Uuid, Task>,
    /// Task ids in insertion order
    order: Vec<Uuid>,
}

/// Store holding everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let email = normalize_email(&data.email);
        let mut inner = self.inner.write().await;

        if inner.emails.contains_key(&email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            name: data.name,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };

        inner.emails.insert(email, user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(&normalize_email(email))
            .and_then(|id| inner.users.get(id))
            .cloned())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&data.owner_id) {
            return Err(StoreError::MissingReference("tasks_owner_id_fkey".to_string()));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            created_at: now,
            updated_at: now,
        };

        inner.order.push(task.id);
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<(Vec<Task>, i64), StoreError> {
        let inner = self.inner.read().await;

        // Reverse insertion order first so equal timestamps stay newest-first
        // after the stable sort.
        let mut matching: Vec<&Task> = inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|task| query.scope.includes(task.owner_id))
            .filter(|task| query.status.map_or(true, |s| task.status == s))
            .filter(|task| query.priority.map_or(true, |p| task.priority == p))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut inner = self.inner.write().await;

        Ok(inner.tasks.get_mut(&id).map(|task| {
            data.apply_to(task, Utc::now());
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        inner.order.retain(|task_id| *task_id != id);
        Ok(true)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::ListScope;
    use crate::models::task::{TaskPriority, TaskStatus};
    use crate::models::user::Role;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "$argon2id$test".to_string(),
                name: "Test User".to_string(),
                role: Role::User,
            })
            .await
            .expect("Should create user")
    }

    async fn task(store: &MemoryStore, owner_id: Uuid, title: &str) -> Task {
        store
            .create_task(CreateTask {
                owner_id,
                title: title.to_string(),
                description: None,
                status: TaskStatus::Todo,
                priority: TaskPriority::Medium,
            })
            .await
            .expect("Should create task")
    }

    fn query(scope: ListScope, limit: i64, offset: i64) -> TaskQuery {
        TaskQuery {
            scope,
            status: None,
            priority: None,
            limit,
            offset,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let created = user(&store, "Jane@Example.com").await;
        assert_eq!(created.email, "jane@example.com");

        let err = store
            .create_user(CreateUser {
                email: " JANE@example.COM".to_string(),
                password_hash: "x".to_string(),
                name: "Other".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let found = store.find_user_by_email("jane@EXAMPLE.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_task_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = store
            .create_task(CreateTask {
                owner_id: Uuid::new_v4(),
                title: "Orphan".to_string(),
                description: None,
                status: TaskStatus::Todo,
                priority: TaskPriority::Low,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_pagination() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        for i in 1..=12 {
            task(&store, owner.id, &format!("Task {:02}", i)).await;
        }

        let (page, total) = store
            .list_tasks(&query(ListScope::Owner(owner.id), 5, 5))
            .await
            .unwrap();

        assert_eq!(total, 12);
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Task 07", "Task 06", "Task 05", "Task 04", "Task 03"]);
    }

    #[tokio::test]
    async fn test_list_scope_and_filters() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;

        task(&store, alice.id, "Alice task").await;
        let bobs = task(&store, bob.id, "Bob task").await;
        store
            .update_task(
                bobs.id,
                UpdateTask {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (tasks, total) = store
            .list_tasks(&query(ListScope::Owner(alice.id), 10, 0))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(tasks.iter().all(|t| t.owner_id == alice.id));

        let (_, total) = store.list_tasks(&query(ListScope::All, 10, 0)).await.unwrap();
        assert_eq!(total, 2);

        let mut done = query(ListScope::All, 10, 0);
        done.status = Some(TaskStatus::Done);
        let (tasks, total) = store.list_tasks(&done).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(tasks[0].id, bobs.id);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let created = task(&store, owner.id, "Original").await;

        let updated = store
            .update_task(
                created.id,
                UpdateTask {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .expect("Task should exist");
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.owner_id, owner.id);
        assert!(updated.updated_at >= created.updated_at);

        assert!(store.delete_task(created.id).await.unwrap());
        assert!(!store.delete_task(created.id).await.unwrap());
        assert!(store.find_task(created.id).await.unwrap().is_none());
        assert!(store
            .update_task(created.id, UpdateTask::default())
            .await
            .unwrap()
            .is_none());
    }
}
