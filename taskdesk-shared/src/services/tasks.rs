/// Task operations with ownership scoping
///
/// Every single-task operation loads the task first, so a missing id is
/// `NotFound` and an existing task the caller may not touch is `Forbidden`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::{FieldError, ServiceError};
use crate::auth::authorization::{list_scope, require_access, Action};
use crate::auth::middleware::AuthContext;
use crate::models::task::{NewTask, Task, TaskPriority, TaskQuery, TaskStatus, UpdateTask};
use crate::store::TaskStore;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Listing filters and page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// 1-based page number
    pub page: i64,
    pub limit: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListParams {
    fn check(&self) -> Result<(), ServiceError> {
        let mut errors = Vec::new();
        if self.page < 1 {
            errors.push(FieldError::new("page", "Page must be at least 1"));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            errors.push(FieldError::new("limit", "Limit must be between 1 and 100"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors))
        }
    }

    /// Rows to skip for this page
    ///
    /// Saturates for absurdly large pages, which then read past the end and
    /// come back empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).checked_mul(self.limit).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// One page of tasks
#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

/// Creates a task owned by the caller
pub async fn create<S>(store: &S, auth: &AuthContext, input: NewTask) -> Result<Task, ServiceError>
where
    S: TaskStore + ?Sized,
{
    let input = input.normalized();
    input.validate()?;

    let task = store.create_task(input.into_create(auth.user_id)).await?;
    info!(
        task_id = %task.id,
        user_id = %auth.user_id,
        status = task.status.as_str(),
        priority = task.priority.as_str(),
        "Task created"
    );

    Ok(task)
}

/// Lists the tasks the caller may see, newest first
pub async fn list<S>(store: &S, auth: &AuthContext, params: ListParams) -> Result<TaskPage, ServiceError>
where
    S: TaskStore + ?Sized,
{
    params.check()?;

    let query = TaskQuery {
        scope: list_scope(auth),
        status: params.status,
        priority: params.priority,
        limit: params.limit,
        offset: params.offset(),
    };
    let (tasks, total) = store.list_tasks(&query).await?;

    Ok(TaskPage {
        tasks,
        pagination: Pagination::new(params.page, params.limit, total),
    })
}

/// Fetches one task
pub async fn get_by_id<S>(store: &S, auth: &AuthContext, id: Uuid) -> Result<Task, ServiceError>
where
    S: TaskStore + ?Sized,
{
    let task = load(store, id).await?;
    require_access(auth, task.owner_id, Action::Read)?;
    Ok(task)
}

/// Applies a partial update
pub async fn update<S>(
    store: &S,
    auth: &AuthContext,
    id: Uuid,
    input: UpdateTask,
) -> Result<Task, ServiceError>
where
    S: TaskStore + ?Sized,
{
    let input = input.normalized();
    input.validate()?;

    let task = load(store, id).await?;
    require_access(auth, task.owner_id, Action::Update)?;

    if input.is_empty() {
        debug!(task_id = %id, "Update carries no fields, touching updated_at only");
    }

    let updated = store
        .update_task(id, input)
        .await?
        .ok_or_else(task_not_found)?;
    info!(
        task_id = %id,
        user_id = %auth.user_id,
        status = updated.status.as_str(),
        priority = updated.priority.as_str(),
        "Task updated"
    );

    Ok(updated)
}

/// Removes a task
pub async fn delete<S>(store: &S, auth: &AuthContext, id: Uuid) -> Result<(), ServiceError>
where
    S: TaskStore + ?Sized,
{
    let task = load(store, id).await?;
    require_access(auth, task.owner_id, Action::Delete)?;

    if !store.delete_task(id).await? {
        return Err(task_not_found());
    }
    info!(task_id = %id, user_id = %auth.user_id, "Task deleted");

    Ok(())
}

async fn load<S>(store: &S, id: Uuid) -> Result<Task, ServiceError>
where
    S: TaskStore + ?Sized,
{
    store.find_task(id).await?.ok_or_else(task_not_found)
}

fn task_not_found() -> ServiceError {
    ServiceError::NotFound("Task not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{CreateUser, Role};
    use crate::store::{MemoryStore, UserStore};

    async fn identity(store: &MemoryStore, email: &str, role: Role) -> AuthContext {
        let user = store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "$argon2id$test".to_string(),
                name: "Someone".to_string(),
                role,
            })
            .await
            .unwrap();
        AuthContext::new(user.id, user.email, role)
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_pagination_pages() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(2, 5, 12).pages, 3);
    }

    #[tokio::test]
    async fn test_create_then_get_roundtrip() {
        let store = MemoryStore::new();
        let alice = identity(&store, "alice@example.com", Role::User).await;

        let created = create(
            &store,
            &alice,
            NewTask {
                title: "  Write docs  ".to_string(),
                description: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(created.title, "Write docs");
        assert_eq!(created.description, None);
        assert_eq!(created.status, TaskStatus::Todo);
        assert_eq!(created.priority, TaskPriority::Medium);
        assert_eq!(created.owner_id, alice.user_id);

        let fetched = get_by_id(&store, &alice, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_short_title() {
        let store = MemoryStore::new();
        let alice = identity(&store, "alice@example.com", Role::User).await;

        let err = create(&store, &alice, new_task("  ab ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref errors) if errors[0].field == "title"));
    }

    #[tokio::test]
    async fn test_user_cannot_touch_others_tasks_admin_can() {
        let store = MemoryStore::new();
        let alice = identity(&store, "alice@example.com", Role::User).await;
        let bob = identity(&store, "bob@example.com", Role::User).await;
        let admin = identity(&store, "admin@example.com", Role::Admin).await;

        let task = create(&store, &alice, new_task("Alice's task")).await.unwrap();

        let err = get_by_id(&store, &bob, task.id).await.unwrap_err();
        assert_eq!(err, ServiceError::Forbidden("Not authorized to view this task".to_string()));

        let change = UpdateTask {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        let err = update(&store, &bob, task.id, change.clone()).await.unwrap_err();
        assert_eq!(err, ServiceError::Forbidden("Not authorized to update this task".to_string()));

        let err = delete(&store, &bob, task.id).await.unwrap_err();
        assert_eq!(err, ServiceError::Forbidden("Not authorized to delete this task".to_string()));

        let updated = update(&store, &admin, task.id, change).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(updated.owner_id, alice.user_id);

        delete(&store, &admin, task.id).await.unwrap();
        assert_eq!(
            get_by_id(&store, &alice, task.id).await.unwrap_err(),
            ServiceError::NotFound("Task not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_scoping() {
        let store = MemoryStore::new();
        let alice = identity(&store, "alice@example.com", Role::User).await;
        let bob = identity(&store, "bob@example.com", Role::User).await;
        let admin = identity(&store, "admin@example.com", Role::Admin).await;

        create(&store, &alice, new_task("Alice one")).await.unwrap();
        create(&store, &alice, new_task("Alice two")).await.unwrap();
        create(&store, &bob, new_task("Bob one")).await.unwrap();

        let page = list(&store, &alice, ListParams::default()).await.unwrap();
        assert_eq!(page.pagination.total, 2);
        assert!(page.tasks.iter().all(|t| t.owner_id == alice.user_id));

        let page = list(&store, &admin, ListParams::default()).await.unwrap();
        assert_eq!(page.pagination.total, 3);
    }

    #[tokio::test]
    async fn test_list_second_page_of_twelve() {
        let store = MemoryStore::new();
        let alice = identity(&store, "alice@example.com", Role::User).await;
        for i in 1..=12 {
            create(&store, &alice, new_task(&format!("Task {:02}", i))).await.unwrap();
        }

        let page = list(
            &store,
            &alice,
            ListParams {
                page: 2,
                limit: 5,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let titles: Vec<&str> = page.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Task 07", "Task 06", "Task 05", "Task 04", "Task 03"]);
        assert_eq!(page.pagination, Pagination { page: 2, limit: 5, total: 12, pages: 3 });
    }

    #[test]
    fn test_offset_saturates() {
        let params = ListParams {
            page: 3,
            limit: 5,
            ..Default::default()
        };
        assert_eq!(params.offset(), 10);

        let params = ListParams {
            page: i64::MAX,
            limit: MAX_LIMIT,
            ..Default::default()
        };
        assert_eq!(params.offset(), i64::MAX);
    }

    #[tokio::test]
    async fn test_list_huge_page_is_empty() {
        let store = MemoryStore::new();
        let alice = identity(&store, "alice@example.com", Role::User).await;
        create(&store, &alice, new_task("Only task")).await.unwrap();

        let page = list(
            &store,
            &alice,
            ListParams {
                page: i64::MAX,
                limit: MAX_LIMIT,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(page.tasks.is_empty());
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.page, i64::MAX);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_paging() {
        let store = MemoryStore::new();
        let alice = identity(&store, "alice@example.com", Role::User).await;

        let err = list(
            &store,
            &alice,
            ListParams {
                page: 0,
                limit: 101,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["page", "limit"]);
    }
}
