use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::errors::TaskError;
use crate::models::task::{Task, TaskPriority, TaskStatus};
use super::tasks_models::{NewTask, SortOrder, TaskChanges};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

// Priority is an ordinal domain concept; sorting the stored strings
// lexically would put "high" before "low".
const PRIORITY_RANK_SQL: &str =
    "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 WHEN 'high' THEN 2 WHEN 'urgent' THEN 3 ELSE 4 END";

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, assigned_to, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct TaskListParams {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub skip: i64,
    pub limit: i64,
}

impl Default for TaskListParams {
    fn default() -> Self {
        TaskListParams {
            status: None,
            priority: None,
            search: None,
            sort_by: "created_at".to_string(),
            sort_order: SortOrder::Asc,
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

fn sort_expr(sort_by: &str) -> Result<&'static str, TaskError> {
    match sort_by {
        "id" => Ok("id"),
        "title" => Ok("title"),
        "status" => Ok("status"),
        "priority" => Ok(PRIORITY_RANK_SQL),
        "due_date" => Ok("due_date"),
        "assigned_to" => Ok("assigned_to"),
        "created_at" => Ok("created_at"),
        "updated_at" => Ok("updated_at"),
        other => Err(TaskError::InvalidSortField(other.to_string())),
    }
}

fn push_filters(qb: &mut QueryBuilder<Sqlite>, params: &TaskListParams) {
    if let Some(status) = params.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = params.priority {
        qb.push(" AND priority = ").push_bind(priority.as_str());
    }
    if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        qb.push(" AND (lower(title) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(COALESCE(description, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[derive(Clone)]
pub struct TaskCrud {
    pool: SqlitePool,
}

impl TaskCrud {
    pub fn new(pool: SqlitePool) -> Self {
        TaskCrud { pool }
    }

    pub async fn create_task(&self, draft: NewTask) -> Result<Task, TaskError> {
        let created_at = Utc::now().naive_utc();
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, status, priority, due_date, assigned_to, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.status.as_str())
        .bind(draft.priority.as_str())
        .bind(draft.due_date)
        .bind(&draft.assigned_to)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Task {
            id: result.last_insert_rowid(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            due_date: draft.due_date,
            assigned_to: draft.assigned_to,
            created_at,
            updated_at: None,
        })
    }

    pub async fn get_task(&self, task_id: i64) -> Result<Option<Task>, TaskError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = ?",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    // Returns the requested page plus the number of rows matching the
    // filter before pagination, not just the page length.
    pub async fn list_tasks(&self, params: &TaskListParams) -> Result<(Vec<Task>, i64), TaskError> {
        let order_expr = sort_expr(&params.sort_by)?;
        let skip = params.skip.max(0);
        let limit = params.limit.clamp(1, MAX_PAGE_SIZE);

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks WHERE 1=1");
        push_filters(&mut count_qb, params);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM tasks WHERE 1=1",
            TASK_COLUMNS
        ));
        push_filters(&mut qb, params);
        qb.push(" ORDER BY ").push(order_expr);
        match params.sort_order {
            SortOrder::Asc => qb.push(" ASC"),
            SortOrder::Desc => qb.push(" DESC"),
        };
        // Tie-break on id so equal keys keep insertion order.
        qb.push(", id ASC");
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(skip);

        let tasks = qb.build_query_as::<Task>().fetch_all(&self.pool).await?;

        Ok((tasks, total))
    }

    pub async fn list_by_status(
        &self,
        status: TaskStatus,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Task>, i64), TaskError> {
        self.list_tasks(&TaskListParams {
            status: Some(status),
            skip,
            limit,
            ..Default::default()
        })
        .await
    }

    pub async fn list_by_priority(
        &self,
        priority: TaskPriority,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<Task>, i64), TaskError> {
        self.list_tasks(&TaskListParams {
            priority: Some(priority),
            skip,
            limit,
            ..Default::default()
        })
        .await
    }

    pub async fn update_task(
        &self,
        task_id: i64,
        changes: &TaskChanges,
    ) -> Result<Task, TaskError> {
        let task = self.get_task(task_id).await?.ok_or(TaskError::NotFound)?;
        if changes.is_empty() {
            // No fields supplied: leave the row (and updated_at) untouched.
            return Ok(task);
        }
        self.apply_update(task, changes).await
    }

    // Applies one sparse update to every id that resolves; unknown ids
    // are skipped silently and duplicates update the same row again.
    // Not atomic across the batch.
    pub async fn bulk_update_tasks(
        &self,
        task_ids: &[i64],
        changes: &TaskChanges,
    ) -> Result<Vec<Task>, TaskError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let mut updated = Vec::new();
        for &task_id in task_ids {
            match self.get_task(task_id).await? {
                Some(task) => updated.push(self.apply_update(task, changes).await?),
                None => continue,
            }
        }

        Ok(updated)
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), TaskError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaskError::NotFound);
        }

        Ok(())
    }

    async fn apply_update(&self, mut task: Task, changes: &TaskChanges) -> Result<Task, TaskError> {
        changes.apply(&mut task);
        task.updated_at = Some(Utc::now().naive_utc());

        sqlx::query(
            "UPDATE tasks
             SET title = ?, description = ?, status = ?, priority = ?, due_date = ?, assigned_to = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(&task.assigned_to)
        .bind(task.updated_at)
        .bind(task.id)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }
}
