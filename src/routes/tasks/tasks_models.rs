use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::TaskError;
use crate::models::task::{Task, TaskPriority, TaskStatus};

const TITLE_MAX_LEN: usize = 200;
const DESCRIPTION_MAX_LEN: usize = 1000;
const ASSIGNED_TO_MAX_LEN: usize = 100;

// json format

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDateTime>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDateTime>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub task_ids: Vec<i64>,
    pub updates: UpdateTaskRequest,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Asc
    }
}

#[derive(Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: i64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

// A fully-populated draft ready for insertion; defaults already applied.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDateTime>,
    pub assigned_to: Option<String>,
}

// Sparse update: one slot per mutable field, absent slots stay untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDateTime>,
    pub assigned_to: Option<String>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = Some(assigned_to.clone());
        }
    }
}

fn validate_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::Validation(
            "Title must not be empty or whitespace.".to_string(),
        ));
    }
    if trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(TaskError::Validation(format!(
            "Title must be at most {} characters.",
            TITLE_MAX_LEN
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_description(description: &str) -> Result<(), TaskError> {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(TaskError::Validation(format!(
            "Description must be at most {} characters.",
            DESCRIPTION_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_assigned_to(assigned_to: &str) -> Result<(), TaskError> {
    if assigned_to.chars().count() > ASSIGNED_TO_MAX_LEN {
        return Err(TaskError::Validation(format!(
            "Assignee must be at most {} characters.",
            ASSIGNED_TO_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_due_date(due_date: NaiveDateTime, now: NaiveDateTime) -> Result<(), TaskError> {
    if due_date <= now {
        return Err(TaskError::Validation(
            "Due date must be in the future.".to_string(),
        ));
    }
    Ok(())
}

impl CreateTaskRequest {
    pub fn validate(&self, now: NaiveDateTime) -> Result<NewTask, TaskError> {
        let title = validate_title(&self.title)?;
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(assigned_to) = &self.assigned_to {
            validate_assigned_to(assigned_to)?;
        }
        if let Some(due_date) = self.due_date {
            validate_due_date(due_date, now)?;
        }

        Ok(NewTask {
            title,
            description: self.description.clone(),
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            assigned_to: self.assigned_to.clone(),
        })
    }
}

impl UpdateTaskRequest {
    pub fn validate(&self, now: NaiveDateTime) -> Result<TaskChanges, TaskError> {
        let title = match &self.title {
            Some(title) => Some(validate_title(title)?),
            None => None,
        };
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(assigned_to) = &self.assigned_to {
            validate_assigned_to(assigned_to)?;
        }
        if let Some(due_date) = self.due_date {
            validate_due_date(due_date, now)?;
        }

        Ok(TaskChanges {
            title,
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            assigned_to: self.assigned_to.clone(),
        })
    }
}
