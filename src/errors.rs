use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),

    #[error("Task not found")]
    NotFound,

    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
