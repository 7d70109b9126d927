pub mod tasks_crud;
pub mod tasks_handlers;
pub mod tasks_models;
