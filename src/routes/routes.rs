use actix_web::web;

use super::tasks::tasks_handlers;

pub fn tasks_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("", web::post().to(tasks_handlers::create_task))
            .route("", web::get().to(tasks_handlers::get_tasks))
            // Literal segment must register ahead of the /{task_id} routes.
            .route("/bulk-update", web::put().to(tasks_handlers::bulk_update_tasks))
            .route("/status/{status}", web::get().to(tasks_handlers::get_tasks_by_status))
            .route("/priority/{priority}", web::get().to(tasks_handlers::get_tasks_by_priority))
            .route("/{task_id}", web::get().to(tasks_handlers::get_task))
            .route("/{task_id}", web::put().to(tasks_handlers::update_task))
            .route("/{task_id}", web::delete().to(tasks_handlers::delete_task)),
    );
}
