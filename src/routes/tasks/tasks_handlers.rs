use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};
use sqlx::SqlitePool;

use crate::errors::TaskError;
use crate::models::task::{TaskPriority, TaskStatus};
use super::tasks_crud::{TaskCrud, TaskListParams, DEFAULT_PAGE_SIZE};
use super::tasks_models::{
    BulkUpdateRequest, CreateTaskRequest, ErrorResponse, PageQuery, TaskListQuery,
    TaskListResponse, UpdateTaskRequest,
};

fn error_response(context: &str, err: TaskError) -> HttpResponse {
    match err {
        TaskError::Validation(message) => {
            info!("{}: {}", context, message);
            HttpResponse::BadRequest().json(ErrorResponse { message })
        }
        TaskError::NotFound => {
            info!("{}: task not found", context);
            HttpResponse::NotFound().json(ErrorResponse {
                message: "Task not found".to_string(),
            })
        }
        TaskError::InvalidSortField(field) => {
            info!("{}: invalid sort field '{}'", context, field);
            HttpResponse::BadRequest().json(ErrorResponse {
                message: format!("Invalid sort field: {}", field),
            })
        }
        TaskError::Database(e) => {
            error!("{}: {}", context, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                message: "Internal server error".to_string(),
            })
        }
    }
}

// Handler to create a task
pub async fn create_task(
    pool: web::Data<SqlitePool>,
    request: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let draft = match request.validate(Utc::now().naive_utc()) {
        Ok(draft) => draft,
        Err(e) => return error_response("create_task", e),
    };

    match TaskCrud::new(pool.get_ref().clone()).create_task(draft).await {
        Ok(task) => {
            info!("Created task {}", task.id);
            HttpResponse::Created().json(task)
        }
        Err(e) => error_response("create_task", e),
    }
}

// Handler to list tasks with filter, search, sort and pagination
pub async fn get_tasks(
    pool: web::Data<SqlitePool>,
    query: web::Query<TaskListQuery>,
) -> impl Responder {
    let query = query.into_inner();
    let params = TaskListParams {
        status: query.status,
        priority: query.priority,
        search: query.search,
        sort_by: query.sort_by.unwrap_or_else(|| "created_at".to_string()),
        sort_order: query.sort_order.unwrap_or_default(),
        skip: query.skip.unwrap_or(0),
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    match TaskCrud::new(pool.get_ref().clone()).list_tasks(&params).await {
        Ok((tasks, total)) => HttpResponse::Ok().json(TaskListResponse { tasks, total }),
        Err(e) => error_response("get_tasks", e),
    }
}

// Handler to get a single task by id
pub async fn get_task(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let task_id = path.into_inner();

    match TaskCrud::new(pool.get_ref().clone()).get_task(task_id).await {
        Ok(Some(task)) => HttpResponse::Ok().json(task),
        Ok(None) => {
            info!("Task not found: {}", task_id);
            HttpResponse::NotFound().json(ErrorResponse {
                message: "Task not found".to_string(),
            })
        }
        Err(e) => error_response("get_task", e),
    }
}

// Handler to apply a sparse update to a single task
pub async fn update_task(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    request: web::Json<UpdateTaskRequest>,
) -> impl Responder {
    let task_id = path.into_inner();
    let changes = match request.validate(Utc::now().naive_utc()) {
        Ok(changes) => changes,
        Err(e) => return error_response("update_task", e),
    };

    match TaskCrud::new(pool.get_ref().clone())
        .update_task(task_id, &changes)
        .await
    {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => error_response("update_task", e),
    }
}

// Handler to apply one sparse update to a batch of task ids
pub async fn bulk_update_tasks(
    pool: web::Data<SqlitePool>,
    request: web::Json<BulkUpdateRequest>,
) -> impl Responder {
    let request = request.into_inner();
    let changes = match request.updates.validate(Utc::now().naive_utc()) {
        Ok(changes) => changes,
        Err(e) => return error_response("bulk_update_tasks", e),
    };

    match TaskCrud::new(pool.get_ref().clone())
        .bulk_update_tasks(&request.task_ids, &changes)
        .await
    {
        Ok(updated) if updated.is_empty() => {
            info!("Bulk update touched no tasks");
            HttpResponse::NotFound().json(ErrorResponse {
                message: "No tasks updated".to_string(),
            })
        }
        Ok(updated) => {
            info!("Bulk updated {} task(s)", updated.len());
            HttpResponse::Ok().json(updated)
        }
        Err(e) => error_response("bulk_update_tasks", e),
    }
}

// Handler to delete a task
pub async fn delete_task(pool: web::Data<SqlitePool>, path: web::Path<i64>) -> impl Responder {
    let task_id = path.into_inner();

    match TaskCrud::new(pool.get_ref().clone()).delete_task(task_id).await {
        Ok(()) => {
            info!("Deleted task {}", task_id);
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response("delete_task", e),
    }
}

// Handler to list tasks in one status
pub async fn get_tasks_by_status(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let value = path.into_inner();
    let status = match value.parse::<TaskStatus>() {
        Ok(status) => status,
        Err(message) => {
            info!("Rejected status filter: {}", message);
            return HttpResponse::BadRequest().json(ErrorResponse { message });
        }
    };
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    match TaskCrud::new(pool.get_ref().clone())
        .list_by_status(status, skip, limit)
        .await
    {
        Ok((tasks, total)) => HttpResponse::Ok().json(TaskListResponse { tasks, total }),
        Err(e) => error_response("get_tasks_by_status", e),
    }
}

// Handler to list tasks at one priority
pub async fn get_tasks_by_priority(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let value = path.into_inner();
    let priority = match value.parse::<TaskPriority>() {
        Ok(priority) => priority,
        Err(message) => {
            info!("Rejected priority filter: {}", message);
            return HttpResponse::BadRequest().json(ErrorResponse { message });
        }
    };
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    match TaskCrud::new(pool.get_ref().clone())
        .list_by_priority(priority, skip, limit)
        .await
    {
        Ok((tasks, total)) => HttpResponse::Ok().json(TaskListResponse { tasks, total }),
        Err(e) => error_response("get_tasks_by_priority", e),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use crate::db;
    use crate::routes::routes::tasks_configure;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("sqlite memory");
        db::create_tables(&pool).await.expect("create tables");
        pool
    }

    #[actix_web::test]
    async fn create_returns_201_with_trimmed_title_and_defaults() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "title": "  ship the release  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "ship the release");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["priority"], "medium");
        assert!(body["updated_at"].is_null());
    }

    #[actix_web::test]
    async fn create_rejects_blank_title_and_past_due_date() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "title": "   " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let past = (Utc::now().naive_utc() - Duration::days(1))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "title": "late", "due_date": past }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn list_reports_full_filter_total() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        for i in 0..12 {
            let req = test::TestRequest::post()
                .uri("/tasks")
                .set_json(json!({ "title": format!("task {}", i) }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 201);
        }

        let req = test::TestRequest::get()
            .uri("/tasks?limit=10")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["tasks"].as_array().unwrap().len(), 10);
        assert_eq!(body["total"], 12);
    }

    #[actix_web::test]
    async fn list_rejects_unknown_sort_field() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/tasks?sort_by=shoe_size")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid sort field: shoe_size");
    }

    #[actix_web::test]
    async fn get_update_delete_round_trip() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "title": "round trip" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let task_id = body["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/tasks/{}", task_id))
            .set_json(json!({ "status": "in_progress" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "in_progress");
        assert_eq!(body["title"], "round trip");
        assert!(!body["updated_at"].is_null());

        let req = test::TestRequest::delete()
            .uri(&format!("/tasks/{}", task_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 204);

        let req = test::TestRequest::get()
            .uri(&format!("/tasks/{}", task_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn missing_task_paths_return_404() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/tasks/999").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::put()
            .uri("/tasks/999")
            .set_json(json!({ "status": "completed" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::delete().uri("/tasks/999").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn bulk_update_skips_unknown_ids() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "title": "task five" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let task_id = body["id"].as_i64().unwrap();

        let req = test::TestRequest::put()
            .uri("/tasks/bulk-update")
            .set_json(json!({
                "task_ids": [task_id, 999, task_id],
                "updates": { "status": "completed" }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        let updated = body.as_array().unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|t| t["id"] == task_id));
        assert!(updated.iter().all(|t| t["status"] == "completed"));
    }

    #[actix_web::test]
    async fn bulk_update_with_nothing_to_do_returns_404() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/tasks/bulk-update")
            .set_json(json!({ "task_ids": [999], "updates": { "status": "completed" } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "No tasks updated");
    }

    #[actix_web::test]
    async fn status_and_priority_routes_filter_tasks() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(tasks_configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "title": "urgent thing", "priority": "urgent" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
        let req = test::TestRequest::post()
            .uri("/tasks")
            .set_json(json!({ "title": "calm thing" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::get()
            .uri("/tasks/priority/urgent")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["tasks"][0]["title"], "urgent thing");

        let req = test::TestRequest::get()
            .uri("/tasks/status/pending")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total"], 2);

        let req = test::TestRequest::get()
            .uri("/tasks/status/not_a_status")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
