use actix_web::{web, App, HttpResponse, HttpServer};
use dotenv::dotenv;
use std::env;

mod db;
mod errors;
mod models;
mod routes;

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the Task Management API",
        "endpoints": ["/health", "/tasks"]
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::connect_pool(&database_url)
        .await
        .expect("Failed to create pool");
    db::create_tables(&pool)
        .await
        .expect("Failed to create tables");

    let server_address = "0.0.0.0:8080";
    println!("Server running at http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .route("/", web::get().to(root))
            .route("/health", web::get().to(health))
            .configure(routes::routes::tasks_configure)
    })
    .bind(server_address)?
    .run()
    .await
}
