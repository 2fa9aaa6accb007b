use rocket::get;
use rocket::serde::json::{json, Json, Value};

#[get("/")]
pub fn index() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "scraper-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/health")]
pub fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
