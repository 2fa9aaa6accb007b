#[macro_use]
extern crate rocket;

mod api;
mod config;
mod error;
mod models;
mod services;
mod utils;

use crate::services::scrape_service::Scraper;
use rocket::{Build, Rocket};

pub struct AppState {
    /// `None` when no YouTube API key is configured.
    pub scraper: Option<Scraper>,
}

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/", routes![api::health::index, api::health::health])
        .mount("/scrape", routes![api::scrape::scrape, api::scrape::scrape_related])
}

#[launch]
async fn rocket() -> _ {
    config::load_environment();
    config::init_logger();

    let app_state = config::create_app_state().expect("Failed to build application state");
    let cors = config::create_cors().expect("Failed to create CORS options");

    build_rocket(app_state).attach(cors)
}
