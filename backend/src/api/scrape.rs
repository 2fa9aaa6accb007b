use crate::models::{ErrorResponse, RelatedScrapeRequest, ScrapeRequest, ScrapeResponse};
use crate::services::scrape_service::{ScrapeTarget, Scraper};
use crate::AppState;
use rocket::serde::json::Json;
use rocket::{post, State};

const MISSING_TARGET: &str = "Either hashtag or channel is required";

fn scraper(state: &AppState) -> Result<&Scraper, ErrorResponse> {
    state.scraper.as_ref().ok_or_else(|| {
        ErrorResponse::configuration_missing("YOUTUBE_API_KEY is not configured")
    })
}

#[post("/", data = "<request>")]
pub async fn scrape(
    request: Json<ScrapeRequest>,
    state: &State<AppState>,
) -> Result<Json<ScrapeResponse>, ErrorResponse> {
    let request = request.into_inner();
    let target = ScrapeTarget::from_fields(request.hashtag.as_deref(), request.channel.as_deref())
        .ok_or_else(|| ErrorResponse::bad_request(MISSING_TARGET))?;
    let scraper = scraper(state)?;

    Ok(Json(
        scraper.scrape(&target, request.limit, request.fresh).await,
    ))
}

#[post("/related", data = "<request>")]
pub async fn scrape_related(
    request: Json<RelatedScrapeRequest>,
    state: &State<AppState>,
) -> Result<Json<ScrapeResponse>, ErrorResponse> {
    let request = request.into_inner();
    let target = ScrapeTarget::from_fields(request.hashtag.as_deref(), request.channel.as_deref())
        .ok_or_else(|| ErrorResponse::bad_request(MISSING_TARGET))?;
    let scraper = scraper(state)?;

    Ok(Json(scraper.scrape_related(&target, request.limit).await))
}
