use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::bundle::{BurgerDataBundle, BurgerRecordView, EpisodeView};
use crate::cli::ServeArgs;
use crate::config::SourceLocation;
use crate::loader::BurgerDataLoader;

#[derive(Clone)]
struct AppState {
    loader: BurgerDataLoader,
}

#[derive(Debug, Serialize)]
struct BurgerDetail<'a> {
    slug: &'a str,
    display: &'a str,
    records: Vec<&'a BurgerRecordView>,
}

#[derive(Debug, Serialize)]
struct EpisodeDetail<'a> {
    episode: &'a EpisodeView,
    burgers: Vec<&'a BurgerRecordView>,
}

#[derive(Debug, Deserialize)]
struct ThisWeekQuery {
    date: Option<String>,
}

pub async fn run(args: ServeArgs, location: SourceLocation) -> anyhow::Result<()> {
    let loader = location.loader()?;
    let static_dir = match &location {
        SourceLocation::Dir(dir) => Some(dir.clone()),
        SourceLocation::Http(_) => None,
    };

    // Warm the cache; a failure here is retried on the first request.
    if let Err(err) = loader.load().await {
        tracing::warn!(%err, "initial burger data load failed");
    }

    let app = router(loader, static_dir);
    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

pub fn router(loader: BurgerDataLoader, static_dir: Option<PathBuf>) -> Router {
    let state = AppState { loader };
    let mut app = Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/burgers", get(list_burgers))
        .route("/api/burgers/:slug", get(get_burger))
        .route("/api/episodes", get(list_episodes))
        .route("/api/episodes/:code", get(get_episode))
        .route("/api/this-week", get(this_week))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app
}

type ApiError = (StatusCode, String);

async fn current_bundle(state: &AppState) -> Result<Arc<BurgerDataBundle>, ApiError> {
    state
        .loader
        .load()
        .await
        .map_err(|err| (StatusCode::BAD_GATEWAY, err.to_string()))
}

async fn list_burgers(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bundle = current_bundle(&state).await?;
    Ok(Json(bundle.unique_burgers()).into_response())
}

async fn get_burger(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let bundle = current_bundle(&state).await?;
    let records = bundle.burgers_for_slug(&slug);
    let Some(first) = records.first() else {
        return Err((StatusCode::NOT_FOUND, format!("no burger with slug: {slug}")));
    };

    let detail = BurgerDetail {
        slug: &first.burger_slug,
        display: &first.burger_display,
        records: records.clone(),
    };
    Ok(Json(detail).into_response())
}

async fn list_episodes(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bundle = current_bundle(&state).await?;
    Ok(Json(&bundle.episodes).into_response())
}

async fn get_episode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let bundle = current_bundle(&state).await?;
    let Some(episode) = bundle.episode_by_code(&code) else {
        return Err((StatusCode::NOT_FOUND, format!("no episode with code: {code}")));
    };

    let detail = EpisodeDetail {
        episode,
        burgers: bundle.burgers_for_episode(episode.episode.id),
    };
    Ok(Json(detail).into_response())
}

async fn this_week(
    State(state): State<AppState>,
    Query(query): Query<ThisWeekQuery>,
) -> Result<Response, ApiError> {
    let now = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|err| (StatusCode::BAD_REQUEST, format!("invalid date: {err}")))?
            .and_time(chrono::NaiveTime::MIN),
        None => chrono::Local::now().naive_local(),
    };

    let bundle = current_bundle(&state).await?;
    Ok(Json(bundle.episodes_near(now)).into_response())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt as _;
    use tower::ServiceExt as _;

    use super::*;
    use crate::source::DirSource;

    fn seed_site() -> tempfile::TempDir {
        let temp = tempfile::TempDir::new().unwrap();
        let data = temp.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(
            data.join("burger-of-the-day.json"),
            r#"{"records": [
                {"season": 1, "episode_title": "Human Flesh", "burger_of_the_day": "New Bacon-ings",
                 "tvmaze_episode_id": 10, "tvmaze_episode_number": 1}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            data.join("tvmaze-episodes.json"),
            r#"{"episodes": [
                {"id": 10, "name": "Human Flesh", "season": 1, "number": 1, "airdate": "2011-01-09"}
            ]}"#,
        )
        .unwrap();
        temp
    }

    fn app(root: &std::path::Path) -> Router {
        let loader = BurgerDataLoader::new(Arc::new(DirSource::new(root)));
        router(loader, Some(root.to_path_buf()))
    }

    async fn request(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn burger_routes_resolve_slugs() {
        let site = seed_site();
        let (status, body) = request(app(site.path()), "/api/burgers/new-bacon-ings").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["display"], "NEW BACON-INGS");
        assert_eq!(value["records"][0]["episodeCode"], "s01e01");

        let (status, _) = request(app(site.path()), "/api/burgers/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn episode_routes_resolve_codes() {
        let site = seed_site();
        let (status, body) = request(app(site.path()), "/api/episodes/s01e01").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["episode"]["name"], "Human Flesh");
        assert_eq!(value["burgers"][0]["burgerSlug"], "new-bacon-ings");

        let (status, body) = request(app(site.path()), "/api/this-week?date=2030-01-10").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value[0]["code"], "s01e01");

        let (status, _) = request(app(site.path()), "/api/this-week?date=soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn static_data_files_are_served() {
        let site = seed_site();
        let (status, body) = request(app(site.path()), "/data/tvmaze-episodes.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("Human Flesh"));
    }

    #[tokio::test]
    async fn load_failures_surface_as_bad_gateway() {
        let temp = tempfile::TempDir::new().unwrap();
        let (status, body) = request(app(temp.path()), "/api/episodes").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(String::from_utf8_lossy(&body).contains("burger-of-the-day.json"));
    }
}
