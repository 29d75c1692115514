use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::Json,
    routing::get,
    routing::post,
    Router,
};
use serde::Serialize;
use tracing::{info, error, warn};
use std::sync::Arc;

use crate::application_state::{ApplicationState, PublishedResult};
use crate::config::CalibrationConfig;
use crate::polar::WindSpeedBin;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<ApplicationState>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PolarView {
    pub source: Option<String>,
    pub bins: Vec<WindSpeedBin>,
}

#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub wind_speeds: usize,
}

pub async fn get_polar(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PolarView>>, StatusCode> {
    info!("GET /api/polar called");
    let table = state.app.polar.current();
    Ok(Json(ApiResponse::ok(PolarView {
        source: state.app.polar.source().map(|path| path.display().to_string()),
        bins: table.bins().to_vec(),
    })))
}

pub async fn get_polar_csv(
    State(state): State<AppState>,
) -> Result<([(HeaderName, &'static str); 1], String), StatusCode> {
    info!("GET /api/polar/csv called");
    let Some(path) = state.app.polar.source() else {
        return Err(StatusCode::NOT_FOUND);
    };
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(([(header::CONTENT_TYPE, "text/csv")], text)),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Polar file not readable");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

pub async fn reload_polar(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReloadSummary>>, StatusCode> {
    info!("POST /api/polar/reload called");
    match state.app.polar.reload() {
        Ok(table) => Ok(Json(ApiResponse::ok(ReloadSummary {
            wind_speeds: table.bins().len(),
        }))),
        Err(e) => {
            error!(error = %e, "Failed to reload polar, keeping the active table");
            Ok(Json(ApiResponse::error(e.to_string())))
        }
    }
}

pub async fn get_performance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PublishedResult>>, StatusCode> {
    info!("GET /api/performance called");
    match state.app.last_result() {
        Some(result) => Ok(Json(ApiResponse::ok(result))),
        None => Ok(Json(ApiResponse::error("No performance data yet".to_string()))),
    }
}

pub async fn get_calibration(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CalibrationConfig>>, StatusCode> {
    info!("GET /api/calibration called");
    Ok(Json(ApiResponse::ok(state.app.calibration().clone())))
}

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/polar", get(get_polar))
        .route("/polar/csv", get(get_polar_csv))
        .route("/polar/reload", post(reload_polar))
        .route("/performance", get(get_performance))
        .route("/calibration", get(get_calibration))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::{DiagnosticSink, RateLimitedWarner};
    use crate::performance::{compute_performance, SensorSnapshot};
    use crate::polar::tests::TEST_POLAR;
    use crate::polar::PolarTable;
    use crate::polar_store::PolarStore;
    use chrono::Utc;
    use std::path::PathBuf;

    fn state_with_file(name: &str, contents: Option<&str>) -> (AppState, PathBuf) {
        let path = std::env::temp_dir().join(format!("{}_{}.csv", name, std::process::id()));
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        let polar = PolarStore::open(&path, Arc::new(RateLimitedWarner::default()));
        let state = AppState {
            app: Arc::new(ApplicationState::new(Config::default(), polar)),
        };
        (state, path)
    }

    #[tokio::test]
    async fn test_get_polar() {
        let (state, path) = state_with_file("api_polar", Some(TEST_POLAR));
        let Json(response) = get_polar(State(state)).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(response.status, "ok");
        let view = response.data.unwrap();
        assert_eq!(view.bins.len(), 3);
        assert_eq!(view.bins[0].wind_speed, 6.0);
        assert_eq!(view.source, Some(path.display().to_string()));
    }

    #[tokio::test]
    async fn test_get_polar_csv() {
        let (state, path) = state_with_file("api_polar_csv", Some(TEST_POLAR));
        let (headers, body) = get_polar_csv(State(state.clone())).await.unwrap();
        assert_eq!(headers[0].1, "text/csv");
        assert_eq!(body, TEST_POLAR);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(get_polar_csv(State(state)).await.unwrap_err(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_polar_csv_without_source() {
        let diagnostics: Arc<dyn DiagnosticSink> = Arc::new(RateLimitedWarner::default());
        let polar = PolarStore::new(PolarTable::empty(diagnostics.clone()), None, diagnostics);
        let state = AppState {
            app: Arc::new(ApplicationState::new(Config::default(), polar)),
        };
        assert_eq!(get_polar_csv(State(state)).await.unwrap_err(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reload_polar() {
        let (state, path) = state_with_file("api_reload", None);
        assert!(state.app.polar.current().is_empty());

        std::fs::write(&path, TEST_POLAR).unwrap();
        let Json(response) = reload_polar(State(state.clone())).await.unwrap();
        assert_eq!(response.status, "ok");
        assert_eq!(response.data.unwrap().wind_speeds, 3);

        // a broken file leaves the loaded table in place
        std::fs::write(&path, "TWA\n").unwrap();
        let Json(response) = reload_polar(State(state.clone())).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(response.status, "error");
        assert!(response.error.is_some());
        assert_eq!(state.app.polar.current().bins().len(), 3);
    }

    #[tokio::test]
    async fn test_get_performance() {
        let (state, path) = state_with_file("api_performance", Some(TEST_POLAR));
        let Json(response) = get_performance(State(state.clone())).await.unwrap();
        assert_eq!(response.status, "error");

        let snapshot = SensorSnapshot {
            apparent_wind_angle: Some(0.9),
            apparent_wind_speed: Some(6.0),
            ..SensorSnapshot::default()
        };
        let result = compute_performance(&snapshot, &state.app.polar.current()).unwrap();
        state.app.update_result(result.clone(), Utc::now());

        let Json(response) = get_performance(State(state)).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(response.status, "ok");
        assert_eq!(response.data.unwrap().result, result);
    }

    #[tokio::test]
    async fn test_get_calibration() {
        let (state, _path) = state_with_file("api_calibration", None);
        let Json(response) = get_calibration(State(state)).await.unwrap();
        assert_eq!(response.data, Some(CalibrationConfig::default()));
    }
}
