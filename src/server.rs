//! HTTP API over the same builders and reducer the terminal front end uses

use crate::data::{CityId, Dataset};
use crate::detail::{build_detail, DetailView};
use crate::export::Download;
use crate::figure::{build_figure, ContinentFilter, FigureDescriptor, FigureStyle, ViewMode};
use crate::state::{filter_options, reduce, Event, FilterOption, ViewState};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    dataset: Arc<Dataset>,
    style: Arc<FigureStyle>,
    session: Arc<Mutex<ViewState>>,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>, style: FigureStyle) -> Self {
        Self {
            dataset,
            style: Arc::new(style),
            session: Arc::new(Mutex::new(ViewState::default())),
        }
    }

    fn snapshot_of(&self, state: &ViewState) -> Snapshot {
        Snapshot {
            figure: build_figure(state.view_mode, &state.continent_filter, &self.dataset, &self.style),
            detail: state
                .open_city(&self.dataset)
                .and_then(|(id, _)| build_detail(id, &self.dataset)),
            state: state.clone(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.session.lock().clone();
        self.snapshot_of(&state)
    }

    /// Reduce one event against the session and return what the client sees
    pub fn apply_event(&self, event: &Event) -> EventOutcome {
        let next = {
            let mut session = self.session.lock();
            let transition = reduce(&session, event, &self.dataset);
            *session = transition.state.clone();
            transition
        };
        match next.download {
            Some(download) => EventOutcome::Download(download),
            None => EventOutcome::Snapshot(Box::new(self.snapshot_of(&next.state))),
        }
    }
}

/// Session state with its derived views
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub state: ViewState,
    pub figure: FigureDescriptor,
    pub detail: Option<DetailView>,
}

#[derive(Debug)]
pub enum EventOutcome {
    Snapshot(Box<Snapshot>),
    Download(Download),
}

impl IntoResponse for EventOutcome {
    fn into_response(self) -> Response {
        match self {
            EventOutcome::Snapshot(s) => Json(*s).into_response(),
            EventOutcome::Download(d) => csv_attachment(d),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FigureQuery {
    view: Option<String>,
    continent: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/state", get(get_state))
        .route("/api/events", post(post_event))
        .route("/api/figure", get(get_figure))
        .route("/api/filters", get(get_filters))
        .route("/api/cities/:id", get(get_city))
        .route("/api/cities/:id/csv", get(get_city_csv))
        .route("/api/export.csv", get(get_export))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("globe explorer listening on http://{addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_state(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshot())
}

async fn post_event(State(state): State<AppState>, Json(event): Json<Event>) -> EventOutcome {
    state.apply_event(&event)
}

async fn get_figure(State(state): State<AppState>, Query(q): Query<FigureQuery>) -> Response {
    let view_mode = match q.view.as_deref().map(str::parse::<ViewMode>) {
        None => ViewMode::default(),
        Some(Ok(mode)) => mode,
        Some(Err(e)) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    let filter = q
        .continent
        .map(ContinentFilter::from)
        .unwrap_or_default();
    Json(build_figure(view_mode, &filter, &state.dataset, &state.style)).into_response()
}

async fn get_filters(State(state): State<AppState>) -> Json<Vec<FilterOption>> {
    Json(filter_options(&state.dataset))
}

async fn get_city(State(state): State<AppState>, Path(id): Path<usize>) -> Response {
    match build_detail(CityId(id), &state.dataset) {
        Some(view) => Json(view).into_response(),
        None => (StatusCode::NOT_FOUND, "no such city").into_response(),
    }
}

async fn get_city_csv(State(state): State<AppState>, Path(id): Path<usize>) -> Response {
    let Some(city) = state.dataset.get(CityId(id)) else {
        return (StatusCode::NOT_FOUND, "no such city").into_response();
    };
    match Download::for_city(city) {
        Ok(d) => csv_attachment(d),
        Err(e) => export_failed(e),
    }
}

async fn get_export(State(state): State<AppState>) -> Response {
    match Download::for_dataset(&state.dataset) {
        Ok(d) => csv_attachment(d),
        Err(e) => export_failed(e),
    }
}

fn export_failed(e: crate::Error) -> Response {
    error!("csv export failed: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, "export failed").into_response()
}

fn csv_attachment(download: Download) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.content,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{city, styles};
    use crate::figure::StyleVariant;
    use serde_json::json;

    fn app() -> AppState {
        let ds = Dataset::new(
            vec![
                city("Tokyo", "Asia", 37_400_000),
                city("Paris", "Europe", 11_000_000),
            ],
            styles(),
        )
        .unwrap();
        AppState::new(Arc::new(ds), StyleVariant::Classic.style())
    }

    fn event(v: serde_json::Value) -> Event {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_initial_snapshot() {
        let s = app().snapshot();
        assert_eq!(s.state, ViewState::default());
        assert_eq!(s.figure.points().count(), 2);
        assert!(s.detail.is_none());
    }

    #[test]
    fn test_click_opens_detail() {
        let app = app();
        let EventOutcome::Snapshot(s) = app.apply_event(&event(json!({"type": "point_clicked", "payload": 1})))
        else {
            panic!("expected snapshot");
        };
        assert!(s.state.panel_visible);
        assert_eq!(s.detail.unwrap().header.name, "Paris");
        assert_eq!(app.snapshot().state.selected, Some(CityId(1)));
    }

    #[test]
    fn test_filter_narrows_figure() {
        let app = app();
        app.apply_event(&event(json!({"type": "set_continent_filter", "continent": "Europe"})));
        let s = app.snapshot();
        let names: Vec<&str> = s.figure.points().map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, vec!["Paris"]);
    }

    #[test]
    fn test_export_events() {
        let app = app();
        assert!(matches!(
            app.apply_event(&event(json!({"type": "export_city"}))),
            EventOutcome::Snapshot(_)
        ));
        app.apply_event(&event(json!({"type": "point_clicked", "payload": "0"})));
        match app.apply_event(&event(json!({"type": "export_city"}))) {
            EventOutcome::Download(d) => assert_eq!(d.filename, "tokyo_data.csv"),
            other => panic!("expected download, got {other:?}"),
        }
        match app.apply_event(&event(json!({"type": "export_all"}))) {
            EventOutcome::Download(d) => assert_eq!(d.filename, "world_cities_data.csv"),
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[test]
    fn test_export_city_after_close() {
        let app = app();
        app.apply_event(&event(json!({"type": "point_clicked", "payload": 1})));
        app.apply_event(&event(json!({"type": "close_panel"})));
        assert!(app.snapshot().detail.is_none());
        match app.apply_event(&event(json!({"type": "export_city"}))) {
            EventOutcome::Download(d) => assert_eq!(d.filename, "paris_data.csv"),
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[test]
    fn test_csv_attachment_headers() {
        let resp = csv_attachment(Download {
            filename: "tokyo_data.csv".into(),
            content: "Field,Value\n".into(),
        });
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"tokyo_data.csv\""
        );
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
    }
}
