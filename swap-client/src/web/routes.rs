//! HTTP route handlers.

use std::path::Path as FsPath;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::{ApiError, LoginRequest};
use crate::domain::{BookingId, StationId};
use crate::geo::{BrowserReport, GeolocationProvider};
use crate::map::MapOverlay;
use crate::reservation::{ReservationError, ReserveOutcome};
use crate::session::SessionUser;
use crate::status::{BookingOrigin, StatusError};
use crate::store::StoreError;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/stations", get(stations_page))
        .route("/stations/:id/reserve", post(reserve_station))
        .route("/booking/status", get(booking_status_page))
        .route("/booking/:id/check-in", post(check_in))
        .route("/signin", get(signin_page).post(signin))
        .route("/signout", post(signout))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn index() -> Redirect {
    Redirect::to("/stations")
}

fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })
}

/// Display name of the signed-in user, if any.
async fn signed_in_name(state: &AppState) -> Option<String> {
    match state.session.current().await {
        Ok(user) => user.map(|u| u.full_name),
        Err(e) => {
            warn!(error = %e, "could not read session");
            None
        }
    }
}

/// Nearby stations around the browser's position.
///
/// Without a position report the locating page is served; its script
/// reloads this route with `lat`/`lng` or a `geo` failure reason.
async fn stations_page(
    State(state): State<AppState>,
    Query(query): Query<StationsQuery>,
) -> Result<Html<String>, AppError> {
    let radius = query.radius();

    let Some(report) = BrowserReport::from_query(query.lat, query.lng, query.geo.as_deref()) else {
        return render(&LocatingTemplate {
            radius: radius.km(),
            query: query.q.clone(),
            timeout_ms: state.geo_timeout.as_millis() as u64,
        });
    };

    let located = GeolocationProvider::new(report)
        .with_timeout(state.geo_timeout)
        .acquire()
        .await;
    let user = signed_in_name(&state).await;

    // No lock is held across the directory call
    let previous = state.nearby.read().await.clone();
    // Same position: a radius change refetches, a text filter reuses the list
    let fetched = match previous {
        Some(current)
            if !query.wants_refresh()
                && current.coords == located.coords
                && current.radius == radius =>
        {
            Ok(current)
        }
        Some(mut current) if !query.wants_refresh() && current.coords == located.coords => {
            let changed = state.directory.change_radius(&mut current, radius).await;
            changed.map(|()| current)
        }
        _ => state.directory.fetch_nearby(located.coords, radius).await,
    };
    if let Ok(list) = &fetched {
        *state.nearby.write().await = Some(list.clone());
    }

    let coords = located.coords;
    let mut template = StationsTemplate {
        user,
        coords: coords.to_string(),
        advisory: located.advisory,
        lat: coords.latitude(),
        lng: coords.longitude(),
        radius: radius.km(),
        radii: RadiusOption::all(radius),
        query: query.q.trim().to_string(),
        stations: Vec::new(),
        total: 0,
        map_json: String::new(),
        error: None,
    };

    let overlay = match &fetched {
        Ok(list) => {
            let hits = list.filter(&query.q);
            template.total = list.stations.len();
            template.stations = hits
                .iter()
                .map(|s| StationCard::from_summary(s, state.reservations.is_in_flight(&s.id)))
                .collect();
            MapOverlay::new(coords, hits.iter().copied())
        }
        Err(e) => {
            warn!(error = %e, radius = radius.km(), "station directory failed");
            template.error = Some(format!(
                "We couldn't load nearby stations ({e}). Please try again."
            ));
            MapOverlay::new(coords, std::iter::empty())
        }
    };
    template.map_json = overlay.to_json().map_err(|e| AppError::Internal {
        message: format!("Map encoding error: {}", e),
    })?;

    render(&template)
}

/// Start a reservation for a station from the last list shown.
async fn reserve_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = StationId::parse(&id).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;

    let listed = {
        let nearby = state.nearby.read().await;
        nearby.as_ref().and_then(|n| n.find(&id)).cloned()
    };
    let station = match listed {
        Some(station) => station,
        None => state
            .records
            .selected_station()
            .await?
            .filter(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound {
                message: format!("Station {id} is not in the current list. Reload the stations and try again."),
            })?,
    };

    match state.reservations.reserve(&station).await? {
        ReserveOutcome::Redirect { url, booking } => {
            info!(booking = %booking.id, "redirecting to payment gateway");
            Ok(Redirect::to(&url).into_response())
        }
        ReserveOutcome::SignInRequired => Ok(Redirect::to("/signin?next=/stations").into_response()),
    }
}

/// Path of the status page for `id`, used as the sign-in `next`.
fn status_path(id: Option<BookingId>) -> String {
    match id {
        Some(id) => format!("/booking/status?bookingId={id}"),
        None => "/booking/status".to_string(),
    }
}

/// Booking status page; also the payment gateway's return URL.
async fn booking_status_page(
    State(state): State<AppState>,
    Query(query): Query<BookingStatusQuery>,
) -> Result<Html<String>, AppError> {
    let hint = query.hint();
    let loaded = state.status.load(hint).await.map_err(|e| match e {
        StatusError::AuthRequired => AppError::SignInRequired {
            next: status_path(hint),
        },
        other => other.into(),
    })?;

    let notice = match (loaded.origin, hint) {
        (BookingOrigin::LocalFallback, Some(id)) => Some(format!(
            "Booking #{id} could not be loaded. Showing your last saved booking."
        )),
        _ => None,
    };

    render(&BookingStatusTemplate {
        user: signed_in_name(&state).await,
        booking: BookingView::from_booking(&loaded.booking),
        notice,
        error: None,
    })
}

async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let id = BookingId(id);
    let sign_in = || AppError::SignInRequired {
        next: status_path(Some(id)),
    };
    let loaded = match state.status.load(Some(id)).await {
        Ok(loaded) => loaded,
        Err(StatusError::AuthRequired) => return Err(sign_in()),
        Err(e) => return Err(e.into()),
    };
    if loaded.booking.id != id {
        return Err(AppError::NotFound {
            message: format!("booking {id} not found"),
        });
    }

    match state.status.check_in(&loaded.booking).await {
        Ok(_) => Ok(Redirect::to(&status_path(Some(id))).into_response()),
        Err(StatusError::AuthRequired) => Err(sign_in()),
        Err(StatusError::CheckIn(e)) => {
            warn!(booking = %id, error = %e, "check-in failed");
            let html = render(&BookingStatusTemplate {
                user: signed_in_name(&state).await,
                booking: BookingView::from_booking(&loaded.booking),
                notice: None,
                error: Some(format!("Check-in failed ({e}). Please try again.")),
            })?;
            Ok((StatusCode::BAD_GATEWAY, html).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn signin_page(Query(query): Query<SignInQuery>) -> Result<Html<String>, AppError> {
    render(&SignInTemplate {
        next: safe_next(query.next.as_deref()),
        user_name: String::new(),
        error: None,
    })
}

async fn signin(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref());
    let request = LoginRequest {
        user_name: form.user_name.trim().to_string(),
        password: form.password,
    };

    let failure = |status: StatusCode, message: &str| -> Result<Response, AppError> {
        let html = render(&SignInTemplate {
            next: next.clone(),
            user_name: request.user_name.clone(),
            error: Some(message.to_string()),
        })?;
        Ok((status, html).into_response())
    };

    match state.api.login(&request).await {
        Ok(response) if !response.token.trim().is_empty() => {
            let user = SessionUser::from_login(response, &request.user_name);
            state.session.login(&user).await?;
            Ok(Redirect::to(&next).into_response())
        }
        Ok(_) => failure(StatusCode::BAD_GATEWAY, "Sign-in did not return a session."),
        Err(ApiError::AuthRequired) => {
            failure(StatusCode::UNAUTHORIZED, "Incorrect user name or password.")
        }
        Err(e) => {
            warn!(error = %e, "sign-in failed");
            failure(
                StatusCode::BAD_GATEWAY,
                "Sign-in is unavailable right now. Please try again.",
            )
        }
    }
}

async fn signout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.session.logout().await?;
    Ok(Redirect::to("/stations"))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    /// The remote API failed; the user can retry.
    Unavailable { message: String },
    Internal { message: String },
    /// No usable session; answered with a redirect to the sign-in page.
    SignInRequired { next: String },
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::BookingNotFound(_) => AppError::NotFound {
                message: e.to_string(),
            },
            ApiError::Invalid(_) | ApiError::Json { .. } => AppError::Unavailable {
                message: format!("The server sent data we could not read: {e}"),
            },
            _ => AppError::Unavailable {
                message: e.to_string(),
            },
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<ReservationError> for AppError {
    fn from(e: ReservationError) -> Self {
        match e {
            ReservationError::InFlight(_) => AppError::Conflict {
                message: e.to_string(),
            },
            ReservationError::Draft(api) => api.into(),
            ReservationError::PaymentLink { booking_id, source } => AppError::Unavailable {
                message: format!(
                    "Booking #{booking_id} was created but payment could not start ({source}). Please try again."
                ),
            },
            ReservationError::Store(e) => e.into(),
            ReservationError::Invalid(_) => AppError::Unavailable {
                message: e.to_string(),
            },
        }
    }
}

impl From<StatusError> for AppError {
    fn from(e: StatusError) -> Self {
        match e {
            StatusError::BookingNotFound(_) => AppError::NotFound {
                message: e.to_string(),
            },
            StatusError::NotCheckInable(_) => AppError::Conflict {
                message: e.to_string(),
            },
            StatusError::AuthRequired => AppError::SignInRequired {
                next: "/booking/status".to_string(),
            },
            StatusError::Fetch(api) | StatusError::CheckIn(api) => api.into(),
            StatusError::Store(e) => e.into(),
            StatusError::Domain(_) => AppError::Unavailable {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, message) = match self {
            AppError::SignInRequired { next } => {
                info!(%next, "sign-in required");
                return Redirect::to(&format!("/signin?next={next}")).into_response();
            }
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, "Bad request", message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, "Not found", message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, "Please wait", message),
            AppError::Unavailable { message } => {
                (StatusCode::BAD_GATEWAY, "Service unavailable", message)
            }
            AppError::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong", message)
            }
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let (link_href, link_label) = if status == StatusCode::NOT_FOUND {
            ("/stations", "Make a new reservation")
        } else {
            ("/stations", "Back to stations")
        };

        let page = ErrorTemplate {
            title: title.to_string(),
            message,
            link_href: link_href.to_string(),
            link_label: link_label.to_string(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!(error = %e, "error page failed to render");
                (status, page.message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::header;
    use serde_json::json;
    use tempfile::tempdir;
    use tokio::sync::Notify;

    use crate::api::mock::{MockApi, MockCall};
    use crate::api::{BookingDto, LoginResponse};
    use crate::config::AppConfig;
    use crate::domain::{BookingState, Coordinates, Radius, sample_booking};
    use crate::session::sample_user;
    use crate::store::Store;

    fn app(api: MockApi, dir: &tempfile::TempDir) -> (Arc<MockApi>, AppState) {
        let api = Arc::new(api);
        let store = Arc::new(Store::open(dir.path().join("store.json")));
        let state = AppState::new(api.clone(), store, &AppConfig::default());
        (api, state)
    }

    async fn sign_in(state: &AppState) {
        state.session.login(&sample_user("tok")).await.unwrap();
    }

    fn records() -> Vec<serde_json::Value> {
        vec![
            json!({"stationID": 1, "stationName": "Downtown Hub", "address": "123 Main St", "status": "OPEN", "availableSlots": 12, "totalSlots": 20, "latitude": 10.76, "longitude": 106.66}),
            json!({"stationID": 2, "stationName": "Mall Station", "address": "456 Shopping Ave", "status": "MAINTENANCE"}),
        ]
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn located(lat: f64, lng: f64, radius: u32, q: &str) -> StationsQuery {
        StationsQuery {
            lat: Some(lat),
            lng: Some(lng),
            radius: Some(radius),
            q: q.to_string(),
            ..Default::default()
        }
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn without_position_serves_locating_page() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new(), &dir);

        let Html(html) = stations_page(State(state), Query(StationsQuery::default()))
            .await
            .unwrap();

        assert!(html.contains("id=\"locating\""));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn denied_location_uses_fallback_and_still_fetches() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new().with_nearby(records()), &dir);
        let query = StationsQuery {
            geo: Some("denied".to_string()),
            ..Default::default()
        };

        let Html(html) = stations_page(State(state.clone()), Query(query))
            .await
            .unwrap();

        assert!(html.contains("denied"));
        assert!(html.contains("Downtown Hub"));
        assert_eq!(api.call_count(), 1);
        let nearby = state.nearby.read().await;
        assert_eq!(nearby.as_ref().unwrap().coords, Coordinates::FALLBACK);
    }

    #[tokio::test]
    async fn filter_reuses_list_and_radius_refetches() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new().with_nearby(records()), &dir);

        let _ = stations_page(State(state.clone()), Query(located(10.7, 106.6, 5, "")))
            .await
            .unwrap();
        let Html(html) = stations_page(State(state.clone()), Query(located(10.7, 106.6, 5, "mall")))
            .await
            .unwrap();
        assert!(html.contains("Mall Station"));
        assert!(!html.contains("Downtown Hub"));
        assert_eq!(api.call_count(), 1);

        let Html(html) = stations_page(State(state.clone()), Query(located(10.7, 106.6, 10, "")))
            .await
            .unwrap();
        assert!(html.contains("Downtown Hub"));
        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(
            calls[1],
            MockCall::Nearby {
                radius: Radius::Ten,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn directory_failure_renders_retry() {
        let dir = tempdir().unwrap();
        let (_, state) = app(MockApi::new().with_nearby_failure(503), &dir);

        let Html(html) = stations_page(State(state), Query(located(10.7, 106.6, 5, "")))
            .await
            .unwrap();

        assert!(html.contains("Try again"));
        assert!(html.contains("refresh=1"));
    }

    #[tokio::test]
    async fn reserve_without_session_redirects_to_signin() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new().with_nearby(records()), &dir);
        let _ = stations_page(State(state.clone()), Query(located(10.7, 106.6, 5, "")))
            .await
            .unwrap();

        let response = reserve_station(State(state), Path("1".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/signin?next=/stations");
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn reserve_unknown_station_is_not_found() {
        let dir = tempdir().unwrap();
        let (_, state) = app(MockApi::new(), &dir);

        let err = reserve_station(State(state), Path("44".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn signed_in_reservation_redirects_to_gateway() {
        let dir = tempdir().unwrap();
        let draft = BookingDto {
            id: Some(555u64.into()),
            station_id: Some(1u64.into()),
            total_price: Some(25_000u64.into()),
            ..Default::default()
        };
        let (_, state) = app(
            MockApi::new()
                .with_nearby(records())
                .with_draft(draft)
                .with_payment_url("https://pay.example/555")
                .with_login(LoginResponse {
                    token: "tok".to_string(),
                    ..Default::default()
                }),
            &dir,
        );
        let _ = stations_page(State(state.clone()), Query(located(10.7, 106.6, 5, "")))
            .await
            .unwrap();
        let form = SignInForm {
            user_name: "alex".to_string(),
            password: "secret".to_string(),
            next: Some("/stations".to_string()),
        };
        let response = signin(State(state.clone()), Form(form)).await.unwrap();
        assert_eq!(location(&response), "/stations");

        let response = reserve_station(State(state), Path("1".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "https://pay.example/555");
    }

    #[tokio::test]
    async fn bad_credentials_rerender_form() {
        let dir = tempdir().unwrap();
        let (_, state) = app(MockApi::new(), &dir);
        let form = SignInForm {
            user_name: " alex ".to_string(),
            password: "wrong".to_string(),
            next: None,
        };

        let response = signin(State(state.clone()), Form(form)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let html = body_text(response).await;
        assert!(html.contains("Incorrect user name or password."));
        assert!(html.contains("value=\"alex\""));
        assert!(state.session.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_without_booking_is_not_found() {
        let dir = tempdir().unwrap();
        let (_, state) = app(MockApi::new(), &dir);

        let err = booking_status_page(State(state), Query(BookingStatusQuery::default()))
            .await
            .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Make a new reservation"));
    }

    #[tokio::test]
    async fn status_page_shows_fallback_notice() {
        let dir = tempdir().unwrap();
        let (_, state) = app(MockApi::new(), &dir);
        sign_in(&state).await;
        state
            .records
            .save_current(&sample_booking(42, BookingState::Confirmed))
            .await
            .unwrap();
        let query = BookingStatusQuery {
            booking_id: Some("99".to_string()),
        };

        let Html(html) = booking_status_page(State(state), Query(query)).await.unwrap();

        assert!(html.contains("Booking #42"));
        assert!(html.contains("Booking #99 could not be loaded"));
    }

    #[tokio::test]
    async fn check_in_redirects_back_to_status() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new(), &dir);
        sign_in(&state).await;
        state
            .records
            .save_current(&sample_booking(42, BookingState::Confirmed))
            .await
            .unwrap();

        let response = check_in(State(state.clone()), Path(42)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/booking/status?bookingId=42");
        assert_eq!(api.calls(), vec![MockCall::CheckIn(BookingId(42))]);
        assert!(state.records.current().await.unwrap().unwrap().is_checked_in());
    }

    #[tokio::test]
    async fn check_in_without_session_redirects_to_signin() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new(), &dir);
        state
            .records
            .save_current(&sample_booking(42, BookingState::Confirmed))
            .await
            .unwrap();

        let err = check_in(State(state.clone()), Path(42)).await.unwrap_err();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/signin?next=/booking/status?bookingId=42"
        );
        assert_eq!(api.call_count(), 0);
        assert!(!state.records.current().await.unwrap().unwrap().is_checked_in());
    }

    #[tokio::test]
    async fn status_for_other_booking_without_session_redirects_to_signin() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new(), &dir);
        state
            .records
            .save_current(&sample_booking(42, BookingState::Confirmed))
            .await
            .unwrap();
        let query = BookingStatusQuery {
            booking_id: Some("99".to_string()),
        };

        let err = booking_status_page(State(state), Query(query))
            .await
            .unwrap_err();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/signin?next=/booking/status?bookingId=99"
        );
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn slow_directory_does_not_block_reservations() {
        let dir = tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let (api, state) = app(
            MockApi::new()
                .with_nearby(records())
                .with_nearby_gate(gate.clone()),
            &dir,
        );
        // Let the first lookup through to populate the list
        gate.notify_one();
        let _ = stations_page(State(state.clone()), Query(located(10.7, 106.6, 5, "")))
            .await
            .unwrap();

        let mut query = located(10.7, 106.6, 5, "");
        query.refresh = Some("1".to_string());
        let slow = tokio::spawn(stations_page(State(state.clone()), Query(query)));
        while api.call_count() < 2 {
            tokio::task::yield_now().await;
        }

        // The refresh is parked inside the directory call
        let response = tokio::time::timeout(
            Duration::from_secs(1),
            reserve_station(State(state.clone()), Path("1".to_string())),
        )
        .await
        .expect("reserve waited on the directory call")
        .unwrap();
        assert_eq!(location(&response), "/signin?next=/stations");

        gate.notify_one();
        let Html(html) = slow.await.unwrap().unwrap();
        assert!(html.contains("Downtown Hub"));
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let dir = tempdir().unwrap();
        let (api, state) = app(MockApi::new().with_nearby(records()), &dir);
        let _ = stations_page(State(state.clone()), Query(located(10.7, 106.6, 5, "")))
            .await
            .unwrap();

        api.set_nearby_failure(503);
        let Html(html) = stations_page(State(state.clone()), Query(located(10.7, 106.6, 10, "")))
            .await
            .unwrap();

        assert!(html.contains("Try again"));
        let nearby = state.nearby.read().await;
        let list = nearby.as_ref().unwrap();
        assert_eq!(list.radius, Radius::Five);
        assert_eq!(list.stations.len(), 2);
    }

    #[tokio::test]
    async fn signout_clears_session() {
        let dir = tempdir().unwrap();
        let (_, state) = app(MockApi::new(), &dir);
        state
            .session
            .login(&crate::session::sample_user("tok"))
            .await
            .unwrap();

        let redirect = signout(State(state.clone())).await.unwrap();
        assert_eq!(redirect.into_response().status(), StatusCode::SEE_OTHER);

        assert!(state.session.current().await.unwrap().is_none());
    }

    #[test]
    fn in_flight_maps_to_conflict() {
        let err: AppError = ReservationError::InFlight(StationId::parse("1").unwrap()).into();
        assert!(matches!(err, AppError::Conflict { .. }));
    }
}
