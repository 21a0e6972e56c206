use std::{fmt::Display, net::Ipv4Addr, sync::Arc};

use axum::{
    Json, Router,
    extract::{self, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    serve,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    panel::{ControlPanel, Status},
    plc::{Credentials, DeviceState},
};

pub async fn launch(panel: ControlPanel, port: u16) -> Result<()> {
    let (app, _) = create_router(panel);

    let socket = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;

    tracing::info!("Listening on http://0.0.0.0:{port}");
    serve(socket, app).await?;

    Ok(())
}

/* === Router === */

/// The mutex makes the panel the single writer of session and device state,
/// commands from concurrent clients are applied one at a time.
pub struct AppState {
    pub panel: Mutex<ControlPanel>,
}

pub fn create_router(panel: ControlPanel) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        panel: Mutex::new(panel),
    });

    let router = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/power", post(power))
        .route("/speed", post(speed))
        .route("/stop", post(stop))
        .route("/status", get(status))
        .with_state(state.clone());

    (router, state)
}

/* == Session == */

#[derive(Deserialize)]
struct LoginPayload {
    address: Option<String>,
    username: Option<String>,
    password: String,
}

async fn login(
    extract::State(state): extract::State<Arc<AppState>>,
    payload: Payload<LoginPayload>,
) -> StandardResponse<Status> {
    let payload = match payload {
        Ok(extract::Json(payload)) => payload,
        Err(rejection) => return rejection.into(),
    };

    let mut panel = state.panel.lock().await;
    let last = panel.last_login().await;

    let (Some(address), Some(username)) = (
        payload.address.or(last.last_address),
        payload.username.or(last.last_username),
    ) else {
        return StandardResponse::Error {
            message: "Address and username are required".to_owned(),
        };
    };

    let credentials = Credentials::new(username, payload.password);

    let result = panel.login(&address, &credentials).await.map(|_| ());

    result.map(|()| panel.status()).into()
}

async fn logout(extract::State(state): extract::State<Arc<AppState>>) -> StandardResponse {
    state.panel.lock().await.logout();
    StandardResponse::Success { data: () }
}

/* == Commands == */

#[derive(Deserialize)]
struct PowerPayload {
    on: bool,
}

#[derive(Deserialize)]
struct SpeedPayload {
    speed: u32,
}

async fn power(
    extract::State(state): extract::State<Arc<AppState>>,
    payload: Payload<PowerPayload>,
) -> StandardResponse<DeviceState> {
    match payload {
        Ok(extract::Json(payload)) => state.panel.lock().await.set_power(payload.on).await.into(),
        Err(rejection) => rejection.into(),
    }
}

async fn speed(
    extract::State(state): extract::State<Arc<AppState>>,
    payload: Payload<SpeedPayload>,
) -> StandardResponse<DeviceState> {
    match payload {
        Ok(extract::Json(payload)) => state.panel.lock().await.set_speed(payload.speed).await.into(),
        Err(rejection) => rejection.into(),
    }
}

async fn stop(extract::State(state): extract::State<Arc<AppState>>) -> StandardResponse<DeviceState> {
    state.panel.lock().await.emergency_stop().await.into()
}

async fn status(extract::State(state): extract::State<Arc<AppState>>) -> StandardResponse<Status> {
    StandardResponse::Success {
        data: state.panel.lock().await.status(),
    }
}

/* == Types == */

/// A body that fails to parse is answered inside the usual envelope instead of
/// axum's plain-text rejection.
type Payload<T> = Result<extract::Json<T>, JsonRejection>;

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum StandardResponse<T = ()> {
    Success { data: T },
    Error { message: String },
}

impl<T: Serialize, E: Display> From<Result<T, E>> for StandardResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => StandardResponse::Success { data },
            Err(error) => StandardResponse::Error {
                message: error.to_string(),
            },
        }
    }
}

impl<T> From<JsonRejection> for StandardResponse<T> {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {rejection}");
        StandardResponse::Error {
            message: rejection.body_text(),
        }
    }
}

impl<T: Serialize> IntoResponse for StandardResponse<T> {
    fn into_response(self) -> axum::response::Response {
        match self {
            StandardResponse::Success { .. } => (StatusCode::OK, Json(self)),
            StandardResponse::Error { .. } => (StatusCode::BAD_REQUEST, Json(self)),
        }
        .into_response()
    }
}
