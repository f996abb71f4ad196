//! Appointments API Lambda - creates appointments.
//!
//! Endpoints:
//! - POST /api/appointments - Create an appointment with its attendees

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::db::connect_store;
use shared::http::{created_response, error_response, problem_response, Problem};
use shared::{parse_body, Config, CreateAppointmentHandler, CreateAppointmentRequest};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const APPOINTMENTS_PATH: &str = "/api/appointments";

/// Application state
struct AppState {
    appointments: CreateAppointmentHandler,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let store = connect_store(&config).await?;

        Ok(Self {
            appointments: CreateAppointmentHandler::new(store),
        })
    }
}

async fn create_appointment(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let request: CreateAppointmentRequest = parse_body!(event.body());

    match state.appointments.handle(request).await {
        Ok(created) => {
            let location = format!("{}/{}", APPOINTMENTS_PATH, created.id);
            created_response(&location, &created)
        }
        Err(e) => {
            if e.status_code() >= 500 {
                error!("Failed to create appointment: {}", e);
            } else {
                warn!("Rejected appointment: {}", e);
            }
            error_response(&e)
        }
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let raw_path = event.uri().path();
    let path = match raw_path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    info!("Appointments request: {} {}", method, path);

    match (method, path) {
        ("POST", APPOINTMENTS_PATH) => create_appointment(&state, &event).await,

        (_, APPOINTMENTS_PATH) => {
            let problem = Problem::new(
                405,
                "Method not allowed",
                format!("{} is not supported on {}", method, APPOINTMENTS_PATH),
            );
            let mut response = problem_response(&problem)?;
            response
                .headers_mut()
                .insert("allow", lambda_http::http::HeaderValue::from_static("POST"));
            Ok(response)
        }

        _ => problem_response(&Problem::new(
            404,
            "Not found",
            format!("No route for {} {}", method, path),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
