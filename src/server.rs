use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::data::{GenerateRequest, RosterSummary, SeatingOutput, SolveRequest, VenueShape};
use crate::error::SeatingError;
use crate::presenter::{PlanPresenter, TextTablePresenter};
use crate::roster::{self, CsvFile, CsvUpload};
use crate::session::Session;
use crate::solver;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for SeatingError {
    fn into_response(self) -> Response {
        let status = match &self {
            SeatingError::Input { .. } | SeatingError::Request { .. } => StatusCode::BAD_REQUEST,
            SeatingError::NoRoster => StatusCode::CONFLICT,
            SeatingError::Capacity { .. } | SeatingError::Format { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SeatingError::Csv(_) | SeatingError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Request failed: {}", self);
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct FormatParams {
    format: Option<String>,
}

impl From<JsonRejection> for SeatingError {
    fn from(rejection: JsonRejection) -> Self {
        SeatingError::Request {
            reason: rejection.body_text(),
        }
    }
}

type SharedSession = Arc<Mutex<Session>>;

async fn load_roster_handler(
    State(session): State<SharedSession>,
    body: Bytes,
) -> Result<Json<RosterSummary>, SeatingError> {
    let summary = session.lock().await.load(&CsvUpload(body.to_vec()))?;
    Ok(Json(summary))
}

async fn roster_handler(
    State(session): State<SharedSession>,
) -> Result<Json<RosterSummary>, SeatingError> {
    let session = session.lock().await;
    let loaded = session.roster().ok_or(SeatingError::NoRoster)?;
    Ok(Json(roster::summarize(loaded)))
}

async fn clear_roster_handler(State(session): State<SharedSession>) -> StatusCode {
    session.lock().await.clear();
    StatusCode::NO_CONTENT
}

async fn generate_handler(
    State(session): State<SharedSession>,
    Query(params): Query<FormatParams>,
    input: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, SeatingError> {
    let Json(input) = input?;
    let output = session.lock().await.generate_request(&input)?;

    match params.format.as_deref() {
        Some("text") => {
            let text = TextTablePresenter.present(&output.plan);
            Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
        }
        _ => Ok(Json(output).into_response()),
    }
}

async fn solve_handler(
    input: Result<Json<SolveRequest>, JsonRejection>,
) -> Result<Json<SeatingOutput>, SeatingError> {
    let Json(input) = input?;
    let venue = VenueShape::new(input.halls, input.seats_per_hall)?;
    let mut rng = match input.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    };
    let output = solver::solve(&input.students, &venue, &mut rng)?;
    Ok(Json(output))
}

pub fn router(session: Session) -> Router {
    Router::new()
        .route(
            "/v1/roster",
            get(roster_handler)
                .post(load_roster_handler)
                .delete(clear_roster_handler),
        )
        .route("/v1/seating/generate", post(generate_handler))
        .route("/v1/seating/solve", post(solve_handler))
        .with_state(Arc::new(Mutex::new(session)))
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let mut session = Session::new(config.seed);
    if let Some(path) = &config.roster {
        if let Err(e) = session.load(&CsvFile::new(path)) {
            warn!("Could not preload roster {}: {}", path.display(), e);
        }
    }
    let app = router(session);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const CSV: &str = "Name,Register No,Department\n\
                       Asha,R1,CS\n\
                       Ben,R2,CS\n\
                       Chen,R3,EE\n\
                       Dev,R4,EE\n\
                       Esi,R5,ME\n";

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn upload(csv: &str) -> Request<Body> {
        Request::post("/v1/roster")
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(csv.to_string()))
            .unwrap()
    }

    fn generate(uri: &str, halls: &str, seats: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "halls": halls, "seatsPerHall": seats }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn load_then_generate() {
        let app = router(Session::new(Some(5)));

        let (status, body) = send(&app, upload(CSV)).await;
        assert_eq!(status, StatusCode::OK);
        let summary: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(summary["students"], 5);
        assert_eq!(summary["departments"][0]["department"], "CS");

        let (status, body) = send(&app, generate("/v1/seating/generate", "1", "5")).await;
        assert_eq!(status, StatusCode::OK);
        let output: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(output["seated"], 5);
        assert_eq!(output["plan"]["halls"][0]["seats"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn generate_without_roster_is_a_conflict() {
        let app = router(Session::new(Some(5)));
        let (status, body) = send(&app, generate("/v1/seating/generate", "1", "5")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(error["error"], "NO_ROSTER");
        assert_eq!(error["message"], "Please load a student CSV file first!");
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let app = router(Session::new(Some(5)));

        let (status, body) = send(&app, upload("Name,Dept\nAsha,CS\n")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("FORMAT_ERROR"));

        send(&app, upload(CSV)).await;

        let (status, body) = send(&app, generate("/v1/seating/generate", "abc", "5")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INPUT_ERROR"));

        let (status, body) = send(&app, generate("/v1/seating/generate", "1", "4")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("CAPACITY_ERROR"));
    }

    #[tokio::test]
    async fn text_format_renders_tables() {
        let app = router(Session::new(Some(5)));
        send(&app, upload(CSV)).await;
        let (status, body) = send(&app, generate("/v1/seating/generate?format=text", "2", "3")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Hall 1\n"));
        assert!(body.contains("Register No"));
        assert!(body.contains("\nHall 2\n"));
    }

    fn post_json(uri: &str, payload: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_or_mistyped_form_fields_are_input_errors() {
        let app = router(Session::new(Some(5)));
        send(&app, upload(CSV)).await;

        let (status, body) = send(
            &app,
            post_json("/v1/seating/generate", json!({ "seatsPerHall": "5" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(error["error"], "INPUT_ERROR");

        let (status, body) = send(
            &app,
            post_json("/v1/seating/generate", json!({ "halls": true, "seatsPerHall": "5" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INPUT_ERROR"));

        let (status, _) = send(
            &app,
            post_json("/v1/seating/generate", json!({ "halls": 1, "seatsPerHall": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn huge_hall_count_is_an_input_error() {
        let app = router(Session::new(Some(5)));
        send(&app, upload(CSV)).await;
        let (status, body) = send(&app, generate("/v1/seating/generate", "4294967295", "1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(error["error"], "INPUT_ERROR");
    }

    #[tokio::test]
    async fn unreadable_bodies_use_the_error_shape() {
        let app = router(Session::new(Some(5)));
        send(&app, upload(CSV)).await;

        let request = Request::post("/v1/seating/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(error["error"], "INPUT_ERROR");

        let (status, body) = send(
            &app,
            post_json("/v1/seating/solve", json!({ "halls": 1, "seatsPerHall": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INPUT_ERROR"));
    }

    #[tokio::test]
    async fn non_utf8_upload_is_a_format_error() {
        let app = router(Session::new(Some(5)));
        let request = Request::post("/v1/roster")
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(b"Name,Register No,Department\nA\xffsha,R1,CS\n".to_vec()))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("FORMAT_ERROR"));
    }

    #[tokio::test]
    async fn clearing_the_roster() {
        let app = router(Session::new(Some(5)));
        send(&app, upload(CSV)).await;
        let (status, body) = send(&app, Request::get("/v1/roster").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"students\":5"));

        let request = Request::delete("/v1/roster").body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, generate("/v1/seating/generate", "1", "5")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(&app, Request::get("/v1/roster").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn stateless_solve_is_reproducible_with_seed() {
        let app = router(Session::new(None));
        let payload = json!({
            "students": [
                { "name": "Asha", "registerNumber": "R1", "department": "CS" },
                { "name": "Ben", "registerNumber": "R2", "department": "CS" },
                { "name": "Chen", "registerNumber": "R3", "department": "EE" }
            ],
            "halls": 2,
            "seatsPerHall": 2,
            "seed": 99
        })
        .to_string();
        let request = || {
            Request::post("/v1/seating/solve")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.clone()))
                .unwrap()
        };

        let (status, first) = send(&app, request()).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = send(&app, request()).await;
        assert_eq!(first, second);

        let output: Value = serde_json::from_str(&first).unwrap();
        assert_eq!(output["capacity"], 4);
        assert_eq!(output["plan"]["halls"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stateless_solve_rejects_zero_halls() {
        let app = router(Session::new(None));
        let request = Request::post("/v1/seating/solve")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "students": [], "halls": 0, "seatsPerHall": 3 }).to_string(),
            ))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
