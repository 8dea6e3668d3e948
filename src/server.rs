use crate::catalog::{Department, Section};
use crate::config::AppConfig;
use crate::data::{FacultyId, FacultyRecord, FacultySubmission, Subject, TimetableGrid};
use crate::error::ScheduleError;
use crate::service::Scheduler;
use crate::settings::ScheduleConfig;
use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

type ApiResult<T> = Result<Json<T>, ScheduleError>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimetableQuery {
    department_id: Option<String>,
    section_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionQuery {
    department_id: Option<String>,
}

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type QueryParams<T> = Result<Query<T>, QueryRejection>;
type FacultyPath = Result<Path<FacultyId>, PathRejection>;

#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn list_faculty_handler(State(state): State<AppState>) -> ApiResult<Vec<FacultyRecord>> {
    Ok(Json(state.scheduler.list_faculty()?))
}

async fn get_faculty_handler(
    State(state): State<AppState>,
    id: FacultyPath,
) -> ApiResult<FacultyRecord> {
    let Path(id) = id?;
    Ok(Json(state.scheduler.get_faculty(id)?))
}

async fn create_faculty_handler(
    State(state): State<AppState>,
    submission: JsonBody<FacultySubmission>,
) -> Result<(StatusCode, Json<FacultyRecord>), ScheduleError> {
    let Json(submission) = submission.inspect_err(|e| warn!("Faculty creation rejected: {e}"))?;
    info!(
        "Faculty creation request: {} / {} / {}",
        submission.name, submission.subject_code, submission.section
    );
    let record = state.scheduler.create_faculty(&submission).inspect_err(|e| {
        warn!("Faculty creation rejected: {e}");
    })?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_faculty_handler(
    State(state): State<AppState>,
    id: FacultyPath,
    submission: JsonBody<FacultySubmission>,
) -> ApiResult<FacultyRecord> {
    let Path(id) = id?;
    let Json(submission) = submission?;
    info!("Faculty update request for {id}");
    let record = state.scheduler.update_faculty(id, &submission).inspect_err(|e| {
        warn!("Faculty update rejected: {e}");
    })?;
    Ok(Json(record))
}

async fn delete_faculty_handler(
    State(state): State<AppState>,
    id: FacultyPath,
) -> ApiResult<Message> {
    let Path(id) = id?;
    state.scheduler.delete_faculty(id)?;
    Ok(Json(Message {
        message: "Faculty deleted successfully",
    }))
}

async fn generate_timetable_handler(
    State(state): State<AppState>,
    query: QueryParams<TimetableQuery>,
) -> ApiResult<TimetableGrid> {
    let Query(query) = query?;
    let timetable = state.scheduler.generate_timetable(
        query.department_id.as_deref(),
        query.section_id.as_deref(),
    )?;
    Ok(Json(timetable))
}

async fn get_timetable_handler(
    State(state): State<AppState>,
    query: QueryParams<TimetableQuery>,
) -> ApiResult<TimetableGrid> {
    let Query(query) = query?;
    let timetable = state
        .scheduler
        .get_timetable(query.department_id.as_deref(), query.section_id.as_deref())?;
    Ok(Json(timetable))
}

async fn delete_timetable_handler(
    State(state): State<AppState>,
    query: QueryParams<TimetableQuery>,
) -> ApiResult<Message> {
    let Query(query) = query?;
    state
        .scheduler
        .delete_timetable(query.department_id.as_deref(), query.section_id.as_deref())?;
    Ok(Json(Message {
        message: "Timetable deleted successfully",
    }))
}

async fn get_settings_handler(State(state): State<AppState>) -> ApiResult<ScheduleConfig> {
    Ok(Json(state.scheduler.settings()?))
}

async fn update_settings_handler(
    State(state): State<AppState>,
    config: JsonBody<ScheduleConfig>,
) -> ApiResult<ScheduleConfig> {
    let Json(config) = config?;
    Ok(Json(state.scheduler.update_settings(config)?))
}

async fn reset_settings_handler(State(state): State<AppState>) -> ApiResult<ScheduleConfig> {
    Ok(Json(state.scheduler.reset_settings()?))
}

async fn departments_handler(State(state): State<AppState>) -> Json<Vec<Department>> {
    Json(state.scheduler.catalog().departments().to_vec())
}

async fn subjects_handler(State(state): State<AppState>) -> Json<Vec<Subject>> {
    Json(state.scheduler.catalog().subjects().to_vec())
}

async fn sections_handler(
    State(state): State<AppState>,
    query: QueryParams<SectionQuery>,
) -> ApiResult<Vec<Section>> {
    let Query(query) = query?;
    let sections = state
        .scheduler
        .catalog()
        .sections(query.department_id.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(sections))
}

async fn handle_timeout(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {err}"),
        )
    }
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/faculty", get(list_faculty_handler).post(create_faculty_handler))
        .route(
            "/faculty/:id",
            get(get_faculty_handler)
                .put(update_faculty_handler)
                .delete(delete_faculty_handler),
        )
        .route("/timetable/generate", post(generate_timetable_handler))
        .route(
            "/timetable",
            get(get_timetable_handler).delete(delete_timetable_handler),
        )
        .route("/settings", get(get_settings_handler).put(update_settings_handler))
        .route("/settings/reset", post(reset_settings_handler))
        .route("/departments", get(departments_handler))
        .route("/subjects", get(subjects_handler))
        .route("/sections", get(sections_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(request_timeout),
        )
        .with_state(state)
}

pub async fn run_server(config: &AppConfig, scheduler: Scheduler) -> std::io::Result<()> {
    let state = AppState {
        scheduler: Arc::new(scheduler),
    };
    let app = router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::store::MemoryStore;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(MemoryStore::new(5));
        let scheduler = Scheduler::new(
            Catalog::builtin().unwrap(),
            store.clone(),
            store.clone(),
            store,
        );
        router(
            AppState {
                scheduler: Arc::new(scheduler),
            },
            Duration::from_secs(5),
        )
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn faculty(name: &str, subject: &str, section: &str, day: &str, periods: &[u8]) -> Value {
        json!({
            "name": name,
            "subjectCode": subject,
            "section": section,
            "availability": [{ "day": day, "periods": periods }]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_faculty_lifecycle() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/faculty",
            Some(faculty("Smith", "DSA", "cse-2a", "Monday", &[1, 2])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["sectionCode"], "2A");
        assert_eq!(created["subject"]["name"], "Data Structures & Algorithms");

        let (status, fetched) = send(&app, Method::GET, &format!("/api/faculty/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/faculty/{id}"),
            Some(faculty("Smith", "DSA", "cse-2a", "Tuesday", &[3])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["availability"][0]["day"], "Tuesday");

        let (status, _) = send(&app, Method::DELETE, &format!("/api/faculty/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, Method::GET, &format!("/api/faculty/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_conflict_response_names_section_and_periods() {
        let app = app();
        send(
            &app,
            Method::POST,
            "/api/faculty",
            Some(faculty("Smith", "DSA", "cse-2a", "Monday", &[1])),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/faculty",
            Some(faculty("smith", "OS", "cse-2b", "Monday", &[1, 4])),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "SCHEDULE_CONFLICT");
        assert_eq!(body["details"]["kind"], "facultyDoubleBooked");
        assert_eq!(body["details"]["sectionCode"], "2A");
        assert_eq!(body["details"]["day"], "Monday");
        assert_eq!(body["details"]["periods"], json!([1]));

        let (_, all) = send(&app, Method::GET, "/api/faculty", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_and_lookup_errors() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/faculty",
            Some(json!({ "name": "Smith", "subjectCode": "DSA", "section": "cse-2a", "availability": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/faculty",
            Some(faculty("Smith", "NOPE", "cse-2a", "Monday", &[1])),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Subject with code \"NOPE\" not found");

        let (status, _) = send(&app, Method::POST, "/api/timetable/generate?departmentId=cse", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_requests_are_bad_requests() {
        let app = app();
        for body in [
            faculty("Smith", "DSA", "cse-2a", "Saturday", &[1]),
            json!({
                "name": "Smith",
                "subjectCode": "DSA",
                "section": "cse-2a",
                "availability": [{ "day": "Monday", "periods": [300] }]
            }),
        ] {
            let (status, response) = send(&app, Method::POST, "/api/faculty", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["code"], "BAD_REQUEST");
            assert!(response["message"].as_str().unwrap().starts_with("Invalid request body"));
        }

        let (status, response) = send(&app, Method::GET, "/api/faculty/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], "BAD_REQUEST");

        let (status, response) = send(
            &app,
            Method::GET,
            "/api/timetable?departmentId=cse&departmentId=ece&sectionId=cse-2a",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], "BAD_REQUEST");

        let (status, response) =
            send(&app, Method::PUT, "/api/settings", Some(json!({ "numberOfPeriods": "six" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], "BAD_REQUEST");

        let (_, all) = send(&app, Method::GET, "/api/faculty", None).await;
        assert!(all.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_and_fetch_timetable() {
        let app = app();
        let uri = "/api/timetable/generate?departmentId=cse&sectionId=cse-2a";

        let (status, body) = send(&app, Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["message"],
            "No faculty found for this section. Please add faculty members first."
        );

        send(&app, Method::POST, "/api/faculty", Some(faculty("A", "DSA", "cse-2a", "Monday", &[1, 2]))).await;
        send(&app, Method::POST, "/api/faculty", Some(faculty("B", "OS", "cse-2b", "Tuesday", &[1, 3]))).await;
        send(&app, Method::POST, "/api/faculty", Some(faculty("B", "OS", "cse-2a", "Monday", &[3]))).await;

        let (status, generated) = send(&app, Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let monday = &generated["grid"]["Monday"];
        assert_eq!(monday.as_object().unwrap().len(), 5);
        assert_eq!(monday["1"]["facultyName"], "A");
        assert_eq!(monday["2"]["facultyName"], "A");
        assert_eq!(monday["3"]["facultyName"], "B");
        assert!(monday["4"].is_null());
        assert!(generated["grid"]["Friday"]["5"].is_null());

        let (status, fetched) = send(
            &app,
            Method::GET,
            "/api/timetable?departmentId=cse&sectionId=cse-2a",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, generated);
    }

    #[tokio::test]
    async fn test_settings_endpoints() {
        let app = app();
        let (status, settings) = send(&app, Method::GET, "/api/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["numberOfPeriods"], 5);

        let mut changed = settings.clone();
        changed["numberOfPeriods"] = json!(12);
        let (status, body) = send(&app, Method::PUT, "/api/settings", Some(changed.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Number of periods must be between 1 and 9");

        changed["numberOfPeriods"] = json!(9);
        let (status, body) = send(&app, Method::PUT, "/api/settings", Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["numberOfPeriods"], 9);

        let (_, reset) = send(&app, Method::POST, "/api/settings/reset", None).await;
        assert_eq!(reset["numberOfPeriods"], 5);
    }

    #[tokio::test]
    async fn test_catalog_endpoints() {
        let app = app();
        let (_, departments) = send(&app, Method::GET, "/api/departments", None).await;
        assert!(departments.as_array().unwrap().iter().any(|d| d["id"] == "cse"));

        let (_, sections) = send(&app, Method::GET, "/api/sections?departmentId=ece", None).await;
        let sections = sections.as_array().unwrap();
        assert!(!sections.is_empty());
        assert!(sections.iter().all(|s| s["departmentId"] == "ece"));

        let (_, subjects) = send(&app, Method::GET, "/api/subjects", None).await;
        assert!(subjects.as_array().unwrap().iter().any(|s| s["code"] == "DSA"));
    }
}
