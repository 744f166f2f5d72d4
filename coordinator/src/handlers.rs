use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use common::{
    CompleteMapTaskRequest, CompleteReduceTaskRequest, CompleteTaskResponse, JobStatusResponse,
    LeaseMapTaskResponse, LeaseReduceTaskResponse, HEALTH_PATH, MAP_COMPLETE_PATH,
    MAP_LEASE_PATH, REDUCE_COMPLETE_PATH, REDUCE_LEASE_PATH, STATUS_PATH,
};
use tower_http::trace::TraceLayer;

use crate::state::Coordinator;

pub fn build_router(coordinator: Coordinator) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(STATUS_PATH, get(job_status))
        .route(MAP_LEASE_PATH, post(lease_map_task))
        .route(MAP_COMPLETE_PATH, post(complete_map_task))
        .route(REDUCE_LEASE_PATH, post(lease_reduce_task))
        .route(REDUCE_COMPLETE_PATH, post(complete_reduce_task))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

/* ---------------- handlers HTTP ----------------
   Ninguno falla: el estado se comunica con los campos de la respuesta. */

async fn health() -> &'static str {
    "ok"
}

async fn job_status(State(c): State<Coordinator>) -> Json<JobStatusResponse> {
    Json(c.status())
}

async fn lease_map_task(State(c): State<Coordinator>) -> Json<LeaseMapTaskResponse> {
    Json(c.lease_map_task())
}

async fn complete_map_task(
    State(c): State<Coordinator>,
    Json(req): Json<CompleteMapTaskRequest>,
) -> Json<CompleteTaskResponse> {
    c.complete_map_task(req.map_task_id);
    Json(CompleteTaskResponse { ok: true })
}

async fn lease_reduce_task(State(c): State<Coordinator>) -> Json<LeaseReduceTaskResponse> {
    Json(c.lease_reduce_task())
}

async fn complete_reduce_task(
    State(c): State<Coordinator>,
    Json(req): Json<CompleteReduceTaskRequest>,
) -> Json<CompleteTaskResponse> {
    c.complete_reduce_task(req.reduce_task_id);
    Json(CompleteTaskResponse { ok: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use common::{JobPhase, MapAssignment};
    use serde::de::DeserializeOwned;
    use std::time::Duration;
    use tower::ServiceExt;

    fn coordinator() -> Coordinator {
        Coordinator::new(
            vec!["a.txt".to_string(), "b.txt".to_string()],
            2,
            Duration::from_secs(10),
        )
    }

    async fn call<T: DeserializeOwned>(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> T {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_responde_ok() {
        let app = build_router(coordinator());
        let resp = app
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn lease_y_complete_de_map_por_http() {
        let app = build_router(coordinator());

        let lease: LeaseMapTaskResponse = call(&app, Method::POST, MAP_LEASE_PATH, None).await;
        assert_eq!(
            lease.task,
            Some(MapAssignment {
                filename: "a.txt".to_string(),
                map_task_id: 0,
                reducer_count: 2,
            })
        );
        assert!(!lease.done);

        let ok: CompleteTaskResponse = call(
            &app,
            Method::POST,
            MAP_COMPLETE_PATH,
            Some(serde_json::json!({ "map_task_id": 0 })),
        )
        .await;
        assert!(ok.ok);

        let status: JobStatusResponse = call(&app, Method::GET, STATUS_PATH, None).await;
        assert_eq!(status.phase, JobPhase::Mapping);
        assert_eq!(status.map.completed, 1);
        assert_eq!(status.map.idle, 1);
    }

    #[tokio::test]
    async fn lease_reduce_espera_durante_el_map() {
        let app = build_router(coordinator());

        let lease: LeaseReduceTaskResponse =
            call(&app, Method::POST, REDUCE_LEASE_PATH, None).await;
        assert_eq!(lease, LeaseReduceTaskResponse::default());
    }

    #[tokio::test]
    async fn complete_de_reduce_desconocido_igual_responde_ok() {
        let app = build_router(coordinator());

        let ok: CompleteTaskResponse = call(
            &app,
            Method::POST,
            REDUCE_COMPLETE_PATH,
            Some(serde_json::json!({ "reduce_task_id": 99 })),
        )
        .await;
        assert!(ok.ok);
    }
}
