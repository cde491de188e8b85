//! HTTP listener tests.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use bulletin::core::error::{ErrorType, EvacuationError, EvacuationResult};
use bulletin::evacuation::{
    ContainerDecision, ControllerFuture, DecisionFuture, EvacuationController, EvacuationHandler,
};
use bulletin::models::{
    ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo, EvacuationResponse,
    RemoveEvacuatingActualLrpResponse,
};
use bulletin::net::http::{router, METRICS_ROUTE, PROTOBUF_CONTENT_TYPE};
use bulletin::ops::MetricsSnapshot;
use bulletin::EvacuationKind;
use common::{recording_handler, valid_request, RecordingController, RecordingSink};
use http_body_util::BodyExt;
use prost::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;

fn post(path: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

#[tokio::test]
async fn every_kind_is_routed() {
    let controller = RecordingController::succeeding(false);
    let (handler, _sink) = recording_handler(controller.clone());
    let app = router(Arc::new(handler), 1024);

    for kind in EvacuationKind::ALL {
        let response = app
            .clone()
            .oneshot(post(kind.route(), valid_request(kind)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{kind}");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            PROTOBUF_CONTENT_TYPE
        );
        assert_eq!(controller.calls(kind), 1, "{kind}");
    }
}

#[tokio::test]
async fn errors_travel_in_body_with_ok_status() {
    let (handler, _sink) = recording_handler(RecordingController::failing(
        EvacuationError::not_found("process-guid", 1),
    ));
    let app = router(Arc::new(handler), 1024);

    let response = app
        .oneshot(post(
            EvacuationKind::RemoveEvacuating.route(),
            valid_request(EvacuationKind::RemoveEvacuating),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let decoded = RemoveEvacuatingActualLrpResponse::decode(body_bytes(response).await).unwrap();
    assert_eq!(
        decoded.error.map(|e| e.error_type()),
        Some(ErrorType::ResourceNotFound)
    );
}

#[tokio::test]
async fn invalid_body_returns_validation_error() {
    let (handler, _sink) = recording_handler(RecordingController::succeeding(false));
    let app = router(Arc::new(handler), 1024);

    let response = app
        .oneshot(post(EvacuationKind::Claimed.route(), Vec::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let decoded = EvacuationResponse::decode(body_bytes(response).await).unwrap();
    assert_eq!(
        decoded.error.map(|e| e.error_type()),
        Some(ErrorType::InvalidRequest)
    );
    assert!(decoded.keep_container);
}

#[tokio::test]
async fn oversized_body_is_an_invalid_request() {
    let controller = RecordingController::succeeding(false);
    let (handler, sink) = recording_handler(controller.clone());
    let app = router(Arc::new(handler), 8);

    for kind in [EvacuationKind::Running, EvacuationKind::Claimed, EvacuationKind::Stopped] {
        let response = app
            .clone()
            .oneshot(post(kind.route(), valid_request(kind)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{kind}");

        let decoded = EvacuationResponse::decode(body_bytes(response).await).unwrap();
        assert_eq!(
            decoded.error.map(|e| e.error_type()),
            Some(ErrorType::InvalidRequest),
            "{kind}"
        );
        assert_eq!(decoded.keep_container, kind != EvacuationKind::Stopped, "{kind}");
    }
    assert_eq!(controller.total_calls(), 0);
    assert_eq!(sink.signals(), 0);
}

#[tokio::test]
async fn oversized_remove_evacuating_gets_response() {
    let (handler, _sink) = recording_handler(RecordingController::succeeding(false));
    let app = router(Arc::new(handler), 4);

    let response = app
        .oneshot(post(
            EvacuationKind::RemoveEvacuating.route(),
            valid_request(EvacuationKind::RemoveEvacuating),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let decoded = RemoveEvacuatingActualLrpResponse::decode(body_bytes(response).await).unwrap();
    assert_eq!(
        decoded.error.map(|e| e.error_type()),
        Some(ErrorType::InvalidRequest)
    );
}

/// Holds every call until released, then fails unrecoverably.
#[derive(Default)]
struct GatedController {
    entered: Notify,
    release: Notify,
}

impl GatedController {
    async fn gate<T>(&self) -> EvacuationResult<T> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(EvacuationError::unrecoverable("store lost"))
    }

    async fn gate_decision(&self) -> ContainerDecision {
        match self.gate::<()>().await {
            Ok(()) => ContainerDecision::succeeded(true),
            Err(err) => ContainerDecision::failed(err, true),
        }
    }
}

impl EvacuationController for GatedController {
    fn remove_evacuating_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(self.gate())
    }

    fn evacuate_claimed_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
    ) -> DecisionFuture<'a> {
        Box::pin(self.gate_decision())
    }

    fn evacuate_crashed_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
        _error_message: &'a str,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(self.gate())
    }

    fn evacuate_running_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
        _net_info: &'a ActualLrpNetInfo,
    ) -> DecisionFuture<'a> {
        Box::pin(self.gate_decision())
    }

    fn evacuate_stopped_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(self.gate())
    }
}

#[tokio::test]
async fn client_disconnect_still_escalates() {
    let controller = Arc::new(GatedController::default());
    let sink = RecordingSink::new();
    let handler = EvacuationHandler::new(controller.clone(), sink.clone());
    let app = router(Arc::new(handler), 1024);

    let request = tokio::spawn(app.oneshot(post(
        EvacuationKind::Running.route(),
        valid_request(EvacuationKind::Running),
    )));
    controller.entered.notified().await;

    // The client goes away while the controller is still working.
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());
    assert_eq!(sink.signals(), 0);

    controller.release.notify_one();
    for _ in 0..100 {
        if sink.signals() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(sink.signals(), 1);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (handler, _sink) = recording_handler(RecordingController::succeeding(false));
    let app = router(Arc::new(handler), 1024);

    let response = app
        .oneshot(post("/v1/actual_lrps/evacuate_sideways", Vec::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_route_reports_snapshot() {
    let (handler, _sink) = recording_handler(RecordingController::succeeding(true));
    let app = router(Arc::new(handler), 1024);

    app.clone()
        .oneshot(post(
            EvacuationKind::Running.route(),
            valid_request(EvacuationKind::Running),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(METRICS_ROUTE)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot: MetricsSnapshot = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(snapshot.requests["evacuate-running-actual-lrp"], 1);
    assert_eq!(snapshot.keep_container, 1);
}
