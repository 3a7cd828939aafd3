// Integration tests for `HttpBackend` using wiremock.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use palisade_api::{ApiError, ConfigBackend, HttpBackend};

const ADDRESS_XPATH: &str = "/config/devices/entry[@name='localhost.localdomain']\
/vsys/entry[@name='vsys1']/address/entry[@name='web-1']";

async fn setup() -> (MockServer, HttpBackend) {
    let server = MockServer::start().await;
    let backend = HttpBackend::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, backend)
}

#[tokio::test]
async fn get_unwraps_success_envelope() {
    let (server, backend) = setup().await;

    let body = json!({
        "status": "success",
        "result": { "network": "10.1.1.0/24", "description": "web tier" }
    });

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .and(body_partial_json(json!({ "action": "get", "xpath": ADDRESS_XPATH })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let payload = backend.get(ADDRESS_XPATH).await.unwrap().unwrap();
    assert_eq!(payload["network"], "10.1.1.0/24");
    assert_eq!(payload["description"], "web tier");
}

#[tokio::test]
async fn get_maps_missing_object_code_to_none() {
    let (server, backend) = setup().await;

    let body = json!({
        "status": "error",
        "code": "7",
        "message": "No such node"
    });

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let payload = backend.get(ADDRESS_XPATH).await.unwrap();
    assert!(payload.is_none());
}

#[tokio::test]
async fn set_sends_element_and_succeeds() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .and(body_partial_json(json!({
            "action": "set",
            "xpath": ADDRESS_XPATH,
            "element": { "network": "10.1.1.0/24" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let element = json!({ "network": "10.1.1.0/24" });
    backend.set(ADDRESS_XPATH, &element).await.unwrap();
}

#[tokio::test]
async fn semantic_rejection_carries_message_and_code() {
    let (server, backend) = setup().await;

    let body = json!({
        "status": "error",
        "code": "12",
        "message": "invalid value for network"
    });

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let element = json!({ "network": "not-a-network" });
    let err = backend.set(ADDRESS_XPATH, &element).await.unwrap_err();

    assert!(!err.is_transient());
    assert_eq!(err.api_error_code(), Some("12"));
    assert!(err.to_string().contains("invalid value for network"));
}

#[tokio::test]
async fn gateway_unavailable_classifies_as_transient() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend.delete(ADDRESS_XPATH).await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(err, ApiError::Connectivity { .. }));
}

#[tokio::test]
async fn unauthorized_classifies_as_authentication() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = backend.get(ADDRESS_XPATH).await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication { .. }));
    assert!(!err.is_transient());
}
