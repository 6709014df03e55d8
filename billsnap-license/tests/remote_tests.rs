#![cfg(feature = "online")]

mod common;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use billsnap_license::{LicenseConfig, LicenseError, LicenseStore, LicenseType, RemoteValidator};
use chrono::{TimeZone, Utc};
use common::fresh_manager;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const VALIDATE_PATH: &str = "/v1/licenses/validate";

/// Spin up a mock validation endpoint on an OS-assigned port, returning the
/// full endpoint URL.
async fn spawn_endpoint(status: StatusCode, body: Value) -> String {
    let app = Router::new().route(
        VALIDATE_PATH,
        post(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );
    serve(app).await
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}{VALIDATE_PATH}")
}

/// A URL on a port nobody is listening on.
async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}{VALIDATE_PATH}")
}

fn validator_for(url: String) -> RemoteValidator {
    let config = LicenseConfig {
        validation_url: url,
        instance_name: Some("test-instance".to_string()),
        request_timeout_secs: 5,
        ..LicenseConfig::default()
    };
    RemoteValidator::new(&config).unwrap()
}

#[tokio::test]
async fn valid_response_activates_with_customer_email() {
    let url = spawn_endpoint(
        StatusCode::OK,
        json!({"valid": true, "meta": {"customer_email": "a@b.com"}}),
    )
    .await;
    let validator = validator_for(url);
    let mut manager = fresh_manager();

    let result = manager
        .activate_license_online(&validator, "38b1460a-5104-4067-a91d-77b872934d51")
        .await;

    assert!(result.success, "{}", result.message);
    assert!(manager.is_licensed());
    assert_eq!(manager.license_info().customer_email.as_deref(), Some("a@b.com"));
    assert_eq!(
        manager.state().key.as_deref(),
        Some("38b1460a-5104-4067-a91d-77b872934d51")
    );
    assert_eq!(manager.state().valid_until, None);
}

#[tokio::test]
async fn valid_response_records_all_metadata() {
    let url = spawn_endpoint(
        StatusCode::OK,
        json!({
            "valid": true,
            "error": null,
            "license_key": {
                "id": 1,
                "status": "active",
                "key": "38b1460a-5104-4067-a91d-77b872934d51",
                "expires_at": "2099-06-30T00:00:00.000000Z"
            },
            "instance": null,
            "meta": {
                "store_id": 1,
                "customer_name": "Ada Lovelace",
                "customer_email": "ada@example.com",
                "product_name": "BillSnap Pro"
            }
        }),
    )
    .await;
    let validator = validator_for(url);
    let mut manager = fresh_manager();

    manager
        .activate_online(&validator, "38b1460a-5104-4067-a91d-77b872934d51")
        .await
        .unwrap();

    let info = manager.license_info();
    assert!(info.is_licensed);
    assert_eq!(info.customer_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(info.customer_email.as_deref(), Some("ada@example.com"));
    assert_eq!(info.product_name.as_deref(), Some("BillSnap Pro"));
    assert_eq!(
        info.valid_until,
        Some(Utc.with_ymd_and_hms(2099, 6, 30, 0, 0, 0).unwrap())
    );
    assert_eq!(manager.store().load().unwrap().unwrap(), *manager.state());
}

#[tokio::test]
async fn past_expiry_from_server_is_not_licensed() {
    let url = spawn_endpoint(
        StatusCode::OK,
        json!({"valid": true, "license_key": {"expires_at": "2001-01-01T00:00:00Z"}}),
    )
    .await;
    let validator = validator_for(url);
    let mut manager = fresh_manager();

    manager.activate_online(&validator, "some-key").await.unwrap();

    assert_eq!(manager.state().license_type, LicenseType::Licensed);
    assert!(!manager.is_licensed());
}

#[tokio::test]
async fn rejected_key_reports_invalid_key() {
    let url = spawn_endpoint(
        StatusCode::NOT_FOUND,
        json!({"valid": false, "error": "license_key not found.", "license_key": null, "meta": null}),
    )
    .await;
    let validator = validator_for(url);
    let mut manager = fresh_manager();
    let before = manager.state().clone();

    let result = manager.activate_license_online(&validator, "bogus").await;

    assert!(!result.success);
    assert_eq!(result.message, "Invalid license key");
    assert_eq!(result.error_code.as_deref(), Some("INVALID_KEY"));
    assert_eq!(manager.state(), &before);
}

#[tokio::test]
async fn unreachable_endpoint_reports_connectivity_failure() {
    let validator = validator_for(closed_endpoint().await);
    let mut manager = fresh_manager();
    let before = manager.state().clone();
    let raw_before = manager.store().raw();

    let result = manager.activate_license_online(&validator, "some-key").await;

    assert!(!result.success);
    assert_eq!(result.error_code.as_deref(), Some("NETWORK_ERROR"));
    assert!(result.message.contains("license server"));
    assert_eq!(manager.state(), &before);
    assert_eq!(manager.store().raw(), raw_before);
    assert!(!manager.is_licensed());
}

#[tokio::test]
async fn slow_endpoint_times_out_as_connectivity_failure() {
    let app = Router::new().route(
        VALIDATE_PATH,
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"valid": true}))
        }),
    );
    let config = LicenseConfig {
        validation_url: serve(app).await,
        instance_name: Some("test-instance".to_string()),
        request_timeout_secs: 1,
        ..LicenseConfig::default()
    };
    let validator = RemoteValidator::new(&config).unwrap();
    let mut manager = fresh_manager();
    let before = manager.state().clone();
    let raw_before = manager.store().raw();

    let result = manager.activate_license_online(&validator, "some-key").await;

    assert!(!result.success);
    assert_eq!(result.error_code.as_deref(), Some("NETWORK_ERROR"));
    assert!(result.message.contains("license server"));
    assert_eq!(manager.state(), &before);
    assert_eq!(manager.store().raw(), raw_before);
    assert!(!manager.is_licensed());
}

#[tokio::test]
async fn unparseable_response_is_a_network_error() {
    let app = Router::new().route(
        VALIDATE_PATH,
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>").into_response() }),
    );
    let validator = validator_for(serve(app).await);
    let mut manager = fresh_manager();

    let err = manager.activate_online(&validator, "some-key").await.unwrap_err();
    assert!(matches!(err, LicenseError::Network(_)));
    assert!(!manager.is_licensed());
}

#[tokio::test]
async fn request_carries_key_and_instance_name() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let captured = Arc::clone(&seen);
    let app = Router::new().route(
        VALIDATE_PATH,
        post(move |Json(body): Json<Value>| {
            let captured = Arc::clone(&captured);
            async move {
                *captured.lock().unwrap() = Some(body);
                Json(json!({"valid": true}))
            }
        }),
    );
    let validator = validator_for(serve(app).await);
    let mut manager = fresh_manager();

    manager.activate_online(&validator, "  the-key  ").await.unwrap();

    let body = seen.lock().unwrap().clone().unwrap();
    assert_eq!(body["license_key"], "the-key");
    assert_eq!(body["instance_name"], "test-instance");
}

#[tokio::test]
async fn blank_key_is_rejected_without_request() {
    let validator = validator_for(closed_endpoint().await);
    let mut manager = fresh_manager();

    let err = manager.activate_online(&validator, "   ").await.unwrap_err();
    assert!(matches!(err, LicenseError::InvalidKeyFormat(_)));
}

#[tokio::test]
async fn activation_counter_is_kept() {
    let url = spawn_endpoint(StatusCode::OK, json!({"valid": true})).await;
    let validator = validator_for(url);
    let mut manager = fresh_manager();
    manager.increment_invoice_count().unwrap();
    manager.increment_invoice_count().unwrap();

    manager.activate_online(&validator, "k").await.unwrap();
    manager.increment_invoice_count().unwrap();

    assert_eq!(manager.state().invoices_created, 2);
    assert_eq!(manager.remaining_trial_invoices(), None);
}

#[test]
fn validator_defaults_to_hostname_instance() {
    let validator = RemoteValidator::new(&LicenseConfig::default()).unwrap();
    assert!(!validator.instance_name().is_empty());
    assert_eq!(
        validator.url(),
        "https://api.lemonsqueezy.com/v1/licenses/validate"
    );
}
