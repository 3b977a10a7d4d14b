#![allow(clippy::unwrap_used)]
// Integration tests for `ApexClient` using wiremock.

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use neptune_api::{ApexClient, Credentials, Error, FeedMode, OutletCommand};

// ── Helpers ─────────────────────────────────────────────────────────

const STATUS_XML: &str = r#"<?xml version="1.0"?>
<status software="5.08_7A18" hardware="1.0">
  <probes>
    <probe><name>Tmp</name><value>78.1</value><type>Temp</type></probe>
  </probes>
  <outlets>
    <outlet><name>Pump1</name><outputID>1</outputID><state>AOF</state><deviceID>1_1</deviceID></outlet>
  </outlets>
</status>"#;

async fn setup() -> (MockServer, ApexClient) {
    let server = MockServer::start().await;
    let client = ApexClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Credentials {
            username: "admin".into(),
            password: SecretString::from("1234".to_string()),
        },
    );
    (server, client)
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_status_sends_basic_auth() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.xml"))
        .and(basic_auth("admin", "1234"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_XML))
        .expect(1)
        .mount(&server)
        .await;

    let body = client.fetch_status().await.unwrap();
    assert!(body.contains("<name>Tmp</name>"));
}

#[tokio::test]
async fn test_fetch_status_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.xml"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.fetch_status().await.unwrap_err();

    assert!(
        matches!(err, Error::Status { status: 401, .. }),
        "expected Status error, got: {err:?}"
    );
    assert!(err.is_unauthorized());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_fetch_status_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.fetch_status().await.unwrap_err();
    assert!(err.is_transient(), "503 should be transient, got {err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // A port that was just free and has nothing listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = ApexClient::with_client(
        reqwest::Client::new(),
        Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap(),
        Credentials {
            username: "admin".into(),
            password: SecretString::from("1234".to_string()),
        },
    );

    let err = client.fetch_status().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_transient());
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_outlet_state_encodes_write_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.sht"))
        .and(query_param("Pump1_state", "2"))
        .and(query_param("Update", "Update"))
        .and(basic_auth("admin", "1234"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_outlet_state("Pump1", OutletCommand::On)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_outlet_auto_sends_zero() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.sht"))
        .and(query_param("Heater_state", "0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_outlet_state("Heater", OutletCommand::Auto)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_feed_mode() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.sht"))
        .and(query_param("$FeedSel", "2"))
        .and(query_param("FeedCycle", "Feed"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.set_feed_mode(FeedMode::C).await.unwrap();
}

#[tokio::test]
async fn test_cancel_feed_mode() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.sht"))
        .and(query_param("FeedCycle", "Feed Cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.cancel_feed_mode().await.unwrap();
}

#[tokio::test]
async fn test_command_rejected_returns_status_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.sht"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client.cancel_feed_mode().await.unwrap_err();
    assert!(err.is_unauthorized(), "got {err:?}");
}
