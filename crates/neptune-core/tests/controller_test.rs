#![allow(clippy::unwrap_used)]
// End-to-end tests: Controller over a real ApexClient against wiremock.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use neptune_core::{
    Controller, ControllerConfig, DeviceDescriptor, DeviceKind, OutletCommand, ProbeType,
    Reading, RefreshConfig, TlsVerification,
};

const STATUS_XML: &str = r#"<?xml version="1.0"?>
<status software="5.08_7A18" hardware="1.0">
  <probes>
    <probe><name>Tmp</name><value>78.1</value><type>Temp</type></probe>
    <probe><name>Salt</name><value></value><type>Cond</type></probe>
  </probes>
  <outlets>
    <outlet><name>Pump1</name><outputID>1</outputID><state>AOF</state><deviceID>1_1</deviceID></outlet>
    <outlet><name>Pump1</name><outputID>9</outputID><state>ON</state><deviceID>9_9</deviceID></outlet>
  </outlets>
</status>"#;

fn config(server: &MockServer) -> ControllerConfig {
    ControllerConfig {
        url: Url::parse(&server.uri()).unwrap(),
        username: "admin".into(),
        password: SecretString::from("1234".to_string()),
        serial_number: "AC5:1".into(),
        tls: TlsVerification::SystemDefaults,
        timeout: Duration::from_secs(5),
        refresh: RefreshConfig::default(),
    }
}

fn descriptors() -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor::probe("Tmp", "Tmp", ProbeType::Temperature, true),
        DeviceDescriptor::probe("Salt", "Salt", ProbeType::Salinity, false),
        DeviceDescriptor::outlet("1_1", "Pump1", false, OutletCommand::On),
    ]
}

async fn mount_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_XML))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_reads_come_from_one_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_XML))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = Controller::new(config(&server), descriptors()).unwrap();
    ctrl.connect().await.unwrap();

    let tmp = ctrl.find(DeviceKind::Probe, "Tmp").unwrap();
    let Some(Reading::Probe(celsius)) = ctrl.reading(&tmp).await else {
        panic!("expected a probe reading");
    };
    assert!((celsius - 25.613_16).abs() < 1e-4);

    // Blank value coerces to zero.
    let salt = ctrl.find(DeviceKind::Probe, "Salt").unwrap();
    assert!(ctrl.probe_value(&salt).await.abs() < f64::EPSILON);

    // Only the (Pump1, 1_1) entry survives the allow-list.
    let pump = ctrl.find(DeviceKind::Outlet, "Pump1").unwrap();
    assert_eq!(ctrl.outlet_state(&pump, false).await, 0);
    assert_eq!(ctrl.outlet_state(&pump, true).await, 1);
    assert_eq!(ctrl.cache().snapshot().outlets.len(), 1);
}

#[tokio::test]
async fn test_outlet_command_forces_refresh() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/status.sht"))
        .and(query_param("Pump1_state", "2"))
        .and(query_param("Update", "Update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = Controller::new(config(&server), descriptors()).unwrap();
    ctrl.connect().await.unwrap();
    let before = ctrl.cache().snapshot().fetched_at;

    let pump = ctrl.find(DeviceKind::Outlet, "Pump1").unwrap();
    ctrl.toggle_outlet(&pump, false).await;

    assert!(ctrl.cache().snapshot().fetched_at > before);
    let gets = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method == wiremock::http::Method::GET)
        .count();
    assert_eq!(gets, 2);
}

#[tokio::test]
async fn test_rejected_command_still_refreshes() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    Mock::given(method("POST"))
        .and(path("/status.sht"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = Controller::new(config(&server), descriptors()).unwrap();
    let pump = ctrl.find(DeviceKind::Outlet, "Pump1").unwrap();
    ctrl.set_outlet_state(&pump, OutletCommand::Off).await;

    assert!(ctrl.cache().snapshot().is_fetched());
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_XML))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let ctrl = Controller::new(config(&server), descriptors()).unwrap();
    ctrl.connect().await.unwrap();
    let before = ctrl.cache().snapshot();

    ctrl.cache().force_refresh().await;

    assert_eq!(ctrl.cache().snapshot().fetched_at, before.fetched_at);
    let tmp = ctrl.find(DeviceKind::Probe, "Tmp").unwrap();
    assert!((ctrl.probe_value(&tmp).await - 78.1).abs() < f64::EPSILON);
}
