//! End-to-end: the blocking ANU client against the local server.

use std::sync::Arc;
use std::time::Duration;

use qrandom_core::{
    AnuClient, ClientConfig, DataKind, EntropySource, Error, FetchRequest, OsSource,
    ReplaySource, Sampler, SamplerConfig,
};
use qrandom_server::{ANU_PATH, serve};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

/// Start a server for `source` on an ephemeral port; returns the runtime and base URL.
fn start(source: Arc<dyn EntropySource>) -> (Runtime, String) {
    let rt = Runtime::new().unwrap();
    let listener = rt.block_on(TcpListener::bind("127.0.0.1:0")).unwrap();
    let addr = listener.local_addr().unwrap();
    rt.spawn(serve(listener, source));
    (rt, format!("http://{addr}"))
}

fn client(base: &str) -> AnuClient {
    AnuClient::new(ClientConfig {
        endpoint: format!("{base}{ANU_PATH}"),
        timeout: Duration::from_secs(10),
    })
}

#[test]
fn client_fetches_every_kind() {
    let (_rt, base) = start(Arc::new(OsSource));
    let client = client(&base);
    for kind in DataKind::ALL {
        let req = FetchRequest::new(kind, 10, 32).unwrap();
        let batch = client.fetch(&req).unwrap();
        assert_eq!(batch.kind(), kind);
        assert_eq!(batch.len(), 10);
        batch.check(&req).unwrap();
    }
}

#[test]
fn sampler_over_http() {
    let (_rt, base) = start(Arc::new(OsSource));
    let sampler = Sampler::with_config(
        client(&base),
        SamplerConfig {
            block_size: 64,
            batch_size: 4,
        },
    )
    .unwrap();
    let values = sampler.sample_ints(7, 200).unwrap();
    assert_eq!(values.len(), 200);
    assert!(values.iter().all(|&v| v < 7));
}

#[test]
fn upstream_failure_becomes_unavailable() {
    let (_rt, base) = start(Arc::new(ReplaySource::new(["ab"]).failing_at(0)));
    let req = FetchRequest::hex16(1, 2).unwrap();
    assert!(matches!(
        client(&base).fetch(&req),
        Err(Error::SourceUnavailable(_))
    ));
}

#[test]
fn replayed_blocks_arrive_verbatim() {
    let (_rt, base) = start(Arc::new(ReplaySource::new(["F0A1", "7E31"])));
    let sampler = Sampler::with_config(
        client(&base),
        SamplerConfig {
            block_size: 4,
            batch_size: 2,
        },
    )
    .unwrap();
    assert_eq!(
        sampler.sample_ints(16, 6).unwrap(),
        vec![0xA, 0x0, 0xF, 0x3, 0xE, 0x7]
    );
}

#[test]
fn out_of_range_parameters_are_rejected() {
    let (_rt, base) = start(Arc::new(OsSource));
    let agent = ureq::Agent::new_with_config(
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build(),
    );
    for query in [
        "type=hex16&length=0&size=4",
        "type=hex16&length=1025&size=4",
        "type=hex16&length=1&size=2000",
        "type=float&length=1",
    ] {
        let mut resp = agent
            .get(format!("{base}{ANU_PATH}?{query}").as_str())
            .call()
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400, "{query}");
        let body: serde_json::Value = resp.body_mut().read_json().unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}

#[test]
fn health_and_index() {
    let (_rt, base) = start(Arc::new(OsSource));
    let mut resp = ureq::get(format!("{base}/health").as_str()).call().unwrap();
    let body: serde_json::Value = resp.body_mut().read_json().unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["source"], "os");

    let mut resp = ureq::get(base.as_str()).call().unwrap();
    let body: serde_json::Value = resp.body_mut().read_json().unwrap();
    assert_eq!(body["version"], qrandom_core::VERSION);
}
