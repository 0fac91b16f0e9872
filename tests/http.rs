#![cfg(feature = "http-client")]

//! HTTP client adapter integration tests (no network access required).

use quartermaster::resources::http::{HttpClientConfig, HttpClientResource};
use quartermaster::{Registry, callback};

#[tokio::test]
async fn client_builds_from_static_config() {
    let registry = Registry::builder("App")
        .register(
            "http",
            HttpClientResource::with_config(HttpClientConfig {
                user_agent: Some("quartermaster-test".into()),
                timeout_ms: Some(5_000),
                pool_max_idle_per_host: Some(2),
            }),
        )
        .unwrap()
        .build();

    let mut manager = registry.manager();
    manager.setup().await.unwrap();
    let _client = manager.get::<reqwest::Client>("http").unwrap();
    manager.close().await.unwrap();
}

#[tokio::test]
async fn client_config_can_come_from_earlier_resource() {
    let registry = Registry::builder("App")
        .register(
            "settings",
            callback(|_| async { Ok(serde_json::json!({"http": {"timeout_ms": 1000}})) }),
        )
        .unwrap()
        .register(
            "http",
            HttpClientResource::with_config_fn(|manager: &quartermaster::Manager| {
                let settings = manager.get::<serde_json::Value>("settings")?;
                serde_json::from_value(settings["http"].clone()).map_err(|err| {
                    quartermaster::Error::configuration(format!("bad http config: {err}"))
                })
            }),
        )
        .unwrap()
        .build();

    let mut manager = registry.manager();
    manager.setup().await.unwrap();
    manager.close().await.unwrap();
}

#[tokio::test]
async fn invalid_config_fails_acquisition() {
    let registry = Registry::builder("App")
        .register(
            "http",
            HttpClientResource::with_config(HttpClientConfig {
                timeout_ms: Some(0),
                ..Default::default()
            }),
        )
        .unwrap()
        .build();

    let mut manager = registry.manager();
    let err = manager.setup().await.unwrap_err();
    assert!(matches!(err, quartermaster::Error::Configuration { .. }));
}
