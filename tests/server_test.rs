//! Integration tests for the HTTP query endpoint

#[cfg(feature = "server")]
mod server_tests {
    use infrasense::alerts::AlertEvaluator;
    use infrasense::checkpoint::create_shared_tracker;
    use infrasense::pipeline::Pipeline;
    use infrasense::query::QueryFacade;
    use infrasense::server::{run, ServerConfig};
    use infrasense::stats::create_shared_stats;
    use infrasense::transport::ConnectionMonitor;
    use std::time::Duration;

    fn build() -> (QueryFacade, Pipeline) {
        let store = infrasense::store::create_shared_store(100);
        let stats = create_shared_stats();
        let checkpoints = create_shared_tracker(100);
        let facade = QueryFacade::new(
            store.clone(),
            AlertEvaluator::default(),
            ConnectionMonitor::new(),
            stats.clone(),
            checkpoints.clone(),
        );
        let pipeline = Pipeline::new(store, stats, checkpoints, "rfid");
        (facade, pipeline)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (facade, _pipeline) = build();

        // Start server on a random port
        let (addr, shutdown_tx) = run(ServerConfig::new(0), facade)
            .await
            .expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_latest_and_kinds_endpoints() {
        let (facade, pipeline) = build();

        let (addr, shutdown_tx) = run(ServerConfig::new(0), facade)
            .await
            .expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        pipeline.on_message(br#"{"sensor":"MAX30105","heart_rate":72,"spo2":98.5}"#);

        let client = reqwest::Client::new();

        let kinds: serde_json::Value = client
            .get(format!("http://{}/kinds", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(kinds, serde_json::json!(["heart_rate_oxygen"]));

        let latest: serde_json::Value = client
            .get(format!("http://{}/sensors/heart_rate_oxygen/latest", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(latest["kind"], "heart_rate_oxygen");
        assert_eq!(latest["heart_rate"], 72.0);
        assert_eq!(latest["spo2"], 98.5);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_alerts_endpoint_flags_abnormal_reading() {
        let (facade, pipeline) = build();

        let (addr, shutdown_tx) = run(ServerConfig::new(0), facade)
            .await
            .expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Fresh reading (wall-clock timestamped) with an out-of-range rate.
        pipeline.on_message(br#"{"sensor":"MAX30105","heart_rate":220,"spo2":98.5}"#);

        let client = reqwest::Client::new();
        let alerts: serde_json::Value = client
            .get(format!("http://{}/sensors/heart_rate_oxygen/alerts", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");

        assert_eq!(alerts["is_stale"], false);
        assert_eq!(alerts["abnormal_fields"], serde_json::json!(["heart_rate"]));

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_found() {
        let (facade, _pipeline) = build();

        let (addr, shutdown_tx) = run(ServerConfig::new(0), facade)
            .await
            .expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/sensors/thermocouple/latest", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "UNKNOWN_KIND");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_status_and_checkpoints_endpoints() {
        let (facade, pipeline) = build();

        let (addr, shutdown_tx) = run(ServerConfig::new(0), facade)
            .await
            .expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        pipeline.dispatch(infrasense::transport::RawMessage::new(
            "rfid",
            br#"{"station_id":"A1","tag_id":"TAG123"}"#.to_vec(),
        ));

        let client = reqwest::Client::new();

        let status: serde_json::Value = client
            .get(format!("http://{}/status", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(status["connection"]["state"], "disconnected");
        assert_eq!(status["stats"]["rfid_scans"], 1);
        assert!(status["instance_id"].as_str().is_some());

        let checkpoints: serde_json::Value = client
            .get(format!("http://{}/checkpoints/1298", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(checkpoints["node_id"], "1298");
        assert_eq!(checkpoints["checkpoints"][0]["checkpoint"], "Entry Gate");
        assert_eq!(checkpoints["checkpoints"][0]["passed"], true);
        assert_eq!(checkpoints["latest_scan"]["tag_id"], "TAG123");

        let _ = shutdown_tx.send(());
    }
}
