//! HTTP-level tests for the positions service router.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};

use rimgaz_service_shared::test_utils::{empty_state, fixture_fleet_ids::*, test_state};
use rimgaz_service_shared::{
    PROBLEM_INVALID_REQUEST, PROBLEM_INVALID_ZONE, PROBLEM_SERVICE_UNAVAILABLE,
    PROBLEM_UNKNOWN_ALERT, PROBLEM_UNKNOWN_BUS, PROBLEM_UNKNOWN_ZONE,
};

fn server() -> TestServer {
    TestServer::new(rimgaz_service_positions::router(test_state(), "/metrics")).unwrap()
}

fn position(bus_id: i64, (lat, lon): (f64, f64), speed: f64, recorded_at: &str) -> Value {
    json!({
        "bus_id": bus_id,
        "latitude": lat,
        "longitude": lon,
        "speed_kmh": speed,
        "recorded_at": recorded_at,
    })
}

fn alert_kinds(body: &Value) -> Vec<String> {
    body["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["alert_type"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn ingest_inside_zone_under_limit_raises_nothing() {
    let server = server();
    let response = server
        .post("/api/v1/positions")
        .json(&position(BUS_LIMITED_60, DEPOT, 40.0, "2025-03-01T08:00:00Z"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["position"]["id"], 1);
    assert_eq!(body["position"]["bus_id"], BUS_LIMITED_60);
    assert_eq!(body["position"]["status"], "on_tour");
    assert!(alert_kinds(&body).is_empty());
    assert_eq!(body["has_alert"], false);
}

#[tokio::test]
async fn ingest_raises_speed_before_geofence() {
    let server = server();
    let response = server
        .post("/api/v1/positions")
        .json(&position(BUS_LIMITED_50, OPEN_DESERT, 55.0, "2025-03-01T08:00:00Z"))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(alert_kinds(&body), vec!["speed", "geofence"]);
    assert_eq!(body["alerts"][0]["message"], "Speed 55 km/h exceeds limit 50 km/h");
    assert_eq!(body["alerts"][1]["message"], "Bus outside authorized zones");
    assert_eq!(body["alerts"][0]["position_id"], body["position"]["id"]);
    assert_eq!(body["has_alert"], true);
}

#[tokio::test]
async fn ingest_bus_without_limit_only_checks_geofence() {
    let server = server();
    let response = server
        .post("/api/v1/positions")
        .json(&position(BUS_UNLIMITED, OPEN_DESERT, 120.0, "2025-03-01T08:00:00Z"))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(alert_kinds(&response.json::<Value>()), vec!["geofence"]);
}

#[tokio::test]
async fn ingest_accepts_decimal_strings() {
    let server = server();
    let response = server
        .post("/api/v1/positions")
        .json(&json!({
            "bus_id": BUS_LIMITED_60,
            "latitude": "18.086100",
            "longitude": "-15.975100",
            "speed_kmh": "60.00",
            "status": "paused",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["position"]["latitude"], "18.086100");
    assert_eq!(body["position"]["status"], "paused");
    assert!(alert_kinds(&body).is_empty());
}

#[tokio::test]
async fn ingest_unknown_bus_is_not_found_and_not_stored() {
    let server = server();
    let response = server
        .post("/api/v1/positions")
        .json(&position(BUS_UNKNOWN, DEPOT, 10.0, "2025-03-01T08:00:00Z"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(body["type"], PROBLEM_UNKNOWN_BUS);

    let listed = server.get("/api/v1/positions").await.json::<Value>();
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn ingest_without_buses_is_unavailable() {
    let server =
        TestServer::new(rimgaz_service_positions::router(empty_state(), "/metrics")).unwrap();
    let response = server
        .post("/api/v1/positions")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-empty-fleet"),
        )
        .json(&position(BUS_LIMITED_60, DEPOT, 10.0, "2025-03-01T08:00:00Z"))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert_eq!(body["type"], PROBLEM_SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);
    assert_eq!(body["instance"], "req-empty-fleet");

    let listed = server.get("/api/v1/positions").await.json::<Value>();
    assert_eq!(listed["count"], 0);
    server.get("/health/ready").await.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn ingest_rejects_malformed_coordinates_with_request_id() {
    let server = server();
    let response = server
        .post("/api/v1/positions")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-bad-lat"),
        )
        .json(&json!({"bus_id": BUS_LIMITED_60, "latitude": "north", "longitude": -15.9}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.header("x-request-id"), "req-bad-lat");
    let body = response.json::<Value>();
    assert_eq!(body["type"], PROBLEM_INVALID_REQUEST);
    assert_eq!(body["instance"], "req-bad-lat");
    assert!(body["detail"].as_str().unwrap().contains("'latitude'"));
}

#[tokio::test]
async fn ingest_rejects_unparseable_body() {
    let server = server();
    let response = server.post("/api/v1/positions").text("{not json").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["type"], PROBLEM_INVALID_REQUEST);
}

#[tokio::test]
async fn positions_are_listed_newest_first() {
    let server = server();
    for (minute, bus) in [(0, BUS_LIMITED_60), (2, BUS_LIMITED_50), (1, BUS_LIMITED_60)] {
        let recorded_at = format!("2025-03-01T08:0{minute}:00Z");
        server
            .post("/api/v1/positions")
            .json(&position(bus, DEPOT, 10.0, &recorded_at))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let body = server.get("/api/v1/positions").await.json::<Value>();
    let ids: Vec<i64> = body["positions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3, 1]);

    let body = server
        .get("/api/v1/positions")
        .add_query_param("bus_id", BUS_LIMITED_60)
        .add_query_param("limit", 1)
        .await
        .json::<Value>();
    assert_eq!(body["count"], 1);
    assert_eq!(body["positions"][0]["id"], 3);
}

#[tokio::test]
async fn positions_limit_is_validated() {
    let server = server();
    server
        .get("/api/v1/positions")
        .add_query_param("limit", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/v1/positions")
        .add_query_param("limit", 501)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/v1/positions")
        .add_query_param("limit", "many")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn alerts_can_be_filtered_and_resolved() {
    let server = server();
    server
        .post("/api/v1/positions")
        .json(&position(BUS_LIMITED_50, OPEN_DESERT, 55.0, "2025-03-01T08:00:00Z"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/v1/positions")
        .json(&position(BUS_UNLIMITED, OPEN_DESERT, 30.0, "2025-03-01T08:01:00Z"))
        .await
        .assert_status(StatusCode::CREATED);

    let all = server.get("/api/v1/alerts").await.json::<Value>();
    assert_eq!(all["count"], 3);

    let resolved = server.post("/api/v1/alerts/1/resolve").await;
    resolved.assert_status_ok();
    let resolved = resolved.json::<Value>();
    assert_eq!(resolved["id"], 1);
    assert_eq!(resolved["is_resolved"], true);

    // Resolving twice is fine.
    server
        .post("/api/v1/alerts/1/resolve")
        .await
        .assert_status_ok();

    let open = server
        .get("/api/v1/alerts")
        .add_query_param("unresolved", true)
        .await
        .json::<Value>();
    assert_eq!(open["count"], 2);

    let bus2 = server
        .get("/api/v1/alerts")
        .add_query_param("bus_id", BUS_LIMITED_50)
        .add_query_param("unresolved", true)
        .await
        .json::<Value>();
    assert_eq!(bus2["count"], 1);
    assert_eq!(bus2["alerts"][0]["alert_type"], "geofence");
}

#[tokio::test]
async fn resolve_unknown_alert_is_not_found() {
    let server = server();
    let response = server.post("/api/v1/alerts/99/resolve").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["type"], PROBLEM_UNKNOWN_ALERT);

    server
        .post("/api/v1/alerts/first/resolve")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn geofences_list_includes_inactive_zones() {
    let server = server();
    let response = server.get("/api/v1/geofences").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["count"], 3);
    assert_eq!(body["active"], 2);
    assert_eq!(body["zones"][2]["id"], ZONE_AIRPORT);
    assert_eq!(body["zones"][2]["is_active"], false);
}

#[tokio::test]
async fn created_zone_gets_next_id_and_takes_effect() {
    let server = server();
    let response = server
        .post("/api/v1/geofences")
        .json(&json!({
            "name": "Desert Corridor",
            "polygon": [[18.15, -15.95], [18.15, -15.85], [18.25, -15.85], [18.25, -15.95]],
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let zone = response.json::<Value>();
    assert_eq!(zone["id"], 4);
    assert_eq!(zone["is_active"], true);

    let body = server
        .post("/api/v1/positions")
        .json(&position(BUS_UNLIMITED, OPEN_DESERT, 30.0, "2025-03-01T08:00:00Z"))
        .await
        .json::<Value>();
    assert!(alert_kinds(&body).is_empty());
}

#[tokio::test]
async fn create_zone_rejects_dual_shape() {
    let server = server();
    let response = server
        .post("/api/v1/geofences")
        .json(&json!({
            "name": "Confused",
            "center_latitude": 18.0,
            "center_longitude": -15.9,
            "radius_meters": 100,
            "polygon": [[18.0, -16.0], [18.0, -15.9], [18.1, -15.9]],
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["type"], PROBLEM_INVALID_ZONE);

    let body = server.get("/api/v1/geofences").await.json::<Value>();
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn replacing_zone_swaps_the_active_set() {
    let server = server();
    let airport = (18.31, -15.97);

    let before = server
        .post("/api/v1/positions")
        .json(&position(BUS_UNLIMITED, airport, 20.0, "2025-03-01T08:00:00Z"))
        .await
        .json::<Value>();
    assert_eq!(alert_kinds(&before), vec!["geofence"]);

    let response = server
        .put(&format!("/api/v1/geofences/{ZONE_AIRPORT}"))
        .json(&json!({
            "name": "Airport",
            "center_latitude": 18.31,
            "center_longitude": -15.97,
            "radius_meters": 2500,
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["id"], ZONE_AIRPORT);

    let after = server
        .post("/api/v1/positions")
        .json(&position(BUS_UNLIMITED, airport, 20.0, "2025-03-01T08:01:00Z"))
        .await
        .json::<Value>();
    assert!(alert_kinds(&after).is_empty());
}

#[tokio::test]
async fn replacing_unknown_zone_is_not_found() {
    let server = server();
    let response = server
        .put("/api/v1/geofences/42")
        .json(&json!({"name": "Nowhere", "polygon": [[0, 0], [0, 1], [1, 1]]}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["type"], PROBLEM_UNKNOWN_ZONE);
}

#[tokio::test]
async fn health_endpoints_report_fleet() {
    let server = server();
    server.get("/health/live").await.assert_status_ok();

    let ready = server.get("/health/ready").await;
    ready.assert_status_ok();
    let body = ready.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["buses_loaded"], 3);
    assert_eq!(body["active_zones"], 2);
}

#[tokio::test]
async fn metrics_endpoint_responds() {
    let server = server();
    let response = server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().starts_with('#'));
}
