mod common;

use rimgaz_lib::{load_positions, replay, AlertEngine, AlertKind, PositionStatus};

use common::{fixture_fleet, positions_path};

#[test]
fn fixture_positions_decode() {
    let positions = load_positions(&positions_path()).expect("fixture positions.csv should load");

    assert_eq!(positions.len(), 6);
    assert_eq!(positions[2].status, PositionStatus::Returning);
    assert!(positions[3].tour_id.is_none());
    assert!(positions[5].coordinates().is_none());
}

#[test]
fn fixture_replay_produces_expected_alerts() {
    let fleet = fixture_fleet();
    let positions = load_positions(&positions_path()).expect("fixture positions.csv should load");

    let report = replay(&fleet, &positions, &AlertEngine::new());

    assert_eq!(report.positions, 5);
    assert_eq!(report.skipped, 1);

    let alerts: Vec<(i64, i64, AlertKind)> = report
        .alerts
        .iter()
        .map(|alert| (alert.position_id, alert.bus_id, alert.alert_type))
        .collect();
    assert_eq!(
        alerts,
        vec![
            (2, 1, AlertKind::Speed),
            (3, 2, AlertKind::Speed),
            (3, 2, AlertKind::Geofence),
            (4, 3, AlertKind::Geofence),
        ]
    );
    assert!(report.alerts.iter().all(|alert| !alert.is_resolved));
}

#[test]
fn replay_is_deterministic() {
    let fleet = fixture_fleet();
    let positions = load_positions(&positions_path()).expect("fixture positions.csv should load");
    let engine = AlertEngine::new();

    let first = replay(&fleet, &positions, &engine);
    let second = replay(&fleet, &positions, &engine);
    assert_eq!(first.alerts, second.alerts);
}
