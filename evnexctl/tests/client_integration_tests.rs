//! Client operations against the in-process mock EVNEX API

use evnex_core::{EvnexError, NetworkStatus, ScheduleSegment};
use evnexctl::auth::Credentials;
use evnexctl::client::EvnexClient;
use evnexctl::test_utils::{mock_client, mock_config, MockServer, MOCK_CHARGE_POINT};
use serde_json::json;

async fn setup() -> (MockServer, EvnexClient) {
    let (server, url) = MockServer::new().start().await.unwrap();
    let client = mock_client(&url).await.unwrap();
    (server, client)
}

#[tokio::test]
async fn test_user_detail_caches_first_org() {
    let (server, client) = setup().await;
    assert_eq!(client.default_org_id(), None);

    let user = client.get_user_detail().await.unwrap();
    assert_eq!(user.organisations.len(), 2);
    assert_eq!(client.default_org_id().as_deref(), Some("org-a"));
    assert_eq!(server.state().hits("/v2/apps/user"), 1);
}

#[tokio::test]
async fn test_org_operations_need_an_org() {
    let (server, client) = setup().await;

    let result = client.get_org_charge_points(None).await;
    assert!(matches!(result, Err(EvnexError::OrganisationUnresolved)));
    assert_eq!(
        server.state().hits("/v2/apps/organisations/org-a/charge-points"),
        0
    );
}

#[tokio::test]
async fn test_default_org_scopes_requests() {
    let (server, client) = setup().await;
    client.get_user_detail().await.unwrap();

    let charge_points = client.get_org_charge_points(None).await.unwrap();
    assert_eq!(charge_points.len(), 1);
    assert_eq!(charge_points[0].id, MOCK_CHARGE_POINT);
    assert_eq!(
        server.state().hits("/v2/apps/organisations/org-a/charge-points"),
        1
    );

    // An explicit org wins over the cached default
    client.get_org_charge_points(Some("org-b")).await.unwrap();
    assert_eq!(
        server.state().hits("/v2/apps/organisations/org-b/charge-points"),
        1
    );
}

#[tokio::test]
async fn test_configured_org_is_used_without_user_lookup() {
    let (server, url) = MockServer::new().start().await.unwrap();
    let mut config = mock_config(&url);
    config.org_id = Some("org-b".to_string());
    let client = EvnexClient::connect(
        config,
        Credentials::new(evnexctl::test_utils::MOCK_USERNAME, evnexctl::test_utils::MOCK_PASSWORD),
    )
    .await
    .unwrap();

    let summary = client.get_org_summary_status(None).await.unwrap();
    assert_eq!(summary.total(), 2);
    assert_eq!(server.state().hits("/v2/apps/user"), 0);
    assert_eq!(
        server.state().hits("/v2/apps/organisations/org-b/summary/status"),
        1
    );
}

#[tokio::test]
async fn test_org_insight_sends_query() {
    let (server, client) = setup().await;

    let entries = client
        .get_org_insight(7, Some("+12:00"), Some("org-a"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].sessions, 1);

    let query = server
        .state()
        .query("/v3/organisations/org-a/summary/insights")
        .unwrap();
    assert!(query.contains("days=7"));
    assert!(query.contains("tz-offset=%2B12%3A00"));
}

#[tokio::test]
async fn test_org_insight_rejects_zero_days() {
    let (server, client) = setup().await;

    let result = client.get_org_insight(0, None, Some("org-a")).await;
    assert!(matches!(result, Err(EvnexError::InvalidInput(_))));
    assert_eq!(
        server.state().hits("/v3/organisations/org-a/summary/insights"),
        0
    );
}

#[tokio::test]
async fn test_charge_point_detail_v2_and_v3() {
    let (_server, client) = setup().await;

    let detail = client.get_charge_point_detail(MOCK_CHARGE_POINT).await.unwrap();
    assert_eq!(detail.id, MOCK_CHARGE_POINT);
    assert_eq!(detail.network_status, NetworkStatus::Online);

    let detail = client
        .get_charge_point_detail_v3(MOCK_CHARGE_POINT)
        .await
        .unwrap();
    assert!(!detail.connectors.is_empty());
    assert!(!detail.serial.is_empty());
}

#[tokio::test]
async fn test_sessions_and_transactions() {
    let (_server, client) = setup().await;

    let sessions = client
        .get_charge_point_sessions(MOCK_CHARGE_POINT)
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(!sessions[0].is_active());
    assert!(sessions[1].is_active());
    assert_eq!(sessions[0].total_cost.as_ref().unwrap().currency, "NZD");

    let transactions = client
        .get_charge_point_transactions(MOCK_CHARGE_POINT)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert!(transactions[0].is_active());
}

#[tokio::test]
async fn test_solar_and_override_reads() {
    let (_server, client) = setup().await;

    let solar = client
        .get_charge_point_solar_config(MOCK_CHARGE_POINT)
        .await
        .unwrap();
    assert!(solar.power_sensor_installed);
    assert_eq!(solar.solar_start_export_power, 1400.0);

    let config = client
        .get_charge_point_override(MOCK_CHARGE_POINT)
        .await
        .unwrap();
    assert!(!config.charge_now);
}

#[tokio::test]
async fn test_set_override_ignores_empty_body() {
    let (server, client) = setup().await;

    let applied = client
        .set_charge_point_override(MOCK_CHARGE_POINT, true, 1)
        .await
        .unwrap();
    assert!(applied);
    assert_eq!(
        server
            .state()
            .body("/v3/charge-points/cp-1/commands/set-override")
            .unwrap(),
        json!({"connectorId": 1, "chargeNow": true})
    );
}

#[tokio::test]
async fn test_availability_commands() {
    let (server, client) = setup().await;
    let path = "/v3/charge-points/cp-1/commands/change-availability";

    let response = client.disable_charger(MOCK_CHARGE_POINT, 1).await.unwrap();
    assert!(response.is_accepted());
    assert_eq!(
        server.state().body(path).unwrap(),
        json!({"connectorId": 1, "changeAvailabilityType": "Inoperative"})
    );

    // Enabling twice is accepted both times
    client.enable_charger(MOCK_CHARGE_POINT, 1).await.unwrap();
    let response = client.enable_charger(MOCK_CHARGE_POINT, 1).await.unwrap();
    assert!(response.is_accepted());
    assert_eq!(
        server.state().body(path).unwrap()["changeAvailabilityType"],
        "Operative"
    );
    assert_eq!(server.state().hits(path), 3);
}

#[tokio::test]
async fn test_stop_charging() {
    let (server, client) = setup().await;
    client.get_user_detail().await.unwrap();

    let response = client
        .stop_charge_point(
            MOCK_CHARGE_POINT,
            None,
            "1",
            evnexctl::client::DEFAULT_STOP_TIMEOUT,
        )
        .await
        .unwrap();
    assert!(response.is_accepted());

    let path = "/v2/apps/organisations/org-a/charge-points/cp-1/commands/remote-stop-transaction";
    assert_eq!(server.state().body(path).unwrap(), json!({"connectorId": "1"}));
}

#[tokio::test]
async fn test_charge_schedule_round_trip() {
    let (server, client) = setup().await;
    let segments = vec![
        ScheduleSegment::new(0, 32.0),
        ScheduleSegment::new(25_200, 0.0),
        ScheduleSegment::new(79_200, 16.0),
    ];

    let stored = client
        .set_charge_point_schedule(MOCK_CHARGE_POINT, &segments, true)
        .await
        .unwrap();
    assert!(stored.enabled);
    assert_eq!(stored.segments().unwrap(), segments);

    let body = server
        .state()
        .body("/v3/charge-points/cp-1/charge-schedule")
        .unwrap();
    assert_eq!(body["enabled"], true);
    assert_eq!(body["chargingSchedulePeriods"][1]["startPeriod"], 25_200.0);
    assert_eq!(body["chargingSchedulePeriods"][1]["limit"], 0.0);
}

#[tokio::test]
async fn test_invalid_schedule_is_not_sent() {
    let (server, client) = setup().await;
    let segments = vec![ScheduleSegment::new(3600, 32.0), ScheduleSegment::new(0, 0.0)];

    let result = client
        .set_charge_point_schedule(MOCK_CHARGE_POINT, &segments, true)
        .await;
    assert!(matches!(result, Err(EvnexError::InvalidInput(_))));

    let result = client
        .set_charge_point_schedule(MOCK_CHARGE_POINT, &[], true)
        .await;
    assert!(matches!(result, Err(EvnexError::InvalidInput(_))));
    assert_eq!(server.state().hits("/v3/charge-points/cp-1/charge-schedule"), 0);
}

#[tokio::test]
async fn test_load_profile_body() {
    let (server, client) = setup().await;
    let segments = vec![ScheduleSegment::new(0, 32.0), ScheduleSegment::new(3600, 16.0)];

    let stored = client
        .set_charger_load_profile(MOCK_CHARGE_POINT, &segments, true, 86_400)
        .await
        .unwrap();
    assert_eq!(stored.timezone.as_deref(), Some("Pacific/Auckland"));
    assert_eq!(stored.segments().unwrap(), segments);

    let body = server
        .state()
        .body("/v3/charge-points/cp-1/load-management")
        .unwrap();
    assert_eq!(body["duration"], 86_400);
    assert_eq!(body["enabled"], true);
    assert_eq!(body["units"], "A");
    assert_eq!(body["chargingProfilePeriods"][1], json!({"limit": 16.0, "start": 3600.0}));
    assert!(body.get("timezone").is_none());
}

#[tokio::test]
async fn test_load_profile_rejects_bad_duration() {
    let (server, client) = setup().await;
    let segments = vec![ScheduleSegment::new(0, 32.0)];

    let result = client
        .set_charger_load_profile(MOCK_CHARGE_POINT, &segments, true, 0)
        .await;
    assert!(matches!(result, Err(EvnexError::InvalidInput(_))));
    assert_eq!(server.state().hits("/v3/charge-points/cp-1/load-management"), 0);
}
