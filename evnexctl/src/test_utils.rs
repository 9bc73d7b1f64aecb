//! Test utilities
//!
//! An in-process mock of the EVNEX API and of the Cognito `InitiateAuth`
//! endpoint, with per-path request counters and scripted faults.

use crate::auth::Credentials;
use crate::client::EvnexClient;
use crate::config::EvnexConfig;
use crate::retry::{Jitter, RetryPolicy};
use anyhow::Result;
use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const MOCK_USERNAME: &str = "jane@example.com";
pub const MOCK_PASSWORD: &str = "secret";
pub const MOCK_CHARGE_POINT: &str = "cp-1";

/// Fault returned instead of the normal response
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Respond with this status and a short text body
    Status(u16),
    /// Respond 200 with a truncated JSON body
    MalformedBody,
    /// Hold the request for this long, then respond 504
    Stall(Duration),
}

/// Mock server state
#[derive(Debug, Clone)]
pub struct MockServerState {
    /// Organisation ids listed on the user profile, in order
    pub orgs: Arc<Mutex<Vec<String>>>,
    /// Access tokens the API accepts
    pub valid_tokens: Arc<Mutex<HashSet<String>>>,
    /// Refresh tokens Cognito accepts
    pub refresh_tokens: Arc<Mutex<HashSet<String>>>,
    pub logins: Arc<AtomicU32>,
    pub refreshes: Arc<AtomicU32>,
    /// Requests seen per path, including rejected ones
    pub hits: Arc<Mutex<HashMap<String, u32>>>,
    /// Last JSON body received per path
    pub bodies: Arc<Mutex<HashMap<String, Value>>>,
    /// Last query string received per path
    pub queries: Arc<Mutex<HashMap<String, String>>>,
    pub faults: Arc<Mutex<HashMap<String, VecDeque<Fault>>>>,
    /// Whether the charge point has a session to stop
    pub charging: Arc<AtomicBool>,
    token_counter: Arc<AtomicU32>,
}

impl Default for MockServerState {
    fn default() -> Self {
        Self {
            orgs: Arc::new(Mutex::new(vec!["org-a".to_string(), "org-b".to_string()])),
            valid_tokens: Arc::new(Mutex::new(HashSet::new())),
            refresh_tokens: Arc::new(Mutex::new(HashSet::new())),
            logins: Arc::new(AtomicU32::new(0)),
            refreshes: Arc::new(AtomicU32::new(0)),
            hits: Arc::new(Mutex::new(HashMap::new())),
            bodies: Arc::new(Mutex::new(HashMap::new())),
            queries: Arc::new(Mutex::new(HashMap::new())),
            faults: Arc::new(Mutex::new(HashMap::new())),
            charging: Arc::new(AtomicBool::new(true)),
            token_counter: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl MockServerState {
    /// Queue faults for the next requests to `path`
    pub fn inject(&self, path: &str, faults: impl IntoIterator<Item = Fault>) {
        self.faults
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .extend(faults);
    }

    pub fn hits(&self, path: &str) -> u32 {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn body(&self, path: &str) -> Option<Value> {
        self.bodies.lock().unwrap().get(path).cloned()
    }

    pub fn query(&self, path: &str) -> Option<String> {
        self.queries.lock().unwrap().get(path).cloned()
    }

    /// Invalidate every issued access token, as if they expired
    pub fn expire_access_tokens(&self) {
        self.valid_tokens.lock().unwrap().clear();
    }

    pub fn set_charging(&self, charging: bool) {
        self.charging.store(charging, Ordering::SeqCst);
    }

    fn issue_tokens(&self) -> (String, String, String) {
        let n = self.token_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{}", n);
        self.valid_tokens.lock().unwrap().insert(access.clone());
        (format!("id-{}", n), access, format!("refresh-{}", n))
    }

    fn next_fault(&self, path: &str) -> Option<Fault> {
        self.faults
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
    }
}

/// Mock server implementation
#[derive(Debug)]
pub struct MockServer {
    state: MockServerState,
    port: u16,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServer {
    /// Create a new mock server
    pub fn new() -> Self {
        Self {
            state: MockServerState::default(),
            port: 0, // Will be assigned when server starts
        }
    }

    /// Start the mock server and return the address
    pub async fn start(mut self) -> Result<(Self, String)> {
        let app = self.create_router();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        self.port = addr.port();

        let server_url = format!("http://127.0.0.1:{}", self.port);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        // Give the server a moment to start and verify it's running
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                break;
            }
        }

        Ok((self, server_url))
    }

    /// Get the server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the server state
    pub fn state(&self) -> &MockServerState {
        &self.state
    }

    fn create_router(&self) -> Router {
        Router::new()
            .route("/cognito", post(cognito_handler))
            // v2
            .route("/v2/apps/user", get(user_handler))
            .route(
                "/v2/apps/organisations/:org/charge-points",
                get(org_charge_points_handler),
            )
            .route(
                "/v2/apps/organisations/:org/summary/status",
                get(summary_status_handler),
            )
            .route("/v2/apps/charge-points/:id", get(detail_v2_handler))
            .route(
                "/v2/apps/charge-points/:id/transactions",
                get(transactions_handler),
            )
            .route(
                "/v2/apps/organisations/:org/charge-points/:id/commands/remote-stop-transaction",
                post(stop_handler),
            )
            // v3
            .route(
                "/v3/organisations/:org/summary/insights",
                get(insights_handler),
            )
            .route("/v3/charge-points/:id", get(detail_v3_handler))
            .route("/v3/charge-points/:id/sessions", get(sessions_handler))
            .route(
                "/v3/charge-points/:id/commands/get-solar",
                post(solar_handler),
            )
            .route(
                "/v3/charge-points/:id/commands/get-override",
                post(get_override_handler),
            )
            .route(
                "/v3/charge-points/:id/commands/set-override",
                post(set_override_handler),
            )
            .route(
                "/v3/charge-points/:id/commands/change-availability",
                post(availability_handler),
            )
            .route(
                "/v3/charge-points/:id/charge-schedule",
                put(charge_schedule_handler),
            )
            .route(
                "/v3/charge-points/:id/load-management",
                put(load_management_handler),
            )
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                api_guard,
            ))
            .with_state(self.state.clone())
    }
}

/// Counts requests, checks the access token and plays scripted faults
async fn api_guard(State(state): State<MockServerState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if path == "/cognito" {
        return next.run(request).await;
    }

    *state.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
    if let Some(query) = request.uri().query() {
        state
            .queries
            .lock()
            .unwrap()
            .insert(path.clone(), query.to_string());
    }

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|token| state.valid_tokens.lock().unwrap().contains(token))
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    match state.next_fault(&path) {
        Some(Fault::Status(code)) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "injected fault",
        )
            .into_response(),
        Some(Fault::MalformedBody) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{\"data\": {\"items\": [",
        )
            .into_response(),
        Some(Fault::Stall(duration)) => {
            tokio::time::sleep(duration).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        None => next.run(request).await,
    }
}

fn cognito_error(kind: &str, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"__type": kind, "message": message})),
    )
        .into_response()
}

async fn cognito_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    // Only status faults apply to the identity endpoint
    if let Some(Fault::Status(code)) = state.next_fault("/cognito") {
        let kind = if code >= 500 {
            "InternalErrorException"
        } else {
            "TooManyRequestsException"
        };
        return (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({"__type": kind, "message": "injected fault"})),
        )
            .into_response();
    }

    let target = headers
        .get("X-Amz-Target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if target != "AWSCognitoIdentityProviderService.InitiateAuth" {
        return cognito_error("UnknownOperationException", "unexpected target");
    }
    let Ok(request) = serde_json::from_str::<Value>(&body) else {
        return cognito_error("SerializationException", "body is not JSON");
    };
    let params = &request["AuthParameters"];

    match request["AuthFlow"].as_str() {
        Some("USER_PASSWORD_AUTH") => {
            if params["USERNAME"] != MOCK_USERNAME || params["PASSWORD"] != MOCK_PASSWORD {
                return cognito_error(
                    "NotAuthorizedException",
                    "Incorrect username or password.",
                );
            }
            state.logins.fetch_add(1, Ordering::SeqCst);
            let (id, access, refresh) = state.issue_tokens();
            state.refresh_tokens.lock().unwrap().insert(refresh.clone());
            Json(json!({
                "AuthenticationResult": {
                    "AccessToken": access,
                    "IdToken": id,
                    "RefreshToken": refresh,
                    "ExpiresIn": 3600,
                    "TokenType": "Bearer"
                },
                "ChallengeParameters": {}
            }))
            .into_response()
        }
        Some("REFRESH_TOKEN_AUTH") => {
            let known = params["REFRESH_TOKEN"]
                .as_str()
                .map(|t| state.refresh_tokens.lock().unwrap().contains(t))
                .unwrap_or(false);
            if !known {
                return cognito_error("NotAuthorizedException", "Invalid Refresh Token");
            }
            state.refreshes.fetch_add(1, Ordering::SeqCst);
            let (id, access, _) = state.issue_tokens();
            Json(json!({
                "AuthenticationResult": {
                    "AccessToken": access,
                    "IdToken": id,
                    "ExpiresIn": 3600,
                    "TokenType": "Bearer"
                },
                "ChallengeParameters": {}
            }))
            .into_response()
        }
        _ => cognito_error("InvalidParameterException", "unsupported auth flow"),
    }
}

fn record_body(state: &MockServerState, path: String, body: &Value) {
    state.bodies.lock().unwrap().insert(path, body.clone());
}

async fn user_handler(State(state): State<MockServerState>) -> Json<Value> {
    let orgs = state.orgs.lock().unwrap().clone();
    Json(json!({"data": fixtures::user(&orgs)}))
}

async fn org_charge_points_handler(Path(org): Path<String>) -> Json<Value> {
    Json(json!({"data": {"items": [fixtures::charge_point(MOCK_CHARGE_POINT, &org)]}}))
}

async fn summary_status_handler(Path(_org): Path<String>) -> Json<Value> {
    Json(json!({"data": {
        "available": 1, "charging": 1, "disabled": 0, "faulted": 0,
        "occupied": 0, "offline": 0, "reserved": 0
    }}))
}

async fn insights_handler(Path(_org): Path<String>) -> Json<Value> {
    Json(json!({"data": {"items": [
        {
            "carbonOffset": 1.5,
            "costs": [{"currency": "NZD", "cost": 2.75}],
            "duration": 3600,
            "powerUsage": 7000.0,
            "startDate": "2022-03-01T00:00:00Z",
            "sessions": 1
        },
        {
            "carbonOffset": 0.0,
            "costs": [],
            "duration": 0,
            "powerUsage": 0.0,
            "startDate": "2022-03-02T00:00:00Z",
            "sessions": 0
        }
    ]}}))
}

async fn detail_v2_handler(Path(id): Path<String>) -> Json<Value> {
    Json(json!({"data": fixtures::charge_point_detail(&id)}))
}

async fn transactions_handler(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({"data": {"items": [{
        "id": "tx-1",
        "connectorId": "1",
        "endDate": null,
        "evseId": "NZ*EVX*E1234*1",
        "powerUsage": 1500.0,
        "reason": null,
        "startDate": "2022-03-01T10:00:00Z",
        "carbonOffset": 0.2,
        "electricityCost": {"currency": "NZD", "cost": 0.4}
    }]}}))
}

async fn detail_v3_handler(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "data": {
            "id": id,
            "type": "ChargePoint",
            "attributes": fixtures::charge_point_attributes_v3(),
            "relationships": {
                "location": {"data": {"id": "loc-1", "type": "Location"}},
                "organisation": {"data": {"id": "org-a", "type": "Organisation"}}
            }
        },
        "included": [{"id": "loc-1", "type": "Location", "attributes": {"name": "Home"}}]
    }))
}

async fn sessions_handler(Path(id): Path<String>) -> Json<Value> {
    Json(json!({"data": [
        {
            "id": "s-1",
            "type": "Session",
            "attributes": {
                "connectorId": "1",
                "startDate": "2022-03-01T10:00:00Z",
                "endDate": "2022-03-01T12:00:00Z",
                "sessionStatus": "COMPLETED",
                "totalPowerUsage": 14000.0,
                "totalCost": {"currency": "NZD", "cost": 3.1}
            },
            "relationships": {"chargePoint": {"data": {"id": id, "type": "ChargePoint"}}}
        },
        {
            "id": "s-2",
            "type": "Session",
            "attributes": {
                "connectorId": "1",
                "startDate": "2022-03-02T10:00:00Z",
                "endDate": null,
                "sessionStatus": "CHARGING",
                "totalPowerUsage": 500.0
            }
        }
    ]}))
}

async fn solar_handler(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({
        "solarWithSchedule": false,
        "powerSensorInstalled": true,
        "solarStartExportPower": 1400.0,
        "solarStopImportPower": 500.0
    }))
}

async fn get_override_handler(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({"chargeNow": false}))
}

async fn set_override_handler(
    State(state): State<MockServerState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    record_body(
        &state,
        format!("/v3/charge-points/{}/commands/set-override", id),
        &body,
    );
    StatusCode::OK
}

async fn availability_handler(
    State(state): State<MockServerState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_body(
        &state,
        format!("/v3/charge-points/{}/commands/change-availability", id),
        &body,
    );
    Json(json!({"data": {
        "id": id,
        "type": "CommandResponse",
        "attributes": {"status": "Accepted"}
    }}))
}

async fn stop_handler(
    State(state): State<MockServerState>,
    Path((org, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    record_body(
        &state,
        format!(
            "/v2/apps/organisations/{}/charge-points/{}/commands/remote-stop-transaction",
            org, id
        ),
        &body,
    );
    if !state.charging.load(Ordering::SeqCst) {
        // Idle charge points never answer
        tokio::time::sleep(Duration::from_secs(30)).await;
        return StatusCode::GATEWAY_TIMEOUT.into_response();
    }
    state.set_charging(false);
    Json(json!({"data": {"status": "Accepted", "message": "Stopping"}})).into_response()
}

async fn charge_schedule_handler(
    State(state): State<MockServerState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_body(&state, format!("/v3/charge-points/{}/charge-schedule", id), &body);
    Json(json!({"data": {"id": id, "type": "ChargeSchedule", "attributes": body}}))
}

async fn load_management_handler(
    State(state): State<MockServerState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_body(&state, format!("/v3/charge-points/{}/load-management", id), &body);
    let mut attributes = body;
    attributes["timezone"] = json!("Pacific/Auckland");
    Json(json!({"data": {"id": id, "type": "LoadManagement", "attributes": attributes}}))
}

/// Retry policy with millisecond delays, so retry tests stay fast
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_delays(Duration::from_millis(10), Duration::from_millis(80))
        .with_jitter(Jitter::None)
}

/// Client configuration pointing both the API and Cognito at the mock
pub fn mock_config(url: &str) -> EvnexConfig {
    EvnexConfig {
        base_url: url.to_string(),
        identity_endpoint: Some(format!("{}/cognito", url)),
        timeout: Duration::from_secs(5),
        retry: fast_retry_policy(),
        ..EvnexConfig::default()
    }
}

/// Client authenticated against the mock with the mock user
pub async fn mock_client(url: &str) -> evnex_core::Result<EvnexClient> {
    EvnexClient::connect(
        mock_config(url),
        Credentials::new(MOCK_USERNAME, MOCK_PASSWORD),
    )
    .await
}

/// JSON documents served by the mock
pub mod fixtures {
    use serde_json::{json, Value};

    pub fn user(orgs: &[String]) -> Value {
        let organisations: Vec<Value> = orgs
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "id": id,
                    "isDefault": i == 0,
                    "role": 1,
                    "createdDate": "2021-08-19T02:29:44.593Z",
                    "name": format!("Org {}", id),
                    "slug": id,
                    "tier": 1,
                    "tierDetails": null,
                    "updatedDate": "2021-08-19T02:29:44.593Z"
                })
            })
            .collect();

        json!({
            "id": "user-1",
            "createdDate": "2021-08-19T02:29:44.593Z",
            "updatedDate": "2022-01-02T03:04:05Z",
            "name": "Jane Doe",
            "email": super::MOCK_USERNAME,
            "organisations": organisations,
            "type": "User"
        })
    }

    fn location() -> Value {
        json!({
            "id": "loc-1",
            "name": "Home",
            "createdDate": "2021-08-19T02:29:44.593Z",
            "updatedDate": "2021-08-19T02:29:44.593Z",
            "address": {
                "address1": "1 Queen St",
                "address2": null,
                "city": "Auckland",
                "postCode": "1010",
                "state": null,
                "country": "NZ"
            },
            "coordinates": {"latitude": -36.85, "longitude": 174.76},
            "chargePointCount": 1
        })
    }

    fn connector() -> Value {
        json!({
            "powerType": "AC_1_PHASE",
            "connectorId": "1",
            "evseId": "NZ*EVX*E1234*1",
            "updatedDate": "2022-03-01T10:00:00Z",
            "connectorType": "IEC_62196_T2",
            "amperage": 32,
            "voltage": 230,
            "connectorFormat": "SOCKET",
            "ocppStatus": "CHARGING",
            "status": "OCCUPIED",
            "ocppCode": "CHARGING",
            "meter": {
                "powerType": "AC_1_PHASE",
                "updatedDate": "2022-03-01T10:00:00Z",
                "power": 7200.5,
                "register": 123456.0,
                "frequency": 50
            }
        })
    }

    pub fn charge_point(id: &str, org: &str) -> Value {
        json!({
            "id": id,
            "createdDate": "2021-08-19T02:29:44.593Z",
            "updatedDate": "2021-08-19T02:29:44.593Z",
            "networkStatusUpdatedDate": "2022-03-01T10:00:00Z",
            "name": format!("Garage ({})", org),
            "ocppChargePointId": "E1234",
            "serial": "E1234",
            "networkStatus": "ONLINE",
            "location": location(),
            "details": {
                "model": "E2-2-5-SN",
                "vendor": "Evnex",
                "firmware": "1.2.3",
                "iccid": "8964000000000000000"
            },
            "connectors": [connector()],
            "lastHeard": "2022-03-01T10:00:00Z",
            "maxCurrent": 32,
            "tokenRequired": false,
            "needsRegistrationInformation": false
        })
    }

    pub fn charge_point_detail(id: &str) -> Value {
        json!({
            "id": id,
            "createdDate": "2021-08-19T02:29:44.593Z",
            "updatedDate": "2021-08-19T02:29:44.593Z",
            "networkStatusUpdatedDate": "2022-03-01T10:00:00Z",
            "name": "Garage",
            "ocppChargePointId": "E1234",
            "serial": "E1234",
            "networkStatus": "ONLINE",
            "location": location(),
            "configuration": {"maxCurrent": 32, "plugAndCharge": false},
            "electricityCost": {
                "currency": "NZD",
                "duration": 86400,
                "costs": [{"cost": 0.25, "start": 0}]
            },
            "loadSchedule": {
                "duration": 86400,
                "enabled": false,
                "timezone": "Pacific/Auckland",
                "units": "A",
                "chargingProfilePeriods": [{"limit": 32, "start": 0}]
            },
            "connectors": [connector()]
        })
    }

    pub fn charge_point_attributes_v3() -> Value {
        json!({
            "connectors": [{
                "evseId": "NZ*EVX*E1234*1",
                "connectorFormat": "CABLE",
                "connectorType": "IEC_62196_T2",
                "ocppStatus": "AVAILABLE",
                "powerType": "AC_1_PHASE",
                "connectorId": "1",
                "ocppCode": "AVAILABLE",
                "updatedDate": "2022-03-01T10:00:00Z",
                "meter": {
                    "currentL1": 0.0,
                    "frequency": 50.0,
                    "power": 0.0,
                    "register": 123456.0,
                    "updatedDate": "2022-03-01T10:00:00Z",
                    "voltageL1N": 238.5
                },
                "maxVoltage": 230,
                "maxAmperage": 32
            }],
            "createdDate": "2021-08-19T02:29:44.593Z",
            "electricityCost": {
                "currency": "NZD",
                "tariffs": [{"start": 0, "rate": 0.25, "type": "Flat"}],
                "tariffType": "Flat",
                "cost": 0.25
            },
            "firmware": "1.2.3",
            "iccid": "8964000000000000000",
            "maxCurrent": 32,
            "model": "X7-T2SW",
            "name": "Garage",
            "networkStatus": "ONLINE",
            "networkStatusUpdatedDate": "2022-03-01T10:00:00Z",
            "ocppChargePointId": "E1234",
            "profiles": {
                "chargeSchedule": {
                    "enabled": true,
                    "chargingSchedulePeriods": [{"limit": 32, "startPeriod": 0}]
                }
            },
            "serial": "E1234",
            "timeZone": "Pacific/Auckland",
            "tokenRequired": false,
            "updatedDate": "2022-03-01T10:00:00Z",
            "vendor": "Evnex"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_startup() {
        let server = MockServer::new();
        let (server, url) = server.start().await.unwrap();

        assert!(server.port() > 0);
        assert!(url.contains(&server.port().to_string()));
    }

    #[tokio::test]
    async fn test_api_rejects_missing_token() {
        let (server, url) = MockServer::new().start().await.unwrap();

        let response = reqwest::Client::new()
            .get(format!("{}/v2/apps/user", url))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(server.state().hits("/v2/apps/user"), 1);
    }

    #[tokio::test]
    async fn test_cognito_password_flow() {
        let (server, url) = MockServer::new().start().await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("{}/cognito", url))
            .header("X-Amz-Target", "AWSCognitoIdentityProviderService.InitiateAuth")
            .header("Content-Type", "application/x-amz-json-1.1")
            .body(
                json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "ClientId": "client",
                    "AuthParameters": {"USERNAME": MOCK_USERNAME, "PASSWORD": MOCK_PASSWORD}
                })
                .to_string(),
            )
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["AuthenticationResult"]["AccessToken"], "access-1");
        assert_eq!(server.state().logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_faults_are_consumed_in_order() {
        let state = MockServerState::default();
        state.inject("/x", [Fault::Status(500), Fault::MalformedBody]);
        assert_eq!(state.next_fault("/x"), Some(Fault::Status(500)));
        assert_eq!(state.next_fault("/x"), Some(Fault::MalformedBody));
        assert_eq!(state.next_fault("/x"), None);
        assert_eq!(state.next_fault("/y"), None);
    }
}
