//! Domain client for the EVNEX charge point API.

use crate::auth::{CognitoIdentityProvider, CredentialStore, Credentials, IdentityProvider, TokenSet};
use crate::config::EvnexConfig;
use crate::executor::{ApiRequest, Executor};
use evnex_core::schema::v3::ChargePointDetailV3;
use evnex_core::{
    decode, decode_collection, validate_segments, ChargePoint, ChargePointDetail,
    ChargePointSession, ChargeSchedule, CommandResponse, Envelope, EvnexError, Items,
    LoadSchedule, OrgInsightEntry, OrgStatusSummary, OverrideConfig, Result, ScheduleSegment,
    SolarConfig, Transaction, UserDetail,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Timeout of `remote-stop-transaction` unless the caller picks one
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load management schedule length unless the caller picks one (one day)
pub const DEFAULT_LOAD_PROFILE_DURATION: i64 = 86_400;

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Client for the EVNEX cloud API.
///
/// Every operation runs through the resilient [`Executor`] and decodes its
/// response in the envelope the endpoint uses. Cloning is cheap and clones
/// share credentials and the default organisation.
///
/// # Organisation scope
///
/// Organisation-level operations take an optional organisation id. When it
/// is `None`, the client uses the first organisation of the last
/// [`get_user_detail`](Self::get_user_detail) call, or the configured
/// `org_id` before that. Users in several organisations should pass the id
/// explicitly.
///
/// # Examples
///
/// ```no_run
/// use evnexctl::auth::Credentials;
/// use evnexctl::client::EvnexClient;
/// use evnexctl::config::EvnexConfig;
///
/// # async fn example() -> evnex_core::Result<()> {
/// let client = EvnexClient::connect(
///     EvnexConfig::default(),
///     Credentials::new("jane@example.com", "secret"),
/// )
/// .await?;
///
/// let user = client.get_user_detail().await?;
/// for charge_point in client.get_org_charge_points(None).await? {
///     println!("{} {}: {}", user.name, charge_point.name, charge_point.network_status);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EvnexClient {
    executor: Executor,
    org_id: Arc<RwLock<Option<String>>>,
    cancel: CancellationToken,
}

impl EvnexClient {
    /// Authenticate against Cognito (unless all tokens are supplied) and
    /// build a client
    pub async fn connect(config: EvnexConfig, credentials: Credentials) -> Result<Self> {
        config.validate()?;
        let provider = CognitoIdentityProvider::new(
            &config.user_pool_id,
            &config.client_id,
            config.identity_endpoint.as_deref(),
            config.timeout,
        )?;
        Self::with_provider(config, credentials, Arc::new(provider)).await
    }

    /// Build a client on top of any identity provider
    pub async fn with_provider(
        config: EvnexConfig,
        credentials: Credentials,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        config.validate()?;
        debug!(base_url = %config.base_url, "Creating EVNEX client");
        let store = CredentialStore::connect(credentials, provider).await?;
        let executor = Executor::new(
            &config.base_url,
            config.timeout,
            Arc::new(store),
            config.retry.clone(),
        )?;

        Ok(Self {
            executor,
            org_id: Arc::new(RwLock::new(config.org_id)),
            cancel: CancellationToken::new(),
        })
    }

    /// Clone whose requests stop with `EvnexError::Cancelled` once `cancel`
    /// fires
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run a password exchange, replacing all tokens
    pub async fn authenticate(&self) -> Result<()> {
        self.executor.credentials().authenticate().await
    }

    /// Replace the access token using the refresh token
    ///
    /// Call after an operation fails with `NotAuthorized`, then resubmit.
    pub async fn refresh_tokens(&self) -> Result<()> {
        self.executor.credentials().refresh().await
    }

    pub async fn tokens(&self) -> Option<TokenSet> {
        self.executor.credentials().tokens().await
    }

    /// Current default organisation id
    pub fn default_org_id(&self) -> Option<String> {
        match self.org_id.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_default_org_id(&self, org_id: Option<String>) {
        match self.org_id.write() {
            Ok(mut guard) => *guard = org_id,
            Err(poisoned) => *poisoned.into_inner() = org_id,
        }
    }

    fn resolve_org(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.default_org_id())
            .ok_or(EvnexError::OrganisationUnresolved)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest, envelope: Envelope) -> Result<T> {
        let payload = self
            .executor
            .execute_with_cancel(&request, &self.cancel)
            .await?;
        decode(envelope, payload, &request.endpoint())
    }

    // =========================================================================
    // User and organisation
    // =========================================================================

    /// Profile of the authenticated user
    ///
    /// Caches the first listed organisation as the default scope.
    pub async fn get_user_detail(&self) -> Result<UserDetail> {
        let user: UserDetail = self
            .fetch(ApiRequest::get("/v2/apps/user"), Envelope::V2)
            .await?;

        if let Some(org_id) = user.default_org_id() {
            debug!(org_id = %org_id, "Caching default organisation");
            self.set_default_org_id(Some(org_id.to_string()));
        }
        Ok(user)
    }

    pub async fn get_org_charge_points(&self, org_id: Option<&str>) -> Result<Vec<ChargePoint>> {
        let org_id = self.resolve_org(org_id)?;
        debug!(org_id = %org_id, "Listing org charge points");
        let path = format!("/v2/apps/organisations/{}/charge-points", segment(&org_id));
        let list: Items<ChargePoint> = self.fetch(ApiRequest::get(path), Envelope::V2).await?;
        Ok(list.items)
    }

    /// Energy, cost and carbon statistics over the last `days` days
    ///
    /// `tz_offset` is an offset such as `+12:00` used to bucket days.
    pub async fn get_org_insight(
        &self,
        days: u32,
        tz_offset: Option<&str>,
        org_id: Option<&str>,
    ) -> Result<Vec<OrgInsightEntry>> {
        if days == 0 {
            return Err(EvnexError::InvalidInput(
                "insight window must be at least one day".to_string(),
            ));
        }
        let org_id = self.resolve_org(org_id)?;
        debug!(org_id = %org_id, days, "Getting org insight");

        let mut request = ApiRequest::get(format!(
            "/v3/organisations/{}/summary/insights",
            segment(&org_id)
        ))
        .query("days", days);
        if let Some(offset) = tz_offset {
            request = request.query("tz-offset", offset);
        }

        let list: Items<OrgInsightEntry> = self.fetch(request, Envelope::V2).await?;
        Ok(list.items)
    }

    pub async fn get_org_summary_status(&self, org_id: Option<&str>) -> Result<OrgStatusSummary> {
        let org_id = self.resolve_org(org_id)?;
        let path = format!("/v2/apps/organisations/{}/summary/status", segment(&org_id));
        self.fetch(ApiRequest::get(path), Envelope::V2).await
    }

    // =========================================================================
    // Charge point telemetry
    // =========================================================================

    pub async fn get_charge_point_detail(&self, charge_point_id: &str) -> Result<ChargePointDetail> {
        let path = format!("/v2/apps/charge-points/{}", segment(charge_point_id));
        self.fetch(ApiRequest::get(path), Envelope::V2).await
    }

    pub async fn get_charge_point_detail_v3(
        &self,
        charge_point_id: &str,
    ) -> Result<ChargePointDetailV3> {
        let path = format!("/v3/charge-points/{}", segment(charge_point_id));
        self.fetch(ApiRequest::get(path), Envelope::V3).await
    }

    pub async fn get_charge_point_sessions(
        &self,
        charge_point_id: &str,
    ) -> Result<Vec<ChargePointSession>> {
        let request = ApiRequest::get(format!(
            "/v3/charge-points/{}/sessions",
            segment(charge_point_id)
        ));
        let payload = self
            .executor
            .execute_with_cancel(&request, &self.cancel)
            .await?;
        let resources = decode_collection::<ChargePointSession>(payload, &request.endpoint())?;
        Ok(resources.into_iter().map(|r| r.attributes).collect())
    }

    pub async fn get_charge_point_transactions(
        &self,
        charge_point_id: &str,
    ) -> Result<Vec<Transaction>> {
        let path = format!("/v2/apps/charge-points/{}/transactions", segment(charge_point_id));
        let list: Items<Transaction> = self.fetch(ApiRequest::get(path), Envelope::V2).await?;
        Ok(list.items)
    }

    pub async fn get_charge_point_solar_config(&self, charge_point_id: &str) -> Result<SolarConfig> {
        let path = format!("/v3/charge-points/{}/commands/get-solar", segment(charge_point_id));
        self.fetch(ApiRequest::post(path), Envelope::Bare).await
    }

    pub async fn get_charge_point_override(&self, charge_point_id: &str) -> Result<OverrideConfig> {
        let path = format!(
            "/v3/charge-points/{}/commands/get-override",
            segment(charge_point_id)
        );
        self.fetch(ApiRequest::post(path), Envelope::Bare).await
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Force charging to start now (or release the override)
    ///
    /// Only the status code is checked; the response body is ignored.
    pub async fn set_charge_point_override(
        &self,
        charge_point_id: &str,
        charge_now: bool,
        connector_id: u32,
    ) -> Result<bool> {
        info!(charge_point_id, charge_now, connector_id, "Setting charge override");
        let request = ApiRequest::post(format!(
            "/v3/charge-points/{}/commands/set-override",
            segment(charge_point_id)
        ))
        .json(json!({"connectorId": connector_id, "chargeNow": charge_now}))
        .discard_body();

        self.executor
            .execute_with_cancel(&request, &self.cancel)
            .await?;
        Ok(true)
    }

    /// Make a connector available (`Operative`) or unavailable (`Inoperative`)
    ///
    /// Repeating the same change is harmless.
    pub async fn set_charger_availability(
        &self,
        charge_point_id: &str,
        available: bool,
        connector_id: u32,
    ) -> Result<CommandResponse> {
        let availability = if available { "Operative" } else { "Inoperative" };
        info!(charge_point_id, availability, connector_id, "Changing availability");
        let request = ApiRequest::post(format!(
            "/v3/charge-points/{}/commands/change-availability",
            segment(charge_point_id)
        ))
        .json(json!({
            "connectorId": connector_id,
            "changeAvailabilityType": availability,
        }));

        self.fetch(request, Envelope::V3).await
    }

    pub async fn enable_charger(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> Result<CommandResponse> {
        self.set_charger_availability(charge_point_id, true, connector_id)
            .await
    }

    pub async fn disable_charger(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> Result<CommandResponse> {
        self.set_charger_availability(charge_point_id, false, connector_id)
            .await
    }

    /// Stop the active charging session
    ///
    /// The vehicle must be unplugged before a new session can start. When no
    /// session is active the API never answers; the resulting timeout is
    /// returned at once instead of being retried.
    pub async fn stop_charge_point(
        &self,
        charge_point_id: &str,
        org_id: Option<&str>,
        connector_id: &str,
        timeout: Duration,
    ) -> Result<CommandResponse> {
        let org_id = self.resolve_org(org_id)?;
        info!(org_id = %org_id, charge_point_id, "Stopping charging");
        let request = ApiRequest::post(format!(
            "/v2/apps/organisations/{}/charge-points/{}/commands/remote-stop-transaction",
            segment(&org_id),
            segment(charge_point_id)
        ))
        .json(json!({"connectorId": connector_id}))
        .timeout(timeout)
        .no_timeout_retry();

        self.fetch(request, Envelope::V2).await
    }

    /// Replace the charge schedule; returns the schedule the API stored
    pub async fn set_charge_point_schedule(
        &self,
        charge_point_id: &str,
        segments: &[ScheduleSegment],
        enabled: bool,
    ) -> Result<ChargeSchedule> {
        validate_segments(segments)?;
        info!(charge_point_id, segments = segments.len(), enabled, "Setting charge schedule");
        let body = serde_json::to_value(ChargeSchedule::new(segments, enabled))
            .map_err(|e| EvnexError::InvalidInput(e.to_string()))?;
        let request = ApiRequest::put(format!(
            "/v3/charge-points/{}/charge-schedule",
            segment(charge_point_id)
        ))
        .json(body);

        self.fetch(request, Envelope::V3).await
    }

    /// Replace the load management profile; returns the stored profile
    pub async fn set_charger_load_profile(
        &self,
        charge_point_id: &str,
        segments: &[ScheduleSegment],
        enabled: bool,
        duration: i64,
    ) -> Result<LoadSchedule> {
        validate_segments(segments)?;
        if duration <= 0 {
            return Err(EvnexError::InvalidInput(format!(
                "load profile duration must be positive, got {}",
                duration
            )));
        }
        info!(charge_point_id, segments = segments.len(), enabled, duration, "Setting load profile");
        let body = serde_json::to_value(LoadSchedule::new(segments, enabled, duration))
            .map_err(|e| EvnexError::InvalidInput(e.to_string()))?;
        let request = ApiRequest::put(format!(
            "/v3/charge-points/{}/load-management",
            segment(charge_point_id)
        ))
        .json(body);

        self.fetch(request, Envelope::V3).await
    }
}
