//! Authenticated request gateway.
//!
//! Every request sent through [`Gateway::send`] carries the current session
//! token as a bearer credential and is marked credentialed so the refresh
//! cookie travels with it. A 401 triggers exactly one recovery cycle:
//!
//! ```text
//! Attempt(original) --401--> Refresh --2xx--> Retry(new token) --> done
//!                                    \--else--> ClearAndRedirect  --> AuthExpired
//! ```
//!
//! The retry's outcome is final, even when it is another 401.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::session::{SessionStore, SessionToken, TokenGrant};
use crate::transport::{ApiRequest, ApiResponse, StatusCode, Transport, endpoint};

/// Path of the token refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/jwt/refresh";

/// Navigation side effect fired when the session cannot be recovered.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, location: &str);
}

/// Redirect that only records the event in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, location: &str) {
        warn!(location = %location, "session expired; login required");
    }
}

/// Outcome of a refresh call.
#[derive(Debug)]
pub enum RefreshOutcome {
    Renewed(SessionToken),
    Rejected(StatusCode),
}

/// Wraps a [`Transport`] with bearer-token attachment and refresh-and-retry.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
    refresh_url: Url,
    login_location: String,
}

impl Gateway {
    pub fn new(
        base_url: &Url,
        login_location: impl Into<String>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> ClientResult<Self> {
        Ok(Self {
            transport,
            store,
            redirect,
            refresh_url: endpoint(base_url, REFRESH_PATH)?,
            login_location: login_location.into(),
        })
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Send an authenticated request, recovering from token expiry once.
    ///
    /// Non-401 responses are returned unchanged, whatever their status.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let token = self.store.get()?;
        let response = self
            .transport
            .execute(authorize(&request, token.as_ref())?)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            debug!(method = %request.method, url = %request.url, status = %response.status(), "request completed");
            return Ok(response);
        }

        info!(url = %request.url, "access token rejected; attempting refresh");

        match self.refresh().await? {
            RefreshOutcome::Renewed(token) => {
                self.store.set(&token)?;
                info!(url = %request.url, "retrying request with refreshed token");
                // Re-read so the retry uses whatever is now persisted
                let token = self.store.get()?;
                self.transport
                    .execute(authorize(&request, token.as_ref())?)
                    .await
            }
            RefreshOutcome::Rejected(status) => {
                warn!(status = %status, "refresh credential rejected; logging out");
                self.store.clear()?;
                self.redirect.redirect_to_login(&self.login_location);
                Err(ClientError::AuthExpired)
            }
        }
    }

    /// Call the refresh endpoint with the cookie credential only.
    ///
    /// A 2xx response must carry `{ accessToken }`; the token is returned
    /// but not persisted.
    pub async fn refresh(&self) -> ClientResult<RefreshOutcome> {
        let request = ApiRequest::post(self.refresh_url.clone()).with_credentials();
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Ok(RefreshOutcome::Rejected(response.status()));
        }

        let grant: TokenGrant = response.json()?;
        Ok(RefreshOutcome::Renewed(grant.access_token))
    }
}

/// Build the outbound copy of `request` carrying `token`.
///
/// An absent token is still sent as an empty bearer credential so the server
/// answers 401 and the refresh cookie gets a chance to mint a token.
fn authorize(request: &ApiRequest, token: Option<&SessionToken>) -> ClientResult<ApiRequest> {
    let mut outbound = request.clone().with_credentials();

    let bearer = token.map(SessionToken::bearer).unwrap_or_else(|| "Bearer ".to_string());
    let mut value = HeaderValue::from_str(&bearer)
        .map_err(|_| ClientError::InvalidRequest("session token is not a valid header value".to_string()))?;
    value.set_sensitive(true);
    outbound.headers.insert(AUTHORIZATION, value);

    if outbound.is_multipart() {
        outbound.headers.remove(CONTENT_TYPE);
    } else {
        outbound
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(outbound)
}
