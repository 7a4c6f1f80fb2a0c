//! Typed gallery API.
//!
//! Authenticated operations go through the [`Gateway`]; public reads go to
//! the transport directly, and the account endpoints send only the cookie
//! credential. Non-success responses become [`ClientError::Status`].

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::GalleryConfig;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{Gateway, LoginRedirect, RefreshOutcome};
use crate::models::{
    Comment, CommentId, ExhibitionDetail, ExhibitionId, ExhibitionSummary, Feed, LikeStatus,
    LikeTarget, PhotoDetail, PhotoId, PhotoSummary, UserArchive, UserId, UserInfo,
    decode_enveloped,
};
use crate::publish::Publisher;
use crate::session::{FileSessionStore, SessionStore, TokenGrant};
use crate::transport::{ApiRequest, ApiResponse, Transport, endpoint};

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z가-힣]+$").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static NICKNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9가-힣]+$").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static HAS_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z가-힣]").expect("valid regex literal"));

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Sign-up form.
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub nickname: String,
}

/// A sign-up field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinProblem {
    Email,
    Password,
    Username,
    Nickname,
}

impl fmt::Display for JoinProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinProblem::Email => "email must look like name@domain.tld",
            JoinProblem::Password => "password must be at least 4 characters",
            JoinProblem::Username => "username may contain letters only",
            JoinProblem::Nickname => "nickname needs a letter and may contain letters and digits",
        })
    }
}

impl JoinRequest {
    /// Check the form locally. Returns every failing field.
    pub fn validate(&self) -> Vec<JoinProblem> {
        let mut problems = Vec::new();
        if !EMAIL.is_match(&self.email) {
            problems.push(JoinProblem::Email);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            problems.push(JoinProblem::Password);
        }
        if !USERNAME.is_match(&self.username) {
            problems.push(JoinProblem::Username);
        }
        if !NICKNAME.is_match(&self.nickname) || !HAS_LETTER.is_match(&self.nickname) {
            problems.push(JoinProblem::Nickname);
        }
        problems
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct EmailQuery<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewComment<'a> {
    photo_id: PhotoId,
    content: &'a str,
}

#[derive(Deserialize)]
struct Existence(bool);

/// Client for the gallery REST API.
#[derive(Clone)]
pub struct GalleryClient {
    base_url: Url,
    gateway: Gateway,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
}

impl GalleryClient {
    pub fn new(
        base_url: Url,
        login_location: impl Into<String>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> ClientResult<Self> {
        let gateway = Gateway::new(
            &base_url,
            login_location,
            transport.clone(),
            store.clone(),
            redirect,
        )?;
        Ok(Self {
            base_url,
            gateway,
            transport,
            store,
        })
    }

    /// Build a client persisting its token under the configured state
    /// directory.
    pub fn from_config(
        config: &GalleryConfig,
        transport: Arc<dyn Transport>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> ClientResult<Self> {
        let store = Arc::new(FileSessionStore::new(config.token_path()));
        Self::new(
            config.api_url.clone(),
            config.login_path.clone(),
            transport,
            store,
            redirect,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn publisher(&self) -> Publisher {
        Publisher::new(self.gateway.clone(), self.base_url.clone())
    }

    /// Whether a session token is stored.
    pub fn is_logged_in(&self) -> ClientResult<bool> {
        Ok(self.store.get()?.is_some())
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        endpoint(&self.base_url, path)
    }

    async fn public(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "public request");
        self.transport.execute(request).await?.error_for_status()
    }

    async fn authed(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.gateway.send(request).await?.error_for_status()
    }

    async fn authed_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        self.authed(request).await?.json()
    }

    // --- Account ---

    /// Sign in with email and password, storing the issued token.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let request = ApiRequest::post(self.url("/login")?)
            .json(&Credentials { email, password })?
            .with_credentials();
        let grant: TokenGrant = self.public(request).await?.json()?;
        self.store.set(&grant.access_token)?;
        info!(email = %email, "logged in");
        Ok(())
    }

    /// Create an account after validating the form locally.
    pub async fn join(&self, form: &JoinRequest) -> ClientResult<()> {
        let problems = form.validate();
        if !problems.is_empty() {
            let message = problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ClientError::InvalidRequest(message));
        }

        let request = ApiRequest::post(self.url("/user/join")?)
            .json(form)?
            .with_credentials();
        self.public(request).await?;
        info!(email = %form.email, "account created");
        Ok(())
    }

    /// Whether an account already uses `email`.
    pub async fn email_exists(&self, email: &str) -> ClientResult<bool> {
        let request = ApiRequest::post(self.url("/user/exist")?)
            .json(&EmailQuery { email })?
            .with_credentials();
        let Existence(exists) = self.public(request).await?.json()?;
        Ok(exists)
    }

    /// End the server session. The local token is cleared whatever the
    /// server answers.
    pub async fn logout(&self) -> ClientResult<()> {
        let request = ApiRequest::post(self.url("/logout")?).with_credentials();
        if let Err(e) = self.transport.execute(request).await {
            warn!(error = %e, "logout request failed; clearing local session anyway");
        }
        self.store.clear()?;
        info!("logged out");
        Ok(())
    }

    /// Finish a social login: exchange the refresh cookie set by the
    /// provider callback for a session token.
    pub async fn complete_oauth(&self) -> ClientResult<()> {
        match self.gateway.refresh().await? {
            RefreshOutcome::Renewed(token) => {
                self.store.set(&token)?;
                info!("social login completed");
                Ok(())
            }
            RefreshOutcome::Rejected(status) => Err(ClientError::Status {
                status,
                body: String::new(),
            }),
        }
    }

    /// Where to send the user to start a social login with `provider`.
    pub fn oauth_authorization_url(&self, provider: &str) -> ClientResult<Url> {
        if provider.is_empty() || !provider.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ClientError::InvalidRequest(format!(
                "invalid provider '{provider}'"
            )));
        }
        self.url(&format!("/oauth2/authorization/{provider}"))
    }

    /// The signed-in user.
    pub async fn user_info(&self) -> ClientResult<UserInfo> {
        let response = self.authed(ApiRequest::get(self.url("/user/info")?)).await?;
        decode_enveloped(&response)
    }

    // --- Public reads ---

    /// Home feed: every exhibition and every photo, fetched concurrently.
    pub async fn feed(&self) -> ClientResult<Feed> {
        let exhibitions = async {
            self.public(ApiRequest::get(self.url("/exhibition/all")?))
                .await?
                .json::<Vec<ExhibitionSummary>>()
        };
        let photos = async {
            self.public(ApiRequest::get(self.url("/photo/all")?))
                .await?
                .json::<Vec<PhotoSummary>>()
        };
        let (exhibitions, photos) = tokio::try_join!(exhibitions, photos)?;
        Ok(Feed {
            exhibitions,
            photos,
        })
    }

    pub async fn photo(&self, id: PhotoId) -> ClientResult<PhotoDetail> {
        let response = self
            .public(ApiRequest::get(self.url(&format!("/photo/{id}"))?))
            .await?;
        decode_enveloped(&response)
    }

    pub async fn exhibition(&self, id: ExhibitionId) -> ClientResult<ExhibitionDetail> {
        let response = self
            .public(ApiRequest::get(self.url(&format!("/exhibition/{id}"))?))
            .await?;
        decode_enveloped(&response)
    }

    /// A user's public archive.
    pub async fn user_archive(&self, id: UserId) -> ClientResult<UserArchive> {
        let response = self
            .public(ApiRequest::get(self.url(&format!("/users/{id}"))?))
            .await?;
        decode_enveloped(&response)
    }

    // --- Authenticated writes ---

    pub async fn delete_photo(&self, id: PhotoId) -> ClientResult<()> {
        self.authed(ApiRequest::delete(self.url(&format!("/photo/{id}"))?))
            .await?;
        info!(photo_id = id, "photo deleted");
        Ok(())
    }

    pub async fn delete_exhibition(&self, id: ExhibitionId) -> ClientResult<()> {
        self.authed(ApiRequest::delete(self.url(&format!("/exhibition/{id}"))?))
            .await?;
        info!(exhibition_id = id, "exhibition deleted");
        Ok(())
    }

    pub async fn like_status(&self, target: LikeTarget) -> ClientResult<LikeStatus> {
        self.authed_json(ApiRequest::get(self.url(&target.like_path())?))
            .await
    }

    /// Flip the like and return the new state.
    pub async fn toggle_like(&self, target: LikeTarget) -> ClientResult<LikeStatus> {
        let path = format!("{}/toggle", target.like_path());
        self.authed_json(ApiRequest::post(self.url(&path)?)).await
    }

    pub async fn comments(&self, photo_id: PhotoId) -> ClientResult<Vec<Comment>> {
        self.authed_json(ApiRequest::get(
            self.url(&format!("/comment/photo/{photo_id}"))?,
        ))
        .await
    }

    /// Post a comment. Blank comments are refused locally.
    pub async fn create_comment(&self, photo_id: PhotoId, content: &str) -> ClientResult<()> {
        if content.trim().is_empty() {
            return Err(ClientError::InvalidRequest("comment is empty".to_string()));
        }
        let request = ApiRequest::post(self.url("/comment/create")?)
            .json(&NewComment { photo_id, content })?;
        self.authed(request).await?;
        debug!(photo_id, "comment created");
        Ok(())
    }

    pub async fn delete_comment(&self, id: CommentId) -> ClientResult<()> {
        self.authed(ApiRequest::delete(self.url(&format!("/comment/{id}"))?))
            .await?;
        debug!(comment_id = id, "comment deleted");
        Ok(())
    }
}
