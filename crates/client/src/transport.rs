//! HTTP transport seam.
//!
//! Requests are described by [`ApiRequest`], a cloneable value, so the
//! gateway can rebuild and re-issue a request after a token refresh.
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! their own [`Transport`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub use reqwest::{Method, StatusCode};

/// Build an endpoint URL under `base`, keeping any path prefix `base` has.
pub fn endpoint(base: &Url, path: &str) -> ClientResult<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| ClientError::InvalidRequest(format!("{joined}: {e}")))
}

/// Request body.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// JSON document, sent as UTF-8 bytes.
    Json(serde_json::Value),
    /// Pre-encoded payload.
    Raw(Vec<u8>),
    /// Multi-part form. The transport owns the content type and boundary.
    Multipart(MultipartForm),
}

/// A multi-part form that can be re-sent.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

/// A single part of a [`MultipartForm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a JSON-encoded part with an `application/json` content type.
    pub fn json_part<T: Serialize>(mut self, name: &str, value: &T) -> ClientResult<Self> {
        self.parts.push(FormPart {
            name: name.to_string(),
            bytes: serde_json::to_vec(value)?,
            file_name: None,
            content_type: Some("application/json".to_string()),
        });
        Ok(self)
    }

    /// Append a file part.
    pub fn file_part(
        mut self,
        name: &str,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            bytes,
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    fn into_reqwest(self) -> ClientResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            let mut body = reqwest::multipart::Part::bytes(part.bytes);
            if let Some(file_name) = part.file_name {
                body = body.file_name(file_name);
            }
            if let Some(content_type) = part.content_type {
                body = body.mime_str(&content_type).map_err(|e| {
                    ClientError::InvalidRequest(format!("part '{}': {e}", part.name))
                })?;
            }
            form = form.part(part.name, body);
        }
        Ok(form)
    }
}

/// An outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Send cookies (and accept `Set-Cookie`) with this request.
    pub credentials: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            credentials: false,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body and its content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> ClientResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(value)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_credentials(mut self) -> Self {
        self.credentials = true;
        self
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.body, RequestBody::Multipart(_))
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-success status into [`ClientError::Status`].
    pub fn error_for_status(self) -> ClientResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Status {
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Executes requests. Implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}

/// reqwest-backed transport.
///
/// Credentialed requests go through a client sharing the cookie jar, the
/// others through a client without cookie support.
#[derive(Clone)]
pub struct ReqwestTransport {
    credentialed: reqwest::Client,
    anonymous: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    /// Create a transport with an empty cookie jar.
    pub fn new() -> ClientResult<Self> {
        Self::with_jar(Arc::new(Jar::default()))
    }

    /// Create a transport sharing an existing cookie jar.
    pub fn with_jar(jar: Arc<Jar>) -> ClientResult<Self> {
        let credentialed = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("http client: {e}")))?;
        let anonymous = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("http client: {e}")))?;
        Ok(Self {
            credentialed,
            anonymous,
            jar,
        })
    }

    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let client = if request.credentials {
            &self.credentialed
        } else {
            &self.anonymous
        };

        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Raw(bytes) => builder.body(bytes),
            RequestBody::Multipart(form) => builder.multipart(form.into_reqwest()?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ApiResponse::new(status, body.to_vec()).with_headers(headers))
    }
}
