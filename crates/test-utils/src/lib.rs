//! Gallery client test utilities.
//!
//! Helpers for integration testing: a scripted transport, a recording login
//! redirect, image and content fixtures, and assertion helpers.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use gallery_client::content::{Align, ContentMap, TextBlock};
use gallery_client::editor::{Editor, EditorMode, InMemoryPreviews, LocalImage};
use gallery_client::error::{ClientError, ClientResult};
use gallery_client::gateway::LoginRedirect;
use gallery_client::transport::{ApiRequest, ApiResponse, StatusCode, Transport};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

/// Smallest byte prefix recognised as a PNG image.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

/// Create a PNG test image.
pub fn test_image(file_name: &str) -> LocalImage {
    LocalImage {
        file_name: file_name.to_string(),
        content_type: "image/png".to_string(),
        bytes: PNG_BYTES.to_vec(),
    }
}

/// Create `count` test images named `photo-0.png`, `photo-1.png`, ...
pub fn test_images(count: usize) -> Vec<LocalImage> {
    (0..count).map(|i| test_image(&format!("photo-{i}.png"))).collect()
}

/// A JSON response with the given status.
pub fn json_response(status: u16, body: JsonValue) -> ClientResult<ApiResponse> {
    let status = StatusCode::from_u16(status)
        .map_err(|e| ClientError::Transport(format!("bad scripted status: {e}")))?;
    Ok(ApiResponse::new(status, body.to_string().into_bytes()))
}

/// An empty response with the given status.
pub fn status_response(status: u16) -> ClientResult<ApiResponse> {
    let status = StatusCode::from_u16(status)
        .map_err(|e| ClientError::Transport(format!("bad scripted status: {e}")))?;
    Ok(ApiResponse::new(status, Vec::new()))
}

/// Transport that answers from a script and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ClientResult<ApiResponse>>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response.
    pub fn then(self, response: ClientResult<ApiResponse>) -> Self {
        self.script.lock().push_back(response);
        self
    }

    /// Queue a JSON response.
    pub fn then_json(self, status: u16, body: JsonValue) -> Self {
        self.then(json_response(status, body))
    }

    /// Queue an empty response.
    pub fn then_status(self, status: u16) -> Self {
        self.then(status_response(status))
    }

    /// Queue a transport failure.
    pub fn then_fail(self, message: &str) -> Self {
        self.then(Err(ClientError::Transport(message.to_string())))
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Requests sent so far, in order.
    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().clone()
    }

    /// Paths of the requests sent so far.
    pub fn sent_paths(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let path = request.url.path().to_string();
        self.sent.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport(format!("unscripted request to {path}"))))
    }
}

/// Login redirect that records where it was sent.
#[derive(Debug, Default)]
pub struct RecordingRedirect {
    locations: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.locations.lock().len()
    }

    pub fn locations(&self) -> Vec<String> {
        self.locations.lock().clone()
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self, location: &str) {
        self.locations.lock().push(location.to_string());
    }
}

/// Create a content map builder.
pub fn test_content() -> TestContent {
    TestContent {
        map: ContentMap::new(),
    }
}

/// A content map builder for test fixtures.
#[derive(Debug, Clone)]
pub struct TestContent {
    map: ContentMap,
}

impl TestContent {
    /// Append a centered block to `slot`.
    pub fn text(mut self, slot: usize, text: &str) -> Self {
        self.map.push_block(slot, TextBlock::centered(text));
        self
    }

    /// Append an aligned block to `slot`.
    pub fn aligned(mut self, slot: usize, text: &str, align: Align) -> Self {
        self.map.push_block(slot, TextBlock::new(text, align));
        self
    }

    pub fn build(self) -> ContentMap {
        self.map
    }
}

/// Create an editor builder.
pub fn test_editor() -> TestEditor {
    TestEditor {
        previews: Arc::new(InMemoryPreviews::new()),
        mode: EditorMode::Single,
        title: String::new(),
        images: Vec::new(),
        texts: Vec::new(),
    }
}

/// An editor builder for test fixtures.
pub struct TestEditor {
    previews: Arc<InMemoryPreviews>,
    mode: EditorMode,
    title: String,
    images: Vec<LocalImage>,
    texts: Vec<(usize, String)>,
}

impl TestEditor {
    /// Start in exhibition mode.
    pub fn exhibition(mut self) -> Self {
        self.mode = EditorMode::Exhibition;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Add `count` images.
    pub fn with_images(mut self, count: usize) -> Self {
        self.images.extend(test_images(count));
        self
    }

    /// Add a block to `slot`. Blocks added to the same slot keep their order.
    pub fn with_text(mut self, slot: usize, text: &str) -> Self {
        self.texts.push((slot, text.to_string()));
        self
    }

    /// The preview store the built editor will use.
    pub fn previews(&self) -> Arc<InMemoryPreviews> {
        self.previews.clone()
    }

    /// Build the editor.
    ///
    /// # Panics
    ///
    /// Panics if a text slot is past the last image.
    pub fn build(self) -> Editor {
        let mut editor = Editor::new(self.previews);
        if self.mode == EditorMode::Exhibition {
            editor.set_mode(EditorMode::Exhibition, |_| true);
        }
        editor.set_title(self.title);
        for image in self.images {
            let _ = editor.insert_media(None, vec![image]);
        }
        // Blocks are prepended, so add in reverse to keep them in order
        for (slot, text) in self.texts.into_iter().rev() {
            assert!(
                editor.add_text_block(slot),
                "text slot {} is past the last image (image count {})",
                slot,
                editor.media_count()
            );
            editor.update_text_block(slot, 0, text, Align::Center);
        }
        editor
    }
}

/// Assertion helpers for recorded requests.
pub mod assert {
    use gallery_client::transport::ApiRequest;
    use reqwest::header::AUTHORIZATION;

    /// Assert that a request carried the given bearer token.
    pub fn bearer(request: &ApiRequest, token: &str) {
        let expected = format!("Bearer {token}");
        let actual = request
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        assert_eq!(
            actual,
            Some(expected.as_str()),
            "Expected bearer '{}' on {} {}",
            token,
            request.method,
            request.url
        );
    }

    /// Assert that a request carried no authorization header.
    pub fn no_bearer(request: &ApiRequest) {
        assert!(
            request.headers.get(AUTHORIZATION).is_none(),
            "Expected no Authorization header on {} {}",
            request.method,
            request.url
        );
    }

    /// Assert the method and path of a request.
    pub fn route(request: &ApiRequest, method: &str, path: &str) {
        assert_eq!(
            (request.method.as_str(), request.url.path()),
            (method, path),
            "Unexpected request route"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_is_png() {
        let image = LocalImage::from_bytes("x.png", PNG_BYTES.to_vec()).unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(test_images(3)[2].file_name, "photo-2.png");
    }

    #[test]
    fn test_content_builder() {
        let map = test_content()
            .text(0, "intro")
            .aligned(1, "left", Align::Start)
            .text(1, "centre")
            .build();
        assert_eq!(map.slot(1).len(), 2);
        assert_eq!(map.slot(1)[0].align, Align::Start);
    }

    #[test]
    fn test_editor_builder_keeps_text_order() {
        let editor = test_editor()
            .exhibition()
            .with_title("Coast")
            .with_images(2)
            .with_text(1, "first")
            .with_text(1, "second")
            .build();
        assert_eq!(editor.media_count(), 2);
        let texts: Vec<_> = editor.content().slot(1).iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    #[should_panic(expected = "text slot 3 is past the last image (image count 1)")]
    fn test_editor_builder_rejects_out_of_range_text() {
        let _ = test_editor().with_images(1).with_text(3, "lost").build();
    }

    #[tokio::test]
    async fn scripted_transport_replays_in_order() {
        let transport = ScriptedTransport::new().then_status(204).then_json(200, serde_json::json!([]));
        let url = reqwest::Url::parse("http://api.test/a").unwrap();

        let first = transport.execute(ApiRequest::get(url.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        let second = transport.execute(ApiRequest::get(url.clone())).await.unwrap();
        assert_eq!(second.text(), "[]");
        assert!(transport.execute(ApiRequest::get(url)).await.is_err());
        assert_eq!(transport.sent_paths(), ["/a", "/a", "/a"]);
    }
}
