#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Publish flow tests.
//!
//! Run against a scripted transport so the exact request sequence, bodies
//! and multipart parts can be inspected.

use std::sync::Arc;

use gallery_client::session::{MemorySessionStore, SessionStore};
use gallery_client::transport::RequestBody;
use gallery_client::{ContentMap, GalleryClient, PublishError, Published, Template};
use gallery_test_utils::{RecordingRedirect, ScriptedTransport, assert, test_editor};
use serde_json::{Value, json};
use url::Url;

fn client(transport: Arc<ScriptedTransport>) -> (GalleryClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_token("t1"));
    let client = GalleryClient::new(
        Url::parse("http://api.test").unwrap(),
        "/login",
        transport,
        store.clone(),
        Arc::new(RecordingRedirect::new()),
    )
    .unwrap();
    (client, store)
}

fn dto(body: &RequestBody) -> Value {
    let RequestBody::Multipart(form) = body else {
        panic!("expected multipart body");
    };
    let part = form.parts().iter().find(|p| p.name == "dto").unwrap();
    assert_eq!(part.content_type.as_deref(), Some("application/json"));
    serde_json::from_slice(&part.bytes).unwrap()
}

#[tokio::test]
async fn test_single_photo_upload() {
    let transport = ScriptedTransport::new()
        .then_json(200, json!([{"photoId": 41}]))
        .into_arc();
    let (client, _) = client(transport.clone());
    let editor = test_editor()
        .with_title("Gull")
        .with_images(1)
        .with_text(1, "at the pier")
        .build();

    let published = client.publisher().publish(&editor).await.unwrap();
    assert_eq!(published, Published::Photo(41));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert::route(&sent[0], "POST", "/photo/upload");
    assert::bearer(&sent[0], "t1");

    let dto = dto(&sent[0].body);
    assert_eq!(dto["exhibitionId"], Value::Null);
    assert_eq!(dto["title"], "Gull");
    let content = ContentMap::deserialize(dto["description"].as_str().unwrap());
    assert_eq!(content.slot(1)[0].text, "at the pier");
}

#[tokio::test]
async fn test_exhibition_created_before_upload() {
    let transport = ScriptedTransport::new()
        .then_json(200, json!({"exhibitionId": 9}))
        .then_json(200, json!([{"photoId": 1}, {"photoId": 2}, {"photoId": 3}]))
        .into_arc();
    let (client, _) = client(transport.clone());
    let mut editor = test_editor()
        .exhibition()
        .with_title("Harbour")
        .with_images(3)
        .with_text(0, "intro")
        .build();
    assert!(editor.set_template(Template::Classic));

    let published = client.publisher().publish(&editor).await.unwrap();
    assert_eq!(published, Published::Exhibition(9));
    assert_eq!(transport.sent_paths(), ["/exhibition/create", "/photo/upload"]);

    let sent = transport.sent();
    let RequestBody::Json(create) = &sent[0].body else {
        panic!("expected json body");
    };
    assert_eq!(create["template"], "classic");
    assert_eq!(create["title"], "Harbour");
    assert_eq!(
        ContentMap::deserialize(create["contents"].as_str().unwrap()),
        *editor.content()
    );

    assert_eq!(dto(&sent[1].body)["exhibitionId"], 9);
    let RequestBody::Multipart(form) = &sent[1].body else {
        panic!("expected multipart body");
    };
    let images: Vec<_> = form
        .parts()
        .iter()
        .filter(|p| p.name == "image")
        .map(|p| p.file_name.clone().unwrap())
        .collect();
    assert_eq!(images, ["photo-0.png", "photo-1.png", "photo-2.png"]);
}

#[tokio::test]
async fn test_upload_retried_after_refresh() {
    let transport = ScriptedTransport::new()
        .then_status(401)
        .then_json(200, json!({"accessToken": "t2"}))
        .then_json(200, json!([{"photoId": 5}]))
        .into_arc();
    let (client, store) = client(transport.clone());
    let editor = test_editor().with_title("Gull").with_images(1).build();

    let published = client.publisher().publish(&editor).await.unwrap();
    assert_eq!(published, Published::Photo(5));
    assert_eq!(store.get().unwrap().unwrap().as_str(), "t2");

    let sent = transport.sent();
    assert_eq!(
        transport.sent_paths(),
        ["/photo/upload", "/jwt/refresh", "/photo/upload"]
    );
    assert::no_bearer(&sent[1]);
    assert::bearer(&sent[2], "t2");
    assert_eq!(dto(&sent[0].body), dto(&sent[2].body));
}

#[tokio::test]
async fn test_failed_exhibition_creation_skips_upload() {
    let transport = ScriptedTransport::new().then_status(500).into_arc();
    let (client, _) = client(transport.clone());
    let editor = test_editor()
        .exhibition()
        .with_title("Harbour")
        .with_images(2)
        .build();

    let err = client.publisher().publish(&editor).await.unwrap_err();
    assert!(matches!(err, PublishError::Client(_)));
    assert_eq!(transport.sent_paths(), ["/exhibition/create"]);
}

#[tokio::test]
async fn test_missing_photo_blocks_publish() {
    let transport = ScriptedTransport::new().into_arc();
    let (client, _) = client(transport.clone());
    let editor = test_editor().with_title("Nothing").build();

    let err = client.publisher().publish(&editor).await.unwrap_err();
    assert!(matches!(
        err,
        PublishError::Invalid {
            missing_title: false,
            missing_photo: true
        }
    ));
    assert!(transport.sent().is_empty());
}
