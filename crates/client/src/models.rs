//! Records exchanged with the gallery API.
//!
//! Payloads are camelCase JSON. Fields the server does not always send are
//! defaulted so that partially populated records still decode.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::content::{ContentMap, Template};
use crate::error::ClientResult;
use crate::transport::ApiResponse;

pub type PhotoId = i64;
pub type ExhibitionId = i64;
pub type UserId = i64;
pub type CommentId = i64;

/// Decode a response body that may wrap its record in `{ "data": ... }`.
pub fn decode_enveloped<T: DeserializeOwned>(response: &ApiResponse) -> ClientResult<T> {
    let mut value: serde_json::Value = response.json()?;
    if let Some(inner) = value.get_mut("data").filter(|v| !v.is_null()) {
        value = inner.take();
    }
    Ok(serde_json::from_value(value)?)
}

/// Photo as listed in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSummary {
    pub photo_id: PhotoId,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub like_count: u64,
}

/// Image reference inside an exhibition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionPhoto {
    pub photo_id: PhotoId,
    #[serde(default)]
    pub image_url: String,
}

/// Exhibition as listed in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionSummary {
    pub exhibition_id: ExhibitionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub photos: Vec<ExhibitionPhoto>,
}

impl ExhibitionSummary {
    /// Cover image, the exhibition's first photo.
    pub fn cover(&self) -> Option<&ExhibitionPhoto> {
        self.photos.first()
    }
}

/// Both halves of the home feed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feed {
    pub exhibitions: Vec<ExhibitionSummary>,
    pub photos: Vec<PhotoSummary>,
}

/// Single photo page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDetail {
    pub photo_id: PhotoId,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl PhotoDetail {
    /// Structured description. Plain-text descriptions render below the
    /// photo.
    pub fn content(&self) -> ContentMap {
        ContentMap::deserialize_with_legacy_slot(&self.description, 1)
    }
}

/// Exhibition page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionDetail {
    pub exhibition_id: ExhibitionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub contents: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub exhibition_view_count: u64,
    #[serde(default)]
    pub template: Template,
    #[serde(default)]
    pub photos: Vec<ExhibitionPhoto>,
}

impl ExhibitionDetail {
    pub fn content(&self) -> ContentMap {
        ContentMap::deserialize(&self.contents)
    }
}

/// A comment on a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub nickname: String,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    /// Written by the current user.
    #[serde(default)]
    pub mine: bool,
}

/// Like state of a photo or exhibition for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
    #[serde(default)]
    pub like_count: u64,
}

/// Something that can be liked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Photo(PhotoId),
    Exhibition(ExhibitionId),
}

impl LikeTarget {
    /// Path of the like resource, e.g. `/photo/3/like`.
    pub fn like_path(self) -> String {
        match self {
            LikeTarget::Photo(id) => format!("/photo/{id}/like"),
            LikeTarget::Exhibition(id) => format!("/exhibition/{id}/like"),
        }
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub nickname: String,
}

/// Exhibition reference attached to an archived photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionRef {
    pub exhibition_id: ExhibitionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedPhoto {
    pub photo_id: PhotoId,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub exhibition: Option<ExhibitionRef>,
}

/// A user's public archive page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserArchive {
    pub user_id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub photo_count: u64,
    #[serde(default)]
    pub photos: Vec<ArchivedPhoto>,
}

impl UserArchive {
    /// Distinct exhibitions the archived photos belong to, in first-seen
    /// order.
    pub fn exhibitions(&self) -> Vec<&ExhibitionRef> {
        let mut seen: Vec<&ExhibitionRef> = Vec::new();
        for exhibition in self.photos.iter().filter_map(|p| p.exhibition.as_ref()) {
            if !seen.iter().any(|e| e.exhibition_id == exhibition.exhibition_id) {
                seen.push(exhibition);
            }
        }
        seen
    }

    /// Photos uploaded outside any exhibition.
    pub fn standalone_photos(&self) -> impl Iterator<Item = &ArchivedPhoto> {
        self.photos.iter().filter(|p| p.exhibition.is_none())
    }
}

/// Author shown alongside detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: UserId,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
}

/// Response of `POST /exhibition/create`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedExhibition {
    pub exhibition_id: ExhibitionId,
}

/// One entry of the `POST /photo/upload` response.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadedPhoto {
    pub photo_id: PhotoId,
}
