//! Publishing an editor's contents.
//!
//! Exhibitions are created first and the photos uploaded under the new id;
//! a single photo is uploaded on its own. Both requests go through the
//! gateway, so an expired token is refreshed transparently.

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::content::Template;
use crate::editor::{Editor, EditorMode};
use crate::error::{ClientError, ClientResult};
use crate::gateway::Gateway;
use crate::models::{CreatedExhibition, ExhibitionId, PhotoId, UploadedPhoto};
use crate::transport::{ApiRequest, MultipartForm, endpoint};

/// Errors from [`Publisher::publish`].
#[derive(Debug, Error)]
pub enum PublishError {
    /// The editor is not ready to publish.
    #[error("cannot publish: missing {}", missing(*.missing_title, *.missing_photo))]
    Invalid {
        missing_title: bool,
        missing_photo: bool,
    },

    /// The upload succeeded but the server reported no photo.
    #[error("upload returned no photos")]
    EmptyUpload,

    #[error(transparent)]
    Client(#[from] ClientError),
}

fn missing(title: bool, photo: bool) -> &'static str {
    match (title, photo) {
        (true, true) => "title and photo",
        (true, false) => "title",
        _ => "photo",
    }
}

/// Where the published work can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    Exhibition(ExhibitionId),
    Photo(PhotoId),
}

impl Published {
    /// Detail page path of the published work.
    pub fn path(self) -> String {
        match self {
            Published::Exhibition(id) => format!("/exhibition/{id}"),
            Published::Photo(id) => format!("/photo/{id}"),
        }
    }
}

#[derive(Serialize)]
struct NewExhibition<'a> {
    title: &'a str,
    contents: &'a str,
    template: Template,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhotoUpload<'a> {
    exhibition_id: Option<ExhibitionId>,
    title: &'a str,
    description: &'a str,
}

/// Sends editor contents to the API.
#[derive(Clone)]
pub struct Publisher {
    gateway: Gateway,
    base_url: Url,
}

impl Publisher {
    pub fn new(gateway: Gateway, base_url: Url) -> Self {
        Self { gateway, base_url }
    }

    /// Publish the editor's title, content and images.
    pub async fn publish(&self, editor: &Editor) -> Result<Published, PublishError> {
        let missing = editor.missing_fields();
        if missing.any() {
            return Err(PublishError::Invalid {
                missing_title: missing.title,
                missing_photo: missing.photo,
            });
        }

        let title = editor.title().trim();
        let contents = editor.content().serialize();

        let exhibition_id = match editor.mode() {
            EditorMode::Exhibition => Some(
                self.create_exhibition(title, &contents, editor.template())
                    .await?,
            ),
            EditorMode::Single => None,
        };

        let mut form = MultipartForm::new()
            .json_part(
                "dto",
                &PhotoUpload {
                    exhibition_id,
                    title,
                    description: &contents,
                },
            )
            .map_err(PublishError::Client)?;
        for item in editor.media() {
            form = form.file_part(
                "image",
                item.image.file_name.clone(),
                item.image.content_type.clone(),
                item.image.bytes.clone(),
            );
        }

        let request = ApiRequest::post(endpoint(&self.base_url, "/photo/upload")?).multipart(form);
        let uploaded: Vec<UploadedPhoto> = self
            .gateway
            .send(request)
            .await?
            .error_for_status()?
            .json()?;
        info!(count = uploaded.len(), ?exhibition_id, "photos uploaded");

        match exhibition_id {
            Some(id) => Ok(Published::Exhibition(id)),
            None => uploaded
                .first()
                .map(|photo| Published::Photo(photo.photo_id))
                .ok_or(PublishError::EmptyUpload),
        }
    }

    async fn create_exhibition(
        &self,
        title: &str,
        contents: &str,
        template: Template,
    ) -> ClientResult<ExhibitionId> {
        let request = ApiRequest::post(endpoint(&self.base_url, "/exhibition/create")?).json(
            &NewExhibition {
                title,
                contents,
                template,
            },
        )?;
        let created: CreatedExhibition = self
            .gateway
            .send(request)
            .await?
            .error_for_status()?
            .json()?;
        info!(exhibition_id = created.exhibition_id, template = %template, "exhibition created");
        Ok(created.exhibition_id)
    }
}
