//! Photo gallery client library.
//!
//! Talks to the gallery REST API through an authenticated gateway that
//! refreshes expired session tokens, and models the photo/exhibition editor
//! whose text is interleaved with media by slot. The `gallery` binary is a
//! thin front-end over this crate.

pub mod api;
pub mod config;
pub mod content;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod models;
pub mod publish;
pub mod session;
pub mod transport;

pub use api::{GalleryClient, JoinProblem, JoinRequest};
pub use config::GalleryConfig;
pub use content::{Align, ContentMap, LayoutItem, MediaEdit, Template, TextBlock};
pub use editor::{Editor, EditorMode, LocalImage, MediaInsertion, ModeAdvisory, ModeChange};
pub use error::{ClientError, ClientResult};
pub use gateway::{Gateway, LogRedirect, LoginRedirect};
pub use publish::{PublishError, Published, Publisher};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, SessionToken};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
