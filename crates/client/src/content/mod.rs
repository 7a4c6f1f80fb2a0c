//! Content model shared by the editor and the detail renderers.
//!
//! Provides:
//! - `TextBlock` / `Align`: aligned text runs
//! - `ContentMap`: slot-keyed text blocks interleaved with media
//! - `Template`: exhibition layout keys

mod block;
mod map;
mod template;

pub use block::{Align, TextBlock};
pub use map::{ContentMap, LayoutItem, MediaEdit};
pub use template::Template;
