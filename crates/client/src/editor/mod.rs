//! Photo and exhibition editor.
//!
//! Holds the media sequence and the content map side by side and keeps them
//! consistent: every media insertion or removal is mirrored into the map via
//! [`ContentMap::reindex`]. In single-photo mode at most one image may be
//! present; exhibition mode is unbounded.

mod media;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::content::{Align, ContentMap, MediaEdit, Template, TextBlock};

pub use media::{
    ALLOWED_IMAGE_TYPES, InMemoryPreviews, LocalImage, MAX_IMAGE_SIZE, MediaItem, PreviewRef,
    PreviewStore,
};

/// Editor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// A single photo.
    #[default]
    Single,
    /// Any number of photos under one exhibition.
    Exhibition,
}

/// A rejected operation, reported to the user rather than raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeAdvisory {
    /// More than one image was offered at once in single-photo mode.
    OneImageAtATime,
    /// Single-photo mode already holds its image.
    SinglePhotoFull,
}

impl fmt::Display for ModeAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModeAdvisory::OneImageAtATime => {
                "Only one photo can be uploaded in single photo mode."
            }
            ModeAdvisory::SinglePhotoFull => {
                "No more photos can be added in single photo mode."
            }
        })
    }
}

/// Result of offering images to the editor.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaInsertion {
    /// `count` images now start at position `at`.
    Inserted { at: usize, count: usize },
    /// Nothing changed.
    Rejected(ModeAdvisory),
}

/// Question put to the user before leaving exhibition mode with several
/// images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationPrompt {
    pub media_count: usize,
}

impl fmt::Display for TruncationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Single photo mode keeps only the first of {} photos. Continue?",
            self.media_count
        )
    }
}

/// Result of a mode change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// Already in the requested mode.
    Unchanged,
    Switched,
    /// Switched to single mode after dropping `removed` images.
    Truncated { removed: usize },
    /// The user declined; still in exhibition mode.
    Declined,
}

/// Missing pieces preventing publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MissingFields {
    pub title: bool,
    pub photo: bool,
}

impl MissingFields {
    pub fn any(&self) -> bool {
        self.title || self.photo
    }
}

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.title {
            parts.push("a title is required to publish");
        }
        if self.photo {
            parts.push("at least one photo is required");
        }
        f.write_str(&parts.join("; "))
    }
}

/// Editor state for one upload.
pub struct Editor {
    mode: EditorMode,
    title: String,
    template: Template,
    media: Vec<MediaItem>,
    content: ContentMap,
    insert_target: Option<usize>,
    previews: Arc<dyn PreviewStore>,
}

impl Editor {
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            mode: EditorMode::Single,
            title: String::new(),
            template: Template::Default,
            media: Vec::new(),
            content: ContentMap::new(),
            insert_target: None,
            previews,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn template(&self) -> Template {
        self.template
    }

    /// Choose the exhibition template. Ignored in single-photo mode, which
    /// always uses the default layout.
    pub fn set_template(&mut self, template: Template) -> bool {
        if self.mode == EditorMode::Single {
            return false;
        }
        self.template = template;
        true
    }

    pub fn media(&self) -> &[MediaItem] {
        &self.media
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    pub fn content(&self) -> &ContentMap {
        &self.content
    }

    /// Remember where the next [`Editor::attach`] inserts.
    pub fn select_insert_point(&mut self, slot: usize) {
        self.insert_target = Some(slot);
    }

    pub fn pending_insert(&self) -> Option<usize> {
        self.insert_target
    }

    /// Insert images at the pending insert point (or append), consuming it.
    pub fn attach(&mut self, images: Vec<LocalImage>) -> MediaInsertion {
        let target = self.insert_target.take();
        self.insert_media(target, images)
    }

    /// Insert images before the item at `at`, or append when `at` is `None`.
    ///
    /// Text slots at or above `at` move up by the number of images inserted.
    pub fn insert_media(&mut self, at: Option<usize>, images: Vec<LocalImage>) -> MediaInsertion {
        if self.mode == EditorMode::Single {
            if images.len() > 1 {
                self.insert_target = None;
                return MediaInsertion::Rejected(ModeAdvisory::OneImageAtATime);
            }
            if !self.media.is_empty() && !images.is_empty() {
                self.insert_target = None;
                return MediaInsertion::Rejected(ModeAdvisory::SinglePhotoFull);
            }
        }

        let count = images.len();
        let position = at.map_or(self.media.len(), |at| at.min(self.media.len()));
        if count == 0 {
            return MediaInsertion::Inserted { at: position, count };
        }

        let items: Vec<MediaItem> = images
            .into_iter()
            .map(|image| {
                let preview = self.previews.create(&image);
                MediaItem { image, preview }
            })
            .collect();
        self.media.splice(position..position, items);

        if at.is_some() {
            self.content.reindex(MediaEdit::Inserted { at: position, count });
        }

        debug!(at = position, count, total = self.media.len(), "media inserted");
        MediaInsertion::Inserted { at: position, count }
    }

    /// Remove the item at `index`, folding its surrounding text together and
    /// releasing its preview.
    pub fn remove_media(&mut self, index: usize) -> Option<LocalImage> {
        if index >= self.media.len() {
            return None;
        }
        let item = self.media.remove(index);
        self.previews.revoke(&item.preview);
        self.content.reindex(MediaEdit::Removed { at: index });
        debug!(index, total = self.media.len(), "media removed");
        Some(item.image)
    }

    /// Prepend an empty block to `slot`. Slots past the last image are
    /// refused.
    pub fn add_text_block(&mut self, slot: usize) -> bool {
        if slot > self.media.len() {
            return false;
        }
        self.content.add_block(slot);
        true
    }

    pub fn update_text_block(
        &mut self,
        slot: usize,
        index: usize,
        text: impl Into<String>,
        align: Align,
    ) -> bool {
        self.content.update_block(slot, index, text, align)
    }

    pub fn remove_text_block(&mut self, slot: usize, index: usize) -> Option<TextBlock> {
        self.content.remove_block(slot, index)
    }

    /// Move between single-photo and exhibition mode.
    ///
    /// Leaving exhibition mode with more than one image asks `confirm`; on
    /// acceptance the images after the first are removed from the last one
    /// down, so their text folds into slot 1 in document order.
    pub fn set_mode<F>(&mut self, mode: EditorMode, confirm: F) -> ModeChange
    where
        F: FnOnce(TruncationPrompt) -> bool,
    {
        if mode == self.mode {
            return ModeChange::Unchanged;
        }

        if mode == EditorMode::Exhibition {
            self.mode = mode;
            return ModeChange::Switched;
        }

        let count = self.media.len();
        let mut change = ModeChange::Switched;
        if count > 1 {
            if !confirm(TruncationPrompt { media_count: count }) {
                return ModeChange::Declined;
            }
            for index in (1..count).rev() {
                self.remove_media(index);
            }
            change = ModeChange::Truncated { removed: count - 1 };
            info!(removed = count - 1, "exhibition truncated to a single photo");
        }

        self.mode = EditorMode::Single;
        self.template = Template::Default;
        change
    }

    /// Report what still blocks publication.
    pub fn missing_fields(&self) -> MissingFields {
        MissingFields {
            title: self.title.trim().is_empty(),
            photo: self.media.is_empty(),
        }
    }

    /// Remove every image, releasing all previews. Text is discarded too.
    pub fn clear_media(&mut self) {
        for item in self.media.drain(..) {
            self.previews.revoke(&item.preview);
        }
        self.content = ContentMap::new();
        self.insert_target = None;
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        for item in &self.media {
            self.previews.revoke(&item.preview);
        }
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("mode", &self.mode)
            .field("title", &self.title)
            .field("template", &self.template)
            .field("media", &self.media.len())
            .field("content", &self.content)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn image(name: &str) -> LocalImage {
        LocalImage {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn editor() -> (Editor, Arc<InMemoryPreviews>) {
        let previews = Arc::new(InMemoryPreviews::new());
        (Editor::new(previews.clone()), previews)
    }

    fn names(editor: &Editor) -> Vec<&str> {
        editor.media().iter().map(|m| m.image.file_name.as_str()).collect()
    }

    fn texts(editor: &Editor, slot: usize) -> Vec<String> {
        editor.content().slot(slot).iter().map(|b| b.text.clone()).collect()
    }

    fn write(editor: &mut Editor, slot: usize, text: &str) {
        assert!(editor.add_text_block(slot));
        assert!(editor.update_text_block(slot, 0, text, Align::Center));
    }

    fn exhibition(names: &[&str]) -> (Editor, Arc<InMemoryPreviews>) {
        let (mut ed, previews) = editor();
        assert_eq!(ed.set_mode(EditorMode::Exhibition, |_| true), ModeChange::Switched);
        let images = names.iter().map(|n| image(n)).collect();
        assert_eq!(
            ed.insert_media(None, images),
            MediaInsertion::Inserted { at: 0, count: names.len() }
        );
        (ed, previews)
    }

    #[test]
    fn starts_in_single_mode() {
        let (ed, _) = editor();
        assert_eq!(ed.mode(), EditorMode::Single);
        assert_eq!(ed.template(), Template::Default);
        assert!(ed.missing_fields().title);
        assert!(ed.missing_fields().photo);
    }

    #[test]
    fn single_mode_rejects_second_photo_and_clears_target() {
        let (mut ed, previews) = editor();
        assert_eq!(
            ed.attach(vec![image("a.jpg")]),
            MediaInsertion::Inserted { at: 0, count: 1 }
        );

        ed.select_insert_point(0);
        assert_eq!(
            ed.attach(vec![image("b.jpg")]),
            MediaInsertion::Rejected(ModeAdvisory::SinglePhotoFull)
        );
        assert_eq!(ed.pending_insert(), None);
        assert_eq!(names(&ed), ["a.jpg"]);
        assert_eq!(previews.live_count(), 1);
    }

    #[test]
    fn single_mode_rejects_batch() {
        let (mut ed, previews) = editor();
        assert_eq!(
            ed.insert_media(None, vec![image("a.jpg"), image("b.jpg")]),
            MediaInsertion::Rejected(ModeAdvisory::OneImageAtATime)
        );
        assert_eq!(ed.media_count(), 0);
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn insertion_at_position_shifts_text() {
        let (mut ed, _) = exhibition(&["a", "b"]);
        write(&mut ed, 0, "intro");
        write(&mut ed, 1, "after a");
        write(&mut ed, 2, "after b");

        ed.select_insert_point(1);
        assert_eq!(
            ed.attach(vec![image("x"), image("y")]),
            MediaInsertion::Inserted { at: 1, count: 2 }
        );

        assert_eq!(names(&ed), ["a", "x", "y", "b"]);
        assert_eq!(texts(&ed, 0), ["intro"]);
        assert_eq!(texts(&ed, 3), ["after a"]);
        assert_eq!(texts(&ed, 4), ["after b"]);
        assert!(ed.content().slot(1).is_empty());
    }

    #[test]
    fn append_leaves_text_in_place() {
        let (mut ed, _) = exhibition(&["a"]);
        write(&mut ed, 1, "after a");
        let _ = ed.insert_media(None, vec![image("b")]);
        assert_eq!(texts(&ed, 1), ["after a"]);
        assert_eq!(ed.content().max_slot(), Some(1));
    }

    #[test]
    fn remove_merges_text_and_revokes_preview() {
        let (mut ed, previews) = exhibition(&["a", "b", "c"]);
        write(&mut ed, 1, "above b");
        write(&mut ed, 2, "below b");
        write(&mut ed, 3, "below c");
        let b_preview = ed.media()[1].preview.clone();

        let removed = ed.remove_media(1).unwrap();
        assert_eq!(removed.file_name, "b");
        assert!(!previews.is_live(&b_preview));
        assert_eq!(previews.live_count(), 2);

        assert_eq!(names(&ed), ["a", "c"]);
        assert_eq!(texts(&ed, 1), ["above b", "below b"]);
        assert_eq!(texts(&ed, 2), ["below c"]);
        assert!(ed.remove_media(9).is_none());
    }

    #[test]
    fn text_blocks_beyond_last_slot_are_refused() {
        let (mut ed, _) = exhibition(&["a"]);
        assert!(ed.add_text_block(1));
        assert!(!ed.add_text_block(2));
    }

    #[test]
    fn newest_block_comes_first_within_slot() {
        let (mut ed, _) = exhibition(&["a"]);
        write(&mut ed, 1, "first");
        write(&mut ed, 1, "second");
        assert_eq!(texts(&ed, 1), ["second", "first"]);

        assert_eq!(ed.remove_text_block(1, 0).unwrap().text, "second");
        assert_eq!(ed.remove_text_block(1, 0).unwrap().text, "first");
        assert!(ed.content().is_empty());
    }

    #[test]
    fn declining_truncation_keeps_exhibition() {
        let (mut ed, _) = exhibition(&["a", "b", "c"]);
        let mut asked = None;
        let change = ed.set_mode(EditorMode::Single, |prompt| {
            asked = Some(prompt.media_count);
            false
        });
        assert_eq!(change, ModeChange::Declined);
        assert_eq!(asked, Some(3));
        assert_eq!(ed.mode(), EditorMode::Exhibition);
        assert_eq!(ed.media_count(), 3);
    }

    #[test]
    fn confirming_truncation_folds_text_into_slot_one() {
        let (mut ed, previews) = exhibition(&["a", "b", "c"]);
        assert!(ed.set_template(Template::Art));
        write(&mut ed, 0, "zero");
        write(&mut ed, 1, "one");
        write(&mut ed, 2, "two");
        write(&mut ed, 3, "three");

        let change = ed.set_mode(EditorMode::Single, |_| true);
        assert_eq!(change, ModeChange::Truncated { removed: 2 });
        assert_eq!(ed.mode(), EditorMode::Single);
        assert_eq!(ed.template(), Template::Default);
        assert_eq!(names(&ed), ["a"]);
        assert_eq!(previews.live_count(), 1);

        assert_eq!(texts(&ed, 0), ["zero"]);
        assert_eq!(texts(&ed, 1), ["one", "two", "three"]);
        assert_eq!(ed.content().slot_indices().collect::<Vec<_>>(), [0, 1]);
    }

    #[test]
    fn single_photo_switch_needs_no_confirmation() {
        let (mut ed, _) = exhibition(&["a"]);
        let change = ed.set_mode(EditorMode::Single, |_| panic!("should not ask"));
        assert_eq!(change, ModeChange::Switched);
        assert_eq!(ed.set_mode(EditorMode::Single, |_| true), ModeChange::Unchanged);
    }

    #[test]
    fn template_ignored_in_single_mode() {
        let (mut ed, _) = editor();
        assert!(!ed.set_template(Template::Grey));
        assert_eq!(ed.template(), Template::Default);
    }

    #[test]
    fn dropping_editor_releases_previews() {
        let (ed, previews) = exhibition(&["a", "b"]);
        assert_eq!(previews.live_count(), 2);
        drop(ed);
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn clear_releases_everything() {
        let (mut ed, previews) = exhibition(&["a", "b"]);
        write(&mut ed, 0, "zero");
        ed.clear_media();
        assert_eq!(previews.live_count(), 0);
        assert_eq!(ed.media_count(), 0);
        assert!(ed.content().is_empty());
    }

    #[test]
    fn slot_keys_stay_within_media_bounds() {
        let (mut ed, _) = exhibition(&["a", "b", "c", "d"]);
        for slot in 0..=4 {
            write(&mut ed, slot, &format!("s{slot}"));
        }
        let ops: &[(bool, usize)] = &[(false, 2), (true, 0), (false, 0), (true, 3), (false, 3), (false, 1)];
        for &(insert, at) in ops {
            if insert {
                let _ = ed.insert_media(Some(at), vec![image("n")]);
            } else {
                ed.remove_media(at);
            }
            let n = ed.media_count();
            assert!(ed.content().slot_indices().all(|k| k <= n));
            assert!(ed.content().iter().all(|(_, blocks)| !blocks.is_empty()));
        }
        // No text is ever lost by media edits
        let total: usize = ed.content().iter().map(|(_, b)| b.len()).sum();
        assert_eq!(total, 5);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert { at: Option<usize>, count: usize },
        Remove(usize),
        Text(usize, String),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (prop::option::of(0usize..16), 1usize..=3).prop_map(|(at, count)| Op::Insert { at, count }),
            (0usize..16).prop_map(Op::Remove),
            (0usize..16, "\\PC{0,12}").prop_map(|(slot, text)| Op::Text(slot, text)),
        ]
    }

    proptest! {
        #[test]
        fn prop_media_edits_keep_text(ops in prop::collection::vec(arb_op(), 1..40)) {
            let (mut ed, _) = exhibition(&["a"]);
            let mut written = 0usize;
            for op in ops {
                let n = ed.media_count();
                match op {
                    Op::Insert { at, count } => {
                        let images = (0..count).map(|i| image(&format!("n{i}"))).collect();
                        let inserted = ed.insert_media(at.map(|k| k % (n + 1)), images);
                        prop_assert!(matches!(inserted, MediaInsertion::Inserted { .. }), "expected MediaInsertion::Inserted");
                        prop_assert_eq!(ed.media_count(), n + count);
                    }
                    Op::Remove(index) => {
                        if n > 0 {
                            prop_assert!(ed.remove_media(index % n).is_some());
                            prop_assert_eq!(ed.media_count(), n - 1);
                        }
                    }
                    Op::Text(slot, text) => {
                        write(&mut ed, slot % (n + 1), &text);
                        written += 1;
                    }
                }

                let n = ed.media_count();
                let total: usize = ed.content().iter().map(|(_, b)| b.len()).sum();
                prop_assert!(ed.content().slot_indices().all(|k| k <= n));
                prop_assert!(ed.content().iter().all(|(_, blocks)| !blocks.is_empty()));
                prop_assert_eq!(total, written);
            }
        }
    }
}
