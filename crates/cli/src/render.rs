//! Plain-text rendering of gallery records.

use std::fmt::Write;

use gallery_client::models::{
    Comment, ExhibitionDetail, ExhibitionPhoto, Feed, PhotoDetail, UserArchive,
};
use gallery_client::{Align, ContentMap, LayoutItem};

const WIDTH: usize = 72;

fn aligned(out: &mut String, text: &str, align: Align) {
    for line in text.lines() {
        let len = line.chars().count();
        let pad = match align {
            Align::Start => 0,
            Align::Center => WIDTH.saturating_sub(len) / 2,
            Align::End => WIDTH.saturating_sub(len),
        };
        let _ = writeln!(out, "{:pad$}{line}", "");
    }
}

/// Render content interleaved with images. `image` formats the i-th image.
fn document(out: &mut String, content: &ContentMap, media_count: usize, image: impl Fn(usize) -> String) {
    for item in content.layout(media_count) {
        match item {
            LayoutItem::Text { block, .. } => aligned(out, &block.text, block.align),
            LayoutItem::Media(i) => {
                let _ = writeln!(out, "  [{}]", image(i));
            }
        }
    }
}

fn photo_ref(photos: &[ExhibitionPhoto], i: usize) -> String {
    photos
        .get(i)
        .map(|p| format!("photo {} {}", p.photo_id, p.image_url))
        .unwrap_or_else(|| "missing image".to_string())
}

pub fn feed(feed: &Feed) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "EXHIBITIONS ({})", feed.exhibitions.len());
    for ex in &feed.exhibitions {
        let cover = ex.cover().map(|p| p.image_url.as_str()).unwrap_or("-");
        let _ = writeln!(out, "  #{:<6} {}  ({cover})", ex.exhibition_id, ex.title);
    }
    let _ = writeln!(out, "PHOTOS ({})", feed.photos.len());
    for photo in &feed.photos {
        let by = photo.nickname.as_deref().unwrap_or("unknown");
        let _ = writeln!(
            out,
            "  #{:<6} {}  by {by}, {} likes",
            photo.photo_id, photo.title, photo.like_count
        );
    }
    out
}

pub fn exhibition(detail: &ExhibitionDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", detail.title);
    let _ = writeln!(
        out,
        "template: {}  views: {}  photos: {}",
        detail.template,
        detail.exhibition_view_count,
        detail.photos.len()
    );
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
    document(&mut out, &detail.content(), detail.photos.len(), |i| {
        photo_ref(&detail.photos, i)
    });
    out
}

pub fn photo(detail: &PhotoDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", detail.title);
    if let Some(nickname) = &detail.nickname {
        let _ = writeln!(out, "by {nickname}");
    }
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
    document(&mut out, &detail.content(), 1, |_| detail.image_url.clone());
    out
}

pub fn comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return "no comments\n".to_string();
    }
    let mut out = String::new();
    for c in comments {
        let mine = if c.mine { " (you)" } else { "" };
        let _ = writeln!(out, "#{} {}{mine} {}: {}", c.id, c.created_at, c.nickname, c.content);
    }
    out
}

pub fn archive(archive: &UserArchive) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (@{})  {} photos",
        archive.nickname, archive.username, archive.photo_count
    );
    for ex in archive.exhibitions() {
        let _ = writeln!(out, "  exhibition #{} {}", ex.exhibition_id, ex.title);
    }
    for photo in archive.standalone_photos() {
        let _ = writeln!(out, "  photo #{} {}", photo.photo_id, photo.title);
    }
    out
}
