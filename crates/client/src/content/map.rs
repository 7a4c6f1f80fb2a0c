//! Content position map.
//!
//! Text blocks are keyed by slot: slot 0 sits before the first media item,
//! slot `k` after the k-th. Keys always stay within `0..=media_count` and no
//! slot holds an empty sequence. Every media insertion or removal goes
//! through [`ContentMap::reindex`], the only place slots are renumbered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::block::{Align, TextBlock};

/// A change to the media sequence the map must follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEdit {
    /// `count` items were inserted before the item previously at `at`.
    Inserted { at: usize, count: usize },
    /// The item at `at` was removed.
    Removed { at: usize },
}

/// One entry of the interleaved document produced by [`ContentMap::layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutItem<'a> {
    Text { slot: usize, block: &'a TextBlock },
    Media(usize),
}

/// Mapping from slot index to the ordered text blocks in that slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentMap {
    slots: BTreeMap<usize, Vec<TextBlock>>,
}

impl ContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no slot holds any text.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of non-empty slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Blocks in `slot`, empty if the slot has none.
    pub fn slot(&self, slot: usize) -> &[TextBlock] {
        self.slots.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occupied slot indices in ascending order.
    pub fn slot_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.keys().copied()
    }

    /// Occupied slots and their blocks in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[TextBlock])> {
        self.slots.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Highest occupied slot.
    pub fn max_slot(&self) -> Option<usize> {
        self.slots.keys().next_back().copied()
    }

    /// Prepend an empty centered block to `slot`.
    pub fn add_block(&mut self, slot: usize) {
        self.slots.entry(slot).or_default().insert(0, TextBlock::empty());
    }

    /// Append `block` to `slot`.
    pub fn push_block(&mut self, slot: usize, block: TextBlock) {
        self.slots.entry(slot).or_default().push(block);
    }

    /// Replace the block at `slot`/`index`. Returns false if out of range.
    pub fn update_block(&mut self, slot: usize, index: usize, text: impl Into<String>, align: Align) -> bool {
        match self.slots.get_mut(&slot).and_then(|blocks| blocks.get_mut(index)) {
            Some(block) => {
                *block = TextBlock::new(text, align);
                true
            }
            None => false,
        }
    }

    /// Remove the block at `slot`/`index`, dropping the slot once empty.
    pub fn remove_block(&mut self, slot: usize, index: usize) -> Option<TextBlock> {
        let blocks = self.slots.get_mut(&slot)?;
        if index >= blocks.len() {
            return None;
        }
        let removed = blocks.remove(index);
        if blocks.is_empty() {
            self.slots.remove(&slot);
        }
        Some(removed)
    }

    /// Renumber slots after a change to the media sequence.
    ///
    /// Insertion shifts every slot `>= at` up by `count`. Removal of item
    /// `at` concatenates slot `at` then slot `at + 1` into slot `at` and
    /// shifts the slots above down by one.
    pub fn reindex(&mut self, edit: MediaEdit) {
        let old = std::mem::take(&mut self.slots);
        self.slots = match edit {
            MediaEdit::Inserted { at, count } => old
                .into_iter()
                .map(|(k, v)| if k >= at { (k + count, v) } else { (k, v) })
                .collect(),
            MediaEdit::Removed { at } => {
                let mut merged = Vec::new();
                let mut next = BTreeMap::new();
                for (k, v) in old {
                    if k < at {
                        next.insert(k, v);
                    } else if k == at || k == at + 1 {
                        // BTreeMap iteration yields `at` before `at + 1`
                        merged.extend(v);
                    } else {
                        next.insert(k - 1, v);
                    }
                }
                if !merged.is_empty() {
                    next.insert(at, merged);
                }
                next
            }
        };
        debug!(?edit, slots = self.slots.len(), "content slots reindexed");
    }

    /// Encode the whole map, slots in ascending order.
    pub fn serialize(&self) -> String {
        // Integer keys and string fields only; encoding cannot fail.
        serde_json::to_string(&self.slots).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decode stored content, wrapping unstructured text into slot 0.
    pub fn deserialize(input: &str) -> Self {
        Self::deserialize_with_legacy_slot(input, 0)
    }

    /// Decode stored content, wrapping unstructured text into `legacy_slot`
    /// as a single centered block.
    ///
    /// Single-photo descriptions predating the structured format render
    /// below the photo, so callers pass slot 1 for them.
    pub fn deserialize_with_legacy_slot(input: &str, legacy_slot: usize) -> Self {
        if input.trim().is_empty() {
            return Self::new();
        }

        match serde_json::from_str::<BTreeMap<usize, Vec<TextBlock>>>(input) {
            Ok(mut slots) => {
                slots.retain(|_, blocks| !blocks.is_empty());
                Self { slots }
            }
            Err(e) => {
                debug!(error = %e, "content is not structured; using legacy text");
                let mut map = Self::new();
                map.push_block(legacy_slot, TextBlock::centered(input));
                map
            }
        }
    }

    /// Interleave text and media the way detail pages and the editor preview
    /// render them. Slots beyond `media_count` are not shown.
    pub fn layout(&self, media_count: usize) -> Vec<LayoutItem<'_>> {
        let mut items = Vec::new();
        for slot in 0..=media_count {
            if slot > 0 {
                items.push(LayoutItem::Media(slot - 1));
            }
            items.extend(self.slot(slot).iter().map(|block| LayoutItem::Text { slot, block }));
        }
        items
    }
}

impl FromIterator<(usize, Vec<TextBlock>)> for ContentMap {
    fn from_iter<I: IntoIterator<Item = (usize, Vec<TextBlock>)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().filter(|(_, v)| !v.is_empty()).collect(),
        }
    }
}
