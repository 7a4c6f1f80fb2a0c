//! Text blocks placed between media items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Horizontal alignment of a text block.
///
/// Serialized with the tokens stored by earlier clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Align {
    #[serde(rename = "text-left", alias = "start")]
    Start,
    #[default]
    #[serde(rename = "text-center", alias = "center")]
    Center,
    #[serde(rename = "text-right", alias = "end")]
    End,
}

impl Align {
    /// Wire token for this alignment.
    pub fn token(self) -> &'static str {
        match self {
            Align::Start => "text-left",
            Align::Center => "text-center",
            Align::End => "text-right",
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Align::Start => "start",
            Align::Center => "center",
            Align::End => "end",
        })
    }
}

impl FromStr for Align {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "left" | "text-left" | "l" => Ok(Align::Start),
            "center" | "centre" | "text-center" | "c" => Ok(Align::Center),
            "end" | "right" | "text-right" | "r" => Ok(Align::End),
            other => Err(format!("unknown alignment '{other}' (expected start, center or end)")),
        }
    }
}

/// An aligned run of text. Identified only by its position within a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default)]
    pub align: Align,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, align: Align) -> Self {
        Self {
            text: text.into(),
            align,
        }
    }

    pub fn centered(text: impl Into<String>) -> Self {
        Self::new(text, Align::Center)
    }

    /// An empty, centered block as created by the editor.
    pub fn empty() -> Self {
        Self::centered("")
    }

    /// Whether the block has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
