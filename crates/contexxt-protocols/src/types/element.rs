//! Page element identity and attribute snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a node owned by the host document.
///
/// Holding a `NodeId` never keeps the node alive; the host may detach it at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kinds of media the overlay registry annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Map a tag name to a media kind (`img` or `video`, any case).
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("img") {
            Some(Self::Image)
        } else if tag.eq_ignore_ascii_case("video") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// The subset of computed style the inspector displays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComputedStyle {
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub color: String,
}

/// Point-in-time copy of the element properties Contexxt reads.
///
/// Every field is optional in practice: hosts fill what the element exposes
/// and leave the rest at its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lower-case tag name.
    pub tag_name: String,
    pub src: Option<String>,
    pub current_src: Option<String>,
    pub alt: Option<String>,
    pub natural_width: u32,
    pub natural_height: u32,
    pub video_width: u32,
    pub video_height: u32,
    /// Media duration in seconds, if known.
    pub duration: Option<f64>,
    /// Rendered width/height in CSS pixels.
    pub width: u32,
    pub height: u32,
    pub class_name: Option<String>,
    pub style: ComputedStyle,
}

impl ElementSnapshot {
    pub fn media_kind(&self) -> Option<MediaKind> {
        MediaKind::from_tag(&self.tag_name)
    }

    /// The source the browser actually selected, falling back to the `src` attribute.
    pub fn resolved_source(&self) -> Option<&str> {
        [self.current_src.as_deref(), self.src.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }

    /// Alt text, treating an empty attribute the same as a missing one.
    pub fn alt_text(&self) -> Option<&str> {
        self.alt.as_deref().filter(|a| !a.is_empty())
    }

    /// Intrinsic pixel size: natural size for images, video size for videos.
    pub fn intrinsic_size(&self) -> (u32, u32) {
        match self.media_kind() {
            Some(MediaKind::Video) => (self.video_width, self.video_height),
            _ => (self.natural_width, self.natural_height),
        }
    }
}
