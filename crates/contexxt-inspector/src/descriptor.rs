//! What the popover shows: metadata extracted from the inspected element.

use serde::Serialize;

use contexxt_protocols::{AssetMetadata, ElementSnapshot, MediaKind};

use crate::format::{format_bytes, format_duration, rgb_to_hex};

/// Network metadata attached after the HEAD probe resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Enrichment {
    pub fn from_metadata(metadata: &AssetMetadata) -> Self {
        Self {
            file_size: metadata.content_length.map(format_bytes),
            mime_type: metadata.content_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetails {
    pub src: String,
    pub file_name: String,
    pub natural_dimensions: String,
    pub display_dimensions: String,
    pub alt: Option<String>,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub src: String,
    pub duration: String,
    pub resolution: String,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDetails {
    pub tag_name: String,
    pub font: String,
    pub size: String,
    pub color: String,
    pub hex: String,
    pub class_name: Option<String>,
}

/// The subject of one inspection session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SubjectDescriptor {
    Image(ImageDetails),
    Video(VideoDetails),
    Element(ElementDetails),
}

impl SubjectDescriptor {
    /// Extract a descriptor from an element snapshot. Missing values become
    /// placeholders, never errors.
    pub fn from_snapshot(element: &ElementSnapshot) -> Self {
        match element.media_kind() {
            Some(MediaKind::Image) => Self::Image(image_details(element)),
            Some(MediaKind::Video) => Self::Video(VideoDetails {
                src: element.resolved_source().unwrap_or_default().to_string(),
                duration: format_duration(element.duration.unwrap_or(f64::NAN)),
                resolution: format!("{} x {}", element.video_width, element.video_height),
                enrichment: Enrichment::default(),
            }),
            None => Self::Element(element_details(element)),
        }
    }

    /// Label shown in the popover header.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Image(_) => "Image",
            Self::Video(_) => "Video",
            Self::Element(_) => "HTML Element",
        }
    }

    /// URL the open/download actions and the metadata probe act on.
    pub fn asset_url(&self) -> Option<&str> {
        let url = match self {
            Self::Image(d) => d.src.as_str(),
            Self::Video(d) => d.src.as_str(),
            Self::Element(_) => return None,
        };
        Some(url).filter(|url| !url.is_empty())
    }

    /// A copy carrying the probe result, or `None` when there is nothing to add.
    pub fn enriched(&self, metadata: &AssetMetadata) -> Option<Self> {
        if metadata.is_empty() {
            return None;
        }
        let enrichment = Enrichment::from_metadata(metadata);
        match self {
            Self::Image(d) => Some(Self::Image(ImageDetails {
                enrichment,
                ..d.clone()
            })),
            Self::Video(d) => Some(Self::Video(VideoDetails {
                enrichment,
                ..d.clone()
            })),
            Self::Element(_) => None,
        }
    }
}

fn image_details(element: &ElementSnapshot) -> ImageDetails {
    let src = element.resolved_source().unwrap_or_default();
    let file_name = src
        .rsplit('/')
        .next()
        .and_then(|last| last.split('?').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("unknown");

    let natural_dimensions = if element.natural_width == 0 && element.natural_height == 0 {
        "Unknown".to_string()
    } else {
        format!("{} x {}", element.natural_width, element.natural_height)
    };

    ImageDetails {
        src: src.to_string(),
        file_name: file_name.to_string(),
        natural_dimensions,
        display_dimensions: format!("{} x {}", element.width, element.height),
        alt: element.alt_text().map(str::to_string),
        enrichment: Enrichment::default(),
    }
}

fn element_details(element: &ElementSnapshot) -> ElementDetails {
    let style = &element.style;
    let family = style
        .font_family
        .split(',')
        .next()
        .unwrap_or_default()
        .replace(['"', '\''], "");

    ElementDetails {
        tag_name: element.tag_name.to_ascii_lowercase(),
        font: format!("{} ({})", family.trim(), style.font_weight),
        size: style.font_size.clone(),
        color: style.color.clone(),
        hex: rgb_to_hex(&style.color),
        class_name: element
            .class_name
            .clone()
            .filter(|class_name| !class_name.trim().is_empty()),
    }
}
