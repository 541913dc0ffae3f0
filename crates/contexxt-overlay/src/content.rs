//! Overlay markup and stylesheet.

use contexxt_protocols::{
    escape_html, DisplayMode, ElementSnapshot, MediaKind, NodeId, Settings, VisibilityPolicy,
};

use crate::error::OverlayError;

/// Class carried by every overlay container appended to the body.
pub const CONTAINER_CLASS: &str = "contexxt-global-overlay";

const EXTERNAL_LINK_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="1em" height="1em" viewBox="0 0 24 24"><path fill="none" stroke="currentColor" stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M15 3h6v6m-11 5L21 3m-3 10v6a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V8a2 2 0 0 1 2-2h6"/></svg>"#;

/// Styles injected into each overlay's isolated scope. The container itself
/// is the styling root: `active` and `video-mode` are toggled on it and
/// matched through `:host(...)`.
pub const STYLESHEET: &str = r#"
:host { pointer-events: none; position: absolute; z-index: 2147483646; }
* { box-sizing: border-box; }

.icon-btn {
    position: absolute; top: 8px; right: 8px;
    pointer-events: auto;
    background: rgba(0, 0, 0, 0.6);
    backdrop-filter: blur(4px);
    border: 1px solid rgba(255, 255, 255, 0.2);
    color: white;
    width: 24px; height: 24px;
    border-radius: 6px;
    display: flex; align-items: center; justify-content: center;
    cursor: pointer; opacity: 0; transition: opacity 0.2s, transform 0.1s;
}
.icon-btn:hover { background: rgba(0, 0, 0, 0.8); transform: scale(1.1); }
:host(.active) .icon-btn { opacity: 1; }
.icon-btn svg { width: 14px; height: 14px; }

.bottom-bar {
    position: absolute; bottom: 0; left: 0; width: 100%;
    background: rgba(0, 0, 0, 0.75);
    backdrop-filter: blur(8px);
    padding: 6px 10px;
    display: flex; justify-content: space-between; align-items: center;
    color: white; font-family: 'Inter', sans-serif; font-size: 11px;
    transition: opacity 0.2s;
}
.url { overflow: hidden; text-overflow: ellipsis; white-space: nowrap; max-width: 70%; opacity: 0.9; }
.dims { opacity: 0.6; font-family: 'Menlo', monospace; font-size: 10px; }

.alt-badge {
    position: absolute; top: 8px; left: 8px;
    background: rgba(245, 215, 0, 0.9);
    color: black;
    padding: 4px 8px;
    border-radius: 4px;
    font-family: 'Inter', sans-serif; font-size: 10px; font-weight: 600;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.3);
    max-width: 80%; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;
    transition: opacity 0.2s;
}
.alt-badge.missing { background: rgba(255, 50, 50, 0.8); }

.visible { opacity: 1; }
.hidden { display: none; }
.show-on-hover { opacity: 0; transition: opacity 0.2s; }
:host(.active) .show-on-hover { opacity: 1; }
.hide-on-hover { opacity: 1; transition: opacity 0.2s; }
:host(.active) .hide-on-hover { opacity: 0; }

:host(.video-mode) .bottom-bar { bottom: auto; top: 0; }
:host(.video-mode) .icon-btn { top: 33px; }
"#;

/// Rendered content of one overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayContent {
    pub markup: String,
    /// Videos put the info bar on top and the action button below it.
    pub video_mode: bool,
}

/// CSS class implementing a display mode.
pub fn visibility_class(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::Always => "visible",
        DisplayMode::HoverReveal => "show-on-hover",
        DisplayMode::HoverHide => "hide-on-hover",
        DisplayMode::Hidden => "hidden",
    }
}

/// Last path segment of `src` without its query string, or `Asset`.
pub fn file_name(src: &str) -> &str {
    let last = src.rsplit('/').next().unwrap_or_default();
    match last.split('?').next() {
        Some(name) if !name.is_empty() => name,
        _ => "Asset",
    }
}

/// Build the overlay content for a media element under the given settings.
///
/// Missing attributes render as empty values rather than failing; only a
/// non-media element is rejected.
pub fn render(
    id: NodeId,
    element: &ElementSnapshot,
    settings: &Settings,
) -> Result<OverlayContent, OverlayError> {
    let kind = element.media_kind().ok_or_else(|| OverlayError::NotMedia {
        id,
        tag: element.tag_name.clone(),
    })?;
    let policy = VisibilityPolicy::from_settings(settings);

    let src = element.resolved_source().unwrap_or_default();
    let (width, height) = element.intrinsic_size();

    let mut markup = String::new();

    // The open-in-tab button is governed by the URL setting.
    if !policy.url.is_hidden() {
        markup.push_str(r#"<button class="icon-btn" title="Open in New Tab">"#);
        markup.push_str(EXTERNAL_LINK_ICON);
        markup.push_str("</button>");
    }

    markup.push_str(&format!(
        r#"<div class="bottom-bar {}"><span class="url" title="{}">{}</span><span class="dims">{}x{}</span></div>"#,
        visibility_class(policy.url),
        escape_html(src),
        escape_html(file_name(src)),
        width,
        height,
    ));

    if kind == MediaKind::Image {
        let (text, missing) = match element.alt_text() {
            Some(alt) => (format!("ALT: {}", alt), ""),
            None => ("NO ALT".to_string(), " missing"),
        };
        markup.push_str(&format!(
            r#"<div class="alt-badge {}{}">{}</div>"#,
            visibility_class(policy.alt),
            missing,
            escape_html(&text),
        ));
    }

    Ok(OverlayContent {
        markup,
        video_mode: kind == MediaKind::Video,
    })
}
