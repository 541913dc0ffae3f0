//! Popover markup.
//!
//! Rendering is a pure function of the descriptor, the settings snapshot and
//! which copy button (if any) is showing its confirmation.

use contexxt_config::PopoverConfig;
use contexxt_protocols::{escape_html, DisplayMode, Settings, VisibilityPolicy};

use crate::descriptor::{Enrichment, SubjectDescriptor};

/// Class of the popover's container.
pub const CONTAINER_CLASS: &str = "contexxt-host";

pub const OPEN_TAB_BUTTON_ID: &str = "btn-open-tab";
pub const DOWNLOAD_BUTTON_ID: &str = "btn-download";

const COPY_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="1em" height="1em" viewBox="0 0 24 24"><g fill="none" stroke="currentColor" stroke-linecap="round" stroke-linejoin="round" stroke-width="2"><rect width="14" height="14" x="8" y="8" rx="2" ry="2"/><path d="M4 16c-1.1 0-2-.9-2-2V4c0-1.1.9-2 2-2h10c1.1 0 2 .9 2 2"/></g></svg>"#;

const CHECK_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="1em" height="1em" viewBox="0 0 24 24"><path fill="none" stroke="currentColor" stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M20 6L9 17l-5-5"/></svg>"#;

const OPEN_TAB_ICON: &str = r#"<svg width="14" height="14" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M18 13v6a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V8a2 2 0 0 1 2-2h6"></path><polyline points="15 3 21 3 21 9"></polyline><line x1="10" y1="14" x2="21" y2="3"></line></svg>"#;

const DOWNLOAD_ICON: &str = r#"<svg width="14" height="14" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M21 15v4a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2v-4"></path><polyline points="7 10 12 15 17 10"></polyline><line x1="12" y1="15" x2="12" y2="3"></line></svg>"#;

/// Styles injected into the popover's isolated scope. The container is the
/// panel itself; `visible` is toggled on it and matched through `:host(...)`.
pub const STYLESHEET: &str = r#"
:host {
  all: initial; position: fixed; z-index: 2147483647; width: 320px;
  --bg-color: rgba(20, 20, 23, 0.95);
  --border-color: rgba(255, 255, 255, 0.1);
  --text-primary: #ededed;
  --text-secondary: #a1a1aa;
  --accent-color: #f5d700;
  --font-family: 'Inter', sans-serif;
  --glass-blur: 24px;
  display: block;
  background: var(--bg-color);
  backdrop-filter: blur(var(--glass-blur));
  border: 1px solid var(--border-color);
  border-radius: 12px;
  box-shadow: 0 16px 40px rgba(0, 0, 0, 0.5);
  font-family: var(--font-family); color: var(--text-primary);
  font-size: 13px; opacity: 0; transform: scale(0.96);
  transition: opacity 0.2s, transform 0.2s;
  overflow: hidden;
}
* { box-sizing: border-box; }
:host(.visible) { opacity: 1; transform: scale(1); }
.header {
  padding: 12px 16px; border-bottom: 1px solid var(--border-color);
  display: flex; justify-content: space-between; align-items: center;
  background: rgba(255, 255, 255, 0.03);
}
.title { font-weight: 600; font-size: 14px; }
.type-badge { font-size: 10px; background: rgba(245, 215, 0, 0.2); color: #f5d700; padding: 2px 6px; border-radius: 4px; text-transform: uppercase; font-weight: 600; }
.content { padding: 16px; }

.preview-wrapper { position: relative; margin-bottom: 16px; border-radius: 6px; overflow: hidden; border: 1px solid var(--border-color); }
.preview-image, .preview-video { width: 100%; height: auto; max-height: 200px; object-fit: contain; background: rgba(0, 0, 0, 0.2); display: block; }
.preview-actions { position: absolute; top: 8px; right: 8px; display: flex; gap: 6px; }
.icon-btn {
  background: rgba(0, 0, 0, 0.6);
  backdrop-filter: blur(4px);
  border: 1px solid rgba(255, 255, 255, 0.2);
  color: white;
  width: 28px; height: 28px;
  border-radius: 6px;
  display: flex; align-items: center; justify-content: center;
  cursor: pointer;
  transition: all 0.2s;
}
.icon-btn:hover { background: rgba(0, 0, 0, 0.8); transform: scale(1.05); border-color: white; }
.icon-btn:active { transform: scale(0.95); }

.row { display: flex; justify-content: space-between; margin-bottom: 8px; align-items: center; min-height: 20px; }
.row:last-child { margin-bottom: 0; }
.label { color: var(--text-secondary); font-size: 12px; flex-shrink: 0; margin-right: 12px; }
.value-cell { display: flex; align-items: center; gap: 6px; justify-content: flex-end; width: 100%; min-width: 0; }
.value { text-align: right; font-family: 'Menlo', monospace; font-size: 11px; word-break: break-all; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; max-width: 180px; }
.link-val { color: inherit; text-decoration: none; border-bottom: 1px dotted #666; }
.dim { opacity: 0.5; }
.tag-badge { background: rgba(255, 255, 255, 0.1); padding: 2px 4px; border-radius: 4px; }
.color-dot { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 6px; border: 1px solid rgba(255, 255, 255, 0.2); vertical-align: middle; }

.copy-btn {
  background: transparent; border: none; cursor: pointer;
  font-size: 0;
  opacity: 0.3; transition: opacity 0.2s;
  padding: 4px; border-radius: 4px; display: flex; align-items: center; justify-content: center;
  width: 20px; height: 20px;
  color: var(--text-secondary);
}
.copy-btn svg { width: 14px; height: 14px; }
.copy-btn:hover { opacity: 1; background: rgba(255, 255, 255, 0.1); color: var(--text-primary); }
.copy-btn.copied { color: var(--accent-color); opacity: 1; }

.show-on-hover { opacity: 0; transition: opacity 0.2s; }
:host(:hover) .show-on-hover { opacity: 1; }
.hide-on-hover { opacity: 1; transition: opacity 0.2s; }
:host(:hover) .hide-on-hover { opacity: 0; }
.hidden-always { display: none !important; }
"#;

/// One label/value line of the details table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    /// Stable identifier, carried by the row's copy button as `data-row`.
    pub key: &'static str,
    pub label: &'static str,
    /// Already-escaped HTML.
    pub value_html: String,
    pub visibility_class: &'static str,
    /// Raw text the copy button puts on the clipboard.
    pub copy: Option<String>,
}

impl DetailRow {
    fn new(key: &'static str, label: &'static str, value_html: String) -> Self {
        Self {
            key,
            label,
            value_html,
            visibility_class: "",
            copy: None,
        }
    }

    fn gated(mut self, mode: DisplayMode) -> Self {
        self.visibility_class = visibility_class(mode);
        self
    }

    fn copying(mut self, value: Option<&str>) -> Self {
        self.copy = value.map(str::to_string);
        self
    }
}

/// Popover class implementing a display mode.
pub fn visibility_class(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::Always => "",
        DisplayMode::HoverReveal => "show-on-hover",
        DisplayMode::HoverHide => "hide-on-hover",
        DisplayMode::Hidden => "hidden-always",
    }
}

/// Detail rows for a descriptor under the given settings.
pub fn detail_rows(
    descriptor: &SubjectDescriptor,
    settings: &Settings,
    config: &PopoverConfig,
) -> Vec<DetailRow> {
    let policy = VisibilityPolicy::from_settings(settings);
    let mut rows = Vec::new();

    match descriptor {
        SubjectDescriptor::Image(d) => {
            let label: String = d.file_name.chars().take(config.source_label_chars).collect();
            let ellipsis = if d.file_name.chars().count() > config.source_label_chars {
                "..."
            } else {
                ""
            };
            rows.push(
                DetailRow::new(
                    "source",
                    "Source",
                    format!(
                        r#"<a href="{}" target="_blank" class="link-val">{}{}</a>"#,
                        escape_html(&d.src),
                        escape_html(&label),
                        ellipsis
                    ),
                )
                .gated(policy.url)
                .copying(Some(d.src.as_str())),
            );
            rows.push(plain_copy("dimensions", "Dimensions", &d.natural_dimensions));
            rows.push(plain_copy("display", "Display", &d.display_dimensions));
            let alt_html = match &d.alt {
                Some(alt) => escape_html(alt),
                None => r#"<em class="dim">None</em>"#.to_string(),
            };
            rows.push(
                DetailRow::new("alt", "Alt Text", alt_html)
                    .gated(policy.alt)
                    .copying(d.alt.as_deref()),
            );
            push_enrichment(&mut rows, &d.enrichment);
        }
        SubjectDescriptor::Video(d) => {
            let tail = tail_chars(&d.src, config.video_source_tail_chars);
            rows.push(
                DetailRow::new("source", "Source", format!("...{}", escape_html(tail)))
                    .gated(policy.url)
                    .copying(Some(d.src.as_str())),
            );
            rows.push(plain_copy("duration", "Duration", &d.duration));
            rows.push(plain_copy("resolution", "Resolution", &d.resolution));
            push_enrichment(&mut rows, &d.enrichment);
        }
        SubjectDescriptor::Element(d) => {
            rows.push(
                DetailRow::new(
                    "tag",
                    "Tag",
                    format!(
                        r#"<code class="tag-badge">&lt;{}&gt;</code>"#,
                        escape_html(&d.tag_name)
                    ),
                )
                .copying(Some(format!("<{}>", d.tag_name).as_str())),
            );
            rows.push(plain_copy("font", "Font", &d.font));
            rows.push(plain_copy("size", "Size", &d.size));
            rows.push(
                DetailRow::new(
                    "color",
                    "Color",
                    format!(
                        r#"<span class="color-dot" style="background:{}"></span>{}"#,
                        escape_html(&d.color),
                        escape_html(&d.hex)
                    ),
                )
                .copying(Some(d.hex.as_str())),
            );
            if let Some(class_name) = &d.class_name {
                let selector: String = class_name
                    .split_whitespace()
                    .map(|c| format!(".{}", c))
                    .collect();
                rows.push(
                    DetailRow::new("class", "Class", escape_html(&selector))
                        .copying(Some(class_name.as_str())),
                );
            }
        }
    }

    rows
}

fn plain_copy(key: &'static str, label: &'static str, value: &str) -> DetailRow {
    DetailRow::new(key, label, escape_html(value)).copying(Some(value))
}

fn push_enrichment(rows: &mut Vec<DetailRow>, enrichment: &Enrichment) {
    if let Some(size) = &enrichment.file_size {
        rows.push(DetailRow::new("file-size", "File Size", escape_html(size)));
    }
    if let Some(mime) = &enrichment.mime_type {
        rows.push(DetailRow::new("type", "Type", escape_html(mime)));
    }
}

fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn preview(descriptor: &SubjectDescriptor) -> String {
    let media = match descriptor {
        SubjectDescriptor::Image(d) => format!(
            r#"<img src="{}" class="preview-image" />"#,
            escape_html(&d.src)
        ),
        SubjectDescriptor::Video(d) => format!(
            r#"<video src="{}" class="preview-video" autoplay muted loop playsinline></video>"#,
            escape_html(&d.src)
        ),
        SubjectDescriptor::Element(_) => return String::new(),
    };
    format!(
        r#"<div class="preview-wrapper">{}<div class="preview-actions"><button class="icon-btn" id="{}" title="Open in New Tab">{}</button><button class="icon-btn" id="{}" title="Download">{}</button></div></div>"#,
        media, OPEN_TAB_BUTTON_ID, OPEN_TAB_ICON, DOWNLOAD_BUTTON_ID, DOWNLOAD_ICON
    )
}

/// Render the full popover content. `copied` names the row whose copy
/// button currently shows its confirmation.
pub fn render(
    descriptor: &SubjectDescriptor,
    settings: &Settings,
    config: &PopoverConfig,
    copied: Option<&str>,
) -> String {
    let mut html = format!(
        r#"<div class="header"><div class="title">Contexxt</div><div class="type-badge">{}</div></div><div class="content">"#,
        descriptor.type_label()
    );
    html.push_str(&preview(descriptor));

    for row in detail_rows(descriptor, settings, config) {
        let copy_button = match &row.copy {
            Some(value) => {
                let is_copied = copied == Some(row.key);
                format!(
                    r#"<button class="copy-btn{}" title="Copy" data-row="{}" data-copy="{}">{}</button>"#,
                    if is_copied { " copied" } else { "" },
                    row.key,
                    escape_html(value),
                    if is_copied { CHECK_ICON } else { COPY_ICON },
                )
            }
            None => String::new(),
        };
        html.push_str(&format!(
            r#"<div class="row {}"><span class="label">{}</span><div class="value-cell"><span class="value">{}</span>{}</div></div>"#,
            row.visibility_class, row.label, row.value_html, copy_button
        ));
    }

    html.push_str("</div>");
    html
}
