//! Serializable page description used to build a [`MemoryPage`].

use serde::{Deserialize, Serialize};

use contexxt_protocols::{Document, ElementSnapshot, NodeId, Rect, Viewport};

use crate::memory_page::MemoryPage;

/// A page as JSON: content type, viewport and a tree of elements under `<body>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

fn default_content_type() -> String {
    "text/html".to_string()
}

/// One element with its document-space box and children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSpec {
    #[serde(flatten)]
    pub element: ElementSnapshot,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl MemoryPage {
    /// Build a page from a snapshot. Returns the page and the ids of the
    /// created elements in document order.
    pub fn from_snapshot(snapshot: &PageSnapshot) -> (Self, Vec<NodeId>) {
        let page = MemoryPage::with_content_type(&snapshot.content_type);
        page.set_viewport(snapshot.viewport);
        let mut created = Vec::new();
        let body = page.body();
        for spec in &snapshot.elements {
            insert_spec(&page, body, spec, &mut created);
        }
        (page, created)
    }
}

fn insert_spec(page: &MemoryPage, parent: NodeId, spec: &ElementSpec, created: &mut Vec<NodeId>) {
    let mut element = spec.element.clone();
    element.tag_name = element.tag_name.to_ascii_lowercase();
    let id = page.insert(parent, element, spec.rect);
    created.push(id);
    for child in &spec.children {
        insert_spec(page, id, child, created);
    }
}
