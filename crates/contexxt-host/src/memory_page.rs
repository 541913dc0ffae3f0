//! In-memory document implementing every page-facing host capability.
//!
//! Nodes keep their document-space box; client rects are derived from the
//! current scroll offsets. Detached subtrees stay addressable so removal
//! handling can still walk them, the same way a browser keeps a removed
//! node alive while script holds a reference.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use contexxt_protocols::{
    Document, ElementSnapshot, MutationRecord, NodeId, ObservationFeeds, Placement, Rect,
    RenderScope, ResizeEntry, Size, Viewport,
};

/// Size reported for a container until the test or host sets one.
pub const DEFAULT_CONTAINER_SIZE: Size = Size {
    width: 320.0,
    height: 240.0,
};

#[derive(Debug, Clone)]
struct ContainerState {
    class_name: String,
    stylesheet: String,
    markup: String,
    classes: BTreeSet<String>,
    placement: Option<Placement>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Element(ElementSnapshot),
    Container(ContainerState),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    /// Document-space border box.
    rect: Rect,
}

#[derive(Debug)]
struct PageTree {
    next_id: u64,
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
    body: NodeId,
    content_type: String,
    viewport: Viewport,
    mutation_root: Option<NodeId>,
    pending_mutations: Vec<MutationRecord>,
    resize_targets: BTreeSet<NodeId>,
    pending_resizes: Vec<ResizeEntry>,
    viewport_listening: bool,
    pointer_down_listeners: usize,
}

impl PageTree {
    fn new(content_type: &str) -> Self {
        let root = NodeId(1);
        let body = NodeId(2);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeData {
                parent: None,
                children: vec![body],
                kind: NodeKind::Root,
                rect: Rect::default(),
            },
        );
        nodes.insert(
            body,
            NodeData {
                parent: Some(root),
                children: Vec::new(),
                kind: NodeKind::Element(ElementSnapshot {
                    tag_name: "body".to_string(),
                    ..Default::default()
                }),
                rect: Rect::default(),
            },
        );
        Self {
            next_id: 3,
            nodes,
            root,
            body,
            content_type: content_type.to_string(),
            viewport: Viewport::default(),
            mutation_root: None,
            pending_mutations: Vec::new(),
            resize_targets: BTreeSet::new(),
            pending_resizes: Vec::new(),
            viewport_listening: false,
            pointer_down_listeners: 0,
        }
    }

    fn alloc(&mut self, kind: NodeKind, rect: Rect) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            NodeData {
                parent: None,
                children: Vec::new(),
                kind,
                rect,
            },
        );
        id
    }

    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(parent) = current {
            out.push(parent);
            current = self.nodes.get(&parent).and_then(|n| n.parent);
        }
        out
    }

    fn is_connected(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).last() == Some(&self.root)
    }

    fn is_observed(&self, id: NodeId) -> bool {
        match self.mutation_root {
            Some(root) => {
                self.is_connected(id) && (id == root || self.ancestors(id).contains(&root))
            }
            None => false,
        }
    }

    fn descendants_inclusive(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn is_media(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(&id).map(|n| &n.kind),
            Some(NodeKind::Element(el)) if el.media_kind().is_some()
        )
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if self.is_observed(parent) {
            self.pending_mutations.push(MutationRecord {
                added: vec![child],
                removed: Vec::new(),
            });
        }
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
            return;
        };
        let observed = self.is_observed(parent);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
        if observed {
            self.pending_mutations.push(MutationRecord {
                added: Vec::new(),
                removed: vec![id],
            });
        }
    }

    fn container_mut(&mut self, id: NodeId) -> Option<&mut ContainerState> {
        match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::Container(state)) => Some(state),
            _ => None,
        }
    }

    fn container(&self, id: NodeId) -> Option<&ContainerState> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Container(state)) => Some(state),
            _ => None,
        }
    }
}

/// An in-memory page.
pub struct MemoryPage {
    tree: RwLock<PageTree>,
}

impl MemoryPage {
    /// An empty HTML page.
    pub fn new() -> Self {
        Self::with_content_type("text/html")
    }

    pub fn with_content_type(content_type: &str) -> Self {
        Self {
            tree: RwLock::new(PageTree::new(content_type)),
        }
    }

    /// Create a detached element.
    pub fn create_element(&self, element: ElementSnapshot, rect: Rect) -> NodeId {
        self.tree.write().alloc(NodeKind::Element(element), rect)
    }

    /// Append `child` under `parent`, moving it if it is already in the tree.
    pub fn append(&self, parent: NodeId, child: NodeId) {
        self.tree.write().append(parent, child);
    }

    /// Create an element and append it under `parent`.
    pub fn insert(&self, parent: NodeId, element: ElementSnapshot, rect: Rect) -> NodeId {
        let mut tree = self.tree.write();
        let id = tree.alloc(NodeKind::Element(element), rect);
        tree.append(parent, id);
        id
    }

    /// Convenience: append an `<img>` to the body.
    pub fn insert_image(&self, src: &str, alt: Option<&str>, rect: Rect) -> NodeId {
        let body = self.tree.read().body;
        self.insert(
            body,
            ElementSnapshot {
                tag_name: "img".to_string(),
                src: Some(src.to_string()),
                current_src: Some(src.to_string()),
                alt: alt.map(str::to_string),
                natural_width: rect.width as u32,
                natural_height: rect.height as u32,
                width: rect.width as u32,
                height: rect.height as u32,
                ..Default::default()
            },
            rect,
        )
    }

    /// Convenience: append a `<video>` to the body.
    pub fn insert_video(&self, src: &str, rect: Rect) -> NodeId {
        let body = self.tree.read().body;
        self.insert(
            body,
            ElementSnapshot {
                tag_name: "video".to_string(),
                src: Some(src.to_string()),
                current_src: Some(src.to_string()),
                video_width: rect.width as u32,
                video_height: rect.height as u32,
                width: rect.width as u32,
                height: rect.height as u32,
                ..Default::default()
            },
            rect,
        )
    }

    /// Detach a node (and its subtree) from its parent.
    pub fn remove(&self, id: NodeId) {
        self.tree.write().detach(id);
    }

    /// Move a node's document-space box. Emits a resize entry when the size
    /// changes and the node is observed.
    pub fn set_rect(&self, id: NodeId, rect: Rect) {
        let mut guard = self.tree.write();
        let tree = &mut *guard;
        let Some(node) = tree.nodes.get_mut(&id) else {
            return;
        };
        let resized = node.rect.size() != rect.size();
        node.rect = rect;
        if resized && tree.resize_targets.contains(&id) {
            tree.pending_resizes.push(ResizeEntry {
                target: id,
                rect: rect.translate(-tree.viewport.scroll_x, -tree.viewport.scroll_y),
            });
        }
    }

    pub fn update_element(&self, id: NodeId, f: impl FnOnce(&mut ElementSnapshot)) {
        let mut tree = self.tree.write();
        if let Some(NodeKind::Element(el)) = tree.nodes.get_mut(&id).map(|n| &mut n.kind) {
            f(el);
        }
    }

    pub fn scroll_to(&self, x: f64, y: f64) {
        let mut tree = self.tree.write();
        tree.viewport.scroll_x = x;
        tree.viewport.scroll_y = y;
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.tree.write().viewport = viewport;
    }

    /// Drain pending mutation records.
    pub fn take_mutations(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.tree.write().pending_mutations)
    }

    /// Drain pending resize entries.
    pub fn take_resizes(&self) -> Vec<ResizeEntry> {
        std::mem::take(&mut self.tree.write().pending_resizes)
    }

    /// Containers currently attached to the document.
    pub fn attached_containers(&self) -> Vec<NodeId> {
        let tree = self.tree.read();
        let mut ids: Vec<NodeId> = tree
            .nodes
            .iter()
            .filter(|(id, node)| {
                matches!(node.kind, NodeKind::Container(_)) && tree.is_connected(**id)
            })
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn container_markup(&self, id: NodeId) -> Option<String> {
        self.tree.read().container(id).map(|c| c.markup.clone())
    }

    pub fn container_placement(&self, id: NodeId) -> Option<Placement> {
        self.tree.read().container(id).and_then(|c| c.placement)
    }

    pub fn container_has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.tree
            .read()
            .container(id)
            .map(|c| c.classes.contains(class_name))
            .unwrap_or(false)
    }

    pub fn container_class_name(&self, id: NodeId) -> Option<String> {
        self.tree.read().container(id).map(|c| c.class_name.clone())
    }

    pub fn container_stylesheet(&self, id: NodeId) -> Option<String> {
        self.tree.read().container(id).map(|c| c.stylesheet.clone())
    }

    /// Elements with a live resize subscription.
    pub fn resize_targets(&self) -> Vec<NodeId> {
        self.tree.read().resize_targets.iter().copied().collect()
    }

    pub fn is_observing_mutations(&self) -> bool {
        self.tree.read().mutation_root.is_some()
    }

    pub fn is_listening_viewport(&self) -> bool {
        self.tree.read().viewport_listening
    }

    pub fn pointer_down_listeners(&self) -> usize {
        self.tree.read().pointer_down_listeners
    }
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryPage {
    fn content_type(&self) -> String {
        self.tree.read().content_type.clone()
    }

    fn body(&self) -> NodeId {
        self.tree.read().body
    }

    fn query_media(&self) -> Vec<NodeId> {
        let tree = self.tree.read();
        tree.descendants_inclusive(tree.root)
            .into_iter()
            .filter(|id| tree.is_media(*id))
            .collect()
    }

    fn query_media_in(&self, root: NodeId) -> Vec<NodeId> {
        let tree = self.tree.read();
        tree.descendants_inclusive(root)
            .into_iter()
            .filter(|id| tree.is_media(*id))
            .collect()
    }

    fn element(&self, id: NodeId) -> Option<ElementSnapshot> {
        match self.tree.read().nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el.clone()),
            Some(NodeKind::Container(_)) => Some(ElementSnapshot {
                tag_name: "div".to_string(),
                ..Default::default()
            }),
            _ => None,
        }
    }

    fn bounding_client_rect(&self, id: NodeId) -> Rect {
        let tree = self.tree.read();
        if !tree.is_connected(id) {
            return Rect::default();
        }
        let rect = match tree.nodes.get(&id) {
            Some(node) => match &node.kind {
                NodeKind::Container(state) => match state.placement {
                    Some(p) => Rect::new(p.left, p.top, node.rect.width, node.rect.height),
                    None => node.rect,
                },
                _ => node.rect,
            },
            None => return Rect::default(),
        };
        rect.translate(-tree.viewport.scroll_x, -tree.viewport.scroll_y)
    }

    fn viewport(&self) -> Viewport {
        self.tree.read().viewport
    }

    fn is_connected(&self, id: NodeId) -> bool {
        self.tree.read().is_connected(id)
    }

    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.read().ancestors(id)
    }
}

impl RenderScope for MemoryPage {
    fn create_container(&self, class_name: &str, stylesheet: &str) -> NodeId {
        let state = ContainerState {
            class_name: class_name.to_string(),
            stylesheet: stylesheet.to_string(),
            markup: String::new(),
            classes: BTreeSet::new(),
            placement: None,
        };
        let rect = Rect::new(
            0.0,
            0.0,
            DEFAULT_CONTAINER_SIZE.width,
            DEFAULT_CONTAINER_SIZE.height,
        );
        self.tree.write().alloc(NodeKind::Container(state), rect)
    }

    fn attach_container(&self, container: NodeId) {
        let mut tree = self.tree.write();
        let body = tree.body;
        if tree.container(container).is_some() {
            tree.append(body, container);
        }
    }

    fn detach_container(&self, container: NodeId) {
        self.tree.write().detach(container);
    }

    fn is_container_attached(&self, container: NodeId) -> bool {
        let tree = self.tree.read();
        tree.container(container).is_some() && tree.is_connected(container)
    }

    fn set_markup(&self, container: NodeId, markup: &str) {
        if let Some(state) = self.tree.write().container_mut(container) {
            state.markup = markup.to_string();
        }
    }

    fn place(&self, container: NodeId, placement: Placement) {
        if let Some(state) = self.tree.write().container_mut(container) {
            state.placement = Some(placement);
        }
    }

    fn set_class(&self, container: NodeId, class_name: &str, on: bool) {
        if let Some(state) = self.tree.write().container_mut(container) {
            if on {
                state.classes.insert(class_name.to_string());
            } else {
                state.classes.remove(class_name);
            }
        }
    }
}

impl ObservationFeeds for MemoryPage {
    fn observe_mutations(&self, root: NodeId) {
        self.tree.write().mutation_root = Some(root);
    }

    fn disconnect_mutations(&self) {
        let mut tree = self.tree.write();
        tree.mutation_root = None;
        tree.pending_mutations.clear();
    }

    fn observe_resize(&self, target: NodeId) {
        self.tree.write().resize_targets.insert(target);
    }

    fn unobserve_resize(&self, target: NodeId) {
        let mut tree = self.tree.write();
        tree.resize_targets.remove(&target);
        tree.pending_resizes.retain(|e| e.target != target);
    }

    fn disconnect_resize(&self) {
        let mut tree = self.tree.write();
        tree.resize_targets.clear();
        tree.pending_resizes.clear();
    }

    fn listen_viewport(&self) {
        self.tree.write().viewport_listening = true;
    }

    fn unlisten_viewport(&self) {
        self.tree.write().viewport_listening = false;
    }

    fn listen_pointer_down(&self) {
        self.tree.write().pointer_down_listeners += 1;
    }

    fn unlisten_pointer_down(&self) {
        let mut tree = self.tree.write();
        tree.pointer_down_listeners = tree.pointer_down_listeners.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "memory_page_tests.rs"]
mod tests;
