//! The DOM seam used by the locator
//!
//! The locator only needs a handful of operations from a document. They are
//! expressed here so the same matching and marking code runs against the
//! arena [`Document`] in tests and against the live page in the browser.
//! Text offsets and lengths are counted in `char`s.

use crate::dom::{Document, NodeId};
use crate::error::DomError;

/// One inline style property set by a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRule {
    pub property: &'static str,
    pub value: &'static str,
    pub important: bool,
}

/// Element used to wrap a located range
#[derive(Debug, Clone, Copy)]
pub struct MarkerSpec {
    pub tag: &'static str,
    pub class: &'static str,
    pub style: &'static [StyleRule],
}

pub trait DomTree {
    type Node: Clone + PartialEq + std::fmt::Debug;

    fn body(&self) -> Option<Self::Node>;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;
    /// Lowercase tag name, `None` for anything but elements
    fn tag_name(&self, node: &Self::Node) -> Option<String>;
    fn attribute(&self, element: &Self::Node, name: &str) -> Option<String>;
    /// Data of a text node, `None` for other nodes
    fn text(&self, node: &Self::Node) -> Option<String>;
    /// Attached elements carrying `class`, in document order
    fn elements_with_class(&self, class: &str) -> Vec<Self::Node>;

    /// Surround `len` characters of `text_node` starting at `start` with a new
    /// marker element. Either the whole wrap happens or nothing changes.
    fn wrap_text(
        &mut self,
        text_node: &Self::Node,
        start: usize,
        len: usize,
        marker: &MarkerSpec,
    ) -> Result<Self::Node, DomError>;

    /// Replace `marker` with a text node holding its text, then normalize
    /// the former parent.
    fn unwrap_marker(&mut self, marker: &Self::Node) -> Result<(), DomError>;

    fn set_style(&mut self, element: &Self::Node, rule: &StyleRule) -> Result<(), DomError>;
    fn remove_style(&mut self, element: &Self::Node, property: &str) -> Result<(), DomError>;
    fn add_class(&mut self, element: &Self::Node, class: &str) -> Result<(), DomError>;
    fn remove_class(&mut self, element: &Self::Node, class: &str) -> Result<(), DomError>;
    fn remove_attribute(&mut self, element: &Self::Node, name: &str) -> Result<(), DomError>;
    fn scroll_into_view(&mut self, node: &Self::Node) -> Result<(), DomError>;
}

/// Parents whose content model only admits text
const TEXT_ONLY_PARENTS: &[&str] = &["textarea", "title", "option", "script", "style"];

impl DomTree for Document {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Document::body(self)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        Document::children(self, *node)
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        Document::parent_element(self, *node)
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.tag(*node).map(str::to_string)
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.attr(*element, name).map(str::to_string)
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        Document::text(self, *node).map(str::to_string)
    }

    fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    fn wrap_text(
        &mut self,
        text_node: &NodeId,
        start: usize,
        len: usize,
        marker: &MarkerSpec,
    ) -> Result<NodeId, DomError> {
        let node = *text_node;
        let text = Document::text(self, node)
            .ok_or(DomError::WrongNodeType { expected: "text" })?
            .to_string();
        if !self.is_attached(node) {
            return Err(DomError::Detached);
        }
        let parent = Document::parent_element(self, node).ok_or_else(|| {
            DomError::HierarchyRequest("text node has no parent element".into())
        })?;
        if let Some(tag) = self.tag(parent).filter(|tag| TEXT_ONLY_PARENTS.contains(tag)) {
            return Err(DomError::HierarchyRequest(format!(
                "<{}> cannot contain elements",
                tag
            )));
        }

        let chars: Vec<char> = text.chars().collect();
        let end = start + len;
        if end > chars.len() {
            return Err(DomError::RangeOutOfBounds {
                start,
                end,
                len: chars.len(),
            });
        }

        let before: String = chars[..start].iter().collect();
        let middle: String = chars[start..end].iter().collect();
        let after: String = chars[end..].iter().collect();

        let wrapper = self.create_element(marker.tag);
        self.set_attr(wrapper, "class", marker.class)?;
        for rule in marker.style {
            self.set_style_property(wrapper, rule.property, rule.value, rule.important)?;
        }
        let inner = self.create_text(middle);
        self.append_child(wrapper, inner)?;

        self.set_text(node, before)?;
        self.insert_after(parent, wrapper, node)?;
        if !after.is_empty() {
            let tail = self.create_text(after);
            self.insert_after(parent, tail, wrapper)?;
        }
        Ok(wrapper)
    }

    fn unwrap_marker(&mut self, marker: &NodeId) -> Result<(), DomError> {
        let parent = self.parent(*marker).ok_or(DomError::Detached)?;
        let replacement = self.create_text(self.text_content(*marker));
        self.replace_child(parent, replacement, *marker)?;
        self.normalize(parent);
        Ok(())
    }

    fn set_style(&mut self, element: &NodeId, rule: &StyleRule) -> Result<(), DomError> {
        self.set_style_property(*element, rule.property, rule.value, rule.important)
    }

    fn remove_style(&mut self, element: &NodeId, property: &str) -> Result<(), DomError> {
        self.remove_style_property(*element, property)
    }

    fn add_class(&mut self, element: &NodeId, class: &str) -> Result<(), DomError> {
        Document::add_class(self, *element, class)
    }

    fn remove_class(&mut self, element: &NodeId, class: &str) -> Result<(), DomError> {
        Document::remove_class(self, *element, class)
    }

    fn remove_attribute(&mut self, element: &NodeId, name: &str) -> Result<(), DomError> {
        self.remove_attr(*element, name).map(|_| ())
    }

    fn scroll_into_view(&mut self, node: &NodeId) -> Result<(), DomError> {
        Document::scroll_into_view(self, *node)
    }
}
