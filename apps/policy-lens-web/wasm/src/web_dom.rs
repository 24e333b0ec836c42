//! [`DomTree`] over the live page
//!
//! The locator counts offsets in `char`s; DOM ranges count UTF-16 code
//! units. The conversion happens here and nowhere else.

use page_dom::tree::{DomTree, MarkerSpec, StyleRule};
use page_dom::DomError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlElement, Node, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition,
};

pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Adapter over the window's document
    pub fn current() -> Result<Self, DomError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| DomError::Platform("no document".into()))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn platform(err: JsValue) -> DomError {
    DomError::Platform(
        err.as_string()
            .unwrap_or_else(|| format!("{:?}", err)),
    )
}

fn as_element(node: &Node) -> Result<&Element, DomError> {
    node.dyn_ref::<Element>()
        .ok_or(DomError::WrongNodeType { expected: "element" })
}

fn as_html_element(node: &Node) -> Result<&HtmlElement, DomError> {
    node.dyn_ref::<HtmlElement>()
        .ok_or(DomError::WrongNodeType { expected: "element" })
}

/// UTF-16 length of the first `chars` characters of `text`
pub fn utf16_offset(text: &str, chars: usize) -> u32 {
    text.chars().take(chars).map(char::len_utf16).sum::<usize>() as u32
}

fn priority(rule: &StyleRule) -> &'static str {
    if rule.important {
        "important"
    } else {
        ""
    }
}

impl DomTree for WebDom {
    type Node = Node;

    fn body(&self) -> Option<Node> {
        self.document.body().map(Node::from)
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn parent_element(&self, node: &Node) -> Option<Node> {
        node.parent_element().map(Node::from)
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>()
            .map(|element| element.tag_name().to_ascii_lowercase())
    }

    fn attribute(&self, element: &Node, name: &str) -> Option<String> {
        element
            .dyn_ref::<Element>()
            .and_then(|element| element.get_attribute(name))
    }

    fn text(&self, node: &Node) -> Option<String> {
        if node.node_type() == Node::TEXT_NODE {
            Some(node.node_value().unwrap_or_default())
        } else {
            None
        }
    }

    fn elements_with_class(&self, class: &str) -> Vec<Node> {
        // snapshot: the live collection shrinks as markers are removed
        let collection = self.document.get_elements_by_class_name(class);
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .map(Node::from)
            .collect()
    }

    fn wrap_text(
        &mut self,
        text_node: &Node,
        start: usize,
        len: usize,
        marker: &MarkerSpec,
    ) -> Result<Node, DomError> {
        let text = self
            .text(text_node)
            .ok_or(DomError::WrongNodeType { expected: "text" })?;
        let char_len = text.chars().count();
        if start + len > char_len {
            return Err(DomError::RangeOutOfBounds {
                start,
                end: start + len,
                len: char_len,
            });
        }
        if !text_node.is_connected() {
            return Err(DomError::Detached);
        }

        let range = self.document.create_range().map_err(platform)?;
        range
            .set_start(text_node, utf16_offset(&text, start))
            .map_err(platform)?;
        range
            .set_end(text_node, utf16_offset(&text, start + len))
            .map_err(platform)?;

        let wrapper = self.document.create_element(marker.tag).map_err(platform)?;
        wrapper.set_class_name(marker.class);
        if let Some(html) = wrapper.dyn_ref::<HtmlElement>() {
            let style = html.style();
            for rule in marker.style {
                style
                    .set_property_with_priority(rule.property, rule.value, priority(rule))
                    .map_err(platform)?;
            }
        }

        // the wrapper is only inserted when surrounding succeeds
        range.surround_contents(&wrapper).map_err(platform)?;
        Ok(wrapper.into())
    }

    fn unwrap_marker(&mut self, marker: &Node) -> Result<(), DomError> {
        let parent = marker.parent_node().ok_or(DomError::Detached)?;
        let text = self
            .document
            .create_text_node(&marker.text_content().unwrap_or_default());
        parent.replace_child(&text, marker).map_err(platform)?;
        parent.normalize();
        Ok(())
    }

    fn set_style(&mut self, element: &Node, rule: &StyleRule) -> Result<(), DomError> {
        as_html_element(element)?
            .style()
            .set_property_with_priority(rule.property, rule.value, priority(rule))
            .map_err(platform)
    }

    fn remove_style(&mut self, element: &Node, property: &str) -> Result<(), DomError> {
        as_html_element(element)?
            .style()
            .remove_property(property)
            .map(|_| ())
            .map_err(platform)
    }

    fn add_class(&mut self, element: &Node, class: &str) -> Result<(), DomError> {
        as_element(element)?
            .class_list()
            .add_1(class)
            .map_err(platform)
    }

    fn remove_class(&mut self, element: &Node, class: &str) -> Result<(), DomError> {
        let element = as_element(element)?;
        element.class_list().remove_1(class).map_err(platform)?;
        if element.class_name().trim().is_empty() {
            element.remove_attribute("class").map_err(platform)?;
        }
        Ok(())
    }

    fn remove_attribute(&mut self, element: &Node, name: &str) -> Result<(), DomError> {
        as_element(element)?
            .remove_attribute(name)
            .map_err(platform)
    }

    fn scroll_into_view(&mut self, node: &Node) -> Result<(), DomError> {
        let element = match node.dyn_ref::<Element>() {
            Some(element) => element.clone(),
            None => node.parent_element().ok_or(DomError::Detached)?,
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        element.scroll_into_view_with_scroll_into_view_options(&options);
        Ok(())
    }
}
