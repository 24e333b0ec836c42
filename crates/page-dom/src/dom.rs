//! Page document
//!
//! Pages are parsed with `scraper` and kept as its `ego_tree` of
//! [`scraper::Node`]s. Content areas are found with [`Selector`]s and the
//! locator edits the same tree in place. A [`NodeId`] stays valid after its
//! node is detached; the node is just unreachable from the root.

use crate::error::DomError;
use ego_tree::NodeRef;
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};

pub use ego_tree::NodeId;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that never contribute rendered text
const HIDDEN_TAGS: &[&str] = &[
    "head", "title", "meta", "link", "script", "style", "noscript", "template",
];

/// Elements rendered on their own line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tbody",
    "thead", "tfoot", "tr", "ul",
];

/// One `property: value` entry of an inline style attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Split an inline style attribute into declarations
pub fn parse_style(style: &str) -> Vec<StyleDeclaration> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let mut value = value.trim();
            let mut important = false;
            let marker_start = value.len().saturating_sub("!important".len());
            if value
                .get(marker_start..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case("!important"))
            {
                value = value[..marker_start].trim_end();
                important = true;
            }
            (!property.is_empty() && !value.is_empty()).then(|| StyleDeclaration {
                property,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

/// Canonical text for a list of declarations
pub fn serialize_style(declarations: &[StyleDeclaration]) -> String {
    declarations
        .iter()
        .map(|d| {
            if d.important {
                format!("{}: {} !important;", d.property, d.value)
            } else {
                format!("{}: {};", d.property, d.value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
    url: String,
    scrolled_to: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document holding only the root node
    pub fn new() -> Self {
        Self {
            html: Html::new_document(),
            url: String::new(),
            scrolled_to: None,
        }
    }

    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            url: String::new(),
            scrolled_to: None,
        }
    }

    pub fn parse_with_url(html: &str, url: &str) -> Self {
        let mut doc = Self::parse(html);
        doc.url = url.to_string();
        doc
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    fn value(&self, id: NodeId) -> Option<&Node> {
        self.node(id).map(|node| node.value())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn root(&self) -> NodeId {
        self.html.tree.root().id()
    }

    /// The `<html>` element, absent only in an empty document
    pub fn root_element(&self) -> Option<ElementRef<'_>> {
        self.html.tree.root().children().find_map(ElementRef::wrap)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.value(id)?.as_element().map(Element::name)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag(id).is_some()
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.value(id)?.as_text().map(|text| &**text)
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), DomError> {
        let value: String = value.into();
        let mut node = self.html.tree.get_mut(id).ok_or(DomError::Detached)?;
        match node.value() {
            Node::Text(text) => {
                text.text = StrTendril::from_slice(&value);
                Ok(())
            }
            _ => Err(DomError::WrongNodeType { expected: "text" }),
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.value(id)?.as_element()?.attr(name)
    }

    /// Apply `edit` to the attribute list of an element. The element is
    /// rebuilt afterwards so its cached id and classes match the new list.
    fn edit_attrs<R>(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut Vec<Attribute>) -> R,
    ) -> Result<R, DomError> {
        let mut node = self.html.tree.get_mut(id).ok_or(DomError::Detached)?;
        let Node::Element(element) = node.value() else {
            return Err(DomError::WrongNodeType { expected: "element" });
        };
        let mut attrs: Vec<Attribute> = element
            .attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        let result = edit(&mut attrs);
        *element = Element::new(element.name.clone(), attrs);
        Ok(result)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.edit_attrs(id, |attrs| {
            let value = StrTendril::from_slice(value);
            match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute {
                    name: attribute_name(name),
                    value,
                }),
            }
        })
    }

    /// Returns whether the attribute was present
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        self.edit_attrs(id, |attrs| {
            let before = attrs.len();
            attrs.retain(|attr| &*attr.name.local != name);
            attrs.len() != before
        })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent().map(|parent| parent.id())
    }

    /// Nearest ancestor that is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| {
            let top = node.ancestors().last().map_or(node.id(), |ancestor| ancestor.id());
            top == self.root()
        })
    }

    /// Every node below `id` in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.descendants().skip(1).map(|d| d.id()).collect())
            .unwrap_or_default()
    }

    /// Attached elements matching `selector`, in document order
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        let Some(root) = self.root_element() else {
            return Vec::new();
        };
        let own = selector.matches(&root).then(|| root.id());
        own.into_iter()
            .chain(root.select(selector).map(|element| element.id()))
            .collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        let root = self.root_element()?;
        if selector.matches(&root) {
            return Some(root.id());
        }
        root.select(selector).next().map(|element| element.id())
    }

    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&id| self.tag(id) == Some(tag))
    }

    pub fn elements_by_tag(&self, scope: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.tag(id).is_some_and(|tag| tags.contains(&tag)))
            .collect()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_element("body")
    }

    /// `<title>` text with whitespace collapsed
    pub fn title(&self) -> String {
        self.find_element("title")
            .map(|id| {
                self.text_content(id)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|d| d.value().as_text())
            .map(|text| &**text)
            .collect()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(tag.to_ascii_lowercase().as_str()),
        );
        self.html
            .tree
            .orphan(Node::Element(Element::new(name, Vec::new())))
            .id()
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        let text: String = text.into();
        self.html
            .tree
            .orphan(Node::Text(Text {
                text: StrTendril::from_slice(&text),
            }))
            .id()
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_node = self.value(parent).ok_or(DomError::Detached)?;
        self.value(child).ok_or(DomError::Detached)?;
        if parent_node.is_text() || parent_node.is_comment() {
            return Err(DomError::HierarchyRequest(
                "character data cannot have children".into(),
            ));
        }
        let mut ancestor = Some(parent);
        while let Some(node) = ancestor {
            if node == child {
                return Err(DomError::HierarchyRequest(
                    "node cannot be inserted into its own subtree".into(),
                ));
            }
            ancestor = self.parent(node);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.html
            .tree
            .get_mut(parent)
            .ok_or(DomError::Detached)?
            .append_id(child);
        Ok(())
    }

    /// Insert `child` right after `reference`, a child of `parent`
    pub fn insert_after(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if child == reference || self.parent(reference) != Some(parent) {
            return Err(DomError::Detached);
        }
        self.remove(child);
        self.html
            .tree
            .get_mut(reference)
            .ok_or(DomError::Detached)?
            .insert_id_after(child);
        Ok(())
    }

    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, new_child)?;
        if new_child == old_child || self.parent(old_child) != Some(parent) {
            return Err(DomError::Detached);
        }
        self.remove(new_child);
        let mut old = self
            .html
            .tree
            .get_mut(old_child)
            .ok_or(DomError::Detached)?;
        old.insert_id_before(new_child);
        old.detach();
        Ok(())
    }

    /// Detach `id` from its parent
    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Merge adjacent text nodes and drop empty ones, recursively
    pub fn normalize(&mut self, id: NodeId) {
        let mut previous_text: Option<NodeId> = None;

        for child in self.children(id) {
            let Some(text) = self.text(child).map(str::to_string) else {
                previous_text = None;
                self.normalize(child);
                continue;
            };

            if text.is_empty() {
                self.remove(child);
                continue;
            }
            match previous_text {
                Some(prev) => {
                    if let Some(mut node) = self.html.tree.get_mut(prev) {
                        if let Node::Text(existing) = node.value() {
                            existing.text.push_slice(&text);
                        }
                    }
                    self.remove(child);
                }
                None => previous_text = Some(child),
            }
        }
    }

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|class| class.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let mut classes: Vec<String> = self.classes(id).into_iter().map(str::to_string).collect();
        classes.push(class.to_string());
        self.set_attr(id, "class", &classes.join(" "))
    }

    /// Remove `class`; an attribute left empty is removed entirely
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if !self.has_class(id, class) {
            return Ok(());
        }
        let remaining: Vec<String> = self
            .classes(id)
            .into_iter()
            .filter(|&c| c != class)
            .map(str::to_string)
            .collect();
        if remaining.is_empty() {
            self.remove_attr(id, "class")?;
            Ok(())
        } else {
            self.set_attr(id, "class", &remaining.join(" "))
        }
    }

    pub fn style(&self, id: NodeId) -> Vec<StyleDeclaration> {
        self.attr(id, "style").map(parse_style).unwrap_or_default()
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        self.style(id)
            .into_iter()
            .find(|d| d.property == property)
            .map(|d| d.value)
    }

    pub fn set_style_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: &str,
        important: bool,
    ) -> Result<(), DomError> {
        let mut declarations = self.style(id);
        let declaration = StyleDeclaration {
            property: property.to_ascii_lowercase(),
            value: value.to_string(),
            important,
        };
        match declarations
            .iter_mut()
            .find(|d| d.property == declaration.property)
        {
            Some(existing) => *existing = declaration,
            None => declarations.push(declaration),
        }
        self.set_attr(id, "style", &serialize_style(&declarations))
    }

    /// Drop one property. The attribute itself is kept, possibly empty.
    pub fn remove_style_property(&mut self, id: NodeId, property: &str) -> Result<(), DomError> {
        if self.attr(id, "style").is_none() {
            return Ok(());
        }
        let declarations: Vec<_> = self
            .style(id)
            .into_iter()
            .filter(|d| d.property != property)
            .collect();
        self.set_attr(id, "style", &serialize_style(&declarations))
    }

    pub fn scroll_into_view(&mut self, id: NodeId) -> Result<(), DomError> {
        if !self.is_attached(id) {
            return Err(DomError::Detached);
        }
        self.scrolled_to = Some(id);
        Ok(())
    }

    /// Node most recently scrolled into view
    pub fn scrolled_to(&self) -> Option<NodeId> {
        self.scrolled_to
    }

    /// Text as a reader sees it: hidden elements skipped, whitespace
    /// collapsed, block elements on their own lines.
    pub fn rendered_text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        if let Some(node) = self.node(id) {
            render_into(node, &mut raw);
        }
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialized markup of `id` and its subtree
    pub fn outer_html(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        match node.value() {
            Node::Document | Node::Fragment => self.inner_html(id),
            Node::Text(text) => escape_text(text),
            Node::Comment(comment) => format!("<!--{}-->", &**comment),
            _ => ElementRef::wrap(node)
                .map(|element| element.html())
                .unwrap_or_default(),
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        match ElementRef::wrap(node) {
            Some(element) => element.inner_html(),
            None => node
                .children()
                .map(|child| self.outer_html(child.id()))
                .collect(),
        }
    }
}

fn render_into(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            for ch in text.chars() {
                if ch.is_whitespace() {
                    if !out.is_empty() && !out.ends_with(' ') && !out.ends_with('\n') {
                        out.push(' ');
                    }
                } else {
                    out.push(ch);
                }
            }
        }
        Node::Element(element) => {
            let tag = element.name();
            if HIDDEN_TAGS.contains(&tag) {
                return;
            }
            if tag == "br" {
                out.push('\n');
                return;
            }
            let block = BLOCK_TAGS.contains(&tag);
            if block {
                line_break(out);
            }
            for child in node.children() {
                render_into(child, out);
            }
            if block {
                line_break(out);
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                render_into(child, out);
            }
        }
        _ => {}
    }
}

fn line_break(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_builds_html_skeleton() {
        let doc = Document::parse("<p>Hello <b>world</b></p>");
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), "<p>Hello <b>world</b></p>");
        assert!(doc.find_element("head").is_some());
    }

    #[test]
    fn test_title_and_url() {
        let doc = Document::parse_with_url(
            "<html><head><title>  Privacy\n  Policy </title></head><body></body></html>",
            "https://example.com/legal",
        );
        assert_eq!(doc.title(), "Privacy Policy");
        assert_eq!(doc.url(), "https://example.com/legal");
    }

    #[test]
    fn test_rendered_text_skips_hidden_and_breaks_blocks() {
        let doc = Document::parse(
            "<body><h1>Policy</h1><script>var x = 1;</script>\
             <p>We   collect\n data.</p><div>Contact <span>us</span></div></body>",
        );
        assert_eq!(
            doc.rendered_text(doc.body().unwrap()),
            "Policy\nWe collect data.\nContact us"
        );
    }

    #[test]
    fn test_select_skips_detached_subtrees() {
        let mut doc = Document::parse(
            r#"<body><nav><p class="content">menu</p></nav><div class="content">main</div></body>"#,
        );
        let content = Selector::parse(".content").unwrap();
        assert_eq!(doc.select(&content).len(), 2);

        let nav = doc.find_element("nav").unwrap();
        doc.remove(nav);

        let found = doc.select(&content);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.text_content(found[0]), "main");
        assert_eq!(doc.select_first(&content), Some(found[0]));
    }

    #[test]
    fn test_normalize_merges_and_drops_empty_text() {
        let mut doc = Document::parse("<body><p>a</p></body>");
        let p = doc.find_element("p").unwrap();
        let b = doc.create_text("b");
        let empty = doc.create_text("");
        let c = doc.create_text("c");
        doc.append_child(p, b).unwrap();
        doc.append_child(p, empty).unwrap();
        doc.append_child(p, c).unwrap();
        assert_eq!(doc.children(p).len(), 4);

        doc.normalize(p);

        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "abc");
    }

    #[test]
    fn test_style_properties_round_trip() {
        let mut doc = Document::parse(r#"<body><p style="color: red">x</p></body>"#);
        let p = doc.find_element("p").unwrap();

        doc.set_style_property(p, "padding", "4px", true).unwrap();
        assert_eq!(doc.attr(p, "style"), Some("color: red; padding: 4px !important;"));

        doc.remove_style_property(p, "padding").unwrap();
        assert_eq!(doc.attr(p, "style"), Some("color: red;"));
        assert_eq!(doc.style_property(p, "color").as_deref(), Some("red"));
    }

    #[test]
    fn test_parse_style_handles_important_and_junk() {
        let decls = parse_style("background-color: #ffeb3b !IMPORTANT; ; bogus; Z-Index:1000");
        assert_eq!(decls.len(), 2);
        assert!(decls[0].important);
        assert_eq!(decls[0].value, "#ffeb3b");
        assert_eq!(decls[1].property, "z-index");
    }

    #[test]
    fn test_class_edits_are_visible_to_selectors() {
        let mut doc = Document::parse(r#"<body><p class="a">x</p></body>"#);
        let p = doc.find_element("p").unwrap();
        let b = Selector::parse("p.b").unwrap();
        assert!(doc.select(&b).is_empty());

        doc.add_class(p, "b").unwrap();
        assert_eq!(doc.attr(p, "class"), Some("a b"));
        assert_eq!(doc.select(&b), vec![p]);

        doc.remove_class(p, "a").unwrap();
        doc.remove_class(p, "b").unwrap();
        assert_eq!(doc.attr(p, "class"), None);
        assert!(doc.select(&b).is_empty());
    }

    #[test]
    fn test_cannot_insert_into_own_subtree() {
        let mut doc = Document::parse("<body><div><p>x</p></div></body>");
        let div = doc.find_element("div").unwrap();
        let p = doc.find_element("p").unwrap();
        assert!(matches!(
            doc.append_child(p, div),
            Err(DomError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_escaping_in_serialization() {
        let doc = Document::parse(r#"<body><p title="a&quot;b">1 &lt; 2 &amp; 3</p></body>"#);
        let p = doc.find_element("p").unwrap();
        assert_eq!(doc.outer_html(p), r#"<p title="a&quot;b">1 &lt; 2 &amp; 3</p>"#);
    }

    #[test]
    fn test_empty_document_has_no_elements() {
        let doc = Document::new();
        assert!(doc.root_element().is_none());
        assert!(doc.body().is_none());
        assert!(doc.select(&Selector::parse("body").unwrap()).is_empty());
        assert_eq!(doc.outer_html(doc.root()), "");
    }
}
