//! An in-memory [`RenderTarget`], for tests and string rendering.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Every write that would change a browser DOM
//! is counted, so callers can assert that a reconciliation did no work at all.
//! Creating detached nodes, tagging links and requesting focus aren't counted.

use crate::target::{is_svg_tag, svg_defaults, RenderTarget};
use core::fmt::Write as _;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{trace, warn};

/// Handle to a node in a [`MemoryTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
struct MemoryNode {
	kind: Kind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	link: Option<u64>,
}

#[derive(Debug)]
enum Kind {
	Element {
		tag: String,
		svg: bool,
		attributes: BTreeMap<String, String>,
		style: BTreeMap<String, String>,
		value: Option<String>,
		listeners: BTreeSet<String>,
	},
	Text(String),
}

const VOID_ELEMENTS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

#[derive(Debug, Default)]
pub struct MemoryTarget {
	nodes: Vec<MemoryNode>,
	mutations: usize,
	pending_focus: Option<NodeId>,
	focused: Option<NodeId>,
}

impl MemoryTarget {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of nodes ever created.
	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Number of counted writes so far.
	#[must_use]
	pub fn mutations(&self) -> usize {
		self.mutations
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		match &self.node(node).kind {
			Kind::Element { tag, .. } => Some(tag),
			Kind::Text(_) => None,
		}
	}

	/// The payload of a text node.
	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.node(node).kind {
			Kind::Text(text) => Some(text),
			Kind::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		match &self.node(node).kind {
			Kind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
			Kind::Text(_) => None,
		}
	}

	/// All attribute names of an element, sorted. Style and value live elsewhere.
	#[must_use]
	pub fn attribute_names(&self, node: NodeId) -> Vec<&str> {
		match &self.node(node).kind {
			Kind::Element { attributes, .. } => attributes.keys().map(String::as_str).collect(),
			Kind::Text(_) => Vec::new(),
		}
	}

	#[must_use]
	pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
		match &self.node(node).kind {
			Kind::Element { style, .. } => style.get(property).map(String::as_str),
			Kind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.node(node).children
	}

	#[must_use]
	pub fn is_listening(&self, node: NodeId, event_type: &str) -> bool {
		match &self.node(node).kind {
			Kind::Element { listeners, .. } => listeners.contains(event_type),
			Kind::Text(_) => false,
		}
	}

	/// Changes a form control's live value like typing would, without counting a write.
	pub fn set_value_as_user(&mut self, node: NodeId, value: &str) {
		if let Kind::Element { value: current, .. } = &mut self.node_mut(node).kind {
			*current = Some(value.to_owned());
		}
	}

	/// Runs the deferred focus request, if any, like the next tick would.
	pub fn flush_focus(&mut self) -> Option<NodeId> {
		if let Some(node) = self.pending_focus.take() {
			self.focused = Some(node);
		}
		self.focused
	}

	#[must_use]
	pub fn focused(&self) -> Option<NodeId> {
		self.focused
	}

	/// Serialises `node` and its subtree as HTML. Attributes are sorted by name.
	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		for &child in &self.node(node).children {
			self.write_html(child, &mut html);
		}
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		let node = self.node(node);
		match &node.kind {
			Kind::Text(text) => escape(text, false, html),
			Kind::Element {
				tag,
				attributes,
				style,
				value,
				..
			} => {
				let mut attributes = attributes.clone();
				if !style.is_empty() {
					let mut declarations = String::new();
					for (property, value) in style {
						let _ = write!(declarations, "{}: {};", property, value);
					}
					attributes.insert("style".to_owned(), declarations);
				}
				if let Some(value) = value {
					attributes.insert("value".to_owned(), value.clone());
				}

				html.push('<');
				html.push_str(tag);
				for (name, value) in &attributes {
					html.push(' ');
					html.push_str(name);
					if !value.is_empty() {
						html.push_str("=\"");
						escape(value, true, html);
						html.push('"');
					}
				}
				html.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) && node.children.is_empty() {
					return;
				}
				for &child in &node.children {
					self.write_html(child, html);
				}
				html.push_str("</");
				html.push_str(tag);
				html.push('>');
			}
		}
	}

	fn node(&self, node: NodeId) -> &MemoryNode {
		&self.nodes[node.0]
	}

	fn node_mut(&mut self, node: NodeId) -> &mut MemoryNode {
		&mut self.nodes[node.0]
	}

	fn create(&mut self, kind: Kind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(MemoryNode {
			kind,
			parent: None,
			children: Vec::new(),
			link: None,
		});
		id
	}

	fn element_mut(&mut self, node: NodeId) -> Option<ElementMut<'_>> {
		match &mut self.node_mut(node).kind {
			Kind::Element {
				svg,
				attributes,
				style,
				value,
				listeners,
				..
			} => Some(ElementMut {
				svg: *svg,
				attributes,
				style,
				value,
				listeners,
			}),
			Kind::Text(_) => {
				warn!(?node, "Expected an element, found a text node.");
				None
			}
		}
	}

	fn detach(&mut self, child: NodeId) {
		if let Some(parent) = self.node_mut(child).parent.take() {
			self.node_mut(parent).children.retain(|&c| c != child);
		}
	}

	fn count(&mut self) {
		self.mutations += 1;
	}
}

struct ElementMut<'a> {
	svg: bool,
	attributes: &'a mut BTreeMap<String, String>,
	style: &'a mut BTreeMap<String, String>,
	value: &'a mut Option<String>,
	listeners: &'a mut BTreeSet<String>,
}

fn escape(text: &str, attribute: bool, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' if !attribute => html.push_str("&gt;"),
			'"' if attribute => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

impl RenderTarget for MemoryTarget {
	type Node = NodeId;

	fn create_element(&mut self, tag: &str) -> NodeId {
		let svg = is_svg_tag(tag);
		let attributes = svg_defaults(tag).iter().map(|&(name, value)| (name.to_owned(), value.to_owned())).collect();
		self.create(Kind::Element {
			tag: tag.to_owned(),
			svg,
			attributes,
			style: BTreeMap::new(),
			value: None,
			listeners: BTreeSet::new(),
		})
	}

	fn create_text_node(&mut self, text: &str) -> NodeId {
		self.create(Kind::Text(text.to_owned()))
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		self.count();
		match &mut self.node_mut(*node).kind {
			Kind::Text(current) => text.clone_into(current),
			Kind::Element { .. } => warn!(?node, "Expected a text node, found an element."),
		}
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			element.attributes.insert(name.to_owned(), value.to_owned());
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			match name {
				"style" => element.style.clear(),
				"value" => *element.value = None,
				_ => (),
			}
			element.attributes.remove(name);
		}
	}

	fn set_property(&mut self, node: &NodeId, name: &str, value: bool) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			if value {
				element.attributes.insert(name.to_owned(), String::new());
			} else {
				element.attributes.remove(name);
			}
		}
	}

	fn value(&self, node: &NodeId) -> Option<String> {
		match &self.node(*node).kind {
			Kind::Element { value, .. } => value.clone(),
			Kind::Text(_) => None,
		}
	}

	fn set_value(&mut self, node: &NodeId, value: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			*element.value = Some(value.to_owned());
		}
	}

	fn class_name_is_string(&self, node: &NodeId) -> bool {
		!matches!(self.node(*node).kind, Kind::Element { svg: true, .. })
	}

	/// An empty class name removes the attribute, so cleared and never-set classes serialise alike.
	fn set_class_name(&mut self, node: &NodeId, class_name: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			if class_name.is_empty() {
				element.attributes.remove("class");
			} else {
				element.attributes.insert("class".to_owned(), class_name.to_owned());
			}
		}
	}

	fn add_class(&mut self, node: &NodeId, token: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			let class = element.attributes.entry("class".to_owned()).or_default();
			if !class.split_ascii_whitespace().any(|existing| existing == token) {
				if !class.is_empty() {
					class.push(' ');
				}
				class.push_str(token);
			}
		}
	}

	fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			if value.is_empty() {
				element.style.remove(property);
			} else {
				element.style.insert(property.to_owned(), value.to_owned());
			}
		}
	}

	fn request_focus(&mut self, node: &NodeId) {
		trace!(?node, "Deferring focus.");
		self.pending_focus = Some(*node);
	}

	fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
		self.count();
		self.detach(*child);
		self.node_mut(*child).parent = Some(*parent);
		self.node_mut(*parent).children.push(*child);
	}

	fn replace_child(&mut self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) {
		self.count();
		self.detach(*new_child);
		let position = self.node(*parent).children.iter().position(|c| c == old_child);
		match position {
			Some(position) => {
				self.node_mut(*parent).children[position] = *new_child;
				self.node_mut(*new_child).parent = Some(*parent);
				self.node_mut(*old_child).parent = None;
			}
			None => warn!(?parent, ?old_child, "Replaced node is not a child of the given parent."),
		}
	}

	fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
		self.count();
		if self.node(*child).parent == Some(*parent) {
			self.detach(*child);
		} else {
			warn!(?parent, ?child, "Removed node is not a child of the given parent.");
		}
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.node(*node).parent
	}

	fn child(&self, node: &NodeId, index: usize) -> Option<NodeId> {
		self.node(*node).children.get(index).copied()
	}

	fn set_link(&mut self, node: &NodeId, link: u64) {
		self.node_mut(*node).link = Some(link);
	}

	fn link(&self, node: &NodeId) -> Option<u64> {
		self.node(*node).link
	}

	fn listen(&mut self, node: &NodeId, event_type: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			element.listeners.insert(event_type.to_owned());
		}
	}

	fn unlisten(&mut self, node: &NodeId, event_type: &str) {
		self.count();
		if let Some(element) = self.element_mut(*node) {
			element.listeners.remove(event_type);
		}
	}
}
