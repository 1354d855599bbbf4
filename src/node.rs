//! Virtual node descriptors.
//!
//! A [`VNode`] tree is produced fresh by each render pass and is immutable by convention.
//! Cloning is cheap: elements are reference-counted, and child lists are shared structurally
//! until a builder method modifies them.

use crate::{
	lifecycle::Path,
	proxy::Proxy,
	value::{Class, Param, Style, Value},
	Error,
};
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;

/// Event listener. Handlers for the same event type are chained by [`Element::listen`].
pub type Handler = Rc<dyn Fn(&mut Event)>;

/// An event delivered to element listeners, either dispatched from the rendering target or
/// emitted by the lifecycle notifier (`mount`/`unmount`).
pub struct Event {
	event_type: String,
	path: Path,
	propagation_stopped: bool,
	native: Option<Rc<dyn Any>>,
}

impl Event {
	#[must_use]
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			path: Path::root(),
			propagation_stopped: false,
			native: None,
		}
	}

	pub(crate) fn lifecycle(event_type: &str, path: &Path) -> Self {
		Self {
			path: path.clone(),
			..Self::new(event_type)
		}
	}

	/// Attaches the rendering target's own event object.
	#[must_use]
	pub fn with_native(mut self, native: Rc<dyn Any>) -> Self {
		self.native = Some(native);
		self
	}

	#[must_use]
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// Structural path of the node a lifecycle event is about. The root path otherwise.
	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Halts the simulated bubbling walk, and any chained handlers after the current one.
	pub fn stop_propagation(&mut self) {
		self.propagation_stopped = true;
	}

	#[must_use]
	pub fn is_propagation_stopped(&self) -> bool {
		self.propagation_stopped
	}

	/// The rendering target's event object, or for `mount`/`unmount` the live node.
	#[must_use]
	pub fn native<E: 'static>(&self) -> Option<&E> {
		self.native.as_deref().and_then(<dyn Any>::downcast_ref::<E>)
	}
}

impl Debug for Event {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("event_type", &self.event_type)
			.field("path", &self.path)
			.field("propagation_stopped", &self.propagation_stopped)
			.field("native", &self.native.is_some())
			.finish()
	}
}

/// A virtual node.
///
/// The set of kinds is closed, so the reconciler's replace fallback can match exhaustively.
#[derive(Clone)]
pub enum VNode {
	Text(Text),
	Element(Rc<Element>),
	Proxy(Proxy),
}

impl VNode {
	#[must_use]
	pub fn text(text: impl Into<Text>) -> Self {
		VNode::Text(text.into())
	}

	/// Identity comparison. Two clones of one descriptor are the same node.
	#[must_use]
	pub fn ptr_eq(&self, other: &VNode) -> bool {
		match (self, other) {
			(VNode::Text(a), VNode::Text(b)) => Rc::ptr_eq(&a.0, &b.0),
			(VNode::Element(a), VNode::Element(b)) => Rc::ptr_eq(a, b),
			(VNode::Proxy(a), VNode::Proxy(b)) => a.ptr_eq(b),
			_ => false,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			VNode::Element(element) => Some(element),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_proxy(&self) -> Option<&Proxy> {
		match self {
			VNode::Proxy(proxy) => Some(proxy),
			_ => None,
		}
	}
}

impl Debug for VNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			VNode::Text(text) => Debug::fmt(text, f),
			VNode::Element(element) => Debug::fmt(element, f),
			VNode::Proxy(proxy) => Debug::fmt(proxy, f),
		}
	}
}

impl From<Text> for VNode {
	fn from(text: Text) -> Self {
		VNode::Text(text)
	}
}
impl From<Element> for VNode {
	fn from(element: Element) -> Self {
		VNode::Element(Rc::new(element))
	}
}
impl From<Rc<Element>> for VNode {
	fn from(element: Rc<Element>) -> Self {
		VNode::Element(element)
	}
}
impl From<Proxy> for VNode {
	fn from(proxy: Proxy) -> Self {
		VNode::Proxy(proxy)
	}
}
impl From<&str> for VNode {
	fn from(text: &str) -> Self {
		VNode::Text(text.into())
	}
}
impl From<String> for VNode {
	fn from(text: String) -> Self {
		VNode::Text(text.into())
	}
}

/// Immutable text payload. Compared by value.
#[derive(Clone, PartialEq, Eq)]
pub struct Text(Rc<str>);

impl Text {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Debug for Text {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Text").field(&&*self.0).finish()
	}
}

impl From<&str> for Text {
	fn from(text: &str) -> Self {
		Text(text.into())
	}
}
impl From<String> for Text {
	fn from(text: String) -> Self {
		Text(text.into())
	}
}

/// An element descriptor.
///
/// The tag name is fixed at construction. Builder methods consume `self`, so deriving a variant of
/// a shared element is `element.clone().attr(..)`, which leaves the original untouched and keeps
/// sharing its child list.
#[derive(Clone)]
pub struct Element {
	tag: Rc<str>,
	params: HashMap<String, Value>,
	children: Rc<Vec<VNode>>,
	events: HashMap<String, Handler>,
}

impl Element {
	/// # Errors
	///
	/// Iff `tag` isn't a plausible element name: ASCII, starting with a letter, and otherwise only
	/// letters, digits, `-`, `_`, `.` or `:`.
	pub fn try_new(tag: &str) -> Result<Self, Error> {
		let mut chars = tag.chars();
		let valid = chars.next().map_or(false, |c| c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
		if !valid {
			return Err(Error::InvalidTagName(tag.to_owned()));
		}
		Ok(Self {
			tag: tag.into(),
			params: HashMap::new(),
			children: Rc::default(),
			events: HashMap::new(),
		})
	}

	/// # Panics
	///
	/// Iff `tag` is rejected by [`Element::try_new`].
	#[must_use]
	pub fn new(tag: &str) -> Self {
		match Self::try_new(tag) {
			Ok(element) => element,
			Err(error) => panic!("{}", error),
		}
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn params(&self) -> &HashMap<String, Value> {
		&self.params
	}

	#[must_use]
	pub fn param(&self, key: &str) -> Option<&Value> {
		self.params.get(key)
	}

	#[must_use]
	pub fn class_name(&self) -> Option<&str> {
		self.params.get("className").and_then(Value::as_str)
	}

	#[must_use]
	pub fn children(&self) -> &[VNode] {
		&self.children
	}

	/// The child list, for sharing with derived elements through [`Element::with_children`].
	#[must_use]
	pub fn shared_children(&self) -> Rc<Vec<VNode>> {
		Rc::clone(&self.children)
	}

	#[must_use]
	pub fn handler(&self, event_type: &str) -> Option<&Handler> {
		self.events.get(event_type)
	}

	pub fn event_types(&self) -> impl Iterator<Item = &str> {
		self.events.keys().map(String::as_str)
	}

	/// Sets one parameter. `class` and `style` are merged as by [`Element::merge_params`].
	#[must_use]
	pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.merge_value(key, value.into());
		self
	}

	/// Returns a derived element with `key` overridden.
	#[must_use]
	pub fn assoc(&self, key: &str, value: impl Into<Value>) -> Self {
		let mut derived = self.clone();
		derived.params.insert(key.to_owned(), value.into());
		derived
	}

	#[must_use]
	pub fn class(mut self, class: impl Into<Class>) -> Self {
		self.merge_class(&class.into());
		self
	}

	#[must_use]
	pub fn style(mut self, style: impl Into<Style>) -> Self {
		self.params.insert("style".to_owned(), Value::Style(style.into()));
		self
	}

	#[must_use]
	pub fn on(mut self, event_type: &str, handler: impl Fn(&mut Event) + 'static) -> Self {
		self.listen(event_type, Rc::new(handler));
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl IntoNodes) -> Self {
		child.into_nodes(Rc::make_mut(&mut self.children));
		self
	}

	#[must_use]
	pub fn extend_children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: IntoNodes,
	{
		let list = Rc::make_mut(&mut self.children);
		for child in children {
			child.into_nodes(list);
		}
		self
	}

	#[must_use]
	pub fn with_children(mut self, children: Rc<Vec<VNode>>) -> Self {
		self.children = children;
		self
	}

	/// Merges raw constructor parameters.
	///
	/// - Handlers under `on<Event>` keys become listeners for the lower-cased event type.
	/// - `class` appends to `className`: strings verbatim, maps by their `true` keys.
	/// - `style` strings are parsed into a [`Style`].
	/// - Anything else is stored as-is. Whether it reaches the live node is up to the [codec](`crate::codec`).
	///
	/// # Errors
	///
	/// Iff a handler is passed under a key that isn't of the `on<Event>` form.
	pub fn merge_params<K: AsRef<str>>(mut self, params: impl IntoIterator<Item = (K, Param)>) -> Result<Self, Error> {
		for (key, param) in params {
			let key = key.as_ref();
			match param {
				Param::Handler(handler) => match handler_event_type(key) {
					Some(event_type) => self.listen(&event_type, handler),
					None => return Err(Error::UnsupportedHandlerKey { key: key.to_owned() }),
				},
				Param::Class(class) => self.merge_class(&class),
				Param::Value(value) => self.merge_value(key, value),
			}
		}
		Ok(self)
	}

	/// Adds a listener. An existing listener for the same type stays and runs first;
	/// the new one is skipped if the earlier one stops propagation.
	pub fn listen(&mut self, event_type: &str, handler: Handler) {
		match self.events.entry(event_type.to_owned()) {
			Entry::Occupied(mut occupied) => {
				let previous = Rc::clone(occupied.get());
				occupied.insert(Rc::new(move |event: &mut Event| {
					previous(event);
					if !event.is_propagation_stopped() {
						handler(event);
					}
				}));
			}
			Entry::Vacant(vacant) => {
				vacant.insert(handler);
			}
		}
	}

	/// Invokes this element's listener for `event`'s type, if any.
	pub fn emit(&self, event: &mut Event) {
		if let Some(handler) = self.events.get(event.event_type()) {
			handler(event);
		}
	}

	fn merge_value(&mut self, key: &str, value: Value) {
		match (key, value) {
			("class", Value::Str(name)) => self.merge_class(&Class::Name(name.to_string())),
			("style", Value::Str(declarations)) => {
				self.params.insert("style".to_owned(), Value::Style(Style::parse(&declarations)));
			}
			(key, value) => {
				self.params.insert(key.to_owned(), value);
			}
		}
	}

	fn merge_class(&mut self, class: &Class) {
		for name in class.names() {
			let merged = match self.params.get("className").and_then(Value::as_str) {
				Some(existing) if !existing.is_empty() => format!("{} {}", existing, name),
				_ => name.to_owned(),
			};
			self.params.insert("className".to_owned(), merged.into());
		}
	}
}

impl Debug for Element {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut events = self.events.keys().collect::<Vec<_>>();
		events.sort();
		f.debug_struct("Element")
			.field("tag", &&*self.tag)
			.field("params", &self.params)
			.field("children", &self.children)
			.field("events", &events)
			.finish()
	}
}

/// `onClick` becomes `click`.
fn handler_event_type(key: &str) -> Option<String> {
	let event_type = key.strip_prefix("on")?;
	if event_type.is_empty() || !event_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return None;
	}
	Some(event_type.to_ascii_lowercase())
}

/// Child input normalisation: text-like values become [`Text`] nodes, `None` is skipped and
/// sequences are flattened.
pub trait IntoNodes {
	fn into_nodes(self, nodes: &mut Vec<VNode>);
}

macro_rules! into_single_node {
	($($ty:ty),*$(,)?) => {$(
		impl IntoNodes for $ty {
			fn into_nodes(self, nodes: &mut Vec<VNode>) {
				nodes.push(self.into());
			}
		}
	)*};
}
into_single_node!(VNode, Element, Rc<Element>, Text, Proxy, &str, String);

macro_rules! into_text_node {
	($($ty:ty),*$(,)?) => {$(
		impl IntoNodes for $ty {
			fn into_nodes(self, nodes: &mut Vec<VNode>) {
				nodes.push(VNode::text(self.to_string()));
			}
		}
	)*};
}
into_text_node!(i32, i64, u32, u64, usize, f64, char);

impl IntoNodes for &VNode {
	fn into_nodes(self, nodes: &mut Vec<VNode>) {
		nodes.push(self.clone());
	}
}

impl<T: IntoNodes> IntoNodes for Option<T> {
	fn into_nodes(self, nodes: &mut Vec<VNode>) {
		if let Some(inner) = self {
			inner.into_nodes(nodes);
		}
	}
}

impl<T: IntoNodes> IntoNodes for Vec<T> {
	fn into_nodes(self, nodes: &mut Vec<VNode>) {
		for item in self {
			item.into_nodes(nodes);
		}
	}
}

impl<T: IntoNodes, const N: usize> IntoNodes for [T; N] {
	fn into_nodes(self, nodes: &mut Vec<VNode>) {
		for item in self {
			item.into_nodes(nodes);
		}
	}
}
