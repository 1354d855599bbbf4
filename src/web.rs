//! Browser DOM adapter, behind the `web` feature.
//!
//! - [`WebTarget`] drives a live `web_sys` DOM.
//! - [`AnimationFrames`] schedules redraws with `requestAnimationFrame`.
//! - [`Dispatcher`] forwards native events into the simulated bubbling walk of an [`App`].

use crate::{
	app::{App, FrameScheduler, Store, WeakApp},
	dispatch::BUBBLING_EVENTS,
	node::Event,
	target::{is_svg_tag, svg_defaults, RenderTarget},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use js_sys::{Function, Reflect};
use std::rc::Rc;
use tracing::{error, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Expando property holding a node's link tag.
const LINK_PROPERTY: &str = "__manaDomLink";

type DirectSink = Rc<RefCell<Option<Rc<dyn Fn(web_sys::Node, web_sys::Event)>>>>;

/// A [`RenderTarget`] on the browser DOM of one document.
pub struct WebTarget {
	document: web_sys::Document,
	direct_handler: Closure<dyn Fn(web_sys::Event)>,
	direct_sink: DirectSink,
}

impl WebTarget {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		let direct_sink: DirectSink = Rc::default();
		let direct_handler = Closure::wrap(Box::new({
			let direct_sink = Rc::clone(&direct_sink);
			move |event: web_sys::Event| {
				let span = trace_span!("direct_handler", event_type = %event.type_());
				let _enter = span.enter();

				let node = match event.current_target().and_then(|target| target.dyn_into::<web_sys::Node>().ok()) {
					Some(node) => node,
					None => return warn!("Directly bound event without a current target node."),
				};
				let sink = direct_sink.borrow().clone();
				match sink {
					Some(sink) => sink(node, event),
					None => trace!("No dispatcher installed. Dropping event."),
				}
			}
		}) as Box<dyn Fn(web_sys::Event)>);

		Self {
			document,
			direct_handler,
			direct_sink,
		}
	}

	/// A target on the current window's document, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::new)
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	fn set_direct_sink(&self, sink: Option<Rc<dyn Fn(web_sys::Node, web_sys::Event)>>) {
		*self.direct_sink.borrow_mut() = sink;
	}
}

impl Debug for WebTarget {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebTarget")
			.field("document", &self.document)
			.field("dispatcher_installed", &self.direct_sink.borrow().is_some())
			.finish_non_exhaustive()
	}
}

fn as_element(node: &web_sys::Node) -> Option<&web_sys::Element> {
	let element = node.dyn_ref::<web_sys::Element>();
	if element.is_none() {
		warn!("Expected `web_sys::Element` but found {:?}", node);
	}
	element
}

fn set_js(target: &JsValue, key: &str, value: &JsValue) {
	if let Err(error) = Reflect::set(target, &JsValue::from_str(key), value) {
		error!("Failed to set property {:?}: {:?}", key, error);
	}
}

impl RenderTarget for WebTarget {
	type Node = web_sys::Node;

	fn create_element(&mut self, tag: &str) -> web_sys::Node {
		let created = if is_svg_tag(tag) {
			self.document.create_element_ns(Some(SVG_NAMESPACE), tag)
		} else {
			self.document.create_element(tag)
		};
		match created {
			Ok(element) => {
				for (name, value) in svg_defaults(tag) {
					if let Err(error) = element.set_attribute(name, value) {
						error!("Failed to set default attribute {:?}: {:?}", name, error);
					}
				}
				element.into()
			}
			Err(error) => {
				error!("Failed to create element <{}>: {:?}. Using an empty text node instead.", tag, error);
				self.document.create_text_node("").into()
			}
		}
	}

	fn create_text_node(&mut self, text: &str) -> web_sys::Node {
		self.document.create_text_node(text).into()
	}

	fn set_text(&mut self, node: &web_sys::Node, text: &str) {
		node.set_text_content(Some(text));
	}

	fn set_attribute(&mut self, node: &web_sys::Node, name: &str, value: &str) {
		if let Some(element) = as_element(node) {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Failed to set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_attribute(&mut self, node: &web_sys::Node, name: &str) {
		if let Some(element) = as_element(node) {
			if let Err(error) = element.remove_attribute(name) {
				error!("Failed to remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn set_property(&mut self, node: &web_sys::Node, name: &str, value: bool) {
		set_js(node, name, &JsValue::from_bool(value));
	}

	fn value(&self, node: &web_sys::Node) -> Option<String> {
		Reflect::get(node, &JsValue::from_str("value")).ok().and_then(|value| value.as_string())
	}

	fn set_value(&mut self, node: &web_sys::Node, value: &str) {
		set_js(node, "value", &JsValue::from_str(value));
	}

	fn class_name_is_string(&self, node: &web_sys::Node) -> bool {
		Reflect::get(node, &JsValue::from_str("className")).map_or(false, |class_name| class_name.is_string())
	}

	fn set_class_name(&mut self, node: &web_sys::Node, class_name: &str) {
		if let Some(element) = as_element(node) {
			element.set_class_name(class_name);
		}
	}

	fn add_class(&mut self, node: &web_sys::Node, token: &str) {
		if let Some(element) = as_element(node) {
			if let Err(error) = element.class_list().add_1(token) {
				error!("Failed to add class {:?}: {:?}", token, error);
			}
		}
	}

	/// Hyphenated properties go through `setProperty`, camel-cased ones are assigned like `style[property] = value`.
	fn set_style(&mut self, node: &web_sys::Node, property: &str, value: &str) {
		let style = match Reflect::get(node, &JsValue::from_str("style")).ok().and_then(|style| style.dyn_into::<web_sys::CssStyleDeclaration>().ok()) {
			Some(style) => style,
			None => return warn!("Node has no style declaration: {:?}", node),
		};
		if property.contains('-') {
			if let Err(error) = style.set_property(property, value) {
				error!("Failed to set style property {:?}: {:?}", property, error);
			}
		} else {
			set_js(&style, property, &JsValue::from_str(value));
		}
	}

	fn request_focus(&mut self, node: &web_sys::Node) {
		let window = match web_sys::window() {
			Some(window) => window,
			None => return warn!("No window to defer focus with."),
		};
		let node = node.clone();
		let focus = Closure::once_into_js(move || match node.dyn_ref::<web_sys::HtmlElement>() {
			Some(element) => {
				if let Err(error) = element.focus() {
					error!("Failed to focus: {:?}", error);
				}
			}
			None => warn!("Can't focus non-HTML element {:?}", node),
		});
		if let Err(error) = window.set_timeout_with_callback(focus.unchecked_ref()) {
			error!("Failed to defer focus: {:?}", error);
		}
	}

	fn append_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append child: {:?}", error);
		}
	}

	fn replace_child(&mut self, parent: &web_sys::Node, new_child: &web_sys::Node, old_child: &web_sys::Node) {
		if let Err(error) = parent.replace_child(new_child, old_child) {
			error!("Failed to replace child: {:?}", error);
		}
	}

	fn remove_child(&mut self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove child: {:?}", error);
		}
	}

	fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn child(&self, node: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
		u32::try_from(index).ok().and_then(|index| node.child_nodes().item(index))
	}

	#[allow(clippy::cast_precision_loss)]
	fn set_link(&mut self, node: &web_sys::Node, link: u64) {
		set_js(node, LINK_PROPERTY, &JsValue::from_f64(link as f64));
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn link(&self, node: &web_sys::Node) -> Option<u64> {
		Reflect::get(node, &JsValue::from_str(LINK_PROPERTY)).ok().and_then(|link| link.as_f64()).map(|link| link as u64)
	}

	fn listen(&mut self, node: &web_sys::Node, event_type: &str) {
		if let Err(error) = node.add_event_listener_with_callback(event_type, self.direct_handler.as_ref().unchecked_ref()) {
			error!("Failed to bind {:?} listener: {:?}", event_type, error);
		}
	}

	fn unlisten(&mut self, node: &web_sys::Node, event_type: &str) {
		if let Err(error) = node.remove_event_listener_with_callback(event_type, self.direct_handler.as_ref().unchecked_ref()) {
			error!("Failed to unbind {:?} listener: {:?}", event_type, error);
		}
	}
}

/// Schedules frames with `window.requestAnimationFrame`.
#[derive(Debug, Clone)]
pub struct AnimationFrames {
	window: web_sys::Window,
}

impl AnimationFrames {
	#[must_use]
	pub fn new(window: web_sys::Window) -> Self {
		Self { window }
	}

	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window().map(Self::new)
	}
}

impl FrameScheduler for AnimationFrames {
	fn request_frame(&self, callback: Box<dyn FnOnce()>) {
		let callback = Closure::once_into_js(move || callback());
		if let Err(error) = self.window.request_animation_frame(callback.unchecked_ref::<Function>()) {
			error!("Failed to request animation frame: {:?}", error);
		}
	}
}

/// Window-level capture listeners for [`BUBBLING_EVENTS`] and the sink for directly bound ones,
/// both feeding an [`App`]'s dispatcher.
///
/// Dropping this removes the listeners again.
pub struct Dispatcher<S: Store + 'static> {
	window: web_sys::Window,
	listener: Closure<dyn Fn(web_sys::Event)>,
	app: WeakApp<S, WebTarget>,
}

/// Starts forwarding native events to `app`.
///
/// Returns [`None`] iff there is no window.
#[must_use]
pub fn install_dispatcher<S: Store + 'static>(app: &App<S, WebTarget>) -> Option<Dispatcher<S>> {
	let window = web_sys::window()?;

	let weak = app.downgrade();
	let listener = Closure::wrap(Box::new(move |native: web_sys::Event| {
		let app = match weak.upgrade() {
			Some(app) => app,
			None => return trace!("App is gone. Ignoring event."),
		};
		let target = match native.target().and_then(|target| target.dyn_into::<web_sys::Node>().ok()) {
			Some(target) => target,
			None => return trace!("Event target isn't a node."),
		};
		let mut event = Event::new(native.type_()).with_native(Rc::new(native));
		app.dispatch(&target, &mut event);
	}) as Box<dyn Fn(web_sys::Event)>);

	for event_type in BUBBLING_EVENTS {
		if let Err(error) = window.add_event_listener_with_callback_and_bool(event_type, listener.as_ref().unchecked_ref(), true) {
			error!("Failed to add window listener for {:?}: {:?}", event_type, error);
		}
	}

	let weak = app.downgrade();
	app.with_target(|target| {
		target.set_direct_sink(Some(Rc::new(move |node: web_sys::Node, native: web_sys::Event| {
			if let Some(app) = weak.upgrade() {
				let mut event = Event::new(native.type_()).with_native(Rc::new(native));
				app.dispatch(&node, &mut event);
			}
		})));
	});

	Some(Dispatcher {
		window,
		listener,
		app: app.downgrade(),
	})
}

impl<S: Store + 'static> Drop for Dispatcher<S> {
	fn drop(&mut self) {
		for event_type in BUBBLING_EVENTS {
			if let Err(error) = self.window.remove_event_listener_with_callback_and_bool(event_type, self.listener.as_ref().unchecked_ref(), true) {
				error!("Failed to remove window listener for {:?}: {:?}", event_type, error);
			}
		}
		if let Some(app) = self.app.upgrade() {
			app.with_target(|target| target.set_direct_sink(None));
		}
	}
}

impl<S: Store + 'static> Debug for Dispatcher<S> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dispatcher").field("window", &self.window).finish_non_exhaustive()
	}
}
