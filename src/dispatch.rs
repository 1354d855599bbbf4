//! Simulated event bubbling over the descriptors linked to live nodes.
//!
//! The rendering target reports an event once, at the node it originated on. The dispatcher then walks
//! the live ancestor chain, invoking the listener of each linked [`Element`](`crate::Element`) for the event's type,
//! until the root is reached or a listener calls [`Event::stop_propagation`].
//! Live nodes without a linked descriptor or without a matching listener are skipped.

use crate::{
	diff::Differ,
	node::{Event, Handler},
	target::RenderTarget,
	VNode,
};
use std::rc::Rc;
use tracing::{trace, trace_span};

/// Event types that are forwarded from the target's root through the simulated bubbling walk.
pub const BUBBLING_EVENTS: &[&str] = &[
	"click", "mousedown", "mouseup", "dblclick", "mouseover", "mousemove", "mouseout", "dragstart", "drag", "dragenter", "dragleave", "dragover", "drop", "dragend", "keydown",
	"keypress", "keyup", "resize", "scroll", "select", "change", "submit", "reset", "focus", "blur", "focusin", "focusout",
];

/// Event types that don't bubble natively and so are bound on each node with a listener for them.
/// Dispatching them only reaches the originating node.
pub const NON_BUBBLING_EVENTS: &[&str] = &["mouseenter", "mouseleave"];

#[must_use]
pub fn is_non_bubbling(event_type: &str) -> bool {
	NON_BUBBLING_EVENTS.contains(&event_type)
}

impl<T: RenderTarget> Differ<T> {
	/// Collects the listeners an `event_type` event originating at `target` reaches, innermost first.
	///
	/// Collecting first lets callers release any borrow of the differ before running them,
	/// since listeners commonly trigger redraws.
	#[must_use]
	pub fn handlers_for(&self, target: &T::Node, event_type: &str) -> Vec<Handler> {
		let mut handlers = Vec::new();
		let mut current = Some(target.clone());
		while let Some(node) = current {
			if let Some(VNode::Element(element)) = self.linked(&node) {
				if let Some(handler) = element.handler(event_type) {
					handlers.push(Rc::clone(handler));
				}
			}
			if is_non_bubbling(event_type) {
				break;
			}
			current = self.target().parent(&node);
		}
		handlers
	}

	/// Delivers `event` as if it originated at `target`.
	///
	/// Returns how many listeners ran.
	pub fn dispatch(&self, target: &T::Node, event: &mut Event) -> usize {
		let span = trace_span!("Dispatching event", event_type = event.event_type());
		let _enter = span.enter();
		let handlers = self.handlers_for(target, event.event_type());
		run_handlers(&handlers, event)
	}
}

/// Runs `handlers` in order until one of them stops propagation.
///
/// Returns how many ran.
pub fn run_handlers(handlers: &[Handler], event: &mut Event) -> usize {
	let mut ran = 0;
	for handler in handlers {
		handler(event);
		ran += 1;
		if event.is_propagation_stopped() {
			trace!(ran, "Propagation stopped.");
			break;
		}
	}
	ran
}
