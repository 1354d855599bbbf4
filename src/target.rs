//! The interface the [`Differ`](`crate::Differ`) needs from a live rendering target.
//!
//! Implementations own the native tree. The differ never inspects native nodes beyond this trait,
//! so anything from a browser DOM ([`WebTarget`](`crate::web::WebTarget`) behind the `web` feature)
//! to an in-memory document ([`MemoryTarget`](`crate::MemoryTarget`)) can be driven.
//!
//! # Correct Use
//!
//! Only the differ may mutate nodes it created while they are attached.
//! External mutation desynchronises the live and virtual trees, which is not detected.

use core::fmt::Debug;

/// Tags created in the SVG namespace.
pub const SVG_TAGS: &[&str] = &["svg", "path", "polyline", "ellipse", "polygon", "circle", "text", "line", "rect", "g"];

#[must_use]
pub fn is_svg_tag(tag: &str) -> bool {
	SVG_TAGS.contains(&tag)
}

/// Attributes written onto freshly created SVG elements of the given tag, before any parameters.
#[must_use]
pub fn svg_defaults(tag: &str) -> &'static [(&'static str, &'static str)] {
	match tag {
		"svg" => &[("xmlns", "http://www.w3.org/2000/svg"), ("version", "1.1"), ("height", "100%"), ("width", "100%")],
		"path" => &[("stroke", "black"), ("fill", "none")],
		_ => &[],
	}
}

/// Rendering-target adapter.
///
/// Node handles are cheap clones referring to the same native node.
pub trait RenderTarget {
	type Node: Clone + Debug + 'static;

	/// Creates a detached element. SVG tags ([`is_svg_tag`]) must be created in the SVG namespace with [`svg_defaults`] applied.
	fn create_element(&mut self, tag: &str) -> Self::Node;
	fn create_text_node(&mut self, text: &str) -> Self::Node;
	fn set_text(&mut self, node: &Self::Node, text: &str);

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&mut self, node: &Self::Node, name: &str);
	/// Writes a native boolean property, like `node[name] = value` in a browser.
	fn set_property(&mut self, node: &Self::Node, name: &str, value: bool);

	/// The current live `value` of a form control, which may differ from what was last written.
	fn value(&self, node: &Self::Node) -> Option<String>;
	fn set_value(&mut self, node: &Self::Node, value: &str);

	/// Whether the class field of `node` is a plain string (`false` for SVG elements).
	fn class_name_is_string(&self, node: &Self::Node) -> bool;
	fn set_class_name(&mut self, node: &Self::Node, class_name: &str);
	fn add_class(&mut self, node: &Self::Node, token: &str);

	fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);

	/// Focuses `node` on the next tick, not synchronously.
	fn request_focus(&mut self, node: &Self::Node);

	fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);
	fn replace_child(&mut self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node);
	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);
	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn child(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

	/// Attaches the back-reference tag the differ uses to find the descriptor of a live node.
	fn set_link(&mut self, node: &Self::Node, link: u64);
	fn link(&self, node: &Self::Node) -> Option<u64>;

	/// Routes native `event_type` events on `node` itself to the application, for events that don't bubble.
	fn listen(&mut self, node: &Self::Node, event_type: &str) {
		let _ = (node, event_type);
	}
	fn unlisten(&mut self, node: &Self::Node, event_type: &str) {
		let _ = (node, event_type);
	}
}
