#![doc(html_root_url = "https://docs.rs/mana-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A small virtual DOM.
//!
//! Describe the UI as a tree of immutable [`VNode`] descriptors, then let a [`Differ`] drive a live
//! [`RenderTarget`] to match each newly rendered tree with as little work as it can manage.
//! [`App`] ties that to a [`Store`] and redraws at most once per frame after changes.
//!
//! # Node kinds
//!
//! - [`Text`]: a string payload, compared by value.
//! - [`Element`]: tag name, parameters, children and event listeners.
//! - [`Proxy`]: a [`Thunk`] or [`Component`] whose delegate descriptor is rendered lazily and memoized
//!   while its arguments (and, for components, its local [`State`]) don't change.
//!
//! # Lifecycle
//!
//! `mount` and `unmount` listeners on elements, and [`Component::mounted`]/[`Component::unmounted`],
//! fire depth-first with children before their parent. See [`lifecycle`].
//!
//! # Events
//!
//! Events are bubbled over the descriptors linked to the live ancestor chain rather than through native listeners.
//! See [`dispatch`].

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod app;
pub mod codec;
pub mod diff;
pub mod dispatch;
mod error;
pub mod lifecycle;
pub mod memory;
pub mod node;
pub mod proxy;
pub mod target;
pub mod value;

#[cfg(feature = "web")]
pub mod web;

pub use app::{App, Atom, FrameScheduler, ManualFrames, RedrawHandle, Store, Subscription, WeakApp};
pub use diff::{Differ, DEFAULT_DEPTH_LIMIT};
pub use error::Error;
pub use lifecycle::Path;
pub use memory::{MemoryTarget, NodeId};
pub use node::{Element, Event, Handler, IntoNodes, Text, VNode};
pub use proxy::{Component, Proxy, State, Thunk};
pub use target::RenderTarget;
pub use value::{Class, Param, Style, Value};

/// Shorthand for [`Element::new`].
///
/// # Panics
///
/// Iff `tag` isn't a valid element name.
#[must_use]
pub fn h(tag: &str) -> Element {
	Element::new(tag)
}
