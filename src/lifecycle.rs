//! Mount and unmount notification.
//!
//! Hooks fire depth-first with children before their parent, in both directions,
//! so a parent's `mount` listener can rely on its whole subtree being live.
//! Element listeners receive the live node as the event's [native](`crate::Event::native`) payload,
//! where it's still known. For [`MemoryTarget`](`crate::MemoryTarget`) that's a [`NodeId`](`crate::NodeId`).
//! Each node is visited exactly once per mount or unmount. Plain updates never notify.
//!
//! [`Path`]s identify occurrences: a [`Component`](`crate::Component`) descriptor may be mounted in several
//! places at once, and its hooks receive the path of the occurrence in question.

use crate::{diff::Differ, node::Event, target::RenderTarget, VNode};
use core::fmt::{self, Display, Formatter};
use std::rc::Rc;
use tracing::{error, trace_span};

/// Sibling indices from the mount root down to a node.
///
/// Computed while traversing, never by counting live siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<usize>);

impl Path {
	#[must_use]
	pub fn root() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn indices(&self) -> &[usize] {
		&self.0
	}

	#[must_use]
	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	pub fn push(&mut self, index: usize) {
		self.0.push(index);
	}

	pub fn pop(&mut self) -> Option<usize> {
		self.0.pop()
	}
}

impl From<Vec<usize>> for Path {
	fn from(indices: Vec<usize>) -> Self {
		Self(indices)
	}
}

impl<const N: usize> From<[usize; N]> for Path {
	fn from(indices: [usize; N]) -> Self {
		Self(indices.to_vec())
	}
}

impl Display for Path {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("/");
		}
		for index in &self.0 {
			write!(f, "/{}", index)?;
		}
		Ok(())
	}
}

impl<T: RenderTarget> Differ<T> {
	/// Fires mount hooks for `node`, which must already be attached.
	///
	/// `live` is handed to each listener as the event's [native](`Event::native`) payload.
	pub(crate) fn notify_mount(&mut self, node: &VNode, live: Option<&T::Node>, path: &mut Path, depth_limit: usize) {
		if depth_limit == 0 {
			return error!("Depth limit reached while notifying mount");
		}

		match node {
			VNode::Text(_) => (),
			VNode::Element(element) => {
				for (i, child) in element.children().iter().enumerate() {
					let child_live = live.and_then(|live| self.target().child(live, i));
					path.push(i);
					self.notify_mount(child, child_live.as_ref(), path, depth_limit - 1);
					path.pop();
				}
				let span = trace_span!("Mounted", tag = element.tag());
				let _enter = span.enter();
				element.emit(&mut lifecycle_event("mount", live, path));
			}
			VNode::Proxy(proxy) => {
				self.notify_mount(&proxy.delegate(), live, path, depth_limit - 1);
				proxy.mounted(path);
			}
		}
	}

	/// Fires unmount hooks for `node` and drops the back-references of its live subtree.
	///
	/// `live` may be [`None`] if the live node is already gone, in which case only hooks run.
	pub(crate) fn notify_unmount(&mut self, node: &VNode, live: Option<&T::Node>, path: &mut Path, depth_limit: usize) {
		if depth_limit == 0 {
			return error!("Depth limit reached while notifying unmount");
		}

		match node {
			VNode::Text(_) => (),
			VNode::Element(element) => {
				for (i, child) in element.children().iter().enumerate() {
					let child_live = live.and_then(|live| self.target().child(live, i));
					path.push(i);
					self.notify_unmount(child, child_live.as_ref(), path, depth_limit - 1);
					path.pop();
				}
				let span = trace_span!("Unmounting", tag = element.tag());
				let _enter = span.enter();
				element.emit(&mut lifecycle_event("unmount", live, path));
			}
			VNode::Proxy(proxy) => {
				self.notify_unmount(&proxy.delegate(), live, path, depth_limit - 1);
				proxy.unmounted(path);
				return;
			}
		}

		if let Some(live) = live {
			self.unlink(live);
		}
	}
}

fn lifecycle_event<N: Clone + 'static>(event_type: &str, live: Option<&N>, path: &Path) -> Event {
	let event = Event::lifecycle(event_type, path);
	match live {
		Some(live) => event.with_native(Rc::new(live.clone())),
		None => event,
	}
}
