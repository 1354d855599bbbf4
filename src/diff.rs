use crate::{codec, dispatch::NON_BUBBLING_EVENTS, lifecycle::Path, node::Element, proxy::Proxy, target::RenderTarget, value::Value, VNode};
use hashbrown::HashMap;
use tracing::{error, instrument, trace, trace_span, warn};

/// Recursion depth past which the differ gives up on a subtree.
pub const DEFAULT_DEPTH_LIMIT: usize = 512;

/// Reconciles [`VNode`] trees against the live tree of a [`RenderTarget`].
///
/// The differ owns the target and a side table from live nodes (via their [link tag](`RenderTarget::set_link`))
/// back to the descriptor that last produced them, which is what [event dispatch](`Differ::dispatch`) walks.
///
/// Child lists are reconciled by position. Moving an item to another index is seen as a series of
/// in-place updates or replacements rather than one move; keep list order stable or wrap items in
/// [`Proxy`](`crate::Proxy`) nodes to keep that cheap.
///
/// # Correct Use
///
/// Every `old` tree passed in must be the tree that was last reconciled into (or mounted at) the given live node.
/// A mismatch is tolerated where it can be detected, with a warning, but the live tree may not match `next` afterwards.
#[derive(Debug)]
pub struct Differ<T: RenderTarget> {
	target: T,
	links: HashMap<u64, VNode>,
	next_link: u64,
	depth_limit: usize,
}

impl<T: RenderTarget> Differ<T> {
	#[must_use]
	pub fn new(target: T) -> Self {
		Self::with_depth_limit(target, DEFAULT_DEPTH_LIMIT)
	}

	#[must_use]
	pub fn with_depth_limit(target: T, depth_limit: usize) -> Self {
		Self {
			target,
			links: HashMap::new(),
			next_link: 0,
			depth_limit,
		}
	}

	#[must_use]
	pub fn target(&self) -> &T {
		&self.target
	}

	/// # Correct Use
	///
	/// Don't mutate nodes the differ manages through this.
	pub fn target_mut(&mut self) -> &mut T {
		&mut self.target
	}

	#[must_use]
	pub fn into_target(self) -> T {
		self.target
	}

	#[must_use]
	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	/// The descriptor that last produced `live`, if it's managed by this differ.
	#[must_use]
	pub fn linked(&self, live: &T::Node) -> Option<&VNode> {
		self.target.link(live).and_then(|link| self.links.get(&link))
	}

	/// Number of live nodes currently linked to a descriptor.
	#[must_use]
	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	/// Mounts `node` onto an existing `container`.
	///
	/// A root element adopts the container: its parameters are written onto it and its children appended.
	/// A root text node can't do that and is appended as a child instead.
	/// Mount hooks fire afterwards, children first.
	///
	/// Returns the live node now representing `node`.
	#[instrument(skip(self, node))]
	pub fn mount(&mut self, node: &VNode, container: &T::Node) -> T::Node {
		let live = self.adopt(node, container, self.depth_limit);
		self.notify_mount(node, Some(&live), &mut Path::root(), self.depth_limit);
		live
	}

	/// Materializes `node`, appends it to `parent` and fires its mount hooks.
	#[instrument(skip(self, node))]
	pub fn append(&mut self, node: &VNode, parent: &T::Node) -> T::Node {
		let live = self.materialize_node(node, self.depth_limit);
		self.target.append_child(parent, &live);
		self.notify_mount(node, Some(&live), &mut Path::root(), self.depth_limit);
		live
	}

	/// Creates the live representation of `node` without attaching it or firing hooks.
	pub fn materialize(&mut self, node: &VNode) -> T::Node {
		self.materialize_node(node, self.depth_limit)
	}

	/// Patches `live`, currently representing `old`, to represent `next`.
	///
	/// Returns the live node now representing `next`, which differs from `live` iff it had to be replaced.
	#[instrument(skip(self, old, next))]
	pub fn update(&mut self, old: &VNode, next: &VNode, live: &T::Node) -> T::Node {
		self.update_node(old, next, live, &mut Path::root(), self.depth_limit)
	}

	/// Unmounts `old` and puts a fresh `next` in its place.
	#[instrument(skip(self, old, next))]
	pub fn replace(&mut self, old: &VNode, next: &VNode, live: &T::Node) -> T::Node {
		self.replace_node(old, next, live, &mut Path::root(), self.depth_limit)
	}

	/// Unmounts `old` and detaches `live` from its parent.
	#[instrument(skip(self, old))]
	pub fn remove(&mut self, old: &VNode, live: &T::Node) {
		self.remove_node(old, live, &mut Path::root(), self.depth_limit);
	}

	fn adopt(&mut self, node: &VNode, container: &T::Node, depth_limit: usize) -> T::Node {
		if depth_limit == 0 {
			error!("Depth limit reached. Leaving the container as is.");
			return container.clone();
		}

		match node {
			VNode::Element(element) => {
				let span = trace_span!("Adopting container", tag = element.tag());
				let _enter = span.enter();
				self.write_element(node, element, container, depth_limit);
				container.clone()
			}
			VNode::Proxy(proxy) => {
				let span = trace_span!("Adopting container for proxy", family = proxy.family_name());
				let _enter = span.enter();
				self.adopt(&proxy.delegate(), container, depth_limit - 1)
			}
			VNode::Text(_) => {
				warn!("A text node can't adopt a container. Appending it instead.");
				let live = self.materialize_node(node, depth_limit);
				self.target.append_child(container, &live);
				live
			}
		}
	}

	pub(crate) fn materialize_node(&mut self, node: &VNode, depth_limit: usize) -> T::Node {
		if depth_limit == 0 {
			error!("Depth limit reached. Materializing an empty text node instead.");
			return self.target.create_text_node("");
		}

		match node {
			VNode::Text(text) => {
				let span = trace_span!("Creating text node", text = text.as_str());
				let _enter = span.enter();
				let live = self.target.create_text_node(text.as_str());
				self.link(&live, node);
				live
			}
			VNode::Element(element) => {
				let span = trace_span!("Creating element", tag = element.tag());
				let _enter = span.enter();
				let live = self.target.create_element(element.tag());
				self.write_element(node, element, &live, depth_limit);
				live
			}
			VNode::Proxy(proxy) => {
				let span = trace_span!("Creating proxy delegate", family = proxy.family_name());
				let _enter = span.enter();
				self.materialize_node(&proxy.delegate(), depth_limit - 1)
			}
		}
	}

	/// Writes a freshly created or adopted element's parameters, direct listeners and children.
	fn write_element(&mut self, node: &VNode, element: &Element, live: &T::Node, depth_limit: usize) {
		self.link(live, node);
		for (key, value) in element.params() {
			codec::set_attribute(&mut self.target, live, key, value);
		}
		for &event_type in NON_BUBBLING_EVENTS {
			if element.handler(event_type).is_some() {
				self.target.listen(live, event_type);
			}
		}
		for child in element.children() {
			let child_live = self.materialize_node(child, depth_limit - 1);
			self.target.append_child(live, &child_live);
		}
	}

	#[allow(clippy::similar_names)]
	pub(crate) fn update_node(&mut self, old: &VNode, next: &VNode, live: &T::Node, path: &mut Path, depth_limit: usize) -> T::Node {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return live.clone();
		}

		if old.ptr_eq(next) {
			match old {
				VNode::Proxy(proxy) if proxy.is_current() => return self.catch_up(proxy, live, path, depth_limit),
				VNode::Proxy(_) => (),
				_ => {
					trace!("Identical node. Nothing to do.");
					return live.clone();
				}
			}
		}

		match (old, next) {
			(VNode::Text(t_1), VNode::Text(t_2)) => {
				let span = trace_span!("Diffing text node", t_1 = t_1.as_str(), t_2 = t_2.as_str());
				let _enter = span.enter();
				if t_1 != t_2 {
					self.target.set_text(live, t_2.as_str());
				}
				self.link(live, next);
				live.clone()
			}

			(VNode::Element(e_1), VNode::Element(e_2)) if e_1.tag() == e_2.tag() => {
				let span = trace_span!("Diffing element", tag = e_1.tag(), path = %DisplayPath(path));
				let _enter = span.enter();
				self.update_params(e_1.params(), e_2.params(), live);
				self.update_children(e_1, e_2, live, path, depth_limit);
				self.update_direct_listeners(e_1, e_2, live);
				self.link(live, next);
				live.clone()
			}

			(VNode::Proxy(p_1), VNode::Proxy(p_2)) if p_1.same_family(p_2) => {
				let span = trace_span!("Diffing proxy", family = p_1.family_name(), path = %DisplayPath(path));
				let _enter = span.enter();
				let same = p_1.ptr_eq(p_2);
				if p_1.is_current() && (same || p_1.same_args(p_2)) {
					trace!("Arguments matched. Reusing the delegate.");
					if !same {
						p_2.adopt(p_1);
					}
					return self.catch_up(p_2, live, path, depth_limit);
				}

				let d_1 = p_1.delegate();
				if !same {
					p_2.inherit(p_1);
				}
				let d_2 = p_2.render_delegate();
				self.update_node(&d_1, &d_2, live, path, depth_limit - 1)
			}

			(VNode::Proxy(p_1), VNode::Text(_) | VNode::Element(_)) => {
				let span = trace_span!("Diffing proxy against its successor's kind", family = p_1.family_name());
				let _enter = span.enter();
				let live = self.update_node(&p_1.delegate(), next, live, path, depth_limit - 1);
				p_1.unmounted(path);
				live
			}

			(VNode::Text(_) | VNode::Element(_), VNode::Proxy(p_2)) => {
				let span = trace_span!("Diffing against proxy", family = p_2.family_name());
				let _enter = span.enter();
				let live = self.update_node(old, &p_2.delegate(), live, path, depth_limit - 1);
				p_2.mounted(path);
				live
			}

			// Mismatching nodes: Destroy and rebuild.
			(n_1, n_2) => {
				let span = trace_span!("Replace mismatching");
				let _enter = span.enter();
				if let (VNode::Element(e_1), VNode::Element(e_2)) = (n_1, n_2) {
					if e_1.tag().eq_ignore_ascii_case(e_2.tag()) {
						warn!("Recreating element due to different tag name casing: {:?} -> {:?}", e_1.tag(), e_2.tag());
					}
				}
				self.replace_node(n_1, n_2, live, path, depth_limit)
			}
		}
	}

	/// Brings one occurrence of a current `proxy` up to its memoized delegate.
	///
	/// Memoization is per descriptor, but a descriptor may be mounted in several places.
	/// An occurrence that wasn't visited when the delegate was last rendered is still linked to an older one.
	fn catch_up(&mut self, proxy: &Proxy, live: &T::Node, path: &mut Path, depth_limit: usize) -> T::Node {
		let mut delegate = proxy.delegate();
		for _ in 0..depth_limit {
			let inner = match &delegate {
				VNode::Proxy(inner) => inner.clone(),
				_ => break,
			};
			delegate = inner.delegate();
		}

		match self.linked(live).cloned() {
			Some(linked) if !linked.ptr_eq(&delegate) => {
				trace!(family = proxy.family_name(), "Occurrence is behind the memoized delegate. Catching up.");
				self.update_node(&linked, &delegate, live, path, depth_limit - 1)
			}
			_ => {
				trace!("Delegate up to date. Nothing to do.");
				live.clone()
			}
		}
	}

	pub(crate) fn replace_node(&mut self, old: &VNode, next: &VNode, live: &T::Node, path: &mut Path, depth_limit: usize) -> T::Node {
		self.notify_unmount(old, Some(live), path, depth_limit);
		let new_live = self.materialize_node(next, depth_limit);
		match self.target.parent(live) {
			Some(parent) => self.target.replace_child(&parent, &new_live, live),
			None => warn!("Replaced node was detached. Its replacement stays detached too."),
		}
		self.notify_mount(next, Some(&new_live), path, depth_limit);
		new_live
	}

	pub(crate) fn remove_node(&mut self, old: &VNode, live: &T::Node, path: &mut Path, depth_limit: usize) {
		self.notify_unmount(old, Some(live), path, depth_limit);
		match self.target.parent(live) {
			Some(parent) => self.target.remove_child(&parent, live),
			None => warn!("Removed node was already detached."),
		}
	}

	/// Removals first, so that a net-empty parameter set leaves nothing behind.
	fn update_params(&mut self, a: &HashMap<String, Value>, b: &HashMap<String, Value>, live: &T::Node) {
		for removed in a.keys().filter(|key| !b.contains_key(*key)) {
			codec::remove_attribute(&mut self.target, live, removed);
		}
		for (key, value) in b {
			if a.get(key) != Some(value) {
				codec::set_attribute(&mut self.target, live, key, value);
			}
		}
	}

	fn update_children(&mut self, e_1: &Element, e_2: &Element, live: &T::Node, path: &mut Path, depth_limit: usize) {
		let (a, b) = (e_1.children(), e_2.children());
		let mut l = a.len();

		// Shrink from the tail.
		while l > b.len() {
			l -= 1;
			path.push(l);
			match self.target.child(live, l) {
				Some(child) => self.remove_node(&a[l], &child, path, depth_limit - 1),
				None => {
					warn!("Expected to remove child {} beyond the end of the live child list. Unmounting it anyway.", l);
					self.notify_unmount(&a[l], None, path, depth_limit - 1);
				}
			}
			path.pop();
		}

		let mut i = 0;
		while i < l {
			let child = match self.target.child(live, i) {
				Some(child) => child,
				None => break,
			};
			path.push(i);
			self.update_node(&a[i], &b[i], &child, path, depth_limit - 1);
			path.pop();
			i += 1;
		}
		if i < l {
			error!("Expected child {} beyond the end of the live child list. Switching to insertions.", i);
			for (j, missing) in a.iter().enumerate().take(l).skip(i) {
				path.push(j);
				self.notify_unmount(missing, None, path, depth_limit - 1);
				path.pop();
			}
			l = i;
		}

		for (j, added) in b.iter().enumerate().skip(l) {
			let child = self.materialize_node(added, depth_limit - 1);
			self.target.append_child(live, &child);
			path.push(j);
			self.notify_mount(added, Some(&child), path, depth_limit - 1);
			path.pop();
		}
	}

	/// Events that don't bubble can't go through the simulated bubbling walk and are bound on the node itself.
	/// The handler is looked up at dispatch time, so only presence changes matter here.
	fn update_direct_listeners(&mut self, e_1: &Element, e_2: &Element, live: &T::Node) {
		for &event_type in NON_BUBBLING_EVENTS {
			match (e_1.handler(event_type).is_some(), e_2.handler(event_type).is_some()) {
				(false, true) => self.target.listen(live, event_type),
				(true, false) => self.target.unlisten(live, event_type),
				_ => (),
			}
		}
	}

	fn link(&mut self, live: &T::Node, node: &VNode) {
		let link = match self.target.link(live) {
			Some(link) => link,
			None => {
				let link = self.next_link;
				self.next_link += 1;
				self.target.set_link(live, link);
				link
			}
		};
		self.links.insert(link, node.clone());
	}

	pub(crate) fn unlink(&mut self, live: &T::Node) {
		if let Some(link) = self.target.link(live) {
			self.links.remove(&link);
		}
	}
}

/// Formats the path only with the `log-paths` feature enabled.
pub(crate) struct DisplayPath<'a>(pub &'a Path);
impl core::fmt::Display for DisplayPath<'_> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		if cfg!(feature = "log-paths") {
			core::fmt::Display::fmt(self.0, f)
		} else {
			f.write_str("..")
		}
	}
}
