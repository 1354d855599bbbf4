//! Proxy nodes, whose live representation is delegated to a lazily rendered descriptor.
//!
//! A proxy's *family* is its [`Thunk`] or [`Component`] implementation. Only proxies of the same family
//! are reconciled against each other; anything else is diffed through the delegates.
//!
//! The delegate is memoized: reconciling two proxies of one family with equal arguments reuses the old
//! delegate without touching the live tree. Unequal arguments re-render and diff the delegates.

use crate::{lifecycle::Path, VNode};
use core::{
	any::{type_name, Any, TypeId},
	cell::{Cell, Ref, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::{trace, warn};

/// A stateless, memoized render function.
pub trait Thunk: 'static {
	type Args: PartialEq + Debug + 'static;

	fn render(args: &Self::Args) -> VNode;
}

/// A render function with local [`State`] and lifecycle hooks.
///
/// One component descriptor may be mounted in several places at once.
/// The hooks then fire once per occurrence, each with that occurrence's [`Path`].
pub trait Component: 'static {
	type Args: PartialEq + Debug + 'static;
	type State: 'static;

	fn init(args: &Self::Args) -> Self::State;
	fn render(args: &Self::Args, state: &State<Self::State>) -> VNode;

	/// Called after the delegate's own mount hooks.
	#[allow(unused_variables)]
	fn mounted(args: &Self::Args, state: &State<Self::State>, path: &Path) {}

	/// Called after the delegate's own unmount hooks.
	#[allow(unused_variables)]
	fn unmounted(args: &Self::Args, state: &State<Self::State>, path: &Path) {}
}

/// Shared handle to a component's local state.
///
/// Every [`State::update`] bumps a revision counter, which invalidates the component's memoized delegate
/// even if its arguments don't change. Nothing is redrawn by that alone: request a redraw afterwards,
/// for example through [`App::request_redraw`](`crate::App::request_redraw`).
pub struct State<S>(Rc<StateCell<S>>);

struct StateCell<S> {
	value: RefCell<S>,
	revision: Cell<u64>,
}

impl<S> State<S> {
	#[must_use]
	pub fn new(value: S) -> Self {
		Self(Rc::new(StateCell {
			value: RefCell::new(value),
			revision: Cell::new(0),
		}))
	}

	/// # Panics
	///
	/// Iff called from within [`State::update`] on the same state.
	#[must_use]
	pub fn borrow(&self) -> Ref<'_, S> {
		self.0.value.borrow()
	}

	pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
		f(&self.0.value.borrow())
	}

	pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
		let result = f(&mut self.0.value.borrow_mut());
		self.0.revision.set(self.0.revision.get() + 1);
		result
	}

	pub fn set(&self, value: S) {
		self.update(|current| *current = value);
	}

	#[must_use]
	pub fn revision(&self) -> u64 {
		self.0.revision.get()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl<S: Clone> State<S> {
	#[must_use]
	pub fn get(&self) -> S {
		self.0.value.borrow().clone()
	}
}

impl<S> Clone for State<S> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<S: Debug> Debug for State<S> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("State")
			.field("value", &self.0.value)
			.field("revision", &self.0.revision.get())
			.finish()
	}
}

/// A type-erased [`Thunk`] or [`Component`] descriptor.
///
/// Clones share the memoized delegate and, for components, the local state.
#[derive(Clone)]
pub struct Proxy(Rc<dyn ProxyNode>);

impl Proxy {
	#[must_use]
	pub fn thunk<T: Thunk>(args: T::Args) -> Self {
		Self(Rc::new(ThunkNode::<T> {
			args,
			delegate: RefCell::default(),
		}))
	}

	#[must_use]
	pub fn component<C: Component>(args: C::Args) -> Self {
		Self(Rc::new(ComponentNode::<C> {
			args,
			instance: RefCell::default(),
			delegate: RefCell::default(),
		}))
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Proxy) -> bool {
		core::ptr::eq(Rc::as_ptr(&self.0).cast::<()>(), Rc::as_ptr(&other.0).cast::<()>())
	}

	#[must_use]
	pub fn family_name(&self) -> &'static str {
		self.0.family_name()
	}

	#[must_use]
	pub fn same_family(&self, other: &Proxy) -> bool {
		self.0.family() == other.0.family()
	}

	/// Whether both are of the same family and their arguments compare equal.
	#[must_use]
	pub fn same_args(&self, other: &Proxy) -> bool {
		self.same_family(other) && self.0.same_args(&*other.0)
	}

	/// The memoized delegate, rendered now if there is none yet.
	///
	/// This may be stale, see [`Proxy::is_current`].
	#[must_use]
	pub fn delegate(&self) -> VNode {
		self.0.delegate()
	}

	/// Whether the memoized delegate reflects the current local state. Always `true` for thunks.
	///
	/// This is per descriptor. The differ still brings each mounted occurrence up to the memoized delegate individually.
	#[must_use]
	pub fn is_current(&self) -> bool {
		self.0.is_current()
	}

	/// Paths of the places a component is currently mounted at, in mount order.
	#[must_use]
	pub fn locations(&self) -> Vec<Path> {
		self.0.locations()
	}

	/// The local state of a component with state type `S`.
	///
	/// [`None`] for thunks, other state types and components that haven't rendered yet.
	#[must_use]
	pub fn state<S: 'static>(&self) -> Option<State<S>> {
		self.0.state().and_then(|state| state.downcast::<State<S>>().ok()).map(|state| *state)
	}

	pub(crate) fn render_delegate(&self) -> VNode {
		self.0.render_delegate()
	}

	/// Takes over `previous`'s delegate and local state.
	pub(crate) fn adopt(&self, previous: &Proxy) {
		self.0.adopt(&*previous.0);
	}

	/// Takes over `previous`'s local state only.
	pub(crate) fn inherit(&self, previous: &Proxy) {
		self.0.inherit(&*previous.0);
	}

	pub(crate) fn mounted(&self, path: &Path) {
		self.0.mounted(path);
	}

	pub(crate) fn unmounted(&self, path: &Path) {
		self.0.unmounted(path);
	}
}

impl Debug for Proxy {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		self.0.fmt_debug(f)
	}
}

trait ProxyNode {
	fn family(&self) -> TypeId;
	fn family_name(&self) -> &'static str;
	fn as_any(&self) -> &dyn Any;
	fn fmt_debug(&self, f: &mut Formatter<'_>) -> fmt::Result;

	fn delegate(&self) -> VNode;
	fn render_delegate(&self) -> VNode;
	fn is_current(&self) -> bool;
	fn same_args(&self, other: &dyn ProxyNode) -> bool;
	fn adopt(&self, previous: &dyn ProxyNode);
	fn inherit(&self, previous: &dyn ProxyNode);

	fn mounted(&self, path: &Path);
	fn unmounted(&self, path: &Path);
	fn locations(&self) -> Vec<Path>;
	fn state(&self) -> Option<Box<dyn Any>>;
}

struct ThunkNode<T: Thunk> {
	args: T::Args,
	delegate: RefCell<Option<VNode>>,
}

impl<T: Thunk> ProxyNode for ThunkNode<T> {
	fn family(&self) -> TypeId {
		TypeId::of::<T>()
	}

	fn family_name(&self) -> &'static str {
		type_name::<T>()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn fmt_debug(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Thunk")
			.field("family", &type_name::<T>())
			.field("args", &self.args)
			.finish()
	}

	fn delegate(&self) -> VNode {
		let memoized = self.delegate.borrow().clone();
		match memoized {
			Some(delegate) => delegate,
			None => self.render_delegate(),
		}
	}

	fn render_delegate(&self) -> VNode {
		trace!(family = type_name::<T>(), "Rendering thunk");
		let delegate = T::render(&self.args);
		*self.delegate.borrow_mut() = Some(delegate.clone());
		delegate
	}

	fn is_current(&self) -> bool {
		true
	}

	fn same_args(&self, other: &dyn ProxyNode) -> bool {
		other.as_any().downcast_ref::<Self>().map_or(false, |other| self.args == other.args)
	}

	fn adopt(&self, previous: &dyn ProxyNode) {
		if let Some(previous) = previous.as_any().downcast_ref::<Self>() {
			let delegate = previous.delegate.borrow().clone();
			*self.delegate.borrow_mut() = delegate;
		}
	}

	fn inherit(&self, _previous: &dyn ProxyNode) {}

	fn mounted(&self, _path: &Path) {}

	fn unmounted(&self, _path: &Path) {}

	fn locations(&self) -> Vec<Path> {
		Vec::new()
	}

	fn state(&self) -> Option<Box<dyn Any>> {
		None
	}
}

struct ComponentNode<C: Component> {
	args: C::Args,
	instance: RefCell<Option<Rc<Instance<C::State>>>>,
	/// The delegate and the state revision it was rendered at.
	delegate: RefCell<Option<(u64, VNode)>>,
}

struct Instance<S> {
	state: State<S>,
	locations: RefCell<Vec<Path>>,
}

impl<C: Component> ComponentNode<C> {
	fn instance(&self) -> Rc<Instance<C::State>> {
		if let Some(instance) = &*self.instance.borrow() {
			return Rc::clone(instance);
		}
		let instance = Rc::new(Instance {
			state: State::new(C::init(&self.args)),
			locations: RefCell::default(),
		});
		*self.instance.borrow_mut() = Some(Rc::clone(&instance));
		instance
	}
}

impl<C: Component> ProxyNode for ComponentNode<C> {
	fn family(&self) -> TypeId {
		TypeId::of::<C>()
	}

	fn family_name(&self) -> &'static str {
		type_name::<C>()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn fmt_debug(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("family", &type_name::<C>())
			.field("args", &self.args)
			.field("locations", &self.locations())
			.finish()
	}

	fn delegate(&self) -> VNode {
		let memoized = self.delegate.borrow().as_ref().map(|(_, delegate)| delegate.clone());
		match memoized {
			Some(delegate) => delegate,
			None => self.render_delegate(),
		}
	}

	fn render_delegate(&self) -> VNode {
		trace!(family = type_name::<C>(), "Rendering component");
		let instance = self.instance();
		let revision = instance.state.revision();
		let delegate = C::render(&self.args, &instance.state);
		*self.delegate.borrow_mut() = Some((revision, delegate.clone()));
		delegate
	}

	fn is_current(&self) -> bool {
		let rendered_at = self.delegate.borrow().as_ref().map(|(revision, _)| *revision);
		match (&*self.instance.borrow(), rendered_at) {
			(Some(instance), Some(revision)) => instance.state.revision() == revision,
			_ => true,
		}
	}

	fn same_args(&self, other: &dyn ProxyNode) -> bool {
		other.as_any().downcast_ref::<Self>().map_or(false, |other| self.args == other.args)
	}

	fn adopt(&self, previous: &dyn ProxyNode) {
		if let Some(previous) = previous.as_any().downcast_ref::<Self>() {
			let (instance, delegate) = (previous.instance.borrow().clone(), previous.delegate.borrow().clone());
			*self.instance.borrow_mut() = instance;
			*self.delegate.borrow_mut() = delegate;
		}
	}

	fn inherit(&self, previous: &dyn ProxyNode) {
		if let Some(previous) = previous.as_any().downcast_ref::<Self>() {
			let instance = previous.instance.borrow().clone();
			*self.instance.borrow_mut() = instance;
		}
	}

	fn mounted(&self, path: &Path) {
		let instance = self.instance();
		instance.locations.borrow_mut().push(path.clone());
		C::mounted(&self.args, &instance.state, path);
	}

	fn unmounted(&self, path: &Path) {
		let instance = self.instance();
		let position = instance.locations.borrow().iter().position(|location| location == path);
		match position {
			Some(position) => {
				instance.locations.borrow_mut().remove(position);
			}
			None => warn!(family = type_name::<C>(), %path, "Unmounting a component occurrence that was never recorded as mounted."),
		}
		C::unmounted(&self.args, &instance.state, path);
	}

	fn locations(&self) -> Vec<Path> {
		self.instance
			.borrow()
			.as_ref()
			.map(|instance| instance.locations.borrow().clone())
			.unwrap_or_default()
	}

	fn state(&self) -> Option<Box<dyn Any>> {
		self.instance.borrow().as_ref().map(|instance| Box::new(instance.state.clone()) as Box<dyn Any>)
	}
}
