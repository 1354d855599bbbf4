//! The redraw driver: re-renders and reconciles once per frame after the store changes.
//!
//! An [`App`] is either idle or has a redraw scheduled. Store notifications and
//! [explicit requests](`App::request_redraw`) schedule one frame callback while idle and are no-ops otherwise,
//! so any number of synchronous mutations within one tick produce exactly one redraw reflecting the final state.
//!
//! Render functions must not mutate the store. Doing so while a redraw is in progress is a fatal contract violation.

use crate::{
	diff::Differ,
	dispatch::run_handlers,
	node::Event,
	target::RenderTarget,
	VNode,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::{instrument, trace, trace_span};

/// A reactive store the [`App`] can observe.
///
/// Listeners must be called synchronously on every committed mutation.
pub trait Store {
	type Snapshot;

	fn subscribe(&self, listener: Rc<dyn Fn()>) -> Subscription;
	fn unsubscribe(&self, subscription: Subscription);
	fn snapshot(&self) -> Self::Snapshot;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// A single shared value that notifies its listeners whenever it's written.
pub struct Atom<T>(Rc<AtomInner<T>>);

struct AtomInner<T> {
	value: RefCell<T>,
	listeners: RefCell<Vec<(Subscription, Rc<dyn Fn()>)>>,
	next_subscription: Cell<u64>,
}

impl<T> Atom<T> {
	#[must_use]
	pub fn new(value: T) -> Self {
		Self(Rc::new(AtomInner {
			value: RefCell::new(value),
			listeners: RefCell::default(),
			next_subscription: Cell::new(0),
		}))
	}

	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.0.value.borrow())
	}

	pub fn set(&self, value: T) {
		*self.0.value.borrow_mut() = value;
		self.notify();
	}

	pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
		let result = f(&mut self.0.value.borrow_mut());
		self.notify();
		result
	}

	/// Listeners added or removed by a listener take effect from the next notification on.
	fn notify(&self) {
		let listeners = self.0.listeners.borrow().iter().map(|(_, listener)| Rc::clone(listener)).collect::<Vec<_>>();
		for listener in listeners {
			listener();
		}
	}
}

impl<T: Clone> Atom<T> {
	#[must_use]
	pub fn get(&self) -> T {
		self.0.value.borrow().clone()
	}
}

impl<T> Clone for Atom<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<T: Debug> Debug for Atom<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Atom")
			.field("value", &self.0.value)
			.field("listeners", &self.0.listeners.borrow().len())
			.finish()
	}
}

impl<T: Clone> Store for Atom<T> {
	type Snapshot = T;

	fn subscribe(&self, listener: Rc<dyn Fn()>) -> Subscription {
		let subscription = Subscription(self.0.next_subscription.get());
		self.0.next_subscription.set(subscription.0 + 1);
		self.0.listeners.borrow_mut().push((subscription, listener));
		subscription
	}

	fn unsubscribe(&self, subscription: Subscription) {
		self.0.listeners.borrow_mut().retain(|(s, _)| *s != subscription);
	}

	fn snapshot(&self) -> T {
		self.get()
	}
}

/// Calls back once per visual frame.
pub trait FrameScheduler {
	fn request_frame(&self, callback: Box<dyn FnOnce()>);
}

/// A [`FrameScheduler`] whose frames are run by hand, for tests and non-visual targets.
#[derive(Clone, Default)]
pub struct ManualFrames(Rc<RefCell<Vec<Box<dyn FnOnce()>>>>);

impl ManualFrames {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of callbacks waiting for the next frame.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.0.borrow().len()
	}

	/// Runs the callbacks requested so far. Callbacks requested meanwhile wait for the next frame.
	///
	/// Returns how many ran.
	pub fn run_frame(&self) -> usize {
		let callbacks = self.0.take();
		let count = callbacks.len();
		for callback in callbacks {
			callback();
		}
		count
	}
}

impl FrameScheduler for ManualFrames {
	fn request_frame(&self, callback: Box<dyn FnOnce()>) {
		self.0.borrow_mut().push(callback);
	}
}

impl Debug for ManualFrames {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ManualFrames").field(&self.pending()).finish()
	}
}

/// A mounted UI that redraws whenever its [`Store`] changes.
///
/// Clones refer to the same app. Dropping the last one unsubscribes from the store,
/// and a frame callback still pending at that point does nothing.
pub struct App<S: Store + 'static, T: RenderTarget + 'static>(Rc<AppInner<S, T>>);

struct AppInner<S: Store + 'static, T: RenderTarget + 'static> {
	store: S,
	render: Box<dyn Fn(&S) -> VNode>,
	differ: RefCell<Differ<T>>,
	scheduler: Box<dyn FrameScheduler>,
	ui: RefCell<VNode>,
	live: RefCell<T::Node>,
	rendering: Cell<bool>,
	redraw_scheduled: Cell<bool>,
	on_redraw: RefCell<Option<Box<dyn FnMut(&VNode)>>>,
	subscription: Cell<Option<Subscription>>,
}

/// Clears the rendering flag even if rendering panics.
struct RenderingGuard<'a>(&'a Cell<bool>);

impl<'a> RenderingGuard<'a> {
	fn new(rendering: &'a Cell<bool>) -> Self {
		rendering.set(true);
		Self(rendering)
	}
}

impl Drop for RenderingGuard<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

impl<S: Store + 'static, T: RenderTarget + 'static> App<S, T> {
	/// Renders once and mounts the result onto `container`, which a root element adopts.
	///
	/// `render` receives the store itself, so anything it constructs can read from it directly.
	#[instrument(skip(store, differ, scheduler, container, render))]
	pub fn mount(store: S, mut differ: Differ<T>, scheduler: impl FrameScheduler + 'static, container: &T::Node, render: impl Fn(&S) -> VNode + 'static) -> Self {
		let rendering = Cell::new(false);
		let (ui, live) = {
			let _guard = RenderingGuard::new(&rendering);
			let ui = render(&store);
			let live = differ.mount(&ui, container);
			(ui, live)
		};

		let inner = Rc::new(AppInner {
			store,
			render: Box::new(render),
			differ: RefCell::new(differ),
			scheduler: Box::new(scheduler),
			ui: RefCell::new(ui),
			live: RefCell::new(live),
			rendering,
			redraw_scheduled: Cell::new(false),
			on_redraw: RefCell::default(),
			subscription: Cell::new(None),
		});

		let weak = Rc::downgrade(&inner);
		let subscription = inner.store.subscribe(Rc::new(move || {
			if let Some(inner) = weak.upgrade() {
				AppInner::invalidate(&inner);
			}
		}));
		inner.subscription.set(Some(subscription));
		Self(inner)
	}

	/// Schedules a redraw like a store change would.
	///
	/// # Panics
	///
	/// Iff called while rendering.
	pub fn request_redraw(&self) {
		AppInner::invalidate(&self.0);
	}

	/// A type-erased [`App::request_redraw`] that doesn't keep the app alive.
	#[must_use]
	pub fn redraw_handle(&self) -> RedrawHandle {
		let weak = Rc::downgrade(&self.0);
		RedrawHandle(Rc::new(move || {
			if let Some(inner) = weak.upgrade() {
				AppInner::invalidate(&inner);
			}
		}))
	}

	/// Re-renders and reconciles right away, whether or not a redraw is scheduled.
	///
	/// # Panics
	///
	/// Iff called while rendering.
	pub fn redraw(&self) {
		self.0.redraw();
	}

	/// Runs after each redraw with the freshly reconciled tree. Replaces any previous hook.
	pub fn on_redraw(&self, hook: impl FnMut(&VNode) + 'static) {
		*self.0.on_redraw.borrow_mut() = Some(Box::new(hook));
	}

	/// A handle that doesn't keep the app alive.
	#[must_use]
	pub fn downgrade(&self) -> WeakApp<S, T> {
		WeakApp(Rc::downgrade(&self.0))
	}

	#[must_use]
	pub fn is_redraw_scheduled(&self) -> bool {
		self.0.redraw_scheduled.get()
	}

	#[must_use]
	pub fn is_rendering(&self) -> bool {
		self.0.rendering.get()
	}

	/// The tree as of the last redraw.
	#[must_use]
	pub fn ui(&self) -> VNode {
		self.0.ui.borrow().clone()
	}

	/// The live node the root of [`App::ui`] is rendered to.
	#[must_use]
	pub fn live(&self) -> T::Node {
		self.0.live.borrow().clone()
	}

	#[must_use]
	pub fn store(&self) -> &S {
		&self.0.store
	}

	pub fn with_target<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(self.0.differ.borrow().target())
	}

	/// Delivers `event` as if it originated at `target`. See [`Differ::dispatch`].
	///
	/// Listeners run after the differ is released, so they may request redraws.
	pub fn dispatch(&self, target: &T::Node, event: &mut Event) -> usize {
		let span = trace_span!("Dispatching app event", event_type = event.event_type());
		let _enter = span.enter();
		let handlers = self.0.differ.borrow().handlers_for(target, event.event_type());
		run_handlers(&handlers, event)
	}
}

impl<S: Store + 'static, T: RenderTarget + 'static> AppInner<S, T> {
	fn invalidate(this: &Rc<Self>) {
		assert!(!this.rendering.get(), "redraw requested while rendering");
		if this.redraw_scheduled.get() {
			return trace!("Redraw already scheduled.");
		}
		this.redraw_scheduled.set(true);
		let weak: Weak<Self> = Rc::downgrade(this);
		this.scheduler.request_frame(Box::new(move || match weak.upgrade() {
			Some(inner) => inner.redraw(),
			None => trace!("App dropped before its redraw."),
		}));
	}

	fn redraw(&self) {
		assert!(!self.rendering.get(), "redraw requested while rendering");
		let span = trace_span!("Redrawing");
		let _enter = span.enter();

		self.redraw_scheduled.set(false);
		let next = {
			let _guard = RenderingGuard::new(&self.rendering);
			let next = (self.render)(&self.store);
			let old = self.ui.borrow().clone();
			let live = self.live.borrow().clone();
			let live = self.differ.borrow_mut().update(&old, &next, &live);
			*self.live.borrow_mut() = live;
			*self.ui.borrow_mut() = next.clone();
			next
		};

		if let Some(hook) = self.on_redraw.borrow_mut().as_mut() {
			hook(&next);
		}
	}
}

impl<S: Store + 'static, T: RenderTarget + 'static> Drop for AppInner<S, T> {
	fn drop(&mut self) {
		if let Some(subscription) = self.subscription.take() {
			self.store.unsubscribe(subscription);
		}
	}
}

impl<S: Store + 'static, T: RenderTarget + 'static> Clone for App<S, T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<S: Store + 'static, T: RenderTarget + 'static> Debug for App<S, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("App")
			.field("rendering", &self.0.rendering.get())
			.field("redraw_scheduled", &self.0.redraw_scheduled.get())
			.field("ui", &self.0.ui)
			.finish_non_exhaustive()
	}
}

/// See [`App::downgrade`].
pub struct WeakApp<S: Store + 'static, T: RenderTarget + 'static>(Weak<AppInner<S, T>>);

impl<S: Store + 'static, T: RenderTarget + 'static> WeakApp<S, T> {
	#[must_use]
	pub fn upgrade(&self) -> Option<App<S, T>> {
		self.0.upgrade().map(App)
	}
}

impl<S: Store + 'static, T: RenderTarget + 'static> Clone for WeakApp<S, T> {
	fn clone(&self) -> Self {
		Self(Weak::clone(&self.0))
	}
}

impl<S: Store + 'static, T: RenderTarget + 'static> Debug for WeakApp<S, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("WeakApp")
	}
}

/// Requests a redraw of the [`App`] it was taken from, if that still exists.
#[derive(Clone)]
pub struct RedrawHandle(Rc<dyn Fn()>);

impl RedrawHandle {
	/// # Panics
	///
	/// Iff the app is rendering.
	pub fn request(&self) {
		(self.0)();
	}
}

impl Debug for RedrawHandle {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("RedrawHandle")
	}
}
