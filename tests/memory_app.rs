use mana_dom::{h, App, Atom, Component, Differ, Event, ManualFrames, MemoryTarget, NodeId, Proxy, RenderTarget, State, Store, VNode};
use std::{cell::Cell, rc::Rc};

mod memory_log_;

fn app(atom: &Atom<i32>, render: impl Fn(&Atom<i32>) -> VNode + 'static) -> (App<Atom<i32>, MemoryTarget>, ManualFrames, NodeId) {
	memory_log_::init();

	let mut target = MemoryTarget::new();
	let body = target.create_element("body");
	let frames = ManualFrames::new();
	let app = App::mount(atom.clone(), Differ::new(target), frames.clone(), &body, render);
	(app, frames, body)
}

fn counter_view(atom: &Atom<i32>) -> VNode {
	let store = atom.clone();
	h("body")
		.child(h("button").on("click", move |_: &mut Event| store.update(|count| *count += 1)).child(atom.snapshot()))
		.into()
}

#[test]
fn redraws_are_coalesced() {
	let atom = Atom::new(0);
	let renders = Rc::new(Cell::new(0));
	let (app, frames, body) = app(&atom, {
		let renders = Rc::clone(&renders);
		move |atom| {
			renders.set(renders.get() + 1);
			counter_view(atom)
		}
	});
	assert_eq!(renders.get(), 1);
	assert!(!app.is_redraw_scheduled());

	atom.set(1);
	atom.set(2);
	atom.update(|count| *count *= 10);
	assert!(app.is_redraw_scheduled());
	assert_eq!(frames.pending(), 1);
	assert_eq!(renders.get(), 1);

	assert_eq!(frames.run_frame(), 1);
	assert!(!app.is_redraw_scheduled());
	assert_eq!(renders.get(), 2);
	assert_eq!(app.with_target(|target| target.outer_html(body)), "<body><button>20</button></body>");

	assert_eq!(frames.run_frame(), 0);
	assert_eq!(renders.get(), 2);
}

#[test]
fn events_drive_redraws() {
	let atom = Atom::new(0);
	let (app, frames, body) = app(&atom, counter_view);
	let button = app.with_target(|target| target.children(body)[0]);

	assert_eq!(app.dispatch(&button, &mut Event::new("click")), 1);
	assert_eq!(app.dispatch(&button, &mut Event::new("click")), 1);
	assert_eq!(atom.get(), 2);
	frames.run_frame();

	assert_eq!(app.with_target(|target| target.children(body).to_vec()), [button]);
	assert_eq!(app.with_target(|target| target.outer_html(button)), "<button>2</button>");
}

#[test]
fn on_redraw_runs_after_each_redraw() {
	let atom = Atom::new(0);
	let (app, frames, _) = app(&atom, counter_view);
	let redraws = Rc::new(Cell::new(0));
	app.on_redraw({
		let redraws = Rc::clone(&redraws);
		move |ui| {
			assert!(ui.as_element().is_some());
			redraws.set(redraws.get() + 1);
		}
	});

	atom.set(1);
	frames.run_frame();
	app.redraw();
	assert_eq!(redraws.get(), 2);
	assert!(app.ui().as_element().is_some());
}

#[test]
#[should_panic(expected = "redraw requested while rendering")]
fn store_mutation_during_render_panics() {
	let atom = Atom::new(0);
	let (_app, frames, _) = app(&atom, |atom| {
		if atom.snapshot() == 1 {
			atom.set(2);
		}
		h("body").into()
	});

	atom.set(1);
	frames.run_frame();
}

#[test]
fn dropping_the_app_unsubscribes() {
	let atom = Atom::new(0);
	let (app, frames, _) = app(&atom, counter_view);
	let handle = app.redraw_handle();

	drop(app);
	atom.set(1);
	handle.request();
	assert_eq!(frames.pending(), 0);
}

#[test]
fn pending_frame_after_drop_does_nothing() {
	let atom = Atom::new(0);
	let (app, frames, _) = app(&atom, counter_view);
	atom.set(1);
	let weak = app.downgrade();
	drop(app);

	assert!(weak.upgrade().is_none());
	assert_eq!(frames.run_frame(), 1);
}

struct Toggle;
impl Component for Toggle {
	type Args = ();
	type State = bool;

	fn init(_: &()) -> bool {
		false
	}

	fn render(_: &(), state: &State<bool>) -> VNode {
		let state = state.clone();
		let on = state.get();
		h("input")
			.attr("type", "checkbox")
			.attr("checked", on)
			.on("click", move |_: &mut Event| state.update(|on| *on = !*on))
			.into()
	}
}

#[test]
fn component_state_with_explicit_redraw() {
	let atom = Atom::new(0);
	let toggle: VNode = Proxy::component::<Toggle>(()).into();
	let (app, frames, body) = app(&atom, move |_| h("body").child(&toggle).into());
	let input = app.with_target(|target| target.children(body)[0]);
	assert!(!app.with_target(|target| target.attribute(input, "checked").is_some()));

	app.dispatch(&input, &mut Event::new("click"));
	assert!(!app.is_redraw_scheduled());
	app.redraw_handle().request();
	frames.run_frame();

	assert_eq!(app.with_target(|target| target.children(body).to_vec()), [input]);
	assert!(app.with_target(|target| target.attribute(input, "checked").is_some()));
}
