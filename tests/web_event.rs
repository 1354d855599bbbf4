#![cfg(all(target_arch = "wasm32", feature = "web"))]

use mana_dom::{
	h,
	web::{install_dispatcher, AnimationFrames, WebTarget},
	App, Atom, Differ, Event, Store, VNode,
};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init_log() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

#[wasm_bindgen_test]
fn click_bubbles_through_the_dispatcher() {
	init_log();

	let document = window().unwrap().document().unwrap();
	let container: web_sys::Node = document.create_element("div").unwrap().into();
	document.body().unwrap().append_child(&container).unwrap();

	let atom = Atom::new(0);
	let outer_clicks = Rc::new(Cell::new(0));
	let app = App::mount(atom.clone(), Differ::new(WebTarget::new(document.clone())), AnimationFrames::from_window().unwrap(), &container, {
		let outer_clicks = Rc::clone(&outer_clicks);
		move |atom: &Atom<i32>| -> VNode {
			let store = atom.clone();
			let outer_clicks = Rc::clone(&outer_clicks);
			h("div")
				.on("click", move |_: &mut Event| outer_clicks.set(outer_clicks.get() + 1))
				.child(
					h("button")
						.attr("id", "mana-dom-test-button")
						.on("click", move |_: &mut Event| store.update(|count| *count += 1))
						.child(atom.snapshot()),
				)
				.into()
		}
	});
	let dispatcher = install_dispatcher(&app).unwrap();

	let button: HtmlElement = document.get_element_by_id("mana-dom-test-button").unwrap().dyn_into().unwrap();
	button.click();
	assert_eq!(atom.get(), 1);
	assert_eq!(outer_clicks.get(), 1);
	assert!(app.is_redraw_scheduled());

	app.redraw();
	assert_eq!(button.text_content().as_deref(), Some("1"));

	drop(dispatcher);
	button.click();
	assert_eq!(atom.get(), 1);

	document.body().unwrap().remove_child(&container).unwrap();
}
