use mana_dom::{h, Component, Differ, MemoryTarget, NodeId, Path, Proxy, RenderTarget, State, Thunk, VNode};
use std::cell::{Cell, RefCell};

mod memory_log_;

thread_local! {
	static RENDERS: Cell<usize> = Cell::new(0);
	static HOOKS: RefCell<Vec<String>> = RefCell::default();
}

fn renders() -> usize {
	RENDERS.with(Cell::get)
}

fn hooks() -> Vec<String> {
	HOOKS.with(|hooks| hooks.borrow_mut().drain(..).collect())
}

struct Label;
impl Thunk for Label {
	type Args = String;

	fn render(args: &String) -> VNode {
		RENDERS.with(|renders| renders.set(renders.get() + 1));
		h("span").child(args.clone()).into()
	}
}

struct Other;
impl Thunk for Other {
	type Args = String;

	fn render(args: &String) -> VNode {
		h("span").child(args.clone()).into()
	}
}

struct Counter;
impl Component for Counter {
	type Args = &'static str;
	type State = i32;

	fn init(_: &&'static str) -> i32 {
		0
	}

	fn render(args: &&'static str, state: &State<i32>) -> VNode {
		RENDERS.with(|renders| renders.set(renders.get() + 1));
		h("button").attr("title", *args).child(state.get()).into()
	}

	fn mounted(args: &&'static str, _: &State<i32>, path: &Path) {
		HOOKS.with(|hooks| hooks.borrow_mut().push(format!("mounted {} {}", args, path)));
	}

	fn unmounted(args: &&'static str, _: &State<i32>, path: &Path) {
		HOOKS.with(|hooks| hooks.borrow_mut().push(format!("unmounted {} {}", args, path)));
	}
}

fn mounted(vdom: &VNode) -> (Differ<MemoryTarget>, NodeId, NodeId) {
	memory_log_::init();

	let mut target = MemoryTarget::new();
	let body = target.create_element("body");
	let mut differ = Differ::new(target);
	let live = differ.append(vdom, &body);
	(differ, body, live)
}

fn proxy(vdom: &VNode) -> &Proxy {
	vdom.as_proxy().unwrap()
}

#[test]
fn thunk_with_equal_args_reuses_delegate() {
	let old: VNode = Proxy::thunk::<Label>("a".to_owned()).into();
	let (mut differ, _, live) = mounted(&old);
	assert_eq!(renders(), 1);

	let next: VNode = Proxy::thunk::<Label>("a".to_owned()).into();
	let mutations = differ.target().mutations();
	assert_eq!(differ.update(&old, &next, &live), live);

	assert_eq!(differ.target().mutations(), mutations);
	assert!(proxy(&next).delegate().ptr_eq(&proxy(&old).delegate()));
	assert_eq!(renders(), 1);
}

#[test]
fn thunk_with_unequal_args_diffs_delegates() {
	let old: VNode = Proxy::thunk::<Label>("a".to_owned()).into();
	let (mut differ, _, live) = mounted(&old);

	let next: VNode = Proxy::thunk::<Label>("b".to_owned()).into();
	let mutations = differ.target().mutations();
	assert_eq!(differ.update(&old, &next, &live), live);

	assert_eq!(differ.target().mutations(), mutations + 1);
	assert_eq!(differ.target().outer_html(live), "<span>b</span>");
	assert_eq!(renders(), 2);
}

#[test]
fn different_families_are_replaced() {
	let old: VNode = Proxy::thunk::<Label>("a".to_owned()).into();
	let (mut differ, body, live) = mounted(&old);

	let next: VNode = Proxy::thunk::<Other>("a".to_owned()).into();
	assert!(!proxy(&old).same_family(proxy(&next)));
	let replacement = differ.update(&old, &next, &live);

	assert_ne!(replacement, live);
	assert_eq!(differ.target().children(body), [replacement]);
}

#[test]
fn component_state_invalidates_delegate() {
	let counter: VNode = Proxy::component::<Counter>("c").into();
	let old: VNode = h("div").child(&counter).into();
	let (mut differ, _, div) = mounted(&old);
	let button = differ.target().children(div)[0];
	assert_eq!(differ.target().outer_html(button), r#"<button title="c">0</button>"#);

	let state = proxy(&counter).state::<i32>().unwrap();
	let mutations = differ.target().mutations();
	assert_eq!(differ.update(&counter, &counter, &button), button);
	assert_eq!(differ.target().mutations(), mutations);

	state.set(5);
	assert!(!proxy(&counter).is_current());
	let next: VNode = h("div").child(&counter).into();
	differ.update(&old, &next, &div);

	assert!(proxy(&counter).is_current());
	assert_eq!(differ.target().children(div), [button]);
	assert_eq!(differ.target().outer_html(button), r#"<button title="c">5</button>"#);
}

#[test]
fn component_keeps_state_across_argument_changes() {
	let old: VNode = Proxy::component::<Counter>("a").into();
	let (mut differ, _, live) = mounted(&old);
	let state = proxy(&old).state::<i32>().unwrap();
	state.update(|count| *count += 3);

	let next: VNode = Proxy::component::<Counter>("b").into();
	assert_eq!(differ.update(&old, &next, &live), live);

	assert_eq!(differ.target().outer_html(live), r#"<button title="b">3</button>"#);
	assert!(proxy(&next).state::<i32>().unwrap().ptr_eq(&state));
	assert_eq!(proxy(&next).locations(), [Path::root()]);
	assert_eq!(state.revision(), 1);
}

#[test]
fn component_occurrences_are_tracked_by_path() {
	let counter: VNode = Proxy::component::<Counter>("c").into();
	let twice: VNode = h("div").child(&counter).child(&counter).into();
	let (mut differ, _, div) = mounted(&twice);

	assert_eq!(hooks(), ["mounted c /0", "mounted c /1"]);
	assert_eq!(proxy(&counter).locations(), [Path::from([0]), Path::from([1])]);
	assert_eq!(differ.target().inner_html(div), r#"<button title="c">0</button><button title="c">0</button>"#);

	let once: VNode = h("div").child(&counter).into();
	differ.update(&twice, &once, &div);
	assert_eq!(hooks(), ["unmounted c /1"]);
	assert_eq!(proxy(&counter).locations(), [Path::from([0])]);

	let plain: VNode = h("div").child(h("p")).into();
	differ.update(&once, &plain, &div);
	assert_eq!(hooks(), ["unmounted c /0"]);
	assert!(proxy(&counter).locations().is_empty());
	assert_eq!(differ.target().inner_html(div), "<p></p>");
}

#[test]
fn every_occurrence_catches_up_with_state() {
	let counter: VNode = Proxy::component::<Counter>("c").into();
	let old: VNode = h("div").child(&counter).child(&counter).into();
	let (mut differ, _, div) = mounted(&old);
	let state = proxy(&counter).state::<i32>().unwrap();

	state.set(5);
	let next: VNode = h("div").child(&counter).child(&counter).into();
	differ.update(&old, &next, &div);
	assert_eq!(differ.target().inner_html(div), r#"<button title="c">5</button><button title="c">5</button>"#);
	for button in differ.target().children(div) {
		assert!(differ.linked(button).unwrap().ptr_eq(&proxy(&counter).delegate()));
	}

	let mutations = differ.target().mutations();
	let again: VNode = h("div").child(&counter).child(&counter).into();
	differ.update(&next, &again, &div);
	assert_eq!(differ.target().mutations(), mutations);
}

#[test]
fn shared_occurrence_catches_up_through_equal_arguments() {
	let counter: VNode = Proxy::component::<Counter>("c").into();
	let old: VNode = h("div").child(&counter).child(&counter).into();
	let (mut differ, _, div) = mounted(&old);

	proxy(&counter).state::<i32>().unwrap().set(2);
	let refreshed: VNode = Proxy::component::<Counter>("c").into();
	let next: VNode = h("div").child(&counter).child(&refreshed).into();
	differ.update(&old, &next, &div);

	assert_eq!(differ.target().inner_html(div), r#"<button title="c">2</button><button title="c">2</button>"#);
}

#[test]
fn element_to_component_mounts_it() {
	let old: VNode = h("div").child(h("button").attr("title", "c").child("0")).into();
	let (mut differ, _, div) = mounted(&old);
	let button = differ.target().children(div)[0];
	let _ = hooks();

	let counter: VNode = Proxy::component::<Counter>("c").into();
	let next: VNode = h("div").child(&counter).into();
	let mutations = differ.target().mutations();
	differ.update(&old, &next, &div);

	assert_eq!(differ.target().children(div), [button]);
	assert_eq!(differ.target().mutations(), mutations);
	assert_eq!(hooks(), ["mounted c /0"]);
	assert!(differ.linked(&button).unwrap().ptr_eq(&proxy(&counter).delegate()));
}

#[test]
fn thunk_state_is_none() {
	let thunk = Proxy::thunk::<Label>("a".to_owned());
	assert!(thunk.state::<i32>().is_none());
	assert!(thunk.locations().is_empty());

	let counter = Proxy::component::<Counter>("c");
	assert!(counter.state::<i32>().is_none());
	let _ = counter.delegate();
	assert!(counter.state::<String>().is_none());
	assert_eq!(counter.state::<i32>().unwrap().get(), 0);
}
