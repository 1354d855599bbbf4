use mana_dom::{h, Differ, Element, Event, MemoryTarget, NodeId, Proxy, RenderTarget, Style, Thunk, VNode};
use std::{cell::RefCell, rc::Rc};

mod memory_log_;

type Log = Rc<RefCell<Vec<String>>>;

fn logged(element: Element, log: &Log, name: &'static str) -> Element {
	let hook = {
		let log = Rc::clone(log);
		move |event: &mut Event| log.borrow_mut().push(format!("{} {} {}", event.event_type(), name, event.path()))
	};
	element.on("mount", hook.clone()).on("unmount", hook)
}

fn mounted(vdom: &VNode) -> (Differ<MemoryTarget>, NodeId, NodeId) {
	memory_log_::init();

	let mut target = MemoryTarget::new();
	let body = target.create_element("body");
	let mut differ = Differ::new(target);
	let live = differ.append(vdom, &body);
	(differ, body, live)
}

fn fresh_html(vdom: &VNode) -> String {
	let (differ, body, _) = mounted(vdom);
	differ.target().inner_html(body)
}

struct Emphasis;
impl Thunk for Emphasis {
	type Args = String;

	fn render(args: &String) -> VNode {
		h("em").child(args.clone()).into()
	}
}

#[test]
fn equal_but_distinct_trees_write_nothing() {
	let render = || -> VNode { h("div").attr("id", "x").style(Style::new().with("color", "red")).child(h("p").class("a b").child("text")).into() };
	let (mut differ, _, live) = mounted(&render());

	let mutations = differ.target().mutations();
	assert_eq!(differ.update(&render(), &render(), &live), live);
	assert_eq!(differ.target().mutations(), mutations);
}

#[test]
fn replace_matches_fresh_mount() {
	let cases: Vec<(VNode, VNode)> = vec![
		(VNode::text("a"), h("b").child("bold").into()),
		(h("b").child("bold").into(), VNode::text("a")),
		(h("div").attr("id", "x").child("1").into(), h("p").attr("title", "y").child("2").into()),
		(h("div").child("d").into(), Proxy::thunk::<Emphasis>("e".to_owned()).into()),
		(Proxy::thunk::<Emphasis>("e".to_owned()).into(), VNode::text("t")),
		(h("svg").into(), h("div").class("c").into()),
	];

	for (old, next) in cases {
		let old = VNode::from(h("section").child(h("span")).child(old).child(h("span")));
		let next = VNode::from(h("section").child(h("span")).child(next).child(h("span")));

		let (mut differ, body, live) = mounted(&old);
		let live = differ.update(&old, &next, &live);

		assert_eq!(differ.target().inner_html(body), fresh_html(&next));
		assert!(differ.linked(&live).unwrap().ptr_eq(&next));
	}
}

#[test]
fn replace_keeps_position_and_fires_hooks() {
	let log = Log::default();
	let old: VNode = h("div").child("a").child(logged(h("span"), &log, "old")).child("c").into();
	let next: VNode = h("div").child("a").child(logged(h("i"), &log, "new")).child("c").into();

	let (mut differ, _, live) = mounted(&old);
	log.borrow_mut().clear();
	let span = differ.target().children(live)[1];

	differ.update(&old, &next, &live);
	let replacement = differ.target().children(live)[1];
	assert_ne!(span, replacement);
	assert_eq!(differ.target().tag(replacement), Some("i"));
	assert_eq!(differ.target().parent(&span), None);
	assert_eq!(*log.borrow(), ["unmount old /1", "mount new /1"]);
}

#[test]
fn attributes_converge() {
	let a: VNode = h("a").attr("id", "a").attr("title", "t").attr("href", "/a").class("x").style("color: red").into();
	let b: VNode = h("a").attr("id", "b").attr("alt", "x").attr("disabled", true).into();
	let empty: VNode = h("a").into();

	let (mut differ, _, live) = mounted(&a);
	differ.update(&a, &b, &live);
	let target = differ.target();
	assert_eq!(target.attribute_names(live), ["alt", "disabled", "id"]);
	assert_eq!(target.attribute(live, "id"), Some("b"));
	assert_eq!(target.style(live, "color"), None);
	assert_eq!(target.outer_html(live), fresh_html(&b));

	differ.update(&b, &empty, &live);
	assert_eq!(differ.target().attribute_names(live), Vec::<&str>::new());
	assert_eq!(differ.target().outer_html(live), "<a></a>");
}

#[test]
fn class_change_rewrites_class_name() {
	let a: VNode = h("p").class("a b").into();
	let b: VNode = h("p").class("c").into();
	let (mut differ, _, live) = mounted(&a);

	differ.update(&a, &b, &live);
	assert_eq!(differ.target().attribute(live, "class"), Some("c"));
}

#[test]
fn tag_case_change_recreates() {
	let a: VNode = h("div").into();
	let b: VNode = h("DIV").into();
	let (mut differ, _, live) = mounted(&a);

	assert_ne!(differ.update(&a, &b, &live), live);
}

#[test]
fn live_value_is_not_clobbered() {
	let a: VNode = h("input").attr("value", "initial").into();
	let (mut differ, _, live) = mounted(&a);

	differ.target_mut().set_value_as_user(live, "typed");
	let same: VNode = h("input").attr("value", "initial").into();
	differ.update(&a, &same, &live);
	assert_eq!(differ.target().value(&live).as_deref(), Some("typed"));

	let typed: VNode = h("input").attr("value", "typed").into();
	let mutations = differ.target().mutations();
	differ.update(&same, &typed, &live);
	assert_eq!(differ.target().mutations(), mutations);

	let reset: VNode = h("input").attr("value", "").into();
	differ.update(&typed, &reset, &live);
	assert_eq!(differ.target().value(&live).as_deref(), Some(""));
}

#[test]
fn shrink_and_grow() {
	let log = Log::default();
	let list = |items: &[&'static str]| -> VNode { h("ul").extend_children(items.iter().map(|&item| logged(h("li"), &log, item).child(item))).into() };

	let abc = list(&["a", "b", "c"]);
	let (mut differ, _, ul) = mounted(&abc);
	let li_0 = differ.target().children(ul)[0];
	let text_0 = differ.target().children(li_0)[0];
	log.borrow_mut().clear();

	let x = list(&["x"]);
	assert_eq!(differ.update(&abc, &x, &ul), ul);
	assert_eq!(differ.target().children(ul), [li_0]);
	assert_eq!(differ.target().children(li_0), [text_0]);
	assert_eq!(differ.target().text(text_0), Some("x"));
	assert_eq!(*log.borrow(), ["unmount c /2", "unmount b /1"]);
	log.borrow_mut().clear();

	let xyz = list(&["x", "y", "z"]);
	differ.update(&x, &xyz, &ul);
	assert_eq!(differ.target().children(ul)[0], li_0);
	assert_eq!(differ.target().outer_html(ul), "<ul><li>x</li><li>y</li><li>z</li></ul>");
	assert_eq!(*log.borrow(), ["mount y /1", "mount z /2"]);
}

#[test]
fn reordering_is_positional() {
	let ab: VNode = h("ul").child(h("li").child("a")).child(h("li").child("b")).into();
	let ba: VNode = h("ul").child(h("li").child("b")).child(h("li").child("a")).into();
	let (mut differ, _, ul) = mounted(&ab);
	let before = differ.target().children(ul).to_vec();

	differ.update(&ab, &ba, &ul);
	assert_eq!(differ.target().children(ul), before.as_slice());
	assert_eq!(differ.target().outer_html(ul), "<ul><li>b</li><li>a</li></ul>");
}

#[test]
fn shared_children_are_skipped() {
	let children = Rc::new(vec![VNode::from(h("li").child("shared"))]);
	let a: VNode = h("ul").attr("id", "a").with_children(Rc::clone(&children)).into();
	let b: VNode = h("ul").attr("id", "b").with_children(children).into();
	let (mut differ, _, ul) = mounted(&a);

	let mutations = differ.target().mutations();
	differ.update(&a, &b, &ul);
	assert_eq!(differ.target().mutations(), mutations + 1);
}

#[test]
fn depth_limit() {
	memory_log_::init();

	let mut target = MemoryTarget::new();
	let body = target.create_element("body");
	let mut differ = Differ::with_depth_limit(target, 2);
	assert_eq!(differ.depth_limit(), 2);

	let vdom: VNode = h("div").child(h("div").child(h("div").child("deep"))).into();
	differ.append(&vdom, &body);
	assert_eq!(differ.target().inner_html(body), "<div><div></div></div>");
}

#[test]
fn zero_depth_limit_leaves_the_container_alone() {
	memory_log_::init();

	let mut target = MemoryTarget::new();
	let body = target.create_element("body");
	let mut differ = Differ::with_depth_limit(target, 0);

	let vdom: VNode = h("body").attr("id", "root").child(h("p")).into();
	assert_eq!(differ.mount(&vdom, &body), body);
	assert_eq!(differ.target().outer_html(body), "<body></body>");
	assert_eq!(differ.link_count(), 0);
}

#[test]
fn adopting_mount_cuts_off_at_the_depth_limit() {
	memory_log_::init();

	let mut target = MemoryTarget::new();
	let body = target.create_element("body");
	let mut differ = Differ::with_depth_limit(target, 1);

	let vdom: VNode = h("body").attr("id", "root").child(h("p").child("deep")).into();
	differ.mount(&vdom, &body);
	assert_eq!(differ.target().outer_html(body), r#"<body id="root"></body>"#);
}

#[test]
fn dropped_attributes_are_not_removed_either() {
	let a: VNode = h("div").attr("id", "a").attr("data-unlisted", "1").into();
	let b: VNode = h("div").attr("id", "a").into();
	let (mut differ, _, live) = mounted(&a);
	assert_eq!(differ.target().attribute_names(live), ["id"]);

	let mutations = differ.target().mutations();
	differ.update(&a, &b, &live);
	assert_eq!(differ.target().mutations(), mutations);
	assert_eq!(differ.target().attribute_names(live), ["id"]);
}

#[test]
fn missing_live_children_switch_to_insertions() {
	let a: VNode = h("ul").child(h("li").child("a")).child(h("li").child("b")).into();
	let b: VNode = h("ul").child(h("li").child("x")).child(h("li").child("y")).child(h("li").child("z")).into();
	let (mut differ, _, ul) = mounted(&a);

	let li_1 = differ.target().children(ul)[1];
	differ.target_mut().remove_child(&ul, &li_1);

	differ.update(&a, &b, &ul);
	assert_eq!(differ.target().outer_html(ul), "<ul><li>x</li><li>y</li><li>z</li></ul>");
}
