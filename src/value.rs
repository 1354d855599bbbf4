//! Parameter values as they are stored on [`Element`](`crate::Element`)s and handed to the [codec](`crate::codec`).

use crate::node::{Event, Handler};
use core::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// A single element parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Str(Rc<str>),
	Number(f64),
	Bool(bool),
	Style(Style),
}

impl Value {
	/// Truthiness used by pseudo-attributes like `isfocused`.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Str(s) => !s.is_empty(),
			Value::Number(n) => *n != 0.0 && !n.is_nan(),
			Value::Bool(b) => *b,
			Value::Style(_) => true,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Str(s) => f.write_str(s),
			Value::Number(n) => Display::fmt(n, f),
			Value::Bool(b) => Display::fmt(b, f),
			Value::Style(style) => Display::fmt(style, f),
		}
	}
}

impl From<&Value> for Value {
	fn from(value: &Value) -> Self {
		value.clone()
	}
}
impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.into())
	}
}
impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s.into())
	}
}
impl From<Rc<str>> for Value {
	fn from(s: Rc<str>) -> Self {
		Value::Str(s)
	}
}
impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}
impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::Number(n)
	}
}
impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Value::Number(n.into())
	}
}
impl From<u32> for Value {
	fn from(n: u32) -> Self {
		Value::Number(n.into())
	}
}
impl From<Style> for Value {
	fn from(style: Style) -> Self {
		Value::Style(style)
	}
}

/// Inline style as an ordered mapping from property to value.
///
/// Styles are merged into the live style property by property and never replace it wholesale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style(Vec<(String, String)>);

impl Style {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a `property: value; property: value` declaration list.
	///
	/// Declarations without a `:` or with an empty property name are skipped.
	#[must_use]
	pub fn parse(declarations: &str) -> Self {
		declarations
			.split(';')
			.filter_map(|declaration| declaration.split_once(':'))
			.map(|(property, value)| (property.trim(), value.trim()))
			.filter(|(property, _)| !property.is_empty())
			.collect()
	}

	#[must_use]
	pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(property, value);
		self
	}

	/// Sets `property`, overwriting a previous value in place.
	pub fn insert(&mut self, property: impl Into<String>, value: impl Into<String>) {
		let (property, value) = (property.into(), value.into());
		match self.0.iter_mut().find(|(p, _)| *p == property) {
			Some((_, v)) => *v = value,
			None => self.0.push((property, value)),
		}
	}

	#[must_use]
	pub fn get(&self, property: &str) -> Option<&str> {
		self.0.iter().find(|(p, _)| p == property).map(|(_, v)| v.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(p, v)| (p.as_str(), v.as_str()))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<P: Into<String>, V: Into<String>> FromIterator<(P, V)> for Style {
	fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
		let mut style = Style::new();
		for (property, value) in iter {
			style.insert(property, value);
		}
		style
	}
}

impl From<&str> for Style {
	fn from(declarations: &str) -> Self {
		Self::parse(declarations)
	}
}

impl Display for Style {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		for (i, (property, value)) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(" ")?;
			}
			write!(f, "{}: {};", property, value)?;
		}
		Ok(())
	}
}

/// Input form of the `class` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Class {
	/// Appended to `className` verbatim.
	Name(String),
	/// The names mapped to `true` are appended, in order.
	Map(Vec<(String, bool)>),
}

impl Class {
	/// The class names this contributes to `className`.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		let (name, map) = match self {
			Class::Name(name) => (Some(name.as_str()), &[][..]),
			Class::Map(map) => (None, map.as_slice()),
		};
		name.into_iter().chain(map.iter().filter(|(_, on)| *on).map(|(name, _)| name.as_str()))
	}
}

impl From<&str> for Class {
	fn from(name: &str) -> Self {
		Class::Name(name.to_owned())
	}
}
impl From<String> for Class {
	fn from(name: String) -> Self {
		Class::Name(name)
	}
}
impl<S: Into<String>> From<Vec<(S, bool)>> for Class {
	fn from(map: Vec<(S, bool)>) -> Self {
		Class::Map(map.into_iter().map(|(name, on)| (name.into(), on)).collect())
	}
}
impl<S: Into<String>, const N: usize> From<[(S, bool); N]> for Class {
	fn from(map: [(S, bool); N]) -> Self {
		Class::Map(map.into_iter().map(|(name, on)| (name.into(), on)).collect())
	}
}

/// Raw constructor input for [`Element::merge_params`](`crate::Element::merge_params`).
#[derive(Clone)]
pub enum Param {
	Value(Value),
	Class(Class),
	Handler(Handler),
}

impl Param {
	pub fn handler(handler: impl Fn(&mut Event) + 'static) -> Self {
		Param::Handler(Rc::new(handler))
	}
}

impl fmt::Debug for Param {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Param::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Param::Class(class) => f.debug_tuple("Class").field(class).finish(),
			Param::Handler(_) => f.write_str("Handler(..)"),
		}
	}
}

macro_rules! param_from_value {
	($($ty:ty),*$(,)?) => {$(
		impl From<$ty> for Param {
			fn from(value: $ty) -> Self {
				Param::Value(value.into())
			}
		}
	)*};
}
param_from_value!(Value, &str, String, Rc<str>, bool, f64, i32, u32, Style);

impl From<Class> for Param {
	fn from(class: Class) -> Self {
		Param::Class(class)
	}
}
