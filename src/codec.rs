//! Translates element parameters into rendering-target attribute, style and class writes.
//!
//! Keys are checked in this order:
//!
//! 1. `style` is merged into the live style property by property. String styles are parsed first.
//! 2. `isfocused` requests a deferred focus when truthy. HTML has no such attribute.
//! 3. `value` is only written if it differs from the live value, so user input isn't clobbered.
//! 4. `className`/`class` go to the class field directly, or token by token where that isn't a plain string (SVG).
//! 5. Anything else must be in the [attribute whitelist](`is_whitelisted`) or is dropped silently.
//!    Booleans are written as native properties.

use crate::{target::RenderTarget, value::Style, Value};
use hashbrown::HashSet;
use tracing::{instrument, trace};

const ATTRIBUTE_WHITELIST: &[&str] = &[
	"align", "alt", "bgcolor", "border", "char", "charoff", "charset", "cite", "compact", "disabled", "height", "href", "hspace", "longdesc", "name", "size", "src", "target", "type", "valign",
	"value", "vspace", "width", "abbr", "axis", "colspan", "nowrap", "rowspan", "scope", "label", "readonly", "cols", "rows", "accept", "span", "accept-charset", "action", "enctype", "method",
	"checked", "maxlength", "for", "start", "selected", "multiple", "cellpadding", "cellspacing", "frame", "rules", "summary", "headers", "autofocus", "id", "className", "placeholder",
	"role", "tabindex", "hidden", "draggable", "autocomplete", "accentHeight", "accumulate", "additive", "alphabetic", "amplitude", "arabicForm", "ascent", "attributeName", "attributeType",
	"azimuth", "baseFrequency", "baseProfile", "bbox", "begin", "bias", "by", "calcMode", "capHeight", "clipPathUnits", "contentScriptType", "contentStyleType", "cx", "cy", "d", "descent",
	"diffuseConstant", "divisor", "dur", "dx", "dy", "edgeMode", "elevation", "end", "exponent", "externalResourcesRequired", "fill", "filterRes", "filterUnits", "fontFamily", "fontSize",
	"fontStretch", "fontStyle", "format", "from", "fx", "fy", "g1", "g2", "glyphame", "glyphRef", "gradientTransform", "gradientUnits", "hanging", "horizAdvX", "horizOriginX", "horizOriginY",
	"ideographic", "in", "in2", "intercept", "k", "k1", "k2", "k3", "k4", "kernelMatrix", "kernelUnitLength", "keyPoints", "keySplines", "keyTimes", "lang", "lengthAdjust",
	"limitingConeAngle", "local", "markerHeight", "markerUnits", "markerWidth", "maskContentUnits", "maskUnits", "mathematical", "max", "media", "min", "mode", "numOctaves", "offset",
	"operator", "order", "orient", "orientation", "origin", "overlinePosition", "overlineThickness", "panose1", "path", "pathLength", "patternContentUnits", "patternTransform", "patternUnits",
	"points", "pointsAtX", "pointsAtY", "pointsAtZ", "preserveAlpha", "preserveAspectRatio", "primitiveUnits", "r", "radius", "refX", "refY", "renderingIntent", "repeatCount", "repeatDur",
	"requiredExtensions", "requiredFeatures", "restart", "result", "rotate", "rx", "ry", "scale", "seed", "slope", "spacing", "specularConstant", "specularExponent", "spreadMethod",
	"startOffset", "stdDeviation", "stemh", "stemv", "stitchTiles", "strikethroughPosition", "strikethroughThickness", "string", "style", "surfaceScale", "systemLanguage", "tableValues",
	"targetX", "targetY", "textLength", "title", "to", "transform", "u1", "u2", "underlinePosition", "underlineThickness", "unicode", "unicodeRange", "unitsPerEm", "vAlphabetic", "vHanging",
	"vIdeographic", "vMathematical", "values", "version", "vertAdvY", "vertOriginX", "vertOriginY", "viewBox", "viewTarget", "widths", "x", "xHeight", "x1", "x2", "xChannelSelector", "xlink",
	"xml", "y", "y1", "y2", "yChannelSelector", "z", "zoomAndPan", "alignmentBaseline", "baselineShift", "clipPath", "clipRule", "clip", "colorInterpolationFilters", "colorInterpolation",
	"colorProfile", "colorRendering", "color", "direction", "display", "dominantBaseline", "enableBackground", "fillOpacity", "fillRule", "filter", "floodColor", "floodOpacity",
	"fontSizeAdjust", "fontVariant", "fontWeight", "glyphOrientationHorizontal", "glyphOrientationVertical", "imageRendering", "kerning", "letterSpacing", "lightingColor", "markerEnd",
	"markerMid", "markerStart", "mask", "opacity", "overflow", "pointerEvents", "shapeRendering", "stopColor", "stopOpacity", "strokeDasharray", "strokeDashoffset", "strokeLinecap",
	"strokeLinejoin", "strokeMiterlimit", "strokeOpacity", "strokeWidth", "stroke", "textAnchor", "textDecoration", "textRendering", "unicodeBidi", "visibility", "wordSpacing", "writingMode",
];

thread_local! {
	static WHITELIST: HashSet<&'static str> = ATTRIBUTE_WHITELIST.iter().copied().collect();
}

/// Whether `key` may be written as a generic attribute.
///
/// Parameter keys outside this set (typos, bookkeeping keys) never leak onto live nodes.
#[must_use]
pub fn is_whitelisted(key: &str) -> bool {
	WHITELIST.with(|whitelist| whitelist.contains(key))
}

/// Writes one parameter onto `node`.
#[instrument(level = "trace", skip(target))]
pub fn set_attribute<T: RenderTarget>(target: &mut T, node: &T::Node, key: &str, value: &Value) {
	match key {
		"style" => match value {
			Value::Style(style) => set_style(target, node, style),
			Value::Str(declarations) => set_style(target, node, &Style::parse(declarations)),
			_ => trace!("Dropping non-style `style` value."),
		},
		"isfocused" => {
			if value.is_truthy() {
				target.request_focus(node);
			}
		}
		"value" => {
			let value = value.to_string();
			if target.value(node).as_deref() == Some(value.as_str()) {
				trace!("Live value already up to date.");
			} else {
				target.set_value(node, &value);
			}
		}
		"className" | "class" => {
			let class_name = value.to_string();
			if target.class_name_is_string(node) {
				target.set_class_name(node, &class_name);
			} else {
				for token in class_name.split_ascii_whitespace() {
					target.add_class(node, token);
				}
			}
		}
		key if is_whitelisted(key) => match *value {
			Value::Bool(value) => target.set_property(node, key, value),
			ref value => target.set_attribute(node, key, &value.to_string()),
		},
		_ => trace!("Dropping attribute that's not whitelisted."),
	}
}

/// Clears one parameter from `node`.
///
/// Clearing the class assigns an empty string instead of removing the attribute,
/// since some targets keep cached styling after the class attribute is removed.
/// Keys [`set_attribute`] drops are never written, so there's nothing to clear for them either.
#[instrument(level = "trace", skip(target))]
pub fn remove_attribute<T: RenderTarget>(target: &mut T, node: &T::Node, key: &str) {
	match key {
		"className" | "class" => target.set_class_name(node, ""),
		"isfocused" => (),
		key if is_whitelisted(key) => target.remove_attribute(node, key),
		_ => trace!("Skipping attribute that was never written."),
	}
}

fn set_style<T: RenderTarget>(target: &mut T, node: &T::Node, style: &Style) {
	for (property, value) in style.iter() {
		target.set_style(node, property, value);
	}
}
