use thiserror::Error;

/// Rejected descriptor input.
///
/// Reconciliation itself is total and never returns an error.
/// These are raised eagerly while building descriptors, so that bad input is never silently coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("invalid element tag name {0:?}")]
	InvalidTagName(String),

	#[error("parameter {key:?} can't hold an event handler; handler keys have the form `on<event>`")]
	UnsupportedHandlerKey { key: String },
}
