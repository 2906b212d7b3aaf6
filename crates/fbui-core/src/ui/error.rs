//! Error type for structural tree operations and configuration loading

use thiserror_no_std::Error;

/// Errors reported by operations that change the shape of the widget tree.
///
/// Everything else in the toolkit degrades to a silent no-op instead of
/// failing, so a display loop can ignore these results with `.ok()` and keep
/// running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    #[error("widget handle is stale or belongs to another tree")]
    StaleWidget,
    #[error("widget is not a container")]
    NotAContainer,
    #[error("widget already has a parent")]
    AlreadyParented,
    #[error("adding the widget would create a cycle")]
    WouldCycle,
    #[error("widget is not a child of this container")]
    NotAChild,
    #[error("configuration error: {0}")]
    Config(heapless::String<64>),
}
