//! Clipboard collaborator contract
//!
//! The concrete subprocess-backed implementation lives in the front-end;
//! the core only depends on this trait so `/copy` and the copy key binding
//! stay testable.

use crate::error::ClipboardError;

/// Copy text to the system clipboard.
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Placeholder used when no clipboard integration is wired in.
#[derive(Debug, Default)]
pub struct NullClipboard;

impl Clipboard for NullClipboard {
    fn copy(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::UnsupportedPlatform {
            platform: "no clipboard configured".to_string(),
        })
    }
}
