//! Best-effort clipboard access for the "Copy Translation" intent.

/// Copy `text` to the system clipboard. Returns whether it worked;
/// failures are logged, never raised.
pub fn copy(text: &str) -> bool {
    let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "clipboard copy failed");
            false
        }
    }
}
