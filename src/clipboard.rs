use crate::error::{Result, ShiplogError};

/// Clipboard seam so the session can be driven with a fake in tests.
pub trait Clipboard {
    fn copy(&self, text: &str) -> Result<()>;
    fn is_available(&self) -> bool;
}

/// System clipboard via arboard.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ShiplogError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ShiplogError::Clipboard(e.to_string()))
    }

    fn is_available(&self) -> bool {
        arboard::Clipboard::new().is_ok()
    }
}
