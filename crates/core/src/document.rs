//! Opaque configuration-document contract.
//!
//! VM and host settings are represented by a document model that lives
//! outside this repository. The SDK forwards documents as text without
//! inspecting them.

use parking_lot::Mutex;

use hvx_runtime::Result;

/// Text round-trip contract the SDK forwards opaquely.
pub trait ConfigDocument: Send + Sync {
    /// Serializes the document to its text form.
    fn to_text(&self) -> Result<String>;

    /// Replaces the document contents from text.
    fn from_text(&self, text: &str) -> Result<()>;
}

/// Passthrough document holding raw text. Useful for embedders that manage
/// configuration themselves and for tests.
pub struct TextDocument {
    text: Mutex<String>,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
        }
    }
}

impl ConfigDocument for TextDocument {
    fn to_text(&self) -> Result<String> {
        Ok(self.text.lock().clone())
    }

    fn from_text(&self, text: &str) -> Result<()> {
        *self.text.lock() = text.to_owned();
        Ok(())
    }
}
