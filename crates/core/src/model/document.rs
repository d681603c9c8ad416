use std::fmt;
use thiserror::Error;

/// Content type used when the picker does not report one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("no document selected")]
    Missing,
}

/// Binary document chosen by the learner, uploaded as-is to the generator.
///
/// Content is never inspected here; the picker is responsible for format checks.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl Document {
    /// Wrap document bytes with the default PDF content type.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Missing` if `bytes` is empty.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DocumentError> {
        Self::with_content_type(file_name, DEFAULT_CONTENT_TYPE, bytes)
    }

    /// # Errors
    ///
    /// Returns `DocumentError::Missing` if `bytes` is empty.
    pub fn with_content_type(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::Missing);
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_missing() {
        let err = Document::new("notes.pdf", Vec::new()).unwrap_err();
        assert_eq!(err, DocumentError::Missing);
    }

    #[test]
    fn debug_hides_payload() {
        let doc = Document::new("notes.pdf", vec![1, 2, 3]).unwrap();
        assert_eq!(doc.content_type(), DEFAULT_CONTENT_TYPE);
        let printed = format!("{doc:?}");
        assert!(printed.contains("len: 3"));
        assert!(!printed.contains("[1, 2, 3]"));
    }
}
