use std::collections::BTreeMap;

use bytes::Bytes;

/// One uploaded file, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A parsed `multipart/form-data` body: text values and files grouped by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub values: BTreeMap<String, Vec<String>>,
    pub files: BTreeMap<String, Vec<FilePart>>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value submitted for `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn push_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    pub fn push_file(&mut self, key: impl Into<String>, file: FilePart) {
        self.files.entry(key.into()).or_default().push(file);
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_value(key, value);
        self
    }

    pub fn with_file(mut self, key: impl Into<String>, file: FilePart) -> Self {
        self.push_file(key, file);
        self
    }
}
