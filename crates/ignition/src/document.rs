//! Boot document (Ignition JSON) codec.
//!
//! The document is kept as an order-preserving JSON tree. Nothing outside
//! `storage.files[*]` is ever interpreted, and entries are only ever replaced
//! wholesale, so untouched entries encode back structurally identical with
//! their key order preserved. Output is compact; string escapes are
//! normalized, so Go-style `\u003e`/`\u0026` come back as raw `>`/`&`.

use serde_json::{Map, Value};

use crate::contents::FileContents;
use crate::error::{ContentError, IgnitionError};

const STORAGE: &str = "storage";
const FILES: &str = "files";
const PATH: &str = "path";
const CONTENTS: &str = "contents";

#[derive(Debug, Clone, PartialEq)]
pub struct BootDocument {
    root: Map<String, Value>,
}

impl BootDocument {
    /// Parses a serialized document and checks that `storage.files` is well formed.
    pub fn decode(raw: &[u8]) -> Result<Self, IgnitionError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| IgnitionError::DocumentDecode {
                message: e.to_string(),
            })?;

        let Value::Object(root) = value else {
            return Err(IgnitionError::DocumentDecode {
                message: "top level is not an object".to_owned(),
            });
        };

        let document = Self { root };
        // validates every entry up front
        document.files()?;
        Ok(document)
    }

    /// Compact JSON with keys in their original order.
    pub fn encode(&self) -> Result<Vec<u8>, IgnitionError> {
        serde_json::to_vec(&self.root).map_err(|e| IgnitionError::DocumentEncode {
            message: e.to_string(),
        })
    }

    fn file_values(&self) -> Result<&Vec<Value>, IgnitionError> {
        self.root
            .get(STORAGE)
            .and_then(Value::as_object)
            .and_then(|storage| storage.get(FILES))
            .and_then(Value::as_array)
            .ok_or_else(|| IgnitionError::DocumentDecode {
                message: "missing `storage.files` list".to_owned(),
            })
    }

    /// Entries of `storage.files`, in document order.
    pub fn files(&self) -> Result<Vec<FileEntry>, IgnitionError> {
        self.file_values()?
            .iter()
            .enumerate()
            .map(|(index, value)| FileEntry::from_value(index, value))
            .collect()
    }

    pub fn file_count(&self) -> Result<usize, IgnitionError> {
        Ok(self.file_values()?.len())
    }

    /// Returns a copy of this document with `storage.files` replaced.
    ///
    /// The replacement must have exactly as many entries as the original.
    pub fn with_files(&self, files: Vec<FileEntry>) -> Result<Self, IgnitionError> {
        let expected = self.file_count()?;
        if files.len() != expected {
            return Err(IgnitionError::DocumentEncode {
                message: format!(
                    "entry count changed from {expected} to {}",
                    files.len()
                ),
            });
        }

        let mut root = self.root.clone();
        let slot = root
            .get_mut(STORAGE)
            .and_then(Value::as_object_mut)
            .and_then(|storage| storage.get_mut(FILES))
            .ok_or_else(|| IgnitionError::DocumentEncode {
                message: "missing `storage.files` list".to_owned(),
            })?;
        *slot = Value::Array(files.into_iter().map(FileEntry::into_value).collect());

        Ok(Self { root })
    }
}

/// One element of `storage.files`.
///
/// All fields are kept as read; only `contents` is ever rewritten, in place.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    path: String,
    fields: Map<String, Value>,
}

impl FileEntry {
    pub(crate) fn from_value(index: usize, value: &Value) -> Result<Self, IgnitionError> {
        let fields = value
            .as_object()
            .ok_or_else(|| IgnitionError::EntryDecode {
                index,
                message: "entry is not an object".to_owned(),
            })?
            .clone();

        let path = fields
            .get(PATH)
            .and_then(Value::as_str)
            .ok_or_else(|| IgnitionError::EntryDecode {
                index,
                message: "entry has no string `path`".to_owned(),
            })?
            .to_owned();

        Ok(Self { path, fields })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Any field of the entry other than `path`, e.g. `mode` or `overwrite`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Classifies the entry's payload envelope.
    pub fn contents(&self) -> Result<FileContents, ContentError> {
        FileContents::from_json(self.fields.get(CONTENTS))
    }

    /// New entry identical to this one except for `contents`, which keeps its
    /// position among the entry's keys.
    pub fn with_contents(&self, contents: &FileContents) -> Result<Self, ContentError> {
        let mut fields = self.fields.clone();
        let slot = fields
            .get_mut(CONTENTS)
            .ok_or(ContentError::MissingContents)?;
        contents.write_into(slot)?;
        Ok(Self {
            path: self.path.clone(),
            fields,
        })
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}
