//! Start operation types.
//!
//! Submitting a build: a form-encoded POST whose optional `replace` field
//! carries the content of locally modified files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::fields;
use crate::error::ProtocolError;

/// Path → content map of files to substitute server-side.
///
/// Keys are kept sorted so the encoded field is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceMap(BTreeMap<String, String>);

impl ReplaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.0.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Encode as the JSON list of single-entry objects the service expects:
    /// `[{"path": "content"}, ...]`.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let list: Vec<Value> = self
            .0
            .iter()
            .map(|(path, content)| {
                let mut entry = Map::new();
                entry.insert(path.clone(), Value::String(content.clone()));
                Value::Object(entry)
            })
            .collect();
        Ok(serde_json::to_string(&list)?)
    }

    /// Decode an encoded `replace` field. Accepts the list form produced by
    /// [`ReplaceMap::encode`] as well as a plain object.
    pub fn decode(encoded: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(encoded)
            .map_err(|e| ProtocolError::Malformed(format!("replace field: {}", e)))?;

        let mut map = ReplaceMap::new();
        let mut take_object = |obj: &Map<String, Value>| -> Result<(), ProtocolError> {
            for (path, content) in obj {
                let content = content.as_str().ok_or_else(|| {
                    ProtocolError::Malformed(format!("replace content for `{}` is not a string", path))
                })?;
                map.insert(path.clone(), content);
            }
            Ok(())
        };

        match &value {
            Value::Array(entries) => {
                for entry in entries {
                    let obj = entry.as_object().ok_or_else(|| {
                        ProtocolError::Malformed("replace entry is not an object".to_string())
                    })?;
                    take_object(obj)?;
                }
            }
            Value::Object(obj) => take_object(obj)?,
            _ => {
                return Err(ProtocolError::Malformed(
                    "replace field is neither a list nor an object".to_string(),
                ))
            }
        }

        Ok(map)
    }
}

impl FromIterator<(String, String)> for ReplaceMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Start request payload.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    /// Target board/toolchain identifier.
    pub platform: String,
    /// Repository URL of the program to build.
    pub repo: String,
    /// Request a clean build.
    pub clean: bool,
    /// Extra preprocessor symbols.
    pub extra_symbols: Option<String>,
    /// Files to substitute server-side.
    pub replace: Option<ReplaceMap>,
}

impl StartRequest {
    /// Build the form body. Empty or absent values are left out entirely.
    pub fn to_form(&self) -> Result<Vec<(String, String)>, ProtocolError> {
        let mut form = Vec::new();

        let mut push = |key: &str, value: &str| {
            if !value.is_empty() {
                form.push((key.to_string(), value.to_string()));
            }
        };

        push(fields::PLATFORM, &self.platform);
        push(fields::REPO, &self.repo);
        if self.clean {
            push(fields::CLEAN, "true");
        }
        if let Some(ref symbols) = self.extra_symbols {
            push(fields::EXTRA_SYMBOLS, symbols);
        }

        if let Some(ref replace) = self.replace {
            if !replace.is_empty() {
                form.push((fields::REPLACE.to_string(), replace.encode()?));
            }
        }

        Ok(form)
    }
}

/// `result.data` of a start response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartData {
    pub task_id: String,
}
