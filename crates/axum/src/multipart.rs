//! Binding of uploaded files to the variables of GraphQL operations.
//!
//! A multipart request carries the operations in an `operations` field with `null` placeholders
//! where files go, a `map` field associating each file field with the placeholder paths it fills,
//! and the files themselves.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::{GraphqlRequestData, RequestError};

pub(crate) const MULTIPART_SPEC_URL: &str = "https://github.com/jaydenseric/graphql-multipart-request-spec";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Upload {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Combines the `operations` and `map` fields of a multipart request with the files it carries.
///
/// Files are bound to `null` variables whose path, e.g. `variables.file` for a single operation or
/// `0.variables.file` for a batch, is listed in `files_map`. Paths pointing anywhere else are
/// ignored.
pub fn combine_multipart_data(
    operations: Value,
    files_map: Value,
    files: &HashMap<String, Upload>,
) -> Result<GraphqlRequestData, RequestError> {
    if !(operations.is_object() || operations.is_array()) {
        return Err(RequestError::InvalidOperationsType);
    }

    let Value::Object(files_map) = files_map else {
        return Err(RequestError::InvalidMapType);
    };

    let files_by_path = files_by_path(&files_map, files)?;
    let mut uploads = BTreeMap::new();

    match &operations {
        Value::Array(batch) => {
            for (index, operation) in batch.iter().enumerate() {
                if let Some(variables) = operation.get("variables") {
                    bind_uploads(variables, &format!("{index}.variables"), &files_by_path, &mut uploads);
                }
            }
        }
        operation => {
            if let Some(variables) = operation.get("variables") {
                bind_uploads(variables, "variables", &files_by_path, &mut uploads);
            }
        }
    }

    Ok(GraphqlRequestData {
        data: operations,
        uploads,
    })
}

fn files_by_path<'m, 'f>(
    files_map: &'m Map<String, Value>,
    files: &'f HashMap<String, Upload>,
) -> Result<HashMap<&'m str, &'f Upload>, RequestError> {
    let mut files_by_path = HashMap::new();

    for (key, paths) in files_map {
        let Value::Array(paths) = paths else {
            return Err(RequestError::InvalidMapEntry { key: key.clone() });
        };

        for (index, path) in paths.iter().enumerate() {
            let Value::String(path) = path else {
                return Err(RequestError::InvalidMapEntryValue {
                    key: key.clone(),
                    index,
                });
            };

            let Some(upload) = files.get(key) else {
                return Err(RequestError::MissingFile { key: key.clone() });
            };

            files_by_path.insert(path.as_str(), upload);
        }
    }

    Ok(files_by_path)
}

fn bind_uploads(
    value: &Value,
    path: &str,
    files_by_path: &HashMap<&str, &Upload>,
    uploads: &mut BTreeMap<String, Upload>,
) {
    let children: Vec<(String, &Value)> = match value {
        Value::Object(object) => object
            .iter()
            .map(|(key, child)| (format!("{path}.{key}"), child))
            .collect(),
        Value::Array(list) => list
            .iter()
            .enumerate()
            .map(|(index, child)| (format!("{path}.{index}"), child))
            .collect(),
        _ => return,
    };

    for (path, child) in children {
        match child {
            Value::Null => {
                if let Some(upload) = files_by_path.get(path.as_str()) {
                    uploads.insert(path, (*upload).clone());
                }
            }
            Value::Object(_) | Value::Array(_) => bind_uploads(child, &path, files_by_path, uploads),
            _ => (),
        }
    }
}
