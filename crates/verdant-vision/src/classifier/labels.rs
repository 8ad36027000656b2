//! Class index file (`{"Tomato__Early_blight": 0, ...}`)

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Parse a `{label: index}` map into labels ordered by index.
///
/// Indices must cover `0..n` exactly once.
pub fn parse_class_indices(json: &str) -> Result<Vec<String>> {
    let indices: HashMap<String, usize> = serde_json::from_str(json)
        .map_err(|e| Error::Model(format!("invalid class index file: {e}")))?;
    if indices.is_empty() {
        return Err(Error::Model("class index file lists no classes".to_string()));
    }

    let mut labels: Vec<Option<String>> = vec![None; indices.len()];
    for (label, index) in indices {
        let slot = labels
            .get_mut(index)
            .ok_or_else(|| Error::Model(format!("class index {index} out of range")))?;
        if slot.is_some() {
            return Err(Error::Model(format!("class index {index} used twice")));
        }
        *slot = Some(label);
    }

    // every slot is filled once the indices are unique and in range
    labels
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::Model("class indices are not contiguous".to_string()))
}

/// Read and parse a class index file
pub fn load_class_indices(path: &Path) -> Result<Vec<String>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        Error::Model(format!(
            "class index file {} unreadable: {e}",
            path.display()
        ))
    })?;
    parse_class_indices(&json)
}
