//! Deep merge of TOML tables.

use toml::{Table, Value};

/// Merge `overlay` into `base`.
///
/// Tables merge key by key, arrays merge index by index, and any other value
/// in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut Table, overlay: &Table) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) => merge_tables(base, overlay),
        (Value::Array(base), Value::Array(overlay)) => {
            for (index, value) in overlay.iter().enumerate() {
                match base.get_mut(index) {
                    Some(existing) => merge_values(existing, value),
                    None => base.push(value.clone()),
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
