//! Deep merge of JSON values.

use serde_json::Value;

/// Merge `update` into `target`.
///
/// Objects merge key by key, any other value replaces the target slot. A
/// `null` inside an update object removes that key.
pub fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                if value.is_null() {
                    target_map.shift_remove(key);
                    continue;
                }
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, Value::Object(update_map)) => {
            let mut new_obj = serde_json::Map::with_capacity(update_map.len());
            for (key, value) in update_map {
                if !value.is_null() {
                    new_obj.insert(key.clone(), value.clone());
                }
            }
            *target_slot = Value::Object(new_obj);
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}
