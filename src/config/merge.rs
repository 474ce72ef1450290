//! Configuration merge logic
//!
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values; `overlay` wins.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays: REPLACE (no concatenation)
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,

        (_, overlay) => overlay,
    }
}

/// Merge config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(
            json!({"max_patch_loop_iterations": 1000}),
            json!({"max_patch_loop_iterations": 10}),
        );
        assert_eq!(result["max_patch_loop_iterations"], 10);
    }

    #[test]
    fn test_array_replace() {
        let result = deep_merge(
            json!({"include": ["**/*.cfg"]}),
            json!({"include": ["GameData/**/*.cfg", "extra/*.cfg"]}),
        );
        let include = result["include"].as_array().unwrap();
        assert_eq!(include.len(), 2);
        assert_eq!(include[0], "GameData/**/*.cfg");
    }

    #[test]
    fn test_object_deep_merge() {
        let result = deep_merge(
            json!({"a": {"x": 1, "y": 2}}),
            json!({"a": {"y": 3, "z": 4}}),
        );
        assert_eq!(result["a"]["x"], 1);
        assert_eq!(result["a"]["y"], 3);
        assert_eq!(result["a"]["z"], 4);
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({"max_patch_loop_iterations": 1000, "exclude_dirs": []});
        let file = json!({"exclude_dirs": ["PluginData"]});
        let cli = json!({"max_patch_loop_iterations": 5});

        let result = merge_layers(vec![builtin, file, cli]);
        assert_eq!(result["max_patch_loop_iterations"], 5);
        assert_eq!(result["exclude_dirs"][0], "PluginData");
    }
}
