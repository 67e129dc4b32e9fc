use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Accumulator for one Terraform JSON document.
///
/// Generators write disjoint subtrees, keyed by module or resource name.
/// Keys keep insertion order so a rerun over the same configuration renders
/// the same bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cluster document: always carries `module` and `output`, even when
    /// one of them ends up empty.
    pub fn for_cluster() -> Self {
        let mut tree = Self::new();
        tree.root.insert("module".to_string(), Value::Object(Map::new()));
        tree.root.insert("output".to_string(), Value::Object(Map::new()));
        tree
    }

    /// Writes `value` at `path`, creating intermediate maps and replacing any
    /// non-map value found on the way.
    pub fn set(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut cursor = &mut self.root;
        for key in parents {
            let slot = cursor
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            cursor = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
        cursor.insert((*last).to_string(), value);
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.root.get(*first)?, |value, key| value.get(*key))
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    pub fn set_module(&mut self, name: &str, block: Value) {
        self.set(&["module", name], block);
    }

    pub fn module(&self, name: &str) -> Option<&Value> {
        self.get(&["module", name])
    }

    pub fn module_names(&self) -> Vec<&str> {
        match self.root.get("module") {
            Some(Value::Object(modules)) => modules.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_output(&mut self, name: &str, value: Value) {
        self.set(&["output", name], value);
    }

    pub fn set_resource(&mut self, kind: &str, name: &str, value: Value) {
        self.set(&["resource", kind, name], value);
    }

    pub fn keys(&self) -> Vec<&str> {
        self.root.keys().map(String::as_str).collect()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

/// Converts plain generator records into tree values.
pub(crate) fn tree_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).expect("tree records are plain data and always serialize")
}
