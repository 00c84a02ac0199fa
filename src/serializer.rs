//! Conversion of [`Value`]s into JSON with identity-based cycle breaking.

use crate::value::{Composite, Value};
use serde_json::Map;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Reserved first key of every converted composite.
pub const CLASS_NAME_KEY: &str = "___class_name";

/// Composites already entered while serializing one top-level argument,
/// keyed by allocation address.
///
/// Each entry holds a clone of the `Arc`, so an address cannot be freed and
/// handed to a different composite while the call tree is still being
/// walked. `members()` may build a fresh `Arc` per call.
#[derive(Default)]
pub struct Visited {
    seen: HashMap<usize, Arc<dyn Composite>>,
}

impl Visited {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, object: &Arc<dyn Composite>) -> bool {
        self.seen.contains_key(&Value::identity(object))
    }

    fn insert(&mut self, object: &Arc<dyn Composite>) {
        self.seen.insert(Value::identity(object), Arc::clone(object));
    }
}

impl std::fmt::Debug for Visited {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.seen.values().map(|object| object.class_name()))
            .finish()
    }
}

/// Serializes one top-level logging argument with its own visited set.
pub fn serialize_argument(value: &Value) -> serde_json::Value {
    serialize(value, &mut Visited::new())
}

/// Converts `value` into JSON.
///
/// Scalars pass through. Sequences and mappings keep their order.
/// Composites become an ordered map headed by [`CLASS_NAME_KEY`]; a
/// composite reached a second time inside the same call tree is replaced by
/// the sentinel `recursion - parent object [<type>]`.
pub fn serialize(value: &Value, visited: &mut Visited) -> serde_json::Value {
    match value {
        Value::Scalar(json) => json.clone(),
        Value::Sequence(items) => serde_json::Value::Array(
            items.iter().map(|item| serialize(item, visited)).collect(),
        ),
        Value::Mapping(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, item) in entries {
                map.insert(key.clone(), serialize(item, visited));
            }
            serde_json::Value::Object(map)
        }
        Value::Object(object) if visited.contains(object) => recursion_sentinel(object.as_ref()),
        Value::Object(object) => serialize_composite(object, visited),
    }
}

fn serialize_composite(object: &Arc<dyn Composite>, visited: &mut Visited) -> serde_json::Value {
    visited.insert(object);

    let mut map = Map::new();
    map.insert(
        CLASS_NAME_KEY.to_string(),
        serde_json::Value::String(object.class_name()),
    );

    let mut emitted: HashSet<String> = HashSet::new();
    for member in object.members() {
        if !emitted.insert(member.name.clone()) {
            continue;
        }
        let key = member.key();
        // the parent itself is already in `visited`
        let json = match &member.value {
            Ok(value) => serialize(value, visited),
            Err(e) => serde_json::Value::String(format!("inaccessible member: {}", e)),
        };
        map.insert(key, json);
    }

    serde_json::Value::Object(map)
}

fn recursion_sentinel(object: &dyn Composite) -> serde_json::Value {
    serde_json::Value::String(format!(
        "recursion - parent object [{}]",
        object.class_name()
    ))
}
