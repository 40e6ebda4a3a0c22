#![allow(dead_code)]

use lset::testing::{MemoryHost, MemoryRegistry};
use lset::{MapFn, SetMap, UserModule, Value};
use std::collections::BTreeMap;

/// A structured test value: `{id: <id>, v: <v>}`.
pub fn obj(id: &str, v: i64) -> Value {
    let mut map = BTreeMap::new();
    map.insert("id".into(), Value::from(id));
    map.insert("v".into(), Value::from(v));
    Value::Map(map)
}

/// Canonical renderings, sorted, for order-insensitive comparison.
pub fn canonical_sorted(members: &[Value]) -> Vec<String> {
    let mut out: Vec<String> = members.iter().map(Value::canonical).collect();
    out.sort();
    out
}

/// Key-extraction function: the `id` field of a structured value.
pub fn id_of(value: &Value) -> lset::Result<Value> {
    value
        .as_map()
        .and_then(|map| map.get("id"))
        .cloned()
        .ok_or_else(|| lset::Error::InputParam("value has no id field".into()))
}

/// Write-side transform: wraps the value in a tagged list.
pub fn wrap(value: &Value) -> lset::Result<Value> {
    Ok(Value::List(vec![Value::from("xf"), value.clone()]))
}

/// Read-side untransform: unwraps [`wrap`].
pub fn unwrap(stored: &Value) -> lset::Result<Value> {
    stored
        .as_list()
        .filter(|list| list.len() == 2 && list[0] == Value::from("xf"))
        .map(|list| list[1].clone())
        .ok_or_else(|| lset::Error::InputParam("not a wrapped value".into()))
}

/// Filter: keeps integers strictly above `args[0]`.
pub fn int_above(value: &Value, args: &[Value]) -> lset::Result<bool> {
    let min = args
        .first()
        .and_then(Value::as_integer)
        .ok_or_else(|| lset::Error::InputParam("filter needs an integer argument".into()))?;

    Ok(value.as_integer().is_some_and(|x| x > min))
}

/// A settings module that keys structured values by their `id` field and
/// shrinks the set for fast rehash coverage.
pub struct IdKeyModule;

impl UserModule for IdKeyModule {
    fn adjust_settings(&self, settings: &mut SetMap) {
        settings.modulo = 13;
        settings.threshold = 4;
        settings.key_function = Some("id_of".into());
    }

    fn function(&self, name: &str) -> Option<MapFn> {
        (name == "id_of").then_some(id_of as MapFn)
    }
}

pub fn registry() -> MemoryRegistry {
    let mut reg = MemoryRegistry::default();
    reg.register_module("idmod", Box::new(IdKeyModule));
    reg.register_function("id_of", id_of);
    reg.register_function("wrap", wrap);
    reg.register_function("unwrap", unwrap);
    reg.register_filter("int_above", int_above);
    reg
}

/// An in-memory host with the test registry installed.
pub fn host() -> MemoryHost {
    let mut host = MemoryHost::default();
    host.set_registry(registry());
    host
}

/// Builds a create-time settings spec from option pairs.
pub fn spec(entries: &[(&str, Value)]) -> Value {
    let mut map = BTreeMap::new();

    for (option, value) in entries {
        map.insert((*option).into(), value.clone());
    }

    Value::Map(map)
}
