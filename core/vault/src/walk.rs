//! Field walker over JSON trees.
//!
//! Walks every variant of `serde_json::Value` and rewrites the string values
//! held under object keys accepted by a predicate. Containers are always
//! descended into, whatever their key. Strings that sit directly in arrays have
//! no key and are never visited.

use std::convert::Infallible;

use serde_json::{Map, Value};

/// Clone `value`, replacing each string held under a key accepted by
/// `predicate` with the visitor's output.
///
/// Key order and array order are preserved.
pub fn map_fields<P, V>(value: &Value, predicate: P, mut visitor: V) -> Value
where
    P: Fn(&str) -> bool,
    V: FnMut(&str) -> String,
{
    match try_map_fields(value, predicate, |s| Ok::<_, Infallible>(visitor(s))) {
        Ok(mapped) => mapped,
        Err(never) => match never {},
    }
}

/// Fallible form of [`map_fields`]. The first visitor error aborts the walk.
pub fn try_map_fields<P, V, E>(value: &Value, predicate: P, mut visitor: V) -> Result<Value, E>
where
    P: Fn(&str) -> bool,
    V: FnMut(&str) -> Result<String, E>,
{
    walk(value, &predicate, &mut visitor)
}

fn walk<P, V, E>(value: &Value, predicate: &P, visitor: &mut V) -> Result<Value, E>
where
    P: Fn(&str) -> bool,
    V: FnMut(&str) -> Result<String, E>,
{
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                let mapped = match child {
                    Value::String(s) if predicate(key.as_str()) => {
                        Value::String(visitor(s.as_str())?)
                    }
                    _ => walk(child, predicate, visitor)?,
                };
                out.insert(key.clone(), mapped);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| walk(item, predicate, visitor))
            .collect::<Result<Vec<_>, E>>()
            .map(Value::Array),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(value.clone()),
    }
}
