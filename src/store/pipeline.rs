//! Aggregation pipeline evaluation for the in-memory store
//!
//! Supported stages: `$match`, `$project`, `$sort`, `$skip`, `$limit` and
//! `$count`. Each stage is a single-key document. Stages run in order over
//! the output of the previous stage.

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::matcher::{compare_values, DocumentMatcher};
use crate::definition::Command;
use crate::placeholder::field_at;

/// Run `pipeline` over `docs`
pub fn run_pipeline(mut docs: Vec<Value>, pipeline: &[Command]) -> StoreResult<Vec<Value>> {
    for stage in pipeline {
        let (name, spec) = single_entry(stage)?;
        docs = match name {
            "$match" => match_stage(docs, spec)?,
            "$project" => project_stage(docs, spec)?,
            "$sort" => sort_stage(docs, spec)?,
            "$skip" => {
                let n = count_arg(name, spec)?;
                docs.into_iter().skip(n).collect()
            }
            "$limit" => {
                let n = count_arg(name, spec)?;
                if n == 0 {
                    return Err(StoreError::invalid_stage(name, "limit must be positive"));
                }
                docs.into_iter().take(n).collect()
            }
            "$count" => count_stage(docs, spec)?,
            other => return Err(StoreError::UnsupportedStage(other.to_string())),
        };
    }
    Ok(docs)
}

fn single_entry(stage: &Command) -> StoreResult<(&str, &Value)> {
    let mut entries = stage.iter();
    match (entries.next(), entries.next()) {
        (Some((name, spec)), None) => Ok((name.as_str(), spec)),
        _ => Err(StoreError::invalid_stage(
            "pipeline",
            "each stage must have exactly one key",
        )),
    }
}

fn spec_object<'a>(stage: &str, spec: &'a Value) -> StoreResult<&'a Map<String, Value>> {
    spec.as_object()
        .ok_or_else(|| StoreError::invalid_stage(stage, "expected a document"))
}

fn count_arg(stage: &str, spec: &Value) -> StoreResult<usize> {
    spec.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| StoreError::invalid_stage(stage, "expected a non-negative integer"))
}

fn match_stage(docs: Vec<Value>, spec: &Value) -> StoreResult<Vec<Value>> {
    let filter = spec_object("$match", spec)?;
    let mut kept = Vec::with_capacity(docs.len());
    for doc in docs {
        if DocumentMatcher::matches(&doc, filter)? {
            kept.push(doc);
        }
    }
    Ok(kept)
}

fn project_stage(docs: Vec<Value>, spec: &Value) -> StoreResult<Vec<Value>> {
    let spec = spec_object("$project", spec)?;
    if spec.is_empty() {
        return Err(StoreError::invalid_stage("$project", "no fields given"));
    }

    let mut id_flag = None;
    let mut fields: Vec<(&str, bool)> = Vec::new();
    for (field, flag) in spec {
        let flag = projection_flag(flag)?;
        if field == "_id" {
            id_flag = Some(flag);
        } else {
            fields.push((field.as_str(), flag));
        }
    }
    let include_id = id_flag.unwrap_or(true);

    let inclusion = match (fields.iter().any(|f| f.1), fields.iter().any(|f| !f.1)) {
        (true, true) => {
            return Err(StoreError::invalid_stage(
                "$project",
                "cannot mix inclusion and exclusion",
            ))
        }
        (true, false) => true,
        (false, true) => false,
        // Only `_id` given
        (false, false) => include_id,
    };

    Ok(docs
        .into_iter()
        .map(|doc| {
            if inclusion {
                include_fields(&doc, &fields, include_id)
            } else {
                exclude_fields(doc, &fields, include_id)
            }
        })
        .collect())
}

fn projection_flag(flag: &Value) -> StoreResult<bool> {
    match flag {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().map_or(false, |f| f != 0.0)),
        _ => Err(StoreError::invalid_stage(
            "$project",
            "only inclusion and exclusion flags are supported",
        )),
    }
}

fn include_fields(doc: &Value, fields: &[(&str, bool)], include_id: bool) -> Value {
    let mut out = Map::new();
    if include_id {
        if let Some(id) = doc.get("_id") {
            out.insert("_id".to_string(), id.clone());
        }
    }
    for (path, _) in fields {
        if let Some(value) = field_at(doc, path) {
            set_path(&mut out, path, value.clone());
        }
    }
    Value::Object(out)
}

fn exclude_fields(mut doc: Value, fields: &[(&str, bool)], include_id: bool) -> Value {
    if let Some(map) = doc.as_object_mut() {
        if !include_id {
            map.remove("_id");
        }
        for (path, _) in fields {
            remove_path(map, path);
        }
    }
    doc
}

fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(child) = child.as_object_mut() {
                set_path(child, rest, value);
            }
        }
    }
}

fn remove_path(target: &mut Map<String, Value>, path: &str) {
    match path.split_once('.') {
        None => {
            target.remove(path);
        }
        Some((head, rest)) => {
            if let Some(child) = target.get_mut(head).and_then(Value::as_object_mut) {
                remove_path(child, rest);
            }
        }
    }
}

fn sort_stage(mut docs: Vec<Value>, spec: &Value) -> StoreResult<Vec<Value>> {
    let spec = spec_object("$sort", spec)?;
    if spec.is_empty() {
        return Err(StoreError::invalid_stage("$sort", "no sort keys given"));
    }

    let mut keys = Vec::with_capacity(spec.len());
    for (field, direction) in spec {
        let descending = match direction.as_i64() {
            Some(1) => false,
            Some(-1) => true,
            _ => {
                return Err(StoreError::invalid_stage(
                    "$sort",
                    format!("direction for \"{}\" must be 1 or -1", field),
                ))
            }
        };
        keys.push((field.as_str(), descending));
    }

    // Stable, so ties keep store order
    docs.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ordering = compare_values(field_at(a, field), field_at(b, field));
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering.is_ne() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });

    Ok(docs)
}

fn count_stage(docs: Vec<Value>, spec: &Value) -> StoreResult<Vec<Value>> {
    let field = spec
        .as_str()
        .filter(|f| !f.is_empty() && !f.starts_with('$') && !f.contains('.'))
        .ok_or_else(|| StoreError::invalid_stage("$count", "expected a plain field name"))?;

    let mut out = Map::new();
    out.insert(field.to_string(), Value::from(docs.len()));
    Ok(vec![Value::Object(out)])
}
