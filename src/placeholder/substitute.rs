//! Command substitution
//!
//! Substitution works on a copy of the commands. A failure leaves the
//! caller's commands untouched and yields no partially substituted output.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::{PlaceholderError, PlaceholderResult};
use super::node::{visit_leaves, Node};
use super::parser::Placeholder;
use super::resolver::Resolver;
use super::saved::SavedResults;
use crate::definition::Command;

/// Key whose placeholder value must resolve to an array
const IN_OPERATOR: &str = "$in";

/// Return a copy of `commands` with every placeholder resolved
pub fn substitute_commands(
    commands: &[Command],
    vars: &HashMap<String, String>,
    saved: &SavedResults,
) -> PlaceholderResult<Vec<Command>> {
    let resolver = Resolver::new(vars, saved);
    let mut resolved = commands.to_vec();
    for command in resolved.iter_mut() {
        substitute_document(command, &resolver)?;
    }
    Ok(resolved)
}

/// Resolve placeholders in one command, in place
pub fn substitute_document(
    command: &mut Command,
    resolver: &Resolver<'_>,
) -> PlaceholderResult<()> {
    visit_leaves::<PlaceholderError, _>(
        Node::Document(command),
        None,
        &mut |key: Option<&str>, value: &mut Value| {
            let placeholder = match value.as_str() {
                Some(token) if Placeholder::is_placeholder(token) => Placeholder::parse(token)?,
                _ => return Ok(()),
            };

            let resolved = if key == Some(IN_OPERATOR) {
                resolver.resolve_in(&placeholder)?
            } else {
                resolver.resolve(&placeholder)?
            };
            if let Some(like) = placeholder_like(&resolved) {
                return Err(PlaceholderError::PlaceholderLikeValue {
                    token: placeholder.raw.clone(),
                    value: like.to_string(),
                });
            }
            *value = resolved;
            Ok(())
        },
    )
}

/// First string inside `value` that would parse as a placeholder
fn placeholder_like(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if Placeholder::is_placeholder(s) => Some(s),
        Value::Array(items) => items.iter().find_map(placeholder_like),
        Value::Object(map) => map.values().find_map(placeholder_like),
        _ => None,
    }
}

/// True if any string leaf in `commands` still looks like a placeholder
pub fn has_placeholders(commands: &[Command]) -> bool {
    let mut found = false;
    let mut copy = commands.to_vec();
    for command in copy.iter_mut() {
        let _ = visit_leaves::<(), _>(
            Node::Document(command),
            None,
            &mut |_: Option<&str>, value: &mut Value| {
                if value.as_str().map_or(false, Placeholder::is_placeholder) {
                    found = true;
                }
                Ok(())
            },
        );
    }
    found
}
