//! Command tree shapes
//!
//! A command document is walked as one of three shapes. Leaves are handed
//! to the visitor together with the key they sit under; sequence elements
//! have no key.

use serde_json::{Map, Value};

/// Borrowed view of one position in a command tree
#[derive(Debug)]
pub enum Node<'a> {
    Scalar(&'a mut Value),
    Document(&'a mut Map<String, Value>),
    Sequence(&'a mut Vec<Value>),
}

impl<'a> Node<'a> {
    /// Classify a value by shape
    pub fn from_value(value: &'a mut Value) -> Self {
        match value {
            Value::Object(map) => Node::Document(map),
            Value::Array(items) => Node::Sequence(items),
            other => Node::Scalar(other),
        }
    }
}

/// Visit every scalar leaf below `node`, depth first, in document order.
///
/// Stops at the first error the visitor returns.
pub fn visit_leaves<E, F>(node: Node<'_>, key: Option<&str>, visit: &mut F) -> Result<(), E>
where
    F: FnMut(Option<&str>, &mut Value) -> Result<(), E>,
{
    match node {
        Node::Scalar(value) => visit(key, value),
        Node::Document(map) => {
            for (child_key, child) in map.iter_mut() {
                visit_leaves(Node::from_value(child), Some(child_key.as_str()), visit)?;
            }
            Ok(())
        }
        Node::Sequence(items) => {
            for item in items.iter_mut() {
                visit_leaves(Node::from_value(item), None, visit)?;
            }
            Ok(())
        }
    }
}
