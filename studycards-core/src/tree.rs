//! Mapping between storage keys and paths in a tree-structured database.
//!
//! The deck collection is stored one record per node at `decks/<id>` and the
//! progress map at `userProgress/<userId>/<deckId>`. Every written key also
//! gets a marker node at its root path holding the empty container, so a
//! collection written empty reads back as empty instead of absent.

use crate::storage::{DECKS_KEY, PROGRESS_KEY};
use crate::CoreError;
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// The whole value sits at the root path.
    Leaf,
    /// An array of objects, each stored at `<root>/<id>`.
    Records,
    /// Objects nested this many levels deep.
    Nested(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeLayout {
    pub root: String,
    pub shape: Shape,
}

impl TreeLayout {
    pub fn for_key(key: &str) -> Self {
        match key {
            DECKS_KEY => Self {
                root: "decks".into(),
                shape: Shape::Records,
            },
            PROGRESS_KEY => Self {
                root: "userProgress".into(),
                shape: Shape::Nested(2),
            },
            other => Self {
                root: other.to_string(),
                shape: Shape::Leaf,
            },
        }
    }

    fn child(&self, segments: &[&str]) -> String {
        let mut p = self.root.clone();
        for s in segments {
            p.push('/');
            p.push_str(s);
        }
        p
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub path: String,
    pub position: i64,
    pub value: Value,
}

fn check_segment(s: &str) -> Result<&str, CoreError> {
    if s.is_empty() || s.contains('/') {
        return Err(CoreError::Invalid("path segment"));
    }
    Ok(s)
}

/// Splits `value` into the nodes that make up its subtree, root marker first.
pub fn flatten(layout: &TreeLayout, value: Value) -> Result<Vec<Node>, CoreError> {
    match layout.shape {
        Shape::Leaf => Ok(vec![Node {
            path: layout.root.clone(),
            position: 0,
            value,
        }]),
        Shape::Records => {
            let Value::Array(items) = value else {
                return Err(CoreError::Invalid("expected array"));
            };
            let mut out = vec![marker(layout, Value::Array(Vec::new()))];
            for (i, item) in items.into_iter().enumerate() {
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or(CoreError::Invalid("record without id"))?;
                let path = layout.child(&[check_segment(id)?]);
                if out.iter().any(|n| n.path == path) {
                    return Err(CoreError::Invalid("duplicate record id"));
                }
                out.push(Node {
                    path,
                    position: i as i64,
                    value: item,
                });
            }
            Ok(out)
        }
        Shape::Nested(depth) => {
            let mut out = vec![marker(layout, Value::Object(Map::new()))];
            let mut segments = Vec::with_capacity(depth);
            walk(layout, &value, depth, &mut segments, &mut out)?;
            Ok(out)
        }
    }
}

fn marker(layout: &TreeLayout, empty: Value) -> Node {
    Node {
        path: layout.root.clone(),
        position: -1,
        value: empty,
    }
}

fn walk<'a>(
    layout: &TreeLayout,
    value: &'a Value,
    depth_left: usize,
    segments: &mut Vec<&'a str>,
    out: &mut Vec<Node>,
) -> Result<(), CoreError> {
    if depth_left == 0 {
        let position = out.len() as i64 - 1;
        out.push(Node {
            path: layout.child(segments),
            position,
            value: value.clone(),
        });
        return Ok(());
    }
    let Value::Object(map) = value else {
        return Err(CoreError::Invalid("expected object"));
    };
    for (k, v) in map {
        segments.push(check_segment(k)?);
        walk(layout, v, depth_left - 1, segments, out)?;
        segments.pop();
    }
    Ok(())
}

/// Rebuilds the value written under a key from its stored nodes; `None` when
/// the subtree is empty.
pub fn assemble(layout: &TreeLayout, mut nodes: Vec<Node>) -> Result<Option<Value>, CoreError> {
    if nodes.is_empty() {
        return Ok(None);
    }
    nodes.sort_by_key(|n| n.position);
    let prefix = format!("{}/", layout.root);
    match layout.shape {
        Shape::Leaf => Ok(nodes
            .into_iter()
            .find(|n| n.path == layout.root)
            .map(|n| n.value)),
        Shape::Records => Ok(Some(Value::Array(
            nodes
                .into_iter()
                .filter(|n| n.path.starts_with(&prefix))
                .map(|n| n.value)
                .collect(),
        ))),
        Shape::Nested(depth) => {
            let mut root = Map::new();
            for n in nodes {
                let Some(rest) = n.path.strip_prefix(&prefix) else {
                    continue;
                };
                let segments: Vec<&str> = rest.split('/').collect();
                if segments.len() != depth {
                    return Err(CoreError::Invalid("node depth"));
                }
                insert_nested(&mut root, &segments, n.value)?;
            }
            Ok(Some(Value::Object(root)))
        }
    }
}

fn insert_nested(map: &mut Map<String, Value>, segments: &[&str], value: Value) -> Result<(), CoreError> {
    match segments {
        [] => Err(CoreError::Invalid("node depth")),
        [last] => {
            map.insert((*last).to_string(), value);
            Ok(())
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(inner) = entry else {
                return Err(CoreError::Invalid("expected object"));
            };
            insert_nested(inner, rest, value)
        }
    }
}
