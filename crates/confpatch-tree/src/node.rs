//! Configuration node tree.
//!
//! A [`Node`] is a name, an ordered list of key/value pairs and an ordered
//! list of child nodes. Duplicate key names and duplicate child names are
//! allowed, and order is significant: "the nth `MODULE`" is the only way a
//! selector addresses a child.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identity token.
///
/// Cloning a node keeps its identity; [`Node::fork`] hands out fresh ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Allocate a new, unique identity.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub name: String,
    pub value: String,
}

impl Value {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named tree element with ordered keys and ordered children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(skip, default = "NodeId::fresh")]
    id: NodeId,

    /// Node name (type), e.g. `PART` or `@PART[probe]:FOR[Thing]`.
    pub name: String,

    /// Keys in document order.
    #[serde(default)]
    pub values: Vec<Value>,

    /// Children in document order.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

// Structural equality. Identity tokens are not compared.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values && self.nodes == other.nodes
    }
}

impl Eq for Node {}

impl Node {
    /// Create an empty node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            name: name.into(),
            values: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Builder: append a key.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_value(name, value);
        self
    }

    /// Builder: append a child.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Deep copy with fresh identities for the node and every descendant.
    pub fn fork(&self) -> Node {
        Node {
            id: NodeId::fresh(),
            name: self.name.clone(),
            values: self.values.clone(),
            nodes: self.nodes.iter().map(Node::fork).collect(),
        }
    }

    /// First value of the key `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    /// All values of the key `name`, in order.
    pub fn values_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .iter()
            .filter(move |v| v.name == name)
            .map(|v| v.value.as_str())
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }

    pub fn add_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.push(Value::new(name, value));
    }

    /// Remove every key called `name`. Returns how many were removed.
    pub fn remove_values(&mut self, name: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|v| v.name != name);
        before - self.values.len()
    }

    /// Insert a key as the `position`-th key of that name.
    ///
    /// Positions past the last key of that name append at the end.
    pub fn insert_value(&mut self, position: usize, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let at = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.name == name)
            .nth(position)
            .map(|(i, _)| i)
            .unwrap_or(self.values.len());
        self.values.insert(at, Value::new(name, value));
    }

    /// First child called `name`.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn nodes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.name == name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Remove every child called `name`. Returns how many were removed.
    pub fn remove_nodes(&mut self, name: &str) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.name != name);
        before - self.nodes.len()
    }

    /// Insert a child as the `position`-th child sharing its name.
    pub fn insert_node(&mut self, position: usize, node: Node) {
        let at = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.name == node.name)
            .nth(position)
            .map(|(i, _)| i)
            .unwrap_or(self.nodes.len());
        self.nodes.insert(at, node);
    }

    /// Follow a path of child indices.
    pub fn descendant(&self, path: &[usize]) -> Option<&Node> {
        path.iter().try_fold(self, |node, &i| node.nodes.get(i))
    }

    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter().try_fold(self, |node, &i| node.nodes.get_mut(i))
    }

    /// True if the node carries no keys and no children.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.nodes.is_empty()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::codec::to_text(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part() -> Node {
        Node::new("PART")
            .with_value("name", "probe")
            .with_value("tag", "a")
            .with_value("tag", "b")
            .with_node(Node::new("MODULE").with_value("name", "First"))
            .with_node(Node::new("RESOURCE").with_value("name", "Fuel"))
            .with_node(Node::new("MODULE").with_value("name", "Second"))
    }

    #[test]
    fn test_clone_keeps_identity() {
        let node = part();
        let copy = node.clone();
        assert_eq!(node.id(), copy.id());
        assert_eq!(node, copy);
    }

    #[test]
    fn test_fork_renews_identity() {
        let node = part();
        let forked = node.fork();
        assert_ne!(node.id(), forked.id());
        assert_ne!(node.nodes[0].id(), forked.nodes[0].id());
        assert_eq!(node, forked);
    }

    #[test]
    fn test_duplicate_keys_keep_order() {
        let node = part();
        let tags: Vec<_> = node.values_named("tag").collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(node.value("tag"), Some("a"));
    }

    #[test]
    fn test_insert_value_among_same_name() {
        let mut node = part();
        node.insert_value(1, "tag", "x");
        let tags: Vec<_> = node.values_named("tag").collect();
        assert_eq!(tags, vec!["a", "x", "b"]);

        node.insert_value(9, "tag", "z");
        assert_eq!(node.values.last().map(|v| v.value.as_str()), Some("z"));
    }

    #[test]
    fn test_insert_node_among_same_name() {
        let mut node = part();
        node.insert_node(1, Node::new("MODULE").with_value("name", "Middle"));
        let names: Vec<_> = node
            .nodes_named("MODULE")
            .filter_map(|n| n.value("name"))
            .collect();
        assert_eq!(names, vec!["First", "Middle", "Second"]);
        // RESOURCE keeps its slot between the modules
        assert_eq!(node.nodes[1].name, "RESOURCE");
    }

    #[test]
    fn test_remove_values_and_nodes() {
        let mut node = part();
        assert_eq!(node.remove_values("tag"), 2);
        assert!(!node.has_value("tag"));
        assert_eq!(node.remove_nodes("MODULE"), 2);
        assert_eq!(node.nodes.len(), 1);
    }

    #[test]
    fn test_descendant_paths() {
        let node = Node::new("A").with_node(Node::new("B").with_node(Node::new("C")));
        assert_eq!(node.descendant(&[0, 0]).map(|n| n.name.as_str()), Some("C"));
        assert!(node.descendant(&[1]).is_none());
        assert_eq!(node.descendant(&[]).map(|n| n.name.as_str()), Some("A"));
    }
}
