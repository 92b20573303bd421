//! Generic nested key-value trees.
//!
//! Every word entry is a tree whose interior nodes are string-keyed maps and
//! whose leaves are ordered lists of value strings. The same shape is used
//! for the full store, for a single usage, and for inverse dictionaries, so
//! the traversal helpers here are shared by every parsing stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of an entry tree: either an inner map or a list of values.
///
/// Serializes untagged, so a branch is a JSON object and a leaf is a JSON
/// array of strings - the exact on-disk format of the exported store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(Vec<String>),
    Branch(BTreeMap<String, Node>),
}

impl Default for Node {
    fn default() -> Self {
        Node::Branch(BTreeMap::new())
    }
}

impl Node {
    pub fn branch() -> Self {
        Node::Branch(BTreeMap::new())
    }

    pub fn leaf<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::Leaf(values.into_iter().map(Into::into).collect())
    }

    /// True for an empty branch or an empty leaf.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Leaf(values) => values.is_empty(),
            Node::Branch(children) => children.is_empty(),
        }
    }

    pub fn as_branch(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Branch(children) => Some(children),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_branch_mut(&mut self) -> Option<&mut BTreeMap<String, Node>> {
        match self {
            Node::Branch(children) => Some(children),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Vec<String>> {
        match self {
            Node::Leaf(values) => Some(values),
            Node::Branch(_) => None,
        }
    }

    /// Follows `path` down the tree; `None` if any segment is missing or a
    /// leaf is hit before the path is exhausted.
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        let mut node = self;
        for key in path {
            node = node.as_branch()?.get(*key)?;
        }
        Some(node)
    }

    pub fn get_path_mut(&mut self, path: &[&str]) -> Option<&mut Node> {
        let mut node = self;
        for key in path {
            node = node.as_branch_mut()?.get_mut(*key)?;
        }
        Some(node)
    }

    /// The leaf values at `path`, if the path ends at a leaf.
    pub fn get_leaf(&self, path: &[&str]) -> Option<&Vec<String>> {
        self.get_path(path)?.as_leaf()
    }

    pub fn contains_path(&self, path: &[&str]) -> bool {
        self.get_path(path).is_some()
    }

    /// Sets `value` at `path`, creating intermediate branches as needed.
    ///
    /// Fails (without partial mutation of the missing tail) when an existing
    /// leaf sits in the middle of the path - the one structural way a
    /// declension table can be unparseable.
    pub fn set_path(&mut self, path: &[&str], value: Node) -> Result<(), String> {
        let (last, inner) = match path.split_last() {
            Some(split) => split,
            None => {
                *self = value;
                return Ok(());
            }
        };
        let mut node = self;
        for (depth, key) in inner.iter().enumerate() {
            let children = node
                .as_branch_mut()
                .ok_or_else(|| format!("leaf in the way at {:?}", &path[..depth]))?;
            node = children
                .entry((*key).to_string())
                .or_insert_with(Node::branch);
        }
        let children = node
            .as_branch_mut()
            .ok_or_else(|| format!("leaf in the way at {:?}", inner))?;
        children.insert((*last).to_string(), value);
        Ok(())
    }

    /// Shorthand for setting a leaf of `values` at `path`.
    pub fn set_leaf(&mut self, path: &[&str], values: Vec<String>) -> Result<(), String> {
        self.set_path(path, Node::Leaf(values))
    }

    /// All leaf lists in the tree, in key order.
    pub fn leaves(&self) -> Vec<&Vec<String>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Vec<String>>) {
        match self {
            Node::Leaf(values) => out.push(values),
            Node::Branch(children) => {
                for child in children.values() {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Mutable variant of [`Node::leaves`], used for post-hoc value cleanup.
    pub fn leaves_mut(&mut self) -> Vec<&mut Vec<String>> {
        let mut out = Vec::new();
        self.collect_leaves_mut(&mut out);
        out
    }

    fn collect_leaves_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Vec<String>>) {
        match self {
            Node::Leaf(values) => out.push(values),
            Node::Branch(children) => {
                for child in children.values_mut() {
                    child.collect_leaves_mut(out);
                }
            }
        }
    }

    /// Unpacks the tree into its root-to-leaf branches as
    /// `(path segments, leaf values)` pairs.
    pub fn branches(&self) -> Vec<(Vec<String>, &Vec<String>)> {
        let mut out = Vec::new();
        self.collect_branches(&mut Vec::new(), &mut out);
        out
    }

    fn collect_branches<'a>(
        &'a self,
        prefix: &mut Vec<String>,
        out: &mut Vec<(Vec<String>, &'a Vec<String>)>,
    ) {
        match self {
            Node::Leaf(values) => out.push((prefix.clone(), values)),
            Node::Branch(children) => {
                for (key, child) in children {
                    prefix.push(key.clone());
                    child.collect_branches(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    /// Every leaf list found under any occurrence of `key`, at any depth.
    /// Once `key` matches, the whole subtree below it is harvested.
    pub fn leaves_by_key<'a>(&'a self, key: &str, out: &mut Vec<&'a Vec<String>>) {
        if let Node::Branch(children) = self {
            for (k, child) in children {
                if k == key {
                    child.collect_leaves(out);
                } else {
                    child.leaves_by_key(key, out);
                }
            }
        }
    }

    /// Deep-merges `other` into `self`: branches merge key-wise, a leaf from
    /// `other` replaces whatever was at the same path.
    pub fn deep_merge(&mut self, other: &Node) {
        match (self, other) {
            (Node::Branch(dst), Node::Branch(src)) => {
                for (key, child) in src {
                    match dst.get_mut(key) {
                        Some(existing) => existing.deep_merge(child),
                        None => {
                            dst.insert(key.clone(), child.clone());
                        }
                    }
                }
            }
            (dst, src) => *dst = src.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut node = Node::branch();
        node.set_leaf(&["gen_case_num", "nominativ", "singular", "sg1"], vec!["Mutter".into()])
            .unwrap();
        node.set_leaf(&["gen_case_num", "nominativ", "plural", "pl1"], vec!["Mütter".into()])
            .unwrap();
        node.set_leaf(&["tantum"], vec!["Sg".into()]).unwrap();
        node
    }

    // ─────────────────────────────────────────────────────────────
    // Path access
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn set_then_get() {
        let node = sample();
        assert_eq!(
            node.get_leaf(&["gen_case_num", "nominativ", "singular", "sg1"]),
            Some(&vec!["Mutter".to_string()])
        );
    }

    #[test]
    fn missing_path_is_none() {
        let node = sample();
        assert!(node.get_path(&["gen_case_num", "dativ"]).is_none());
        assert!(!node.contains_path(&["decl_type"]));
    }

    #[test]
    fn path_through_leaf_is_none() {
        let node = sample();
        assert!(node.get_path(&["tantum", "deeper"]).is_none());
    }

    #[test]
    fn set_through_leaf_fails() {
        let mut node = sample();
        let result = node.set_leaf(&["tantum", "deeper"], vec!["x".into()]);
        assert!(result.is_err());
        // tree left intact
        assert_eq!(node.get_leaf(&["tantum"]), Some(&vec!["Sg".to_string()]));
    }

    #[test]
    fn set_empty_path_replaces_root() {
        let mut node = sample();
        node.set_path(&[], Node::leaf(["x"])).unwrap();
        assert_eq!(node, Node::leaf(["x"]));
    }

    // ─────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn leaves_in_key_order() {
        let node = sample();
        let leaves: Vec<&str> = node.leaves().iter().map(|l| l[0].as_str()).collect();
        assert_eq!(leaves, vec!["Mütter", "Mutter", "Sg"]);
    }

    #[test]
    fn branches_carry_full_paths() {
        let node = sample();
        let branches = node.branches();
        assert_eq!(branches.len(), 3);
        let (path, leaf) = &branches[1];
        assert_eq!(path, &["gen_case_num", "nominativ", "singular", "sg1"]);
        assert_eq!(*leaf, &vec!["Mutter".to_string()]);
    }

    #[test]
    fn leaves_by_key_takes_whole_subtree() {
        let node = sample();
        let mut out = Vec::new();
        node.leaves_by_key("nominativ", &mut out);
        assert_eq!(out.len(), 2);
        let mut out = Vec::new();
        node.leaves_by_key("singular", &mut out);
        assert_eq!(out, vec![&vec!["Mutter".to_string()]]);
    }

    #[test]
    fn leaves_by_key_missing_key() {
        let node = sample();
        let mut out = Vec::new();
        node.leaves_by_key("translations", &mut out);
        assert!(out.is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Merging and serialization
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn deep_merge_disjoint_keys() {
        let mut grammar = sample();
        let mut translations = Node::branch();
        translations
            .set_leaf(&["translations", "en", "m1"], vec!["mother".into()])
            .unwrap();
        grammar.deep_merge(&translations);
        assert_eq!(
            grammar.get_leaf(&["translations", "en", "m1"]),
            Some(&vec!["mother".to_string()])
        );
        assert!(grammar.contains_path(&["tantum"]));
    }

    #[test]
    fn deep_merge_leaf_overwrites() {
        let mut a = sample();
        let mut b = Node::branch();
        b.set_leaf(&["tantum"], vec!["Pl".into()]).unwrap();
        a.deep_merge(&b);
        assert_eq!(a.get_leaf(&["tantum"]), Some(&vec!["Pl".to_string()]));
    }

    #[test]
    fn json_roundtrip() {
        let node = sample();
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn leaf_serializes_as_array() {
        let node = Node::leaf(["f", "m"]);
        assert_eq!(serde_json::to_string(&node).unwrap(), r#"["f","m"]"#);
    }
}
