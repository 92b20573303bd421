//! Declension-table ("Übersicht") extraction.
//!
//! A usage block may embed one table template whose parameter list carries
//! the inflected forms. Every rule of the part-of-speech pattern table is
//! matched against the parameter list; starred (secondary/dialectal)
//! readings are deferred until an unstarred tuple establishes their path.

use crate::pos::{PosProfile, ValueShape};
use crate::tree::Node;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref GENDER_ALTERNATIVES: Regex = Regex::new(r" *\+ *").unwrap();
}

/// Placeholder values marking a non-existent form inside a table.
const PLACEHOLDER_DASHES: &[&str] = &["—", "-", "–"];

fn refs(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

/// Extracts the table template body from a usage block, if present.
pub fn find_table<'a>(profile: &PosProfile, usage: &'a str) -> Option<&'a str> {
    profile
        .table
        .captures(usage)
        .and_then(|caps| caps.name("body"))
        .map(|m| m.as_str())
}

/// Shapes one raw attribute value into leaf values plus an optional prefix
/// (the leading tokens of a multi-word form). `None` means the occurrence
/// contributes nothing.
fn shape_value(shape: ValueShape, raw: &str) -> Option<(Vec<String>, Option<String>)> {
    match shape {
        ValueShape::LastWord | ValueShape::GenderLastWord => {
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            let last = *tokens.last()?;
            let values = if shape == ValueShape::GenderLastWord && last.contains('+') {
                GENDER_ALTERNATIVES
                    .split(last)
                    .map(str::to_string)
                    .collect()
            } else {
                vec![last.to_string()]
            };
            let prefix = if tokens.len() > 1 {
                Some(tokens[..tokens.len() - 1].join(" "))
            } else {
                None
            };
            Some((values, prefix))
        }
        ValueShape::Full => {
            let value = raw.trim();
            if value.is_empty() {
                None
            } else {
                Some((vec![value.to_string()], None))
            }
        }
        ValueShape::NoAmFlag => {
            let value = raw.trim();
            let mapped = if value == "nein" || value == "0" {
                "no_am".to_string()
            } else {
                value.to_string()
            };
            Some((vec![mapped], None))
        }
        ValueShape::NoOtherFormsFlag => {
            let value = raw.trim();
            let mapped = if value == "ja" || value == "1" {
                "no_other_forms".to_string()
            } else {
                value.to_string()
            };
            Some((vec![mapped], None))
        }
    }
}

/// Parses a table body into the grammatical subtree stored under the usage
/// id. Malformed tables (a value colliding with an established subtree)
/// fail as a whole; the caller logs and moves on to the next usage.
pub fn parse_decl_table(profile: &PosProfile, body: &str) -> Result<Node, String> {
    let mut tree = Node::branch();
    // Deferred starred tuples, waiting for an unstarred match of the same
    // path. One slot each, kept across rules like the source data expects.
    let mut deferred: Option<(Vec<String>, Vec<String>)> = None;
    let mut deferred_prefix: Option<(Vec<String>, String)> = None;

    for rule in &profile.rules {
        for caps in rule.regex.captures_iter(body) {
            let index = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let starred = caps.get(2).is_some();
            let raw = caps.get(3).map(|m| m.as_str()).unwrap_or("");

            let (values, prefix) = match shape_value(rule.shape, raw) {
                Some(shaped) => shaped,
                None => continue,
            };

            // An unnumbered attribute counts as declension variant 1.
            let tag = rule.variant.map(|class| {
                let index = if index.is_empty() { "1" } else { index };
                class.tag(index)
            });

            let mut path = rule.path.clone();
            if let Some(tag) = &tag {
                path.push(tag.clone());
            }

            place_values(&mut tree, &path, starred, values, &mut deferred)
                .map_err(|e| format!("attribute {}: {}", rule.feature, e))?;

            if let (Some(prefix), Some(prefix_base)) = (prefix, &rule.prefix_path) {
                let mut prefix_path = prefix_base.clone();
                if let Some(tag) = &tag {
                    prefix_path.push(tag.clone());
                }
                place_prefix(&mut tree, &prefix_path, starred, prefix, &mut deferred_prefix)
                    .map_err(|e| format!("attribute {}: {}", rule.feature, e))?;
            }
        }
    }

    strip_placeholders(&mut tree);
    Ok(tree)
}

fn place_values(
    tree: &mut Node,
    path: &[String],
    starred: bool,
    values: Vec<String>,
    deferred: &mut Option<(Vec<String>, Vec<String>)>,
) -> Result<(), String> {
    let path_refs = refs(path);
    if starred {
        match tree.get_path_mut(&path_refs) {
            Some(Node::Leaf(existing)) if !existing.is_empty() => {
                existing.extend(values);
            }
            Some(Node::Leaf(_)) => {}
            Some(Node::Branch(_)) => {
                return Err(format!("subtree in place of form list at {:?}", path));
            }
            None => *deferred = Some((path.to_vec(), values)),
        }
    } else {
        let mut to_add = values;
        if let Some((deferred_path, deferred_values)) = deferred {
            if deferred_path == path {
                to_add.extend(deferred_values.iter().cloned());
            }
        }
        tree.set_leaf(&path_refs, to_add)?;
    }
    Ok(())
}

fn place_prefix(
    tree: &mut Node,
    path: &[String],
    starred: bool,
    prefix: String,
    deferred: &mut Option<(Vec<String>, String)>,
) -> Result<(), String> {
    let path_refs = refs(path);
    if starred {
        match tree.get_path_mut(&path_refs) {
            Some(Node::Leaf(existing)) if !existing.is_empty() => {
                existing.push(prefix);
            }
            Some(Node::Leaf(_)) => {}
            Some(Node::Branch(_)) => {
                return Err(format!("subtree in place of prefix list at {:?}", path));
            }
            None => *deferred = Some((path.to_vec(), prefix)),
        }
    } else {
        let mut to_add = vec![prefix];
        if let Some((deferred_path, deferred_prefix)) = deferred {
            if deferred_path == path {
                to_add.push(deferred_prefix.clone());
            }
        }
        tree.set_leaf(&path_refs, to_add)?;
    }
    Ok(())
}

/// Drops placeholder dashes from every leaf list they appear in.
pub fn strip_placeholders(tree: &mut Node) {
    for leaf in tree.leaves_mut() {
        leaf.retain(|value| !PLACEHOLDER_DASHES.contains(&value.as_str()));
    }
}
