//! Splitting one page into per-sense usage blocks.
//!
//! A two-state machine walks the page lines: level-2 headings switch
//! between the German section and other languages, level-3 `{{Wortart}}`
//! headings open a new usage. Lines from other languages are dropped, and
//! so is everything before the first usage heading (etymology preamble).

use crate::pos::{PosProfile, HEADING_TWO, NEW_USAGE};

/// One sense of a headword, tagged with its ordinal usage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageBlock {
    /// `u1`, `u2`, ... in order of appearance among the German blocks.
    /// Blocks failing the part-of-speech gate keep their slot, so emitted
    /// ids may have gaps.
    pub id: String,
    pub text: String,
}

/// Splits the cleaned lines of one page into usage blocks of the target
/// part of speech.
pub fn split_usages(profile: &PosProfile, lines: &[String]) -> Vec<UsageBlock> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_german = true;

    for line in lines {
        if let Some(caps) = HEADING_TWO.captures(line) {
            in_german = &caps["lang"] == "Deutsch";
        }
        if !in_german {
            continue;
        }
        if NEW_USAGE.is_match(line) {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current.push(line);
        } else {
            current.push(line);
        }
    }
    blocks.push(current);

    // The first block holds whatever precedes the first usage heading.
    blocks.remove(0);

    blocks
        .iter()
        .enumerate()
        .filter_map(|(i, block)| {
            let text = block.join("\n");
            if !profile.gate.is_match(&text) {
                return None;
            }
            Some(UsageBlock {
                id: format!("u{}", i + 1),
                text,
            })
        })
        .collect()
}
