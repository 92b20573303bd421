//! Markup cleanup applied to every page before structural parsing.
//!
//! The dump interleaves wiki markup with (sometimes entity-encoded) HTML.
//! Order matters: wiki links are unwrapped first, since link targets may
//! contain characters the tag patterns would misread, and entities are
//! rewritten before the delete list runs so a single pass is enough.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // [[target|label]] or [[target]] - keep only the label/target text.
    static ref WIKI_LINK: Regex = Regex::new(r"\[\[(?:[^\|\]]+\|)?([^\]]+)\]\]").unwrap();
    // Entities arrive plain or re-encoded to any depth (&amp;quot; and
    // worse); each pattern swallows the whole amp chain so one pass fully
    // resolves it.
    static ref NBSP_ENTITY: Regex = Regex::new(r"&(?:amp;)*nbsp;").unwrap();
    static ref QUOT_ENTITY: Regex = Regex::new(r"&(?:amp;)*quot;").unwrap();
    static ref AMP_ENTITY: Regex = Regex::new(r"&(?:amp;)+").unwrap();

    // Spans removed outright, in application order. Tags appear both raw
    // and entity-encoded, and the regex crate has no backreferences, so the
    // paired-tag patterns are expanded per tag and per bracket style.
    static ref DELETE_LIST: Vec<Regex> = {
        let mut list = vec![
            // HTML comments, raw or entity-encoded
            Regex::new(r"(?s)(?:<|&lt;)!--.*?--(?:>|&gt;)").unwrap(),
            // <comment> blocks from the page metadata
            Regex::new(r"(?s)<comment.*?</comment>").unwrap(),
            // nowiki spans (closing tag sometimes lacks the slash in dumps)
            Regex::new(r"(?s)(?:<|&lt;)nowiki(?:>|&gt;).*?(?:<|&lt;)/?nowiki(?:>|&gt;)").unwrap(),
        ];
        // Paired <small>/<sup>/<ref> tags including their content
        for tag in ["small", "sup", "ref"] {
            list.push(Regex::new(&format!(r"(?s)<{tag}\b[^>]*>.*?</{tag}>")).unwrap());
            list.push(Regex::new(&format!(r"(?s)&lt;{tag}\b.*?&lt;/{tag}&gt;")).unwrap());
        }
        // Leftover unpaired or self-closing forms of the same tags
        list.push(Regex::new(r"<(?:small|sup|ref)\b[^>\n]*>").unwrap());
        list.push(Regex::new(r"&lt;(?:small|sup|ref)\b[^\n]*?&gt;").unwrap());
        // Stray marker characters: ® and the left-to-right mark
        list.push(Regex::new("[\u{00AE}\u{200E}]").unwrap());
        list
    };
}

/// Strips and rewrites markup from raw page text. Unmatched patterns are
/// no-ops, and re-running on already-cleaned text returns it unchanged.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = WIKI_LINK.replace_all(text, "$1").into_owned();
    cleaned = NBSP_ENTITY.replace_all(&cleaned, " ").into_owned();
    cleaned = QUOT_ENTITY.replace_all(&cleaned, "\"").into_owned();
    cleaned = AMP_ENTITY.replace_all(&cleaned, "&").into_owned();
    for pattern in DELETE_LIST.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}
