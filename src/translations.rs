//! English translation lines.
//!
//! A usage carries at most one `*{{en}}:` line listing translations per
//! sense number. Two heuristics are supported: strict keeps only the term
//! field of each `{{Ü|en|...}}` template, greedy also folds leading free
//! text into the term ("[[insect]] {{Ü|en|colony}}" becomes "insect
//! colony").

use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;

/// Extraction heuristic for translation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranslationMode {
    /// Only the template term field is kept.
    Strict,
    /// Pre-template free text is folded into the term.
    Greedy,
}

lazy_static! {
    static ref EN_LINE: Regex = Regex::new(r"(?m)^\*\{\{en\}\}:.*").unwrap();
    // Another language marker on the same line ends the English part.
    static ref NEXT_MARKER: Regex = Regex::new(r"\*+\{\{").unwrap();

    // Translation-specific delete list; emphasis markup goes before the
    // generic template strip so ''...'' survives being half-eaten.
    static ref ITALICS: Regex = Regex::new(r"\(?''[^']+''\)?\s*").unwrap();
    static ref NON_TRANSLATION_TAG: Regex = Regex::new(r"\(?\{\{[^Ü][^\}]*\}\}\)?").unwrap();
    static ref EMPTY_UE_TAG: Regex = Regex::new(r"\{\{Ü\|en\}\}").unwrap();
    static ref ANGLE_QUOTED: Regex = Regex::new("\\(?\u{00bb}[^\u{00ab}]+\u{00ab}\\)?").unwrap();
    static ref QUOTED: Regex = Regex::new(r"\(?„[^“]+“\)?").unwrap();
    // A comma inside the term field glues two alternatives together
    static ref UE_TAG_COMMA: Regex =
        Regex::new(r"(\{\{Ü\|en\|[^\}]*),([^\}]*\}\})").unwrap();

    // [1], [1-3], [1, 4] sense specifications heading each segment
    static ref SENSE_SPEC: Regex = Regex::new(r"\[(\d+[^\]]*)\]").unwrap();
    static ref SENSE_RANGE: Regex = Regex::new(r"(\d+)[-–](\d+)").unwrap();
    static ref SENSE_NUMBER: Regex = Regex::new(r"\d+").unwrap();

    // {{Ü|en|term}} / {{Üt|en|xx|term}} with optional surrounding text
    static ref UE_TEMPLATE: Regex = Regex::new(
        r"(?P<pre>[^\{\|\}]*)\{\{Üt?\|en(?:\|[^\}\|]+)?\|(?P<term>[^\}\|]+)(?:\|[^\}\|]+)*\}\}",
    )
    .unwrap();

    // Greedy-mode cleanup of the pre-template text, applied in order
    static ref PRE_PUNCT_SPACE: Regex = Regex::new(r"^\W+\s+").unwrap();
    static ref PRE_NONWORD: Regex = Regex::new(r"^[^\w\(]+\s*").unwrap();
    static ref PRE_ONLY_PUNCT: Regex = Regex::new(r"^\W+\s*$").unwrap();
    static ref PRE_AUCH: Regex = Regex::new(r"^\(auch:\s*").unwrap();
}

/// Finds and cleans the English translation line of a usage block.
fn english_line(usage: &str) -> Option<String> {
    let found = EN_LINE.find(usage)?;
    let mut line = found.as_str();
    // keep only up to the next language marker, if one shares the line
    let marker_end = "*{{en}}:".len();
    if let Some(stop) = NEXT_MARKER.find(&line[marker_end..]) {
        line = &line[..marker_end + stop.start()];
    }
    let mut cleaned = line.to_string();
    for pattern in [
        &*ITALICS,
        &*NON_TRANSLATION_TAG,
        &*EMPTY_UE_TAG,
        &*ANGLE_QUOTED,
        &*QUOTED,
    ] {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned = UE_TAG_COMMA.replace_all(&cleaned, "$1$2").into_owned();
    Some(cleaned)
}

/// Expands a sense specification like `1-3, 5` into `["1","2","3","5"]`
/// (range numbers first, leftovers after, as listed).
fn expand_senses(spec: &str) -> Vec<String> {
    let mut senses = Vec::new();
    for caps in SENSE_RANGE.captures_iter(spec) {
        let first: usize = match caps[1].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let last: usize = match caps[2].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        for n in first..=last {
            senses.push(n.to_string());
        }
    }
    let remainder = SENSE_RANGE.replace_all(spec, "");
    for m in SENSE_NUMBER.find_iter(&remainder) {
        senses.push(m.as_str().to_string());
    }
    senses
}

fn strict_translations(segment: &str) -> Vec<String> {
    UE_TEMPLATE
        .captures_iter(segment)
        .map(|caps| caps["term"].to_string())
        .collect()
}

fn greedy_translations(segment: &str) -> Vec<String> {
    let mut out = Vec::new();
    // splitting on commas loses pre-text that itself contains a comma,
    // same trade-off as the strict/greedy distinction itself
    for piece in segment.split(',') {
        for caps in UE_TEMPLATE.captures_iter(piece) {
            let mut pre = caps["pre"].to_string();
            for pattern in [&*PRE_PUNCT_SPACE, &*PRE_NONWORD, &*PRE_ONLY_PUNCT, &*PRE_AUCH] {
                pre = pattern.replace(&pre, "").into_owned();
            }
            let term = &caps["term"];
            if pre.is_empty() {
                out.push(term.to_string());
            } else {
                out.push(format!("{}{}", pre, term));
            }
        }
    }
    out
}

/// Parses the usage's translation line into `(sense id, translations)`
/// pairs, sense ids keyed `m1`, `m2`, ... A sense may appear more than
/// once; the store appends in order.
pub fn parse_usage_translations(mode: TranslationMode, usage: &str) -> Vec<(String, Vec<String>)> {
    let line = match english_line(usage) {
        Some(line) => line,
        None => return Vec::new(),
    };

    // split into [sense-spec]text segments
    let specs: Vec<(Vec<String>, std::ops::Range<usize>)> = {
        let matches: Vec<_> = SENSE_SPEC.captures_iter(&line).collect();
        let mut segments = Vec::new();
        for (i, caps) in matches.iter().enumerate() {
            let spec = expand_senses(&caps[1]);
            let start = caps.get(0).unwrap().end();
            let end = matches
                .get(i + 1)
                .map(|next| next.get(0).unwrap().start())
                .unwrap_or(line.len());
            segments.push((spec, start..end));
        }
        segments
    };

    let mut out = Vec::new();
    for (senses, range) in specs {
        let segment = &line[range];
        let translations = match mode {
            TranslationMode::Strict => strict_translations(segment),
            TranslationMode::Greedy => greedy_translations(segment),
        };
        if translations.is_empty() {
            continue;
        }
        for sense in senses {
            out.push((format!("m{}", sense), translations.clone()));
        }
    }
    out
}
