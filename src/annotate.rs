//! Secondary grammatical flags read from the usage text.
//!
//! Each rule is independent: a match writes a tag into the entry tree, a
//! non-match leaves the path untouched (never an explicit "false"). The
//! noun and adjective rule sets differ, dispatched by part of speech.

use crate::pos::{PartOfSpeech, USAGE_HEADING_LINE};
use crate::tree::Node;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Irregular "-sch" declension (words like "Deutsch") marked directly
    // in the table template name.
    static ref UEBERSICHT_SCH: Regex =
        Regex::new(r"\{\{Deutsch Substantiv Übersicht\s+-sch[^\}]*\}\}").unwrap();

    // Adjectival declension: the explicit template wins over the textual
    // marker on the heading line.
    static ref UEBERSICHT_ADJEKTIVISCH: Regex =
        Regex::new(r"\{\{Deutsch adjektivisch Übersicht[^\}]*\}\}").unwrap();
    static ref ADJ_DECL_TEXT: Regex = Regex::new(
        r"(?:^|[^=])=== \{\{Wortart\|Substantiv\|Deutsch\}\}[^']+(?:'')?adjektivische Deklination(?:'')?",
    )
    .unwrap();

    // {{kPl.}} under {{Worttrennung}} means "kein Plural", so the word is
    // a singular tantum; {{kSg.}} the other way around.
    static ref TANTUM: Regex =
        Regex::new(r"\{\{Worttrennung\}\}.*\n:.*\{\{k(?P<tantum>Pl|Sg)\.\}\}").unwrap();

    static ref SPEC_FEATURE: Regex = Regex::new(
        r"\|(?P<spec>Abkürzung|Toponym|Name|Nachname|Vorname|Eigenname|Buchstabe|Straßenname)\|Deutsch\}\}",
    )
    .unwrap();

    // {{f}}, {{m}}, {{n}} and combined forms like {{mn.}} on the heading
    // line; each letter contributes one gender.
    static ref GENDER_TEMPLATE: Regex = Regex::new(r"\{\{(?P<gender>[fmn]+)\.?\}\}").unwrap();

    // Adjective-only markers
    static ref KEINE_STEIGERUNG: Regex =
        Regex::new(r"\{\{Worttrennung\}\}.*\n:.*\{\{kSt\.\}\}").unwrap();
    static ref ADJ_NO_DECL: Regex = Regex::new(
        r"(?:^|[^=])=== \{\{Wortart\|Adjektiv\|Deutsch\}\}[^\n]+(?:'')?indeklinabel(?:'')?",
    )
    .unwrap();
    static ref ADJ_ONLY_ATTR: Regex = Regex::new(
        r"(?:^|[^=])=== \{\{Wortart\|Adjektiv\|Deutsch\}\}[^\n]+(?:'')?nur attributiv(?:'')?",
    )
    .unwrap();
    static ref ADJ_ONLY_PRED: Regex = Regex::new(
        r"(?:^|[^=])=== \{\{Wortart\|Adjektiv\|Deutsch\}\}[^\n]+(?:'')?nur prädikativ(?:'')?",
    )
    .unwrap();
}

/// Applies the annotation rules for `pos` to one usage. `entry` is the
/// headword node (the map of usage ids); an abbreviation-only usage is
/// deleted from it outright.
pub fn annotate_usage(
    pos: PartOfSpeech,
    entry: &mut Node,
    usage_id: &str,
    usage: &str,
) -> Result<(), String> {
    match pos {
        PartOfSpeech::Noun => annotate_noun(entry, usage_id, usage),
        PartOfSpeech::Adjective => annotate_adjective(entry, usage_id, usage),
    }
}

fn annotate_noun(entry: &mut Node, uid: &str, usage: &str) -> Result<(), String> {
    gender_fallback(entry, uid, usage)?;

    if UEBERSICHT_SCH.is_match(usage) {
        entry.set_leaf(&[uid, "decl_type"], vec!["-sch".to_string()])?;
    }

    if UEBERSICHT_ADJEKTIVISCH.is_match(usage) {
        entry.set_leaf(&[uid, "decl_type"], vec!["adj".to_string()])?;
    } else if ADJ_DECL_TEXT.is_match(usage) {
        entry.set_leaf(&[uid, "decl_type"], vec!["adj".to_string()])?;
    }

    if let Some(caps) = TANTUM.captures(usage) {
        // inverted on purpose: "kein Plural" makes a singular tantum
        let tantum = match &caps["tantum"] {
            "Pl" => "Sg",
            _ => "Pl",
        };
        entry.set_leaf(&[uid, "tantum"], vec![tantum.to_string()])?;
    }

    let mut special: Vec<String> = Vec::new();
    for caps in SPEC_FEATURE.captures_iter(usage) {
        let spec = caps["spec"].to_string();
        if !special.contains(&spec) {
            special.push(spec);
        }
    }
    if !special.is_empty() {
        let abbreviation_only = special == ["Abkürzung"];
        entry.set_leaf(&[uid, "spec_word_type"], special)?;
        // An entry saying nothing beyond "this is an abbreviation" (e.g.
        // "usw.") carries no morphology worth keeping.
        if abbreviation_only {
            let only_key = entry
                .get_path(&[uid])
                .and_then(Node::as_branch)
                .map(|children| children.len() == 1 && children.contains_key("spec_word_type"))
                .unwrap_or(false);
            if only_key {
                if let Some(children) = entry.as_branch_mut() {
                    children.remove(uid);
                }
            }
        }
    }

    Ok(())
}

/// When the table gave no usable gender (absent, or the `0` placeholder),
/// genders are read from the `{{f}}/{{m}}/{{n}}` markers on the usage
/// heading line instead.
fn gender_fallback(entry: &mut Node, uid: &str, usage: &str) -> Result<(), String> {
    let genus_path = [uid, "gen_case_num", "genus", "sg1"];
    let placeholder = entry.get_leaf(&genus_path).map(|leaf| leaf == &["0"]);
    match placeholder {
        Some(true) => {
            entry.set_leaf(&genus_path, Vec::new())?;
            gender_from_heading(entry, uid, usage)?;
        }
        Some(false) => {}
        None => {
            if !entry.contains_path(&[uid, "gen_case_num", "genus"]) {
                gender_from_heading(entry, uid, usage)?;
            }
        }
    }
    Ok(())
}

fn gender_from_heading(entry: &mut Node, uid: &str, usage: &str) -> Result<(), String> {
    let heading = match USAGE_HEADING_LINE.find(usage) {
        Some(m) => m.as_str(),
        None => return Ok(()),
    };
    let mut genders: Vec<String> = Vec::new();
    for caps in GENDER_TEMPLATE.captures_iter(heading) {
        for ch in caps["gender"].chars() {
            let gender = ch.to_string();
            if !genders.contains(&gender) {
                genders.push(gender);
            }
        }
    }
    if !genders.is_empty() {
        entry.set_leaf(&[uid, "gen_case_num", "genus", "sg1"], genders)?;
    }
    Ok(())
}

fn annotate_adjective(entry: &mut Node, uid: &str, usage: &str) -> Result<(), String> {
    if KEINE_STEIGERUNG.is_match(usage) {
        entry.set_leaf(&[uid, "decl_feat"], vec!["no_comp".to_string()])?;
    }
    if ADJ_NO_DECL.is_match(usage) {
        append_tag(entry, &[uid, "decl_feat"], "no_decl")?;
    }
    if ADJ_ONLY_ATTR.is_match(usage) {
        append_tag(entry, &[uid, "attr_pred"], "attr_only")?;
    }
    if ADJ_ONLY_PRED.is_match(usage) {
        append_tag(entry, &[uid, "attr_pred"], "pred_only")?;
    }
    Ok(())
}

/// Appends `tag` to the list at `path`, creating a single-element list
/// when the path is new. An already-present tag is not repeated.
fn append_tag(entry: &mut Node, path: &[&str], tag: &str) -> Result<(), String> {
    match entry.get_path_mut(path) {
        Some(Node::Leaf(values)) => {
            if !values.iter().any(|v| v == tag) {
                values.push(tag.to_string());
            }
            Ok(())
        }
        Some(Node::Branch(_)) => Err(format!("subtree in place of tag list at {:?}", path)),
        None => entry.set_leaf(path, vec![tag.to_string()]),
    }
}
