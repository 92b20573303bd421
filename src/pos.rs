//! Part-of-speech descriptors.
//!
//! The noun and adjective pipelines differ only in their pattern tables and
//! feature vocabulary, so both are expressed as one [`PosProfile`] consulted
//! by the segmenter, the usage splitter and the table extractor. Profiles
//! are built once at startup and shared read-only.

use clap::ValueEnum;
use lazy_static::lazy_static;
use once_cell::sync::Lazy;
use regex::Regex;

/// Which part of speech a store collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartOfSpeech {
    /// German nouns, including special word types (names, toponyms, ...)
    Noun,
    /// German adjectives
    Adjective,
}

/// Singular/plural/generic prefix of the composite variant tag
/// (`sg1`, `pl2`, ...) a table rule writes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantClass {
    Singular,
    Plural,
    Other,
}

impl VariantClass {
    pub fn tag(self, index: &str) -> String {
        let prefix = match self {
            VariantClass::Singular => "sg",
            VariantClass::Plural => "pl",
            VariantClass::Other => "d",
        };
        format!("{}{}", prefix, index)
    }
}

/// How a rule turns the raw matched value text into leaf values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Last whitespace-delimited token is the value, leading tokens are
    /// recorded as a prefix (noun declension forms).
    LastWord,
    /// Like `LastWord`, but the token may hold `+`-joined alternatives
    /// (the gender field).
    GenderLastWord,
    /// The whole (trimmed) value text (adjective comparison degrees).
    Full,
    /// `nein`/`0` collapses to the `no_am` flag, anything else kept as is.
    NoAmFlag,
    /// `ja`/`1` collapses to the `no_other_forms` flag.
    NoOtherFormsFlag,
}

/// One entry of the pattern rule table: a template parameter pattern plus
/// the key path it populates inside a usage.
pub struct TableRule {
    pub feature: &'static str,
    pub regex: Regex,
    /// Path under the usage node, before any variant tag.
    pub path: Vec<String>,
    /// `Some` when a composite variant tag (`sg1`, `pl2`, ...) is appended.
    pub variant: Option<VariantClass>,
    /// Parallel path for leading-token prefixes, when collected.
    pub prefix_path: Option<Vec<String>>,
    pub shape: ValueShape,
}

/// Everything that varies between the noun and adjective pipelines.
pub struct PosProfile {
    /// Page- and usage-level gate: the `{{Wortart|...|Deutsch}}` heading.
    pub gate: Regex,
    /// Level-2 headword heading naming the target language.
    pub headword: Regex,
    /// The embedded declension-table template; `body` captures its
    /// parameter list.
    pub table: Regex,
    pub rules: Vec<TableRule>,
    /// Default include/exclude feature sets for the inverse dictionary.
    pub inv_include: &'static [&'static str],
    pub inv_exclude: &'static [&'static str],
}

impl PartOfSpeech {
    pub fn profile(self) -> &'static PosProfile {
        match self {
            PartOfSpeech::Noun => &NOUN_PROFILE,
            PartOfSpeech::Adjective => &ADJECTIVE_PROFILE,
        }
    }
}

/// `|<Attr><digit?><star?>= <value>` template parameter pattern for one
/// declension-table attribute.
fn attr_regex(feature: &str) -> Regex {
    Regex::new(&format!(r"\|{} ?(\d)? *(\*)?\** *= *([^\n\|]+)", feature)).unwrap()
}

fn key_path(feature: &str) -> Vec<String> {
    feature
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// The noun attributes harvested from `{{Deutsch Substantiv Übersicht}}`
/// tables and relatives.
const MORPH_ATTRS_NOUN: &[&str] = &[
    "Genus",
    "Nominativ Singular",
    "Nominativ Plural",
    "Genitiv Singular",
    "Genitiv Plural",
    "Dativ Singular",
    "Dativ Plural",
    "Akkusativ Singular",
    "Akkusativ Plural",
];

/// The adjective attributes harvested from `{{Deutsch Adjektiv Übersicht}}`.
const MORPH_ATTRS_ADJ: &[&str] = &[
    "Positiv",
    "Komparativ",
    "Superlativ",
    "am",
    "keine weiteren Formen",
];

fn noun_rules() -> Vec<TableRule> {
    MORPH_ATTRS_NOUN
        .iter()
        .map(|feature| {
            let morphs = key_path(feature);
            let variant = match morphs.last().map(String::as_str) {
                Some("singular") | Some("genus") => VariantClass::Singular,
                Some("plural") => VariantClass::Plural,
                _ => VariantClass::Other,
            };
            let shape = if *feature == "Genus" {
                ValueShape::GenderLastWord
            } else {
                ValueShape::LastWord
            };
            let mut path = vec!["gen_case_num".to_string()];
            path.extend(morphs.iter().cloned());
            let mut prefix_path = vec!["spec_pre".to_string()];
            prefix_path.extend(morphs.iter().map(|m| format!("{}_pre", m)));
            TableRule {
                feature,
                regex: attr_regex(feature),
                path,
                variant: Some(variant),
                prefix_path: Some(prefix_path),
                shape,
            }
        })
        .collect()
}

fn adjective_rules() -> Vec<TableRule> {
    MORPH_ATTRS_ADJ
        .iter()
        .map(|feature| {
            let (path, shape) = match *feature {
                "am" => (vec!["spec_comp".to_string()], ValueShape::NoAmFlag),
                "keine weiteren Formen" => {
                    (vec!["spec_comp".to_string()], ValueShape::NoOtherFormsFlag)
                }
                _ => {
                    let mut path = vec!["deg_of_comp".to_string()];
                    path.extend(key_path(feature));
                    (path, ValueShape::Full)
                }
            };
            TableRule {
                feature,
                regex: attr_regex(feature),
                path,
                variant: None,
                prefix_path: None,
                shape,
            }
        })
        .collect()
}

static NOUN_PROFILE: Lazy<PosProfile> = Lazy::new(|| PosProfile {
    gate: Regex::new(
        r"(?:^|[^=])=== \{\{Wortart\|(?:Substantiv|Abkürzung|Toponym|Nachname|Vorname|Eigenname|Name|Buchstabe|Zahlklassifikator|Straßenname)\|Deutsch\}\}",
    )
    .unwrap(),
    headword: Regex::new(r"(?:^|[^=])== (\w\S+) \(\{\{Sprache\|Deutsch").unwrap(),
    table: Regex::new(
        r"\{\{Deutsch (?:Substantiv|Abkürzung|Toponym|Name|Nachname|Vorname|Eigenname|Buchstabe|Zahlklassifikator) Übersicht(?P<body>[^\}]+)\}\}",
    )
    .unwrap(),
    rules: noun_rules(),
    inv_include: &["gen_case_num"],
    inv_exclude: &["genus"],
});

static ADJECTIVE_PROFILE: Lazy<PosProfile> = Lazy::new(|| PosProfile {
    gate: Regex::new(r"(?:^|[^=])=== \{\{Wortart\|Adjektiv\|Deutsch\}\}").unwrap(),
    // adjective pages may carry multi-word headwords
    headword: Regex::new(r"(?:^|[^=])== (\w[^\n]*?) \(\{\{Sprache\|Deutsch").unwrap(),
    table: Regex::new(r"\{\{Deutsch Adjektiv Übersicht(?P<body>[^\}]+)\}\}").unwrap(),
    rules: adjective_rules(),
    inv_include: &["positiv", "komparativ", "superlativ"],
    inv_exclude: &[],
});

lazy_static! {
    /// Level-2 heading that switches the current language section.
    pub static ref HEADING_TWO: Regex =
        Regex::new(r"(?:^|[^=])== (\w\S+) \(\{\{Sprache\|(?P<lang>\w+)").unwrap();

    /// Level-3 heading that opens a new usage of any word type.
    pub static ref NEW_USAGE: Regex =
        Regex::new(r"=== \{\{Wortart\|([^\|]+)\|Deutsch\}\}").unwrap();

    /// The full usage heading line, for heading-only annotations.
    pub static ref USAGE_HEADING_LINE: Regex =
        Regex::new(r"(?m)^=== \{\{Wortart\|.*$").unwrap();

    pub static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]+)</title>").unwrap();

    /// Reserved-namespace titles (`Hilfe:...`, `Benutzer Diskussion:...`)
    /// are never word pages.
    pub static ref NAMESPACE_PREFIX: Regex = Regex::new(
        r"^(?:Benutzer|Wiktionary|Datei|MediaWiki|Vorlage|Hilfe|Kategorie|Verzeichnis|Thesaurus|Reim|Flexion|Modul|Spezial|Medium|Diskussion)(?::| Diskussion:)",
    )
    .unwrap();
}
