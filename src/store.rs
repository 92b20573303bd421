//! The word entry store and its derived dictionaries.
//!
//! A [`WordEntries`] store maps headwords to entry trees and is filled by
//! streaming a dump through the page scanner. Grammar and translation runs
//! fill separate stores which can then be merged, and a filled store can be
//! inverted, filtered, or written to and read back from JSON.

use crate::annotate::annotate_usage;
use crate::decl::{find_table, parse_decl_table};
use crate::pos::PartOfSpeech;
use crate::segment::scan_pages;
use crate::translations::{parse_usage_translations, TranslationMode};
use crate::tree::Node;
use crate::usage::split_usages;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind};
use std::path::Path;

/// Counters reported after a dump run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    /// Pages seen in the stream, matching or not.
    pub pages: usize,
    /// Headwords that ended up with at least one non-empty usage.
    pub words: usize,
    /// Non-empty usages across those headwords.
    pub usages: usize,
    /// Declension tables that failed to parse and were skipped.
    pub table_failures: usize,
}

impl ScanStats {
    pub fn report(&self) {
        println!("Pages scanned:      {}", self.pages);
        println!("Words collected:    {}", self.words);
        println!("Usages collected:   {}", self.usages);
        if self.table_failures > 0 {
            println!("Tables skipped:     {}", self.table_failures);
        }
    }
}

/// A translation run inverts on the translation values, not on the
/// declension forms.
const TRANSLATIONS_INV_INCLUDE: &[&str] = &["translations"];

/// All entries collected for one part of speech.
pub struct WordEntries {
    pub pos: PartOfSpeech,
    pub entries: BTreeMap<String, Node>,
    /// Inverse-dictionary defaults; switched when the store is filled by a
    /// translation run.
    inv_include: &'static [&'static str],
    inv_exclude: &'static [&'static str],
}

impl WordEntries {
    pub fn new(pos: PartOfSpeech) -> Self {
        let profile = pos.profile();
        WordEntries {
            pos,
            entries: BTreeMap::new(),
            inv_include: profile.inv_include,
            inv_exclude: profile.inv_exclude,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Streams a dump and collects the grammatical entries: declension
    /// tables plus the textual annotations, one subtree per usage id.
    ///
    /// A declension table that cannot be parsed skips its whole usage with
    /// a message on stderr; the run continues.
    pub fn generate_entries<R, P>(&mut self, reader: R, on_progress: P) -> std::io::Result<ScanStats>
    where
        R: BufRead,
        P: FnMut(usize),
    {
        let profile = self.pos.profile();
        let pos = self.pos;
        let mut stats = ScanStats::default();
        let entries = &mut self.entries;

        stats.pages = scan_pages(reader, profile, on_progress, |title, lines| {
            let mut entry = entries.remove(title).unwrap_or_default();
            for usage in split_usages(profile, lines) {
                if let Some(body) = find_table(profile, &usage.text) {
                    let table = match parse_decl_table(profile, body) {
                        Ok(table) => table,
                        Err(err) => {
                            stats.table_failures += 1;
                            eprintln!(
                                "couldn't parse declension table: {} {}: {}",
                                title, usage.id, err
                            );
                            continue;
                        }
                    };
                    if !table.is_empty() {
                        if let Err(err) = entry.set_path(&[usage.id.as_str()], table) {
                            eprintln!("couldn't store usage: {} {}: {}", title, usage.id, err);
                            continue;
                        }
                    }
                }
                if let Err(err) = annotate_usage(pos, &mut entry, &usage.id, &usage.text) {
                    eprintln!("couldn't annotate usage: {} {}: {}", title, usage.id, err);
                }
            }
            if let Some(usages) = entry.as_branch_mut() {
                usages.retain(|_, usage| !usage.is_empty());
            }
            if !entry.is_empty() {
                stats.words += 1;
                stats.usages += entry.as_branch().map(BTreeMap::len).unwrap_or(0);
                entries.insert(title.to_string(), entry);
            }
        })?;

        Ok(stats)
    }

    /// Streams a dump and collects only the English translation lines,
    /// stored under `<uid>/translations/en/m<sense>`.
    pub fn generate_translations<R, P>(
        &mut self,
        reader: R,
        mode: TranslationMode,
        on_progress: P,
    ) -> std::io::Result<ScanStats>
    where
        R: BufRead,
        P: FnMut(usize),
    {
        let profile = self.pos.profile();
        let mut stats = ScanStats::default();
        self.inv_include = TRANSLATIONS_INV_INCLUDE;
        self.inv_exclude = &[];
        let entries = &mut self.entries;

        stats.pages = scan_pages(reader, profile, on_progress, |title, lines| {
            let mut entry = entries.remove(title).unwrap_or_default();
            for usage in split_usages(profile, lines) {
                for (sense, translations) in parse_usage_translations(mode, &usage.text) {
                    let path = [usage.id.as_str(), "translations", "en", sense.as_str()];
                    let appended = match entry.get_path_mut(&path) {
                        Some(Node::Leaf(existing)) => {
                            existing.extend(translations.iter().cloned());
                            Ok(())
                        }
                        _ => entry.set_leaf(&path, translations),
                    };
                    if let Err(err) = appended {
                        eprintln!("couldn't store translations: {} {}: {}", title, usage.id, err);
                    }
                }
            }
            if !entry.is_empty() {
                stats.words += 1;
                stats.usages += entry.as_branch().map(BTreeMap::len).unwrap_or(0);
                entries.insert(title.to_string(), entry);
            }
        })?;

        Ok(stats)
    }

    /// Merges another store (typically translations) into this one,
    /// usage by usage. Returned is the number of this store's usages that
    /// had no counterpart in `other`; usages present only in `other` have
    /// nothing to attach to and are dropped silently.
    pub fn enhance_usages(&mut self, other: &WordEntries) -> usize {
        let mut missed = 0usize;
        for (word, entry) in &mut self.entries {
            let source = other.entries.get(word).and_then(Node::as_branch);
            let usages = match entry.as_branch_mut() {
                Some(usages) => usages,
                None => continue,
            };
            for (uid, target) in usages.iter_mut() {
                match source.and_then(|usages| usages.get(uid)) {
                    Some(addition) => target.deep_merge(addition),
                    None => missed += 1,
                }
            }
        }
        if missed > 0 {
            println!("Usages without a counterpart: {}", missed);
        }
        missed
    }

    /// Builds the inverse dictionary: every inflected form found under the
    /// `include` keys maps back to the headwords it belongs to. Subtrees
    /// under `exclude` keys are pruned (gender values are forms of nothing).
    /// Empty slices fall back to the store's defaults - the part-of-speech
    /// table features, or the translation values after a translation run.
    pub fn make_inv_dict(&self, include: &[&str], exclude: &[&str]) -> BTreeMap<String, Vec<String>> {
        let include = if include.is_empty() {
            self.inv_include
        } else {
            include
        };
        let exclude = if exclude.is_empty() {
            self.inv_exclude
        } else {
            exclude
        };

        let mut inverse: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (word, entry) in &self.entries {
            let mut forms = Vec::new();
            // with no include keys at all, every non-excluded leaf counts
            collect_included_leaves(entry, include.is_empty(), include, exclude, &mut forms);
            for form in forms {
                let words = inverse.entry(form.clone()).or_default();
                if !words.contains(word) {
                    words.push(word.clone());
                }
            }
        }
        inverse
    }

    /// The entries restricted to their usages without a special word type:
    /// ordinary dictionary words, with name/abbreviation usages left out.
    /// A headword keeps its common usages even when other usages are
    /// special; only headwords with no common usage at all drop out.
    pub fn make_commons_dict(&self) -> BTreeMap<String, Node> {
        self.filter_usages_by_keywords(&[], &["spec_word_type"])
    }

    /// Keeps only the usages that carry every `include` key somewhere and
    /// none of the `exclude` keys; headwords left without usages drop out.
    pub fn filter_usages_by_keywords(
        &self,
        include: &[&str],
        exclude: &[&str],
    ) -> BTreeMap<String, Node> {
        let mut out = BTreeMap::new();
        for (word, entry) in &self.entries {
            let usages = match entry.as_branch() {
                Some(usages) => usages,
                None => continue,
            };
            let kept: BTreeMap<String, Node> = usages
                .iter()
                .filter(|(_, usage)| {
                    include.iter().all(|key| contains_key_anywhere(usage, key))
                        && !exclude.iter().any(|key| contains_key_anywhere(usage, key))
                })
                .map(|(uid, usage)| (uid.clone(), usage.clone()))
                .collect();
            if !kept.is_empty() {
                out.insert(word.clone(), Node::Branch(kept));
            }
        }
        out
    }

    /// The leaf values lying under all of the given keys at once: the
    /// intersection of the per-key value sets. `["nominativ", "plural"]`
    /// yields every nominative plural form in the store; an unknown key
    /// empties the result.
    pub fn find_by_path_fragment(&self, keys: &[&str]) -> BTreeSet<String> {
        let mut per_key = keys.iter().map(|key| {
            let mut values = BTreeSet::new();
            for (word, entry) in &self.entries {
                let mut leaves = Vec::new();
                if word == key {
                    // a headword counts as a key of the store itself
                    leaves = entry.leaves();
                } else {
                    entry.leaves_by_key(key, &mut leaves);
                }
                values.extend(leaves.into_iter().flatten().cloned());
            }
            values
        });
        let first = match per_key.next() {
            Some(first) => first,
            None => return BTreeSet::new(),
        };
        per_key.fold(first, |acc, set| acc.intersection(&set).cloned().collect())
    }

    /// All leaf values found under `key` in the entry of `word`.
    pub fn leaves_under_keyword(&self, word: &str, key: &str) -> Vec<String> {
        let entry = match self.entries.get(word) {
            Some(entry) => entry,
            None => return Vec::new(),
        };
        let mut leaves = Vec::new();
        entry.leaves_by_key(key, &mut leaves);
        leaves.into_iter().flatten().cloned().collect()
    }

    /// Headwords where some leaf value under `key` contains `value` as a
    /// substring. With an empty `key`, every leaf is considered.
    pub fn find_entries_by_keyword_value(&self, key: &str, value: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| {
                let leaves = if key.is_empty() {
                    entry.leaves()
                } else {
                    let mut out = Vec::new();
                    entry.leaves_by_key(key, &mut out);
                    out
                };
                leaves
                    .iter()
                    .any(|leaf| leaf.iter().any(|v| v.contains(value)))
            })
            .map(|(word, _)| word.clone())
            .collect()
    }

    /// Writes the entries as one JSON object, headwords as top-level keys.
    pub fn export_to_json(&self, path: &Path) -> std::io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &self.entries)?;
        Ok(())
    }

    /// Reads entries back from a JSON export, merging them over whatever
    /// the store already holds (`clear` empties it first). A missing file
    /// is reported and leaves the store untouched.
    pub fn retrieve_from_json(&mut self, path: &Path, clear: bool) -> std::io::Result<()> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                eprintln!("no such file: {}", path.display());
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let loaded: BTreeMap<String, Node> = serde_json::from_reader(BufReader::new(file))?;
        if clear {
            self.entries.clear();
        }
        for (word, entry) in loaded {
            match self.entries.get_mut(&word) {
                Some(existing) => existing.deep_merge(&entry),
                None => {
                    self.entries.insert(word, entry);
                }
            }
        }
        Ok(())
    }
}

/// Walks an entry tree collecting leaf values that sit under an `include`
/// key and not under an `exclude` key.
fn collect_included_leaves(
    node: &Node,
    active: bool,
    include: &[&str],
    exclude: &[&str],
    out: &mut Vec<String>,
) {
    match node {
        Node::Leaf(values) => {
            if active {
                out.extend(values.iter().cloned());
            }
        }
        Node::Branch(children) => {
            for (key, child) in children {
                if exclude.contains(&key.as_str()) {
                    continue;
                }
                let active = active || include.contains(&key.as_str());
                collect_included_leaves(child, active, include, exclude, out);
            }
        }
    }
}

fn contains_key_anywhere(node: &Node, key: &str) -> bool {
    match node.as_branch() {
        Some(children) => children
            .iter()
            .any(|(k, child)| k == key || contains_key_anywhere(child, key)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MUTTER_PAGE: &str = "<page>\n<title>Mutter</title>\n<text>\n\
        == Mutter ({{Sprache|Deutsch}}) ==\n\
        === {{Wortart|Substantiv|Deutsch}}, {{f}} ===\n\
        {{Deutsch Substantiv Übersicht\n\
        |Genus=f\n\
        |Nominativ Singular=Mutter\n\
        |Nominativ Plural1=Mütter\n\
        |Nominativ Plural2=Muttern\n\
        |Genitiv Singular=Mutter\n\
        |Genitiv Plural1=Mütter\n\
        |Genitiv Plural2=Muttern\n\
        }}\n\
        *{{en}}: [1] {{Ü|en|mother}}; [2] {{Ü|en|nut}}\n\
        </text>\n</page>\n";

    fn grammar_store(input: &str) -> WordEntries {
        let mut store = WordEntries::new(PartOfSpeech::Noun);
        store
            .generate_entries(Cursor::new(input.as_bytes()), |_| {})
            .unwrap();
        store
    }

    fn translation_store(input: &str, mode: TranslationMode) -> WordEntries {
        let mut store = WordEntries::new(PartOfSpeech::Noun);
        store
            .generate_translations(Cursor::new(input.as_bytes()), mode, |_| {})
            .unwrap();
        store
    }

    // ─────────────────────────────────────────────────────────────
    // Entry generation
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn grammar_run_collects_tables() {
        let store = grammar_store(MUTTER_PAGE);
        let entry = store.entries.get("Mutter").unwrap();
        assert_eq!(
            entry.get_leaf(&["u1", "gen_case_num", "genus", "sg1"]),
            Some(&vec!["f".to_string()])
        );
        assert_eq!(
            entry.get_leaf(&["u1", "gen_case_num", "nominativ", "plural", "pl2"]),
            Some(&vec!["Muttern".to_string()])
        );
        // grammar runs don't touch translation lines
        assert!(!entry.contains_path(&["u1", "translations"]));
    }

    #[test]
    fn empty_entries_dropped() {
        // gate matches but there's no table and nothing to annotate
        let input = "<page>\n<title>Dings</title>\n<text>\n\
            == Dings ({{Sprache|Deutsch}}) ==\n\
            === {{Wortart|Substantiv|Deutsch}} ===\n\
            {{Bedeutungen}}\n\
            </text>\n</page>\n";
        let store = grammar_store(input);
        assert!(store.is_empty());
    }

    #[test]
    fn stats_count_words_and_usages() {
        let stats = {
            let mut store = WordEntries::new(PartOfSpeech::Noun);
            store
                .generate_entries(Cursor::new(MUTTER_PAGE.as_bytes()), |_| {})
                .unwrap()
        };
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.words, 1);
        assert_eq!(stats.usages, 1);
        assert_eq!(stats.table_failures, 0);
    }

    // ─────────────────────────────────────────────────────────────
    // Translation runs and merging
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn translation_run_collects_senses() {
        let store = translation_store(MUTTER_PAGE, TranslationMode::Strict);
        let entry = store.entries.get("Mutter").unwrap();
        assert_eq!(
            entry.get_leaf(&["u1", "translations", "en", "m1"]),
            Some(&vec!["mother".to_string()])
        );
        assert_eq!(
            entry.get_leaf(&["u1", "translations", "en", "m2"]),
            Some(&vec!["nut".to_string()])
        );
    }

    #[test]
    fn enhance_attaches_translations_to_grammar() {
        let mut grammar = grammar_store(MUTTER_PAGE);
        let translations = translation_store(MUTTER_PAGE, TranslationMode::Strict);
        let missed = grammar.enhance_usages(&translations);
        assert_eq!(missed, 0);
        let entry = grammar.entries.get("Mutter").unwrap();
        assert_eq!(
            entry.get_leaf(&["u1", "translations", "en", "m1"]),
            Some(&vec!["mother".to_string()])
        );
        // grammar side survives the merge
        assert_eq!(
            entry.get_leaf(&["u1", "gen_case_num", "genus", "sg1"]),
            Some(&vec!["f".to_string()])
        );
    }

    #[test]
    fn enhance_counts_own_usages_without_counterpart() {
        let mut grammar = grammar_store(MUTTER_PAGE);
        let empty = WordEntries::new(PartOfSpeech::Noun);
        // Mutter/u1 finds nothing to pull in
        assert_eq!(grammar.enhance_usages(&empty), 1);
        // the grammar side is untouched by a miss
        assert!(grammar.entries.contains_key("Mutter"));
    }

    #[test]
    fn enhance_ignores_source_only_usages() {
        let mut grammar = WordEntries::new(PartOfSpeech::Noun);
        let translations = translation_store(MUTTER_PAGE, TranslationMode::Strict);
        assert_eq!(grammar.enhance_usages(&translations), 0);
        // nothing to attach to, nothing invented
        assert!(grammar.is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Derived dictionaries
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn inverse_dict_maps_forms_to_words() {
        let store = grammar_store(MUTTER_PAGE);
        let inverse = store.make_inv_dict(&[], &[]);
        assert_eq!(inverse.get("Mütter"), Some(&vec!["Mutter".to_string()]));
        assert_eq!(inverse.get("Muttern"), Some(&vec!["Mutter".to_string()]));
        // the genus subtree is excluded by default
        assert!(!inverse.contains_key("f"));
    }

    #[test]
    fn inverse_dict_of_translation_store() {
        let store = translation_store(MUTTER_PAGE, TranslationMode::Strict);
        let inverse = store.make_inv_dict(&[], &[]);
        assert_eq!(inverse.get("mother"), Some(&vec!["Mutter".to_string()]));
        assert_eq!(inverse.get("nut"), Some(&vec!["Mutter".to_string()]));
    }

    #[test]
    fn inverse_dict_deduplicates_headwords() {
        let store = grammar_store(MUTTER_PAGE);
        let inverse = store.make_inv_dict(&[], &[]);
        // "Mutter" is nominative and genitive singular; listed once
        assert_eq!(inverse.get("Mutter"), Some(&vec!["Mutter".to_string()]));
    }

    #[test]
    fn commons_dict_drops_special_word_types() {
        let mut store = grammar_store(MUTTER_PAGE);
        let mut toponym = Node::branch();
        toponym
            .set_leaf(&["u1", "spec_word_type"], vec!["Toponym".to_string()])
            .unwrap();
        store.entries.insert("Berlin".to_string(), toponym);
        let commons = store.make_commons_dict();
        assert!(commons.contains_key("Mutter"));
        assert!(!commons.contains_key("Berlin"));
    }

    #[test]
    fn commons_dict_keeps_common_usages_of_mixed_words() {
        // "Essen" the city is a toponym, "Essen" the meal is a common noun
        let mut store = WordEntries::new(PartOfSpeech::Noun);
        let mut mixed = Node::branch();
        mixed
            .set_leaf(&["u1", "spec_word_type"], vec!["Toponym".to_string()])
            .unwrap();
        mixed
            .set_leaf(&["u2", "gen_case_num", "genus", "sg1"], vec!["n".to_string()])
            .unwrap();
        store.entries.insert("Essen".to_string(), mixed);
        let commons = store.make_commons_dict();
        let entry = commons.get("Essen").unwrap();
        assert!(!entry.contains_path(&["u1"]));
        assert_eq!(
            entry.get_leaf(&["u2", "gen_case_num", "genus", "sg1"]),
            Some(&vec!["n".to_string()])
        );
    }

    #[test]
    fn filter_usages_by_keywords_prunes() {
        let store = grammar_store(MUTTER_PAGE);
        let with_plural = store.filter_usages_by_keywords(&["plural"], &[]);
        assert!(with_plural.contains_key("Mutter"));
        let without_genus = store.filter_usages_by_keywords(&[], &["genus"]);
        assert!(without_genus.is_empty() || !contains_key_anywhere(&without_genus["Mutter"], "genus"));
        let with_tantum = store.filter_usages_by_keywords(&["tantum"], &[]);
        assert!(with_tantum.is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Exploration helpers
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn find_by_path_fragment_intersects_value_sets() {
        let store = grammar_store(MUTTER_PAGE);
        let plurals = store.find_by_path_fragment(&["nominativ", "plural"]);
        assert!(plurals.contains("Mütter"));
        assert!(plurals.contains("Muttern"));
        // "Mutter" is nominative but only singular
        assert!(!plurals.contains("Mutter"));
        assert!(store.find_by_path_fragment(&["plural", "tantum"]).is_empty());
    }

    #[test]
    fn find_by_path_fragment_accepts_headword_key() {
        let store = grammar_store(MUTTER_PAGE);
        let genitives = store.find_by_path_fragment(&["Mutter", "genitiv"]);
        assert!(genitives.contains("Mütter"));
        assert!(genitives.contains("Mutter"));
    }

    #[test]
    fn leaves_under_keyword_collects_subtree() {
        let store = grammar_store(MUTTER_PAGE);
        let forms = store.leaves_under_keyword("Mutter", "nominativ");
        assert!(forms.contains(&"Mutter".to_string()));
        assert!(forms.contains(&"Mütter".to_string()));
        assert!(forms.contains(&"Muttern".to_string()));
    }

    #[test]
    fn find_entries_by_keyword_value_substring() {
        let store = grammar_store(MUTTER_PAGE);
        assert_eq!(
            store.find_entries_by_keyword_value("plural", "ütte"),
            vec!["Mutter".to_string()]
        );
        assert!(store.find_entries_by_keyword_value("singular", "ütte").is_empty());
    }

    // ─────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn export_then_retrieve_roundtrip() {
        let store = grammar_store(MUTTER_PAGE);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nouns.json");
        store.export_to_json(&path).unwrap();

        let mut back = WordEntries::new(PartOfSpeech::Noun);
        back.retrieve_from_json(&path, false).unwrap();
        assert_eq!(back.entries, store.entries);
    }

    #[test]
    fn retrieve_missing_file_leaves_store_untouched() {
        let mut store = grammar_store(MUTTER_PAGE);
        let before = store.entries.clone();
        let dir = tempfile::tempdir().unwrap();
        store
            .retrieve_from_json(&dir.path().join("nope.json"), true)
            .unwrap();
        assert_eq!(store.entries, before);
    }

    #[test]
    fn retrieve_with_clear_replaces_entries() {
        let store = grammar_store(MUTTER_PAGE);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nouns.json");
        store.export_to_json(&path).unwrap();

        let mut other = WordEntries::new(PartOfSpeech::Noun);
        other
            .entries
            .insert("Alt".to_string(), Node::leaf(["stale"]));
        other.retrieve_from_json(&path, true).unwrap();
        assert!(!other.entries.contains_key("Alt"));
        assert_eq!(other.entries, store.entries);
    }
}
