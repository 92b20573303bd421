//! Page segmentation over the raw dump stream.
//!
//! Lines are buffered until the page-close marker, then the page is
//! cleaned and gated: it must carry the target part-of-speech heading, a
//! German headword heading and a title outside the reserved namespaces.
//! Pages failing any gate are dropped with their buffered lines.

use crate::cleanup::clean_text;
use crate::pos::{PosProfile, NAMESPACE_PREFIX, TITLE_PATTERN};
use std::io::BufRead;
use unicode_normalization::UnicodeNormalization;

/// How often the progress callback fires, in pages.
pub const PROGRESS_INTERVAL: usize = 50_000;

/// Scans `reader` for `<page>...</page>` records and hands each matching
/// page's title and cleaned lines to `on_page`. `on_progress` fires every
/// [`PROGRESS_INTERVAL`] pages with the running page count. Returns the
/// total number of pages seen.
pub fn scan_pages<R, P, F>(
    reader: R,
    profile: &PosProfile,
    mut on_progress: P,
    mut on_page: F,
) -> std::io::Result<usize>
where
    R: BufRead,
    P: FnMut(usize),
    F: FnMut(&str, &[String]),
{
    let mut page_lines: Vec<String> = Vec::new();
    let mut page_count = 0usize;

    for line in reader.lines() {
        let line = line?;
        let closes_page = line.contains("</page>");
        page_lines.push(line);
        if !closes_page {
            continue;
        }

        page_count += 1;
        if page_count % PROGRESS_INTERVAL == 0 {
            on_progress(page_count);
        }

        let page_text = clean_text(&page_lines.join("\n"));
        page_lines.clear();

        // Only pages with a German usage of the target part of speech
        // are worth looking at.
        if !profile.gate.is_match(&page_text) {
            continue;
        }
        if !profile.headword.is_match(&page_text) {
            continue;
        }
        let title = match TITLE_PATTERN.captures(&page_text) {
            Some(caps) => caps[1].nfc().collect::<String>(),
            None => continue,
        };
        if NAMESPACE_PREFIX.is_match(&title) {
            continue;
        }

        let lines: Vec<String> = page_text.lines().map(str::to_string).collect();
        on_page(&title, &lines);
    }

    Ok(page_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::PartOfSpeech;
    use std::io::Cursor;

    fn noun_page(title: &str) -> String {
        format!(
            "<page>\n<title>{}</title>\n<text>\n\
             == {} ({{{{Sprache|Deutsch}}}}) ==\n\
             === {{{{Wortart|Substantiv|Deutsch}}}}, {{{{f}}}} ===\n\
             </text>\n</page>\n",
            title, title
        )
    }

    fn collect_titles(input: &str) -> (usize, Vec<String>) {
        let mut titles = Vec::new();
        let pages = scan_pages(
            Cursor::new(input.as_bytes()),
            PartOfSpeech::Noun.profile(),
            |_| {},
            |title, _| titles.push(title.to_string()),
        )
        .unwrap();
        (pages, titles)
    }

    // ─────────────────────────────────────────────────────────────
    // Page gating
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn matching_page_emitted() {
        let (pages, titles) = collect_titles(&noun_page("Mutter"));
        assert_eq!(pages, 1);
        assert_eq!(titles, vec!["Mutter"]);
    }

    #[test]
    fn page_without_german_noun_dropped() {
        let input = "<page>\n<title>alter</title>\n<text>\n\
                     == alter ({{Sprache|Englisch}}) ==\n\
                     </text>\n</page>\n";
        let (pages, titles) = collect_titles(input);
        assert_eq!(pages, 1);
        assert!(titles.is_empty());
    }

    #[test]
    fn page_without_title_dropped() {
        let input = "<page>\n<text>\n\
                     == Mutter ({{Sprache|Deutsch}}) ==\n\
                     === {{Wortart|Substantiv|Deutsch}}, {{f}} ===\n\
                     </text>\n</page>\n";
        let (_, titles) = collect_titles(input);
        assert!(titles.is_empty());
    }

    #[test]
    fn namespace_page_dropped() {
        let (_, titles) = collect_titles(&noun_page("Hilfe:Flexion"));
        assert!(titles.is_empty());
        let (_, titles) = collect_titles(&noun_page("Benutzer Diskussion:Jemand"));
        assert!(titles.is_empty());
    }

    #[test]
    fn multiple_pages_in_stream() {
        let input = format!("{}{}", noun_page("Mutter"), noun_page("Vater"));
        let (pages, titles) = collect_titles(&input);
        assert_eq!(pages, 2);
        assert_eq!(titles, vec!["Mutter", "Vater"]);
    }

    // ─────────────────────────────────────────────────────────────
    // Cleanup interaction
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn page_lines_are_cleaned() {
        let input = "<page>\n<title>Mutter</title>\n<text>\n\
                     == Mutter ({{Sprache|Deutsch}}) ==\n\
                     === {{Wortart|Substantiv|Deutsch}}, {{f}} ===\n\
                     ein [[Wort|Wörter]]<ref>Quelle</ref>\n\
                     </text>\n</page>\n";
        let mut seen = Vec::new();
        scan_pages(
            Cursor::new(input.as_bytes()),
            PartOfSpeech::Noun.profile(),
            |_| {},
            |_, lines| seen = lines.to_vec(),
        )
        .unwrap();
        let joined = seen.join("\n");
        assert!(joined.contains("ein Wörter"));
        assert!(!joined.contains("<ref>"));
    }
}
