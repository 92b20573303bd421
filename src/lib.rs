//! Morphology and translation extraction from German Wiktionary dumps.
//!
//! The pipeline streams a `dewiktionary` XML dump (plain or bz2), keeps the
//! pages carrying a German usage of the target part of speech, and distills
//! each one into a nested entry tree: declension tables, grammatical flags
//! read from the article text, and English translations. Separate runs fill
//! separate stores which can be merged and exported as JSON.

pub mod annotate;
pub mod cleanup;
pub mod decl;
pub mod pos;
pub mod segment;
pub mod store;
pub mod translations;
pub mod tree;
pub mod usage;

pub use pos::PartOfSpeech;
pub use store::{ScanStats, WordEntries};
pub use translations::TranslationMode;
pub use tree::Node;
