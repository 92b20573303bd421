use bzip2::read::BzDecoder;
use clap::Parser;
use dewiktionary_scanner::{PartOfSpeech, TranslationMode, WordEntries};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "dewiktionary-scanner")]
#[command(about = "Extracts German noun/adjective morphology and translations from a dewiktionary XML dump")]
struct Args {
    /// Input XML dump (.xml or .xml.bz2)
    input: PathBuf,

    /// Output JSON file
    output: PathBuf,

    /// Part of speech to collect
    #[arg(short, long, value_enum, default_value_t = PartOfSpeech::Noun)]
    pos: PartOfSpeech,

    /// Also collect English translations (second pass over the dump) and
    /// merge them into the grammatical entries
    #[arg(short, long, value_enum)]
    translations: Option<TranslationMode>,

    /// Merge entries from a previous JSON export before scanning
    #[arg(long)]
    merge: Option<PathBuf>,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

fn open_reader(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if path.to_string_lossy().ends_with(".bz2") {
        Ok(Box::new(BufReader::with_capacity(
            256 * 1024,
            BzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(256 * 1024, file)))
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap(),
        );
        pb
    }
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!("Input:  {}", args.input.display());
        println!("Output: {}", args.output.display());
        println!();
    }

    let mut store = WordEntries::new(args.pos);
    if let Some(merge) = &args.merge {
        store.retrieve_from_json(merge, false)?;
        if !args.quiet {
            println!("Merged {} entries from {}", store.len(), merge.display());
        }
    }

    let start_time = Instant::now();
    let pb = spinner(args.quiet);
    let stats = store.generate_entries(open_reader(&args.input)?, |pages| {
        let rate = pages as f64 / start_time.elapsed().as_secs_f64();
        pb.set_message(format!("{} pages ({:.0} pages/s)", pages, rate));
    })?;
    pb.finish_and_clear();

    if let Some(mode) = args.translations {
        let mut extra = WordEntries::new(args.pos);
        let start_time = Instant::now();
        let pb = spinner(args.quiet);
        extra.generate_translations(open_reader(&args.input)?, mode, |pages| {
            let rate = pages as f64 / start_time.elapsed().as_secs_f64();
            pb.set_message(format!("translations: {} pages ({:.0} pages/s)", pages, rate));
        })?;
        pb.finish_and_clear();
        store.enhance_usages(&extra);
    }

    store.export_to_json(&args.output)?;

    if !args.quiet {
        stats.report();
        println!("Elapsed:            {:.1}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}
