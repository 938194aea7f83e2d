use apostil_core::{
    apply::NoteApplier,
    config::{LocatorSettings, MatcherSettings, PipelineConfig},
    locate::{self, NoteInventory, NoteLocator},
    matcher::{self, NoteMatcher},
    report,
    tei::TeiDocument,
    NoteMapping, Result,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "apostil")]
#[command(about = "Footnote placement pipeline for TEI verse editions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract note positions from a directory of annotated HTML documents
    Locate {
        /// Directory containing the *.html documents
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Where to write the note-position export (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Words of preceding context to record per note
        #[arg(long, default_value_t = 5)]
        context_window: usize,
    },
    /// Match extracted notes against the verse lines of the target document
    Map {
        /// Note-position export produced by `locate`
        #[arg(short, long)]
        positions: PathBuf,

        /// The TEI document with numbered verse lines
        #[arg(short, long)]
        target: PathBuf,

        /// Where to write the mapping export (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Verse lines on each side used for context widening
        #[arg(long, default_value_t = 2)]
        widen_lines: usize,
    },
    /// Insert markers for resolved notes and write the review report
    Apply {
        /// Mapping export produced by `map`
        #[arg(short, long)]
        mapping: PathBuf,

        /// The TEI document to annotate (rewritten in place, backup kept)
        #[arg(short, long)]
        target: PathBuf,

        /// Where to write the manual-review report (CSV)
        #[arg(short, long)]
        report: PathBuf,
    },
    /// Run locate, map and apply in sequence with the conventional layout
    Run {
        /// Directory containing the *.html documents
        #[arg(short, long)]
        input_dir: PathBuf,

        /// The TEI document to annotate
        #[arg(short, long)]
        target: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Locate {
            input_dir,
            output,
            context_window,
        } => {
            let settings = LocatorSettings::default().with_context_window(context_window);
            run_locate(&input_dir, &output, settings)
        }
        Commands::Map {
            positions,
            target,
            output,
            widen_lines,
        } => {
            let settings = MatcherSettings::default().with_widen_lines(widen_lines);
            run_map(&positions, &target, &output, settings)
        }
        Commands::Apply {
            mapping,
            target,
            report,
        } => run_apply(&mapping, &target, &report),
        Commands::Run { input_dir, target } => {
            let config = PipelineConfig::for_edition(input_dir, target);
            run_locate(
                &config.input_dir,
                &config.positions_path,
                LocatorSettings::default(),
            )?;
            run_map(
                &config.positions_path,
                &config.target_document,
                &config.mapping_path,
                MatcherSettings::default(),
            )?;
            run_apply(
                &config.mapping_path,
                &config.target_document,
                &config.report_path,
            )
        }
    }
}

fn run_locate(input_dir: &Path, output: &Path, settings: LocatorSettings) -> Result<()> {
    println!("Extracting note positions from {}...", input_dir.display());

    let locator = NoteLocator::new(settings);
    let extracted = locator.extract_dir(input_dir)?;

    for (path, count) in &extracted.documents {
        println!(
            "  {}: {} notes",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            count
        );
    }
    for path in &extracted.failed_documents {
        println!("  {}: unreadable, skipped", path.display());
    }

    locate::write_records(output, &extracted.records)?;
    println!("Total notes found: {}", extracted.records.len());
    println!("Positions written to {}", output.display());

    for record in extracted.records.iter().take(5) {
        println!(
            "  note {}: '{}' after ...{}",
            record.number, record.word, record.context
        );
    }

    if let Some(inventory) = NoteInventory::of(&extracted.records) {
        println!(
            "Note range {}-{}, {} unique",
            inventory.first, inventory.last, inventory.unique
        );
        if !inventory.missing.is_empty() {
            let shown: Vec<String> = inventory
                .missing
                .iter()
                .take(20)
                .map(u32::to_string)
                .collect();
            println!("Missing from HTML: {}", shown.join(", "));
            if inventory.missing.len() > 20 {
                println!("  ... and {} more", inventory.missing.len() - 20);
            }
        }
    }

    Ok(())
}

fn run_map(
    positions: &Path,
    target: &Path,
    output: &Path,
    settings: MatcherSettings,
) -> Result<()> {
    let records = locate::read_records(positions)?;
    println!("Matching {} notes against {}...", records.len(), target.display());

    let doc = TeiDocument::load(target)?;
    let mapping = NoteMatcher::new(settings).match_notes(&records, &doc);
    matcher::write_mapping(output, &mapping)?;

    println!("Mapping written to {}", output.display());
    print_mapping_summary(&mapping);
    Ok(())
}

fn print_mapping_summary(mapping: &NoteMapping) {
    println!("  resolved:   {}", mapping.resolved.len());
    println!("  unresolved: {}", mapping.unresolved.len());
    println!("  ambiguous:  {}", mapping.ambiguous.len());

    for note in mapping.unresolved.iter().take(5) {
        println!(
            "  unresolved note {}: '{}' ({})",
            note.number, note.word, note.context
        );
    }
    for note in mapping.ambiguous.iter().take(5) {
        println!("  ambiguous note {}: '{}'", note.number, note.word);
        for candidate in note.candidates.iter().take(3) {
            println!(
                "    line {} (score {:.2}): {}",
                candidate.line_number, candidate.score, candidate.text
            );
        }
    }
}

fn run_apply(mapping_path: &Path, target: &Path, report_path: &Path) -> Result<()> {
    let mapping = matcher::read_mapping(mapping_path)?;
    println!(
        "Applying {} resolved notes to {}...",
        mapping.resolved.len(),
        target.display()
    );

    let outcome = NoteApplier::new().apply_file(target, &mapping)?;
    let failures = outcome.failures();
    report::write_review_report(report_path, &mapping, &failures)?;

    println!("  inserted:       {}", outcome.inserted());
    println!("  already marked: {}", outcome.already_marked());
    println!("  failed:         {}", failures.len());
    println!(
        "Needs manual review: {} (see {})",
        mapping.unresolved.len() + mapping.ambiguous.len() + failures.len(),
        report_path.display()
    );
    Ok(())
}
