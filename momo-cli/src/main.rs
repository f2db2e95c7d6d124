use clap::Parser;
use momo_report::{write_results, Configuration, NoLogos, ReportError, Summary};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Report(#[from] ReportError),
}

/// Tallied motifs and the options they were found with
#[derive(Deserialize)]
struct RunInput {
    config: Configuration,
    summary: Summary,
}

#[derive(Parser)]
#[command(
    name = "momo-report",
    about = "Scores modification motifs and writes MoMo HTML and MEME text reports",
    long_about = "Reads motifs with their foreground and background match counts, computes \
                  Fisher exact E-values corrected for the number of tests the discovery \
                  algorithm performed, and writes an HTML report together with a MEME \
                  motif file.",
    version,
    after_help = "Example usage:\n    \
                  momo-report phospho.json --outdir momo_out\n    \
                  momo-report phospho.json --outdir momo_out --allow-clobber --print-pvalues",
    color = clap::ColorChoice::Always
)]
#[derive(Debug)]
struct Args {
    /// Path to a JSON file with a "config" and a "summary" object
    #[arg(value_name = "INPUT_JSON")]
    input: PathBuf,

    /// Output directory, overriding the one in the input file
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Write into an existing output directory
    #[arg(long)]
    allow_clobber: bool,

    /// Print test counts, normalized p-values and E-values for every motif
    #[arg(long)]
    print_pvalues: bool,
}

fn main() -> Result<(), CliError> {
    let start_time = std::time::Instant::now();

    let args = Args::parse();

    let reader = BufReader::new(File::open(&args.input)?);
    let RunInput {
        mut config,
        summary,
    } = serde_json::from_reader(reader)?;

    if let Some(outdir) = args.outdir {
        config.output_dir = outdir;
    }
    config.allow_clobber |= args.allow_clobber;
    config.print_pvalues |= args.print_pvalues;
    if config.command_line.is_empty() {
        config.command_line = std::env::args().collect::<Vec<_>>().join(" ");
    }

    let scored = write_results(&config, summary, &NoLogos)?;

    println!(
        "{} motifs written to {} and {}",
        scored.motifs().count(),
        config.html_path().display(),
        config.text_path().display()
    );

    let elapsed = start_time.elapsed();
    println!(
        "Total execution time: {:.4} seconds",
        elapsed.as_secs_f64()
    );

    Ok(())
}
