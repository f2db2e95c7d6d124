//! HTML and MEME text output of scored motifs.
//!
//! [`write_results`] is the entry point: it creates the output directory,
//! scores every motif once, then writes the HTML report followed by the MEME
//! motif file. Both writers only read the scored summary.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ReportError, Result};
use crate::modl::ModlReplay;
use crate::notation::{format_g, Scientific};
use crate::scoring::{score_all, ScoredSummary};
use crate::stats::BIG;
use crate::template::{self, Tag, TagWriter, MOMO_TEMPLATE};
use crate::types::{Algorithm, Configuration, FileType, Motif, Summary};
use crate::{RELEASE_DATE, VERSION};

/// Sequence-logo generator, called once per motif with the output path
/// without extension. Failures are the generator's own business.
pub trait LogoGenerator {
    fn create_logo(&self, motif: &Motif, path: &Path);
}

/// Skip logo generation
pub struct NoLogos;

impl LogoGenerator for NoLogos {
    fn create_logo(&self, _motif: &Motif, _path: &Path) {}
}

/// Create `path`, or accept an existing directory when `allow_clobber` is set.
///
/// # Errors
/// * `ReportError::OutputDirectory` if the directory exists and clobbering is
///   not allowed, the path is not a directory, or creation fails
pub fn create_output_directory(path: &Path, allow_clobber: bool) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(ReportError::output_directory(path, "not a directory"));
        }
        if !allow_clobber {
            return Err(ReportError::output_directory(path, "directory already exists"));
        }
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| ReportError::output_directory(path, e.to_string()))
}

/// `MoMo version ... (Release date: ...)`
pub fn write_version<W: Write>(out: &mut W) -> Result<()> {
    write!(out, "MoMo version {} (Release date: {})", VERSION, RELEASE_DATE)?;
    Ok(())
}

pub fn write_command_line<W: Write>(out: &mut W, config: &Configuration) -> Result<()> {
    out.write_all(config.command_line.as_bytes())?;
    Ok(())
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Plain-text listing of the run parameters
pub fn write_parameters<W: Write>(out: &mut W, config: &Configuration) -> Result<()> {
    writeln!(out, "PARAMETERS:\n")?;
    writeln!(out, "algorithm: {}", config.algorithm.name())?;

    writeln!(out, "post-translationally modified peptide filenames: ")?;
    for (i, filename) in config.ptm_filenames.iter().enumerate() {
        writeln!(out, "\tfile {}: {}", i + 1, filename)?;
    }

    match &config.filetype {
        FileType::Psm {
            psm_type,
            sequence_column,
        } => {
            writeln!(out, "PTM filetype: {}", psm_type.as_deref().unwrap_or("PSM"))?;
            writeln!(out, "modified peptide column: '{}'", sequence_column)?;
        }
        FileType::Prealigned => writeln!(out, "PTM filetype: Raw")?,
        FileType::Fasta => writeln!(out, "PTM filetype: FASTA")?,
    }

    if let Some(db) = &config.protein_database {
        writeln!(out, "protein database filename: {}", db.filename)?;
        let format = match db.format {
            FileType::Psm { .. } => "PSM (error!)",
            FileType::Prealigned => "Raw",
            FileType::Fasta => "FASTA",
        };
        writeln!(out, "protein database format: {}", format)?;
    }

    writeln!(out, "motif width: {}", config.width)?;

    writeln!(out, "filter: {}", bool_str(config.filter.is_some()))?;
    if let Some(filter) = &config.filter {
        writeln!(out, "\tfilter field: '{}'", filter.field)?;
        writeln!(out, "\tfilter type: {}", filter.op.symbol())?;
        writeln!(out, "\tfilter threshold: {}", format_g(filter.threshold))?;
    }

    writeln!(out, "remove unknowns: {}", bool_str(config.remove_unknowns))?;
    writeln!(out, "eliminate repeats: {}", bool_str(config.eliminate_repeat_width > 0))?;
    if config.eliminate_repeat_width > 0 {
        writeln!(out, "\teliminate repeat width: {}", config.eliminate_repeat_width)?;
    }
    writeln!(out, "min occurrences: {}", config.min_occurrences)?;
    writeln!(out, "single motif per mass: {}", bool_str(config.single_motif_per_mass))?;
    writeln!(out, "hash fasta: {}", bool_str(config.hash_fasta))?;
    writeln!(out, "\thash fasta width: {}", config.hash_fasta_width)?;

    match config.algorithm {
        Algorithm::Simple => {}
        Algorithm::MotifX {
            score_threshold,
            harvard,
        } => {
            writeln!(out, "score threshold: {}", format_g(score_threshold))?;
            writeln!(
                out,
                "p-value calculations: {}",
                if harvard {
                    "inaccurate (emulate original motif-x)"
                } else {
                    "accurate"
                }
            )?;
        }
        Algorithm::Modl {
            max_motifs,
            max_iterations,
            max_no_decrease,
        } => {
            writeln!(out, "max motifs: {}", max_motifs)?;
            writeln!(out, "max iterations: {}", max_iterations)?;
            writeln!(out, "max no decrease iterations: {}", max_no_decrease)?;
        }
    }

    writeln!(out)?;
    Ok(())
}

/// Counts, per-motif results with occurrence lists, and MoDL logs
pub fn write_summary<W: Write, L: LogoGenerator>(
    out: &mut W,
    config: &Configuration,
    scored: &ScoredSummary,
    logos: &L,
) -> Result<()> {
    let algorithm = config.algorithm.name();
    write!(
        out,
        "  <li>\n    SUMMARY:\n    <ul>\n      <li>Algorithm: {}</li>\n",
        algorithm
    )?;
    writeln!(out, "      <li>Number of Mods: {}</li>", scored.num_mod)?;
    writeln!(out, "      <li>Number of Mod Types: {}</li>", scored.num_modtype)?;
    writeln!(
        out,
        "      <li>Number of Mods Passing Filters: {}</li>",
        scored.num_mod_passing
    )?;
    writeln!(
        out,
        "      <li>Number of Mod Types Passing Filters: {}</li>",
        scored.num_modtype_passing
    )?;
    write!(out, "    </ul><br>\n  </li>\n")?;

    for (i, entry) in scored.entries.iter().enumerate() {
        for (j, record) in entry.motifs.iter().enumerate() {
            let motif = &record.motif;
            let stats = &record.stats;
            logos.create_logo(motif, &config.output_dir.join(&motif.id));

            match scored.significance(i, j) {
                Some(sig) => writeln!(
                    out,
                    "  <li>final_pattern: {} score: {:.2} foreground_matches: {} foreground_size: {} bg_matches: {} bg_size: {} fold_increase: {:.2} E-value: {}<br>",
                    motif.id,
                    stats.score,
                    stats.fg_match,
                    stats.fg_size,
                    stats.bg_match,
                    stats.bg_size,
                    sig.fold_enrichment,
                    sig.evalue(),
                )?,
                None => writeln!(
                    out,
                    "  <li>final_pattern: {} foreground_matches: {}<br>",
                    motif.id, stats.fg_match
                )?,
            }

            writeln!(
                out,
                "      <img src=\"{}.png\" alt=\"sequence logo of motif\"><br>",
                motif.id
            )?;
            write!(
                out,
                "      <button onclick=\"change_display('occ_{i}_{j}')\">Show/Hide Motif Occurrences</button>\n      <div style='display:none' id='occ_{i}_{j}'>\n        <pre class='console'>\n"
            )?;
            for sequence in &motif.sequences {
                writeln!(out, "{}", sequence)?;
            }
            write!(out, "      </pre>\n    </div>\n    <br><br>\n  </li>\n")?;
        }

        if let Algorithm::Modl { max_motifs, .. } = config.algorithm {
            write!(
                out,
                "  <li>\n    <button onclick=\"change_display('log_{i}')\"><b>Show/Hide MoDL Log:</b></button>\n    <div style='display:none' id='log_{i}'>\n      <ul>\n        <li><b>MoDL Log</b></li>\n"
            )?;

            let mut replay = ModlReplay::new(
                &scored.alphabet,
                &entry.bg_sequences,
                config.width,
                max_motifs,
            );
            let mut min_dl = f64::INFINITY;
            for (j, step) in entry.modl_steps.iter().enumerate() {
                writeln!(out, "      <li>STEP: {}, DL: {}<br>", j, format_g(step.score))?;
                replay.apply(&step.action)?;
                if step.score < min_dl {
                    min_dl = step.score;
                }
                for motif in replay.motifs() {
                    writeln!(out, "        {}<br>", replay.describe(motif))?;
                }
                writeln!(out, "      </li>")?;
            }

            write!(
                out,
                "      </ul>\n    </div><br>\n    <b>Final DL: {}</b>\n  <br><br></li>\n",
                format_g(min_dl)
            )?;
        }
    }
    Ok(())
}

struct HtmlReport<'a, L> {
    config: &'a Configuration,
    scored: &'a ScoredSummary,
    logos: &'a L,
}

impl<L: LogoGenerator> TagWriter for HtmlReport<'_, L> {
    fn write_tag<W: Write>(&self, tag: Tag, out: &mut W) -> Result<()> {
        match tag {
            Tag::Version => write_version(out),
            Tag::CommandLine => write_command_line(out, self.config),
            Tag::Summary => write_summary(out, self.config, self.scored, self.logos),
            Tag::Parameters => write_parameters(out, self.config),
        }
    }
}

/// Render the HTML report from the built-in template
pub fn write_html<W: Write, L: LogoGenerator>(
    out: &mut W,
    config: &Configuration,
    scored: &ScoredSummary,
    logos: &L,
) -> Result<()> {
    write_html_with_template(out, MOMO_TEMPLATE, config, scored, logos)
}

/// Render the HTML report from a caller-supplied template
pub fn write_html_with_template<W: Write, L: LogoGenerator>(
    out: &mut W,
    template_text: &str,
    config: &Configuration,
    scored: &ScoredSummary,
    logos: &L,
) -> Result<()> {
    let report = HtmlReport {
        config,
        scored,
        logos,
    };
    template::render(template_text, out, &report)
}

/// Write all motifs in MEME text format.
///
/// E-values come from the scoring pass; motifs without one get `E= 0`.
pub fn write_text<W: Write>(out: &mut W, config: &Configuration, scored: &ScoredSummary) -> Result<()> {
    let alphabet = &scored.alphabet;
    let symbols: String = alphabet.symbols().iter().collect();

    write!(out, "MEME version {}\n\n", VERSION)?;
    write!(out, "Alphabet= {}\n\n", symbols)?;
    writeln!(out, "Background letter frequencies")?;
    for (symbol, freq) in alphabet.symbols().iter().zip(alphabet.background()) {
        write!(out, "{} {:8.6} ", symbol, freq)?;
    }
    write!(out, "\n\n")?;

    for record in scored.motifs() {
        let motif = &record.motif;
        writeln!(out, "MOTIF {}", motif.id)?;
        write!(
            out,
            "letter-probability matrix: alength= {} w= {} nsites= {} E= ",
            alphabet.len(),
            config.width,
            motif.sequences.len()
        )?;
        match motif.log_evalue() {
            Some(log_evalue) if log_evalue > -BIG => {
                writeln!(out, "{}", Scientific::from_ln(log_evalue, 1))?
            }
            _ => writeln!(out, "0")?,
        }

        for row in motif.freqs.rows() {
            for p in row {
                write!(out, "{:8.6}\t", p)?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| ReportError::output_file(path, e))
}

/// Score `summary` and write the HTML report and the MEME text file into
/// `config.output_dir`.
///
/// The HTML report is complete before the text file is opened.
///
/// # Returns
/// * `Result<ScoredSummary>` - the scored summary both files were written from
///
/// # Errors
/// * `ReportError::OutputDirectory` if the output directory cannot be created
/// * `ReportError::OutputFile` if either file cannot be opened
/// * `ReportError::TagOverflow` / `ReportError::UnterminatedTag` for a broken template
/// * `ReportError::InvalidMotif` if a motif does not fit the configured width
pub fn write_results<L: LogoGenerator>(
    config: &Configuration,
    summary: Summary,
    logos: &L,
) -> Result<ScoredSummary> {
    create_output_directory(&config.output_dir, config.allow_clobber)?;
    let scored = score_all(summary, config)?;

    let mut html = create(&config.html_path())?;
    write_html(&mut html, config, &scored, logos)?;
    html.flush()?;
    drop(html);

    let mut text = create(&config.text_path())?;
    write_text(&mut text, config, &scored)?;
    text.flush()?;

    Ok(scored)
}
