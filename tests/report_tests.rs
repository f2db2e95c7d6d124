use momo_report::modl::{ModlAction, ModlStep};
use momo_report::report::{self, LogoGenerator, NoLogos};
use momo_report::types::{FileType, WILDCARD};
use momo_report::{
    score_all, write_results, Algorithm, AlphabetModel, Configuration, ModificationEntry, Motif,
    MotifRecord, MotifStatistics, ReportError, Summary, VERSION,
};
use ndarray::{array, Array2};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

fn config(algorithm: Algorithm, output_dir: PathBuf) -> Configuration {
    Configuration {
        algorithm,
        width: 3,
        filter: None,
        min_occurrences: 2,
        ptm_filenames: vec!["peptides.fasta".to_string()],
        filetype: FileType::Fasta,
        protein_database: None,
        output_dir,
        html_filename: "momo.html".to_string(),
        text_filename: "momo.txt".to_string(),
        allow_clobber: false,
        remove_unknowns: false,
        eliminate_repeat_width: 0,
        single_motif_per_mass: false,
        hash_fasta: false,
        hash_fasta_width: 0,
        print_pvalues: false,
        command_line: "momo simple peptides.fasta".to_string(),
    }
}

fn motifx() -> Algorithm {
    Algorithm::MotifX {
        score_threshold: 1e-6,
        harvard: false,
    }
}

fn record(id: &str, freqs: Array2<f64>, sequences: &[&str], stats: MotifStatistics) -> MotifRecord {
    MotifRecord {
        motif: Motif::new(id, freqs, sequences.iter().map(|s| s.to_string()).collect()),
        stats,
    }
}

fn stats(fg_match: u64, fg_size: u64, bg_match: u64, bg_size: u64, score: f64) -> MotifStatistics {
    MotifStatistics {
        fg_match,
        fg_size,
        bg_match,
        bg_size,
        score,
        n_tests: None,
    }
}

/// Two motifs of width 3 over a four-letter alphabet
fn summary() -> Summary {
    let alphabet = AlphabetModel::new(vec!['A', 'P', 'S', 'T'], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
    let xsp = record(
        "XSP",
        array![
            [0.25, 0.25, 0.25, 0.25],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0]
        ],
        &["ASP", "TSP"],
        stats(6, 10, 1, 10, 12.5),
    );
    let tsx = record(
        "TSX",
        array![
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.5, 0.0, 0.5, 0.0]
        ],
        &["TSA", "TSS", "TSA"],
        stats(3, 10, 3, 10, 1.0),
    );
    Summary {
        alphabet,
        entries: vec![ModificationEntry {
            key: "S".to_string(),
            motifs: vec![xsp, tsx],
            bg_sequences: Vec::new(),
            modl_steps: Vec::new(),
        }],
        num_mod: 7,
        num_modtype: 1,
        num_mod_passing: 5,
        num_modtype_passing: 1,
    }
}

fn to_string<F>(f: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> momo_report::Result<()>,
{
    let mut out = Vec::new();
    f(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_text_output_simple() {
    let config = config(Algorithm::Simple, PathBuf::from("unused"));
    let mut summary = summary();
    summary.entries[0].motifs.truncate(1);
    let scored = score_all(summary, &config).unwrap();
    assert!(scored.significance(0, 0).is_none());

    let text = to_string(|out| report::write_text(out, &config, &scored));
    let expected = format!(
        "MEME version {}\n\n\
         Alphabet= APST\n\n\
         Background letter frequencies\n\
         A 0.100000 P 0.200000 S 0.300000 T 0.400000 \n\n\
         MOTIF XSP\n\
         letter-probability matrix: alength= 4 w= 3 nsites= 2 E= 0\n\
         0.250000\t0.250000\t0.250000\t0.250000\t\n\
         0.000000\t0.000000\t1.000000\t0.000000\t\n\
         0.000000\t1.000000\t0.000000\t0.000000\t\n\n",
        VERSION
    );
    assert_eq!(text, expected);
}

#[test]
fn test_text_output_two_motifs() {
    let config = config(motifx(), PathBuf::from("unused"));
    let scored = score_all(summary(), &config).unwrap();
    let text = to_string(|out| report::write_text(out, &config, &scored));

    let blocks: Vec<&str> = text.split("MOTIF ").skip(1).collect();
    assert_eq!(blocks.len(), 2);
    for block in &blocks {
        let rows: Vec<&str> = block
            .lines()
            .skip(2)
            .take_while(|line| !line.is_empty())
            .collect();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.split('\t').filter(|c| !c.is_empty()).count(), 4);
        }
    }

    // 12 tests; P(X >= 6) = (C(10,6) C(10,1) + C(10,7)) / C(20,7) = 2220 / 77520
    let sig = scored.significance(0, 0).unwrap();
    assert_eq!(sig.n_tests, 12.0);
    assert!((sig.log_pvalue - (2220.0f64 / 77520.0).ln()).abs() < 1e-9);
    assert!((sig.fold_enrichment - 6.0).abs() < 1e-12);
    assert!(blocks[0].contains("nsites= 2 E= 3.4e-001\n"));

    // the text pass shows the E-value computed by the scoring pass
    for (j, block) in blocks.iter().enumerate() {
        let evalue = scored.significance(0, j).unwrap().evalue().to_string();
        assert!(block.contains(&format!("E= {}\n", evalue)), "{}", block);
        assert_eq!(
            scored.entries[0].motifs[j].motif.log_evalue(),
            Some(scored.significance(0, j).unwrap().log_evalue)
        );
    }
}

#[test]
fn test_html_summary_motifx() {
    let config = config(motifx(), PathBuf::from("out"));
    let scored = score_all(summary(), &config).unwrap();
    let html = to_string(|out| report::write_summary(out, &config, &scored, &NoLogos));

    assert!(html.starts_with(
        "  <li>\n    SUMMARY:\n    <ul>\n      <li>Algorithm: motif-x</li>\n      <li>Number of Mods: 7</li>\n"
    ));
    assert!(html.contains(
        "  <li>final_pattern: XSP score: 12.50 foreground_matches: 6 foreground_size: 10 bg_matches: 1 bg_size: 10 fold_increase: 6.00 E-value: 3.4e-001<br>\n"
    ));
    assert!(html.contains("      <img src=\"XSP.png\" alt=\"sequence logo of motif\"><br>\n"));
    assert!(html.contains(
        "      <button onclick=\"change_display('occ_0_1')\">Show/Hide Motif Occurrences</button>\n      <div style='display:none' id='occ_0_1'>\n        <pre class='console'>\nTSA\nTSS\nTSA\n      </pre>\n"
    ));
    assert!(!html.contains("MoDL Log"));
}

#[test]
fn test_html_summary_simple() {
    let config = config(Algorithm::Simple, PathBuf::from("out"));
    let scored = score_all(summary(), &config).unwrap();
    let html = to_string(|out| report::write_summary(out, &config, &scored, &NoLogos));
    assert!(html.contains("  <li>final_pattern: XSP foreground_matches: 6<br>\n"));
    assert!(!html.contains("E-value"));
}

#[test]
fn test_template_known_and_unknown_tags() {
    let config = config(motifx(), PathBuf::from("out"));
    let scored = score_all(summary(), &config).unwrap();
    let html = to_string(|out| {
        report::write_html_with_template(
            out,
            "<p>@command_line@</p><p>@bogus@</p>",
            &config,
            &scored,
            &NoLogos,
        )
    });
    assert_eq!(html, "<p>momo simple peptides.fasta</p><p></p>");
}

#[test]
fn test_template_overflow_is_fatal() {
    let config = config(motifx(), PathBuf::from("out"));
    let scored = score_all(summary(), &config).unwrap();
    let template = format!("<p>@{}", "a".repeat(2000));
    let mut out = Vec::new();
    let result = report::write_html_with_template(&mut out, &template, &config, &scored, &NoLogos);
    assert!(matches!(result, Err(ReportError::TagOverflow { offset: 3 })));
}

#[test]
fn test_full_html_has_no_leftover_tags() {
    let config = config(motifx(), PathBuf::from("out"));
    let scored = score_all(summary(), &config).unwrap();
    let html = to_string(|out| report::write_html(out, &config, &scored, &NoLogos));
    assert!(!html.contains('@'));
    assert!(html.contains(&format!("MoMo version {} (Release date: ", VERSION)));
    assert!(html.contains("PARAMETERS:\n\nalgorithm: motif-x\n"));
    assert!(html.contains("score threshold: 1e-06\np-value calculations: accurate\n"));
    assert!(html.contains("final_pattern: TSX"));
}

#[test]
fn test_parameters() {
    let mut config = config(
        Algorithm::Modl {
            max_motifs: 100,
            max_iterations: 50,
            max_no_decrease: 10,
        },
        PathBuf::from("out"),
    );
    config.filetype = FileType::Psm {
        psm_type: None,
        sequence_column: "peptide".to_string(),
    };
    config.eliminate_repeat_width = 10;
    config.hash_fasta_width = 4;
    let text = to_string(|out| report::write_parameters(out, &config));
    let expected = "PARAMETERS:\n\n\
                    algorithm: MoDL\n\
                    post-translationally modified peptide filenames: \n\
                    \tfile 1: peptides.fasta\n\
                    PTM filetype: PSM\n\
                    modified peptide column: 'peptide'\n\
                    motif width: 3\n\
                    filter: false\n\
                    remove unknowns: false\n\
                    eliminate repeats: true\n\
                    \teliminate repeat width: 10\n\
                    min occurrences: 2\n\
                    single motif per mass: false\n\
                    hash fasta: false\n\
                    \thash fasta width: 4\n\
                    max motifs: 100\n\
                    max iterations: 50\n\
                    max no decrease iterations: 10\n\n";
    assert_eq!(text, expected);
}

fn modl_summary() -> Summary {
    let mut summary = summary();
    let entry = &mut summary.entries[0];
    entry.motifs.truncate(1);
    entry.motifs[0].stats.n_tests = Some(50.0);
    entry.bg_sequences = ["ASP", "TSP", "ASA", "TTP"].iter().map(|s| s.to_string()).collect();
    entry.modl_steps = vec![
        ModlStep {
            action: ModlAction::Start,
            score: 100.0,
        },
        ModlStep {
            action: ModlAction::AddMotif {
                position: 1,
                residue: 'S',
            },
            score: 90.5,
        },
        ModlStep {
            action: ModlAction::AddResidue {
                motif: 0,
                position: 2,
                residue: 'P',
            },
            score: 85.25,
        },
        ModlStep {
            action: ModlAction::AddMotif {
                position: 0,
                residue: 'T',
            },
            score: 88.0,
        },
    ];
    summary
}

#[test]
fn test_modl_log() {
    let config = config(
        Algorithm::Modl {
            max_motifs: 5,
            max_iterations: 50,
            max_no_decrease: 10,
        },
        PathBuf::from("out"),
    );
    let scored = score_all(modl_summary(), &config).unwrap();
    assert_eq!(scored.significance(0, 0).unwrap().n_tests, 50.0);

    let html = to_string(|out| report::write_summary(out, &config, &scored, &NoLogos));
    let log = html.split("id='log_0'>\n").nth(1).unwrap();
    let expected = "      <ul>\n\
                    \x20       <li><b>MoDL Log</b></li>\n\
                    \x20     <li>STEP: 0, DL: 100<br>\n\
                    \x20     </li>\n\
                    \x20     <li>STEP: 1, DL: 90.5<br>\n\
                    \x20       XSX (background: 0.75)<br>\n\
                    \x20     </li>\n\
                    \x20     <li>STEP: 2, DL: 85.25<br>\n\
                    \x20       XSP (background: 0.5625)<br>\n\
                    \x20     </li>\n\
                    \x20     <li>STEP: 3, DL: 88<br>\n\
                    \x20       XSP (background: 0.5625)<br>\n\
                    \x20       TXX (background: 0.5)<br>\n\
                    \x20     </li>\n\
                    \x20     </ul>\n    </div><br>\n    <b>Final DL: 85.25</b>\n  <br><br></li>\n";
    assert_eq!(log, expected);
}

#[test]
fn test_modl_requires_test_count() {
    let config = config(
        Algorithm::Modl {
            max_motifs: 5,
            max_iterations: 50,
            max_no_decrease: 10,
        },
        PathBuf::from("out"),
    );
    let result = score_all(summary(), &config);
    assert!(matches!(result, Err(ReportError::InvalidMotif { .. })));
}

#[test]
fn test_width_mismatch_is_rejected() {
    let mut config = config(motifx(), PathBuf::from("out"));
    config.width = 5;
    assert!(matches!(
        score_all(summary(), &config),
        Err(ReportError::InvalidMotif { .. })
    ));
}

struct RecordingLogos(RefCell<Vec<PathBuf>>);

impl LogoGenerator for RecordingLogos {
    fn create_logo(&self, motif: &Motif, path: &Path) {
        assert!(motif.id.contains(WILDCARD));
        self.0.borrow_mut().push(path.to_path_buf());
    }
}

#[test]
fn test_write_results() {
    let tmp = tempfile::tempdir().unwrap();
    let outdir = tmp.path().join("momo_out");
    let config = config(motifx(), outdir.clone());
    let logos = RecordingLogos(RefCell::new(Vec::new()));

    let scored = write_results(&config, summary(), &logos).unwrap();

    let html = std::fs::read_to_string(outdir.join("momo.html")).unwrap();
    let text = std::fs::read_to_string(outdir.join("momo.txt")).unwrap();
    assert!(html.contains("final_pattern: XSP"));
    assert_eq!(text.matches("MOTIF ").count(), 2);
    let evalue = scored.significance(0, 1).unwrap().evalue().to_string();
    assert!(text.contains(&format!("nsites= 3 E= {}\n", evalue)));
    assert_eq!(
        logos.0.into_inner(),
        vec![outdir.join("XSP"), outdir.join("TSX")]
    );

    // the directory now exists
    let again = write_results(&config, summary(), &NoLogos);
    assert!(matches!(again, Err(ReportError::OutputDirectory { .. })));

    let mut clobber = config.clone();
    clobber.allow_clobber = true;
    assert!(write_results(&clobber, summary(), &NoLogos).is_ok());
}

#[test]
fn test_output_directory_is_a_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("taken");
    std::fs::write(&file, "x").unwrap();
    let mut config = config(motifx(), file);
    config.allow_clobber = true;
    assert!(matches!(
        write_results(&config, summary(), &NoLogos),
        Err(ReportError::OutputDirectory { .. })
    ));
}

#[test]
fn test_json_input() {
    #[derive(serde::Deserialize)]
    struct RunInput {
        config: Configuration,
        summary: Summary,
    }

    let json = std::fs::read_to_string("tests/data/phospho_motifx.json").unwrap();
    let RunInput { mut config, summary } = serde_json::from_str(&json).unwrap();
    assert_eq!(summary.alphabet.len(), 5);
    assert_eq!(summary.motifs().count(), 2);

    let tmp = tempfile::tempdir().unwrap();
    config.output_dir = tmp.path().join("out");
    let scored = write_results(&config, summary, &NoLogos).unwrap();

    // XXSPX: one fixed position plus the failed round
    let sig = scored.significance(0, 0).unwrap();
    assert_eq!(sig.n_tests, 35.0);
    assert!(sig.log_evalue < 0.0);

    let text = std::fs::read_to_string(config.text_path()).unwrap();
    assert!(text.contains("Alphabet= APRST\n"));
    assert!(text.contains("A 0.300000 P 0.200000 R 0.200000 S 0.150000 T 0.150000 \n"));
    assert!(text.contains("MOTIF XXSPX\nletter-probability matrix: alength= 5 w= 5 nsites= 5 E= "));

    let html = std::fs::read_to_string(config.html_path()).unwrap();
    assert!(html.contains("momo motifx --width 5 phospho.psm.txt"));
    assert!(html.contains("PTM filetype: Crux\nmodified peptide column: 'sequence'\n"));
    assert!(html.contains("protein database filename: tests/data/yeast.fasta\nprotein database format: FASTA\n"));
    assert!(html.contains("filter: true\n\tfilter field: 'q-value'\n\tfilter type: <=\n\tfilter threshold: 0.01\n"));
}

#[test]
fn test_json_alphabet_is_validated() {
    let ok: AlphabetModel =
        serde_json::from_str(r#"{"symbols":["A","P","S"],"background":[0.5,0.25,0.25]}"#).unwrap();
    assert_eq!(ok.len(), 3);

    let mismatched =
        serde_json::from_str::<AlphabetModel>(r#"{"symbols":["A","P","S"],"background":[0.5]}"#);
    let err = mismatched.unwrap_err().to_string();
    assert!(err.contains("3 symbols but 1 background frequencies"), "{}", err);

    let duplicate =
        serde_json::from_str::<AlphabetModel>(r#"{"symbols":["A","A"],"background":[0.5,0.5]}"#);
    assert!(duplicate.unwrap_err().to_string().contains("duplicate alphabet symbol 'A'"));
}
