use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;

use wordfreq_rs::common::io::read_stdin;
use wordfreq_rs::common::{init_logging, io_error_msg, level_for, reset_sigpipe};
use wordfreq_rs::config::{DEFAULT_BLOCK_SIZE, DEFAULT_BUCKET_COUNT, DEFAULT_PARTITION_COUNT};
use wordfreq_rs::instrument::{CpuTimeAccumulator, resident_memory};
use wordfreq_rs::report::{FreqWriter, ReportSink};
use wordfreq_rs::{FreqConfig, Mode, count_file, count_words};

#[derive(Parser)]
#[command(
    name = "fwordfreq",
    version,
    about = "Count word frequencies in FILE, most frequent first"
)]
struct Cli {
    /// Counting strategy: seq, std or lockfree
    #[arg(short = 'm', long = "mode", default_value = "lockfree")]
    mode: Mode,

    /// Number of word-aligned partitions (one worker each)
    #[arg(short = 'j', long = "partitions", default_value_t = DEFAULT_PARTITION_COUNT)]
    partitions: usize,

    /// Number of hash buckets in the shared table
    #[arg(long = "buckets", default_value_t = DEFAULT_BUCKET_COUNT)]
    buckets: usize,

    /// Scanner block size in bytes; must exceed the longest word
    #[arg(long = "block-size", default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Write the report to PATH instead of standard output
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Only list the N most frequent words (totals still cover every word)
    #[arg(short = 'n', long = "top", value_name = "N")]
    top: Option<usize>,

    /// Read the file with positional reads instead of mapping it
    #[arg(long = "no-mmap")]
    no_mmap: bool,

    /// More logging on stderr (repeat for debug and trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Text file to count (reads stdin if omitted or -)
    #[arg(default_value = "-")]
    file: String,
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = FreqConfig::new(cli.partitions, cli.buckets)?.with_block_size(cli.block_size);
    config.validate()?;

    let cpu = CpuTimeAccumulator::new();
    let start = Instant::now();
    let report = if cli.file == "-" {
        let data = read_stdin()
            .map_err(|e| anyhow::anyhow!("standard input: {}", io_error_msg(&e)))?;
        count_words(&data[..], cli.mode, &config, &cpu)?
    } else {
        count_file(Path::new(&cli.file), cli.mode, &config, !cli.no_mmap, &cpu)?
    };
    info!(
        "{} (mode={}, N={}): {} words, {} unique, wall {:?}, cpu {:?}, {}",
        cli.file,
        cli.mode,
        config.partition_count(),
        report.total_words,
        report.unique_words,
        start.elapsed(),
        cpu.total(),
        resident_memory()
    );

    let pairs = match cli.top {
        Some(n) => report.top(n),
        None => &report.pairs[..],
    };
    match &cli.output {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::create(path)
                .with_context(|| format!("cannot create '{}'", path.display()))?;
            FreqWriter::new(file).accept(report.total_words, report.unique_words, pairs)?;
        }
        _ => {
            let stdout = io::stdout();
            FreqWriter::new(stdout.lock()).accept(report.total_words, report.unique_words, pairs)?;
        }
    }
    Ok(())
}

fn main() {
    reset_sigpipe();
    let cli = Cli::parse();
    init_logging(level_for(cli.verbose, cli.quiet));

    if let Err(e) = run(&cli) {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::BrokenPipe {
                process::exit(0);
            }
        }
        eprintln!("fwordfreq: {:#}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::process::{Command, Stdio};

    fn cmd() -> Command {
        let mut path = std::env::current_exe().unwrap();
        path.pop();
        path.pop();
        path.push("fwordfreq");
        Command::new(path)
    }

    fn run_stdin(args: &[&str], input: &[u8]) -> std::process::Output {
        let mut child = cmd()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        child.stdin.take().unwrap().write_all(input).unwrap();
        child.wait_with_output().unwrap()
    }

    const CAT_SAT: &[u8] = b"The cat sat. The dog sat!";
    const CAT_SAT_REPORT: &str = "6\n4\n2 sat\n2 the\n1 cat\n1 dog\n";

    #[test]
    fn test_stdin_two_partitions() {
        let output = run_stdin(&["-j", "2"], CAT_SAT);
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), CAT_SAT_REPORT);
    }

    #[test]
    fn test_every_mode_prints_same_report() {
        for mode in ["seq", "std", "lockfree"] {
            let output = run_stdin(&["-m", mode, "-j", "3"], CAT_SAT);
            assert!(output.status.success(), "mode {}", mode);
            assert_eq!(String::from_utf8_lossy(&output.stdout), CAT_SAT_REPORT);
        }
    }

    #[test]
    fn test_top_limits_pairs_not_totals() {
        let output = run_stdin(&["--top", "1"], CAT_SAT);
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "6\n4\n2 sat\n");
    }

    #[test]
    fn test_file_argument_with_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.txt");
        let report = dir.path().join("lockfree.freq");
        std::fs::write(&input, CAT_SAT).unwrap();
        for extra in [&[][..], &["--no-mmap"][..]] {
            let output = cmd()
                .arg(&input)
                .arg("-o")
                .arg(&report)
                .args(extra)
                .output()
                .unwrap();
            assert!(output.status.success());
            assert!(output.stdout.is_empty());
            assert_eq!(std::fs::read_to_string(&report).unwrap(), CAT_SAT_REPORT);
        }
    }

    #[test]
    fn test_missing_file_fails() {
        let output = cmd().arg("/nonexistent/corpus.txt").output().unwrap();
        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("fwordfreq: cannot open '/nonexistent/corpus.txt'"));
    }

    #[test]
    fn test_zero_partitions_rejected() {
        let output = run_stdin(&["-j", "0"], CAT_SAT);
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("partition count"));
    }

    #[test]
    fn test_word_longer_than_block_fails() {
        let mut input = b"a ".to_vec();
        input.extend(std::iter::repeat_n(b'x', 64));
        input.extend_from_slice(b" b c d");
        let output = run_stdin(&["--block-size", "16", "-j", "1"], &input);
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("exceeds the 16-byte scan block"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let output = run_stdin(&["-m", "parallel"], CAT_SAT);
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("unknown mode"));
    }
}
