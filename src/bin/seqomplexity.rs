use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{ArgAction, Parser};
use log::{debug, error, info, warn};

use seqomplexity::complexity::{DEFAULT_KMERS, DEFAULT_WINDOW};
use seqomplexity::parser::FastaReader;
use seqomplexity::{
    parse_fasta_file, parse_fasta_stdin, BaseScorer, ComplexityError, ComplexityParams,
    ComplexityScorer, FastaEvent, GcParams, GcScorer, ScoreRun,
};

/// Compute the sequence complexity of every base of a FASTA file: the
/// product over several k of the fraction of distinct k-mers in the window
/// centered on the base.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input FASTA file, plain or gzip/bzip2/xz compressed [default: stdin]
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file [default: stdout]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Odd window size
    #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// Strictly ascending k-mer sizes, each at most the window size
    #[arg(short, long, num_args = 1.., value_delimiter = ',', default_values_t = DEFAULT_KMERS.to_vec())]
    kmers: Vec<u8>,

    /// Compute the GC content of each window instead of its complexity
    #[arg(long)]
    gc: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Default)]
struct Summary {
    records: usize,
    bases: usize,
    skipped: usize,
}

fn build_scorer(args: &Args) -> Result<Box<dyn BaseScorer>, ComplexityError> {
    if args.gc {
        let params = GcParams::new(args.window)?;
        info!("GC content with window {}", params.window());
        return Ok(Box::new(GcScorer::new(params)));
    }
    let params = ComplexityParams::new(args.window, &args.kmers)?;
    if !params.is_canonical() {
        warn!(
            "k-mer sizes {:?} exceed half the window {}; scores will saturate",
            params.kmers(),
            params.window()
        );
    }
    info!(
        "complexity with window {} and k-mer sizes {:?}",
        params.window(),
        params.kmers()
    );
    let scorer: ComplexityScorer = ComplexityScorer::new(params);
    Ok(Box::new(scorer))
}

fn write_run<W: Write>(out: &mut W, run: ScoreRun) -> io::Result<()> {
    for score in run {
        writeln!(out, "{}", score)?;
    }
    Ok(())
}

fn close_record<W: Write>(
    id: &str,
    scorer: &mut dyn BaseScorer,
    out: &mut W,
    summary: &mut Summary,
) -> Result<(), Box<dyn Error>> {
    match scorer.finish() {
        Ok(run) => write_run(out, run)?,
        Err(e @ ComplexityError::SequenceTooShort { .. }) => {
            warn!("skipping record '{}': {}", id, e);
            summary.skipped += 1;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Streams every record through `scorer`, writing a `>id` line followed by
/// one score per base.
fn score_records<R: Read, W: Write>(
    reader: &mut FastaReader<R>,
    scorer: &mut dyn BaseScorer,
    out: &mut W,
) -> Result<Summary, Box<dyn Error>> {
    let mut summary = Summary::default();
    let mut current: Option<String> = None;

    while let Some(event) = reader.next() {
        match event? {
            FastaEvent::Header(id) => {
                let id = String::from_utf8_lossy(id).into_owned();
                if let Some(prev) = current.take() {
                    close_record(&prev, scorer, out, &mut summary)?;
                }
                debug!("scoring record '{}'", id);
                writeln!(out, ">{}", id)?;
                scorer.reset();
                summary.records += 1;
                current = Some(id);
            }
            FastaEvent::Bases(chunk) => {
                summary.bases += chunk.len();
                for &b in chunk {
                    if let Some(run) = scorer.push(b) {
                        write_run(out, run)?;
                    }
                }
            }
        }
    }
    if let Some(prev) = current {
        close_record(&prev, scorer, out, &mut summary)?;
    }
    Ok(summary)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    // configuration errors surface before any input is touched
    let mut scorer = build_scorer(&args)?;

    let mut reader = match args.input.as_deref() {
        Some(path) if path != Path::new("-") => {
            info!("Reading {:?}..", path);
            parse_fasta_file(path)?
        }
        _ => {
            info!("Reading stdin..");
            parse_fasta_stdin()?
        }
    };
    let out: Box<dyn Write> = match args.output.as_deref() {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);

    let start = Instant::now();
    let summary = score_records(&mut reader, scorer.as_mut(), &mut out)?;
    out.flush()?;
    info!(
        "{} records, {} bases, {} skipped in {:.2?}",
        summary.records,
        summary.bases,
        summary.skipped,
        start.elapsed()
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    let verbosity = if args.quiet { 0 } else { 1 + args.verbose as usize };
    if let Err(e) = stderrlog::new().verbosity(verbosity).init() {
        eprintln!("could not set up logging: {}", e);
    }

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
