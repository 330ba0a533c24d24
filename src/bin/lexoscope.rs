use clap::Parser;
use lexoscope::affinity::{AffinityConfig, Preference};
use lexoscope::corpus::{self, CorpusUnit};
use lexoscope::pipeline::{self, PipelineConfig, UnitStatus};
use lexoscope::report;
use lexoscope::vectorizer::NgramConfig;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

#[derive(Parser, Debug)]
#[command(name = "lexoscope", version, about = "Lexical n-gram clustering for multilingual corpora")]
struct Cli {
    /// Token list inputs (`-` for stdin, one token per line). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Output directory for per-unit cluster reports
    #[arg(long = "out-dir", default_value = "results")]
    out_dir: PathBuf,

    /// Character n-gram range (inclusive)
    #[arg(long = "ngram-min", default_value_t = 2)] ngram_min: usize,
    #[arg(long = "ngram-max", default_value_t = 3)] ngram_max: usize,
    /// Pad tokens with boundary markers before n-gram extraction
    #[arg(long = "pad", default_value_t = false)] pad: bool,

    // Affinity propagation knobs
    #[arg(long = "damping", default_value_t = 0.7)] damping: f64,
    #[arg(long = "max-iter", default_value_t = 1000)] max_iter: usize,
    #[arg(long = "convergence-iter", default_value_t = 15)] convergence_iter: usize,
    /// Exemplar preference: `median` or a fixed value
    #[arg(long = "preference", default_value = "median")] preference: String,

    // Unit gating
    #[arg(long = "min-tokens", default_value_t = 5)] min_tokens: usize,
    #[arg(long = "min-token-len", default_value_t = 1)] min_token_len: usize,
    /// Keep per-occurrence duplicates instead of deduplicating per unit
    #[arg(long = "keep-duplicates", default_value_t = false)] keep_duplicates: bool,

    /// Merge all inputs into a single corpus unit
    #[arg(long = "merge", default_value_t = false)] merge: bool,
    /// Keep only tokens matching this regex
    #[arg(long = "match")] match_re: Option<String>,
    /// Drop tokens matching this regex
    #[arg(long = "exclude")] exclude_re: Option<String>,

    /// Load existing reports from the inputs and print their stats instead of clustering
    #[arg(long = "inspect", default_value_t = false)] inspect: bool,
}

fn main() -> anyhow::Result<()> {
    init_parallelism();
    let cli = Cli::parse();

    if cli.inspect {
        return inspect(&cli.input);
    }

    let inputs = if cli.input.is_empty() { vec!["-".to_string()] } else { cli.input.clone() };
    let mut units: Vec<CorpusUnit> = Vec::new();
    for input in &inputs {
        if input == "-" {
            let stdin = io::stdin();
            units.push(corpus::unit_from_reader(stdin.lock(), "stdin")?);
        } else {
            units.extend(corpus::units_from_path(Path::new(input))?);
        }
    }

    let match_re = cli.match_re.as_deref().map(Regex::new).transpose()?;
    let exclude_re = cli.exclude_re.as_deref().map(Regex::new).transpose()?;
    if match_re.is_some() || exclude_re.is_some() {
        for unit in &mut units {
            unit.tokens.retain(|t| {
                match_re.as_ref().map(|re| re.is_match(t)).unwrap_or(true)
                    && !exclude_re.as_ref().map(|re| re.is_match(t)).unwrap_or(false)
            });
        }
    }
    if cli.merge {
        units = vec![corpus::merge(units)];
    }

    let preference = if cli.preference == "median" {
        Preference::Median
    } else {
        Preference::Value(cli.preference.parse()?)
    };
    let cfg = PipelineConfig {
        ngram: NgramConfig { min: cli.ngram_min, max: cli.ngram_max, pad_boundaries: cli.pad },
        dedup: !cli.keep_duplicates,
        min_token_len: cli.min_token_len,
        min_tokens: cli.min_tokens,
        affinity: AffinityConfig {
            damping: cli.damping,
            max_iter: cli.max_iter,
            convergence_iter: cli.convergence_iter,
            preference,
        },
    };

    let outcomes = pipeline::run_units(&units, &cfg)?;

    std::fs::create_dir_all(&cli.out_dir)?;
    for outcome in &outcomes {
        match &outcome.report {
            Some(rep) => {
                let path = cli.out_dir.join(format!("clusters_{}.json", sanitize(&outcome.unit)));
                report::save(rep, &path)?;
                if outcome.status == UnitStatus::NonConvergent {
                    eprintln!(
                        "[warn] unit {}: no stable exemplar set within {} iterations, report flagged non-convergent",
                        outcome.unit, cli.max_iter
                    );
                }
            }
            None => {
                eprintln!(
                    "[warn] unit {}: skipped ({}, {} tokens)",
                    outcome.unit,
                    outcome.status.as_str(),
                    outcome.token_count
                );
            }
        }
    }

    let summary = pipeline::summarize(&outcomes);
    let out = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{}", out);
    Ok(())
}

fn sanitize(id: &str) -> String {
    id.chars().map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect()
}

/// Report inspection mode: validate and summarize previously written
/// reports. A malformed report is reported and skipped; the rest still print.
fn inspect(inputs: &[String]) -> anyhow::Result<()> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
                .collect();
            entries.sort();
            paths.extend(entries);
        } else {
            paths.push(path.to_path_buf());
        }
    }
    for path in paths {
        match report::load(&path) {
            Ok(rep) => println!("{}", serde_json::to_string(&report::stats(&rep))?),
            Err(e) => eprintln!("[error] {}: {}", path.display(), e),
        }
    }
    Ok(())
}
