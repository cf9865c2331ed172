use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{info, warn};

use phono_synth_core::cache::DEFAULT_CACHE_FILE;
use phono_synth_core::io::{normalize_folder, read_text};
use phono_synth_core::phoneme::espeak::{DEFAULT_PROGRAM, DEFAULT_VOICE};
use phono_synth_core::phoneme::remote::DEFAULT_URL;
use phono_synth_core::synthesis::params::DEFAULT_THRESHOLD;
use phono_synth_core::{
    ChunkMode, CorpusModel, Criterion, Direction, GroupSize, JsonExport, JsonFileCache, ReportFormat, SourceConfig,
    SpreadsheetExport, SynthResult, SynthesisParams, SynthesisReport, Synthesizer, TranscriptionMarks,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceKind {
    Remote,
    Espeak,
}

/// Extracts a phonetically representative excerpt from a text file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Text file to synthesize from
    input: PathBuf,

    /// Chunk unit: sentence or word
    #[arg(long, default_value_t = ChunkMode::Sentence)]
    mode: ChunkMode,

    /// append or delete
    #[arg(long, default_value_t = Direction::Append)]
    direction: Direction,

    /// Selection criterion: pvalue or statistic
    #[arg(long, default_value_t = Criterion::PValue)]
    criterion: Criterion,

    /// Minimum p-value of the kept text
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// 1 = singles, 2 = singles and pairs, 3 = up to triplets
    #[arg(long, default_value_t = GroupSize::SINGLES)]
    group_size: GroupSize,

    #[arg(long, value_enum, default_value_t = SourceKind::Remote)]
    source: SourceKind,

    /// Lookup form url of the remote source
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Phonemizer executable of the espeak source
    #[arg(long, default_value = DEFAULT_PROGRAM)]
    program: String,

    /// Voice of the espeak source
    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,

    /// Transcription cache file
    #[arg(long, default_value = DEFAULT_CACHE_FILE)]
    cache: PathBuf,

    /// Report file (single run only)
    #[arg(long, conflicts_with_all = ["report_dir", "all_modes"])]
    report: Option<PathBuf>,

    /// Report file format: xlsx or json
    #[arg(long, default_value_t = ReportFormat::Xlsx)]
    format: ReportFormat,

    /// Folder receiving the reports under their default names
    #[arg(long)]
    report_dir: Option<String>,

    /// Run every mode, direction, criterion and group size
    #[arg(long)]
    all_modes: bool,

    /// Always rebuild the corpus instead of reusing its snapshot
    #[arg(long)]
    no_snapshot: bool,
}

impl Args {
    fn source_config(&self) -> SourceConfig {
        match self.source {
            SourceKind::Remote => SourceConfig::Remote { url: self.url.clone() },
            SourceKind::Espeak => SourceConfig::Espeak {
                program: self.program.clone(),
                voice: self.voice.clone(),
            },
        }
    }

    fn runs(&self) -> SynthResult<Vec<SynthesisParams>> {
        if self.all_modes {
            return SynthesisParams::grid(self.threshold);
        }
        Ok(vec![SynthesisParams::new(
            self.mode,
            self.direction,
            self.criterion,
            self.group_size,
            self.threshold,
        )?])
    }

    /// Writes `report` in the chosen format and returns its path.
    fn save_report(&self, report: &SynthesisReport) -> SynthResult<PathBuf> {
        let dir = self.report_dir.as_deref().map(normalize_folder);
        match self.format {
            ReportFormat::Xlsx => match dir {
                Some(dir) => SpreadsheetExport::in_dir(report, dir).save(),
                None => SpreadsheetExport::new(report, self.report.clone()).save(),
            },
            ReportFormat::Json => match dir {
                Some(dir) => JsonExport::in_dir(report, dir).save(),
                None => JsonExport::new(report, self.report.clone()).save(),
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Parameters are checked before any transcription work starts
    let runs = args.runs()?;

    let source = args.source_config().build()?;
    let mut cache = JsonFileCache::new(&args.cache);
    let marks = TranscriptionMarks::default();

    let corpus = if args.no_snapshot {
        let raw = read_text(&args.input)?;
        CorpusModel::build(&raw, &source, &mut cache, &marks)?
    } else {
        CorpusModel::load_or_build(&args.input, &source, &mut cache, &marks)?
    };
    info!(
        "corpus: {} words, {} distinct",
        corpus.word_count(),
        corpus.distinct_word_count()
    );

    for params in runs {
        let report = Synthesizer::new(&corpus, params).run()?;
        let path = args.save_report(&report)?;
        println!("{}", report.summary());
        println!("  -> {}", path.display());
        if report.result_words == 0 {
            warn!("{} {} kept no text", params.mode, params.direction);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_params() {
        let args = Args::parse_from([
            "phono-synth",
            "airport.txt",
            "--mode",
            "word",
            "--direction",
            "delete",
            "--criterion",
            "statistic",
            "--group-size",
            "3",
            "--threshold",
            "0.9",
        ]);
        let runs = args.runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].mode, ChunkMode::Word);
        assert_eq!(runs[0].direction, Direction::Delete);
        assert_eq!(runs[0].criterion, Criterion::Statistic);
        assert_eq!(runs[0].group_size, GroupSize::TRIPLETS);
        assert_eq!(runs[0].threshold(), 0.9);
    }

    #[test]
    fn all_modes_runs_the_whole_grid() {
        let args = Args::parse_from(["phono-synth", "airport.txt", "--all-modes"]);
        assert_eq!(args.runs().unwrap().len(), 24);
    }

    #[test]
    fn out_of_range_values_are_refused() {
        assert!(Args::try_parse_from(["phono-synth", "a.txt", "--group-size", "4"]).is_err());
        assert!(Args::try_parse_from(["phono-synth", "a.txt", "--mode", "paragraph"]).is_err());
        let args = Args::parse_from(["phono-synth", "a.txt", "--threshold", "1.5"]);
        assert!(args.runs().is_err());
    }

    #[test]
    fn source_flags_select_the_provider() {
        let args = Args::parse_from(["phono-synth", "a.txt", "--source", "espeak", "--voice", "en-gb"]);
        assert_eq!(
            args.source_config(),
            SourceConfig::Espeak {
                program: DEFAULT_PROGRAM.to_owned(),
                voice: "en-gb".to_owned()
            }
        );
        let args = Args::parse_from(["phono-synth", "a.txt"]);
        assert_eq!(args.source_config(), SourceConfig::remote());
    }

    #[test]
    fn report_format_defaults_to_xlsx() {
        let args = Args::parse_from(["phono-synth", "a.txt"]);
        assert_eq!(args.format, ReportFormat::Xlsx);
        let args = Args::parse_from(["phono-synth", "a.txt", "--format", "json"]);
        assert_eq!(args.format, ReportFormat::Json);
        assert!(Args::try_parse_from(["phono-synth", "a.txt", "--format", "csv"]).is_err());
    }

    #[test]
    fn single_report_path_conflicts_with_grid() {
        assert!(Args::try_parse_from(["phono-synth", "a.txt", "--report", "r.json", "--all-modes"]).is_err());
    }
}
