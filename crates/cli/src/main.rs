use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use codes_adapter::{LineListWriter, SqlInsertWriter};
use csv_adapter::CsvTableWriter;
use json_adapter::JsonRecordSource;
use std::io;
use std::path::PathBuf;
use study_core::application::{AnalysisServiceImpl, CodeIssuanceServiceImpl};
use study_core::columns::ColumnMapping;
use study_core::config::{AnalysisConfig, CodeConfig};
use study_core::ports::{CodeWriter, RecordSource, TableWriter};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Tools for the digit-span study: build the analysis table and issue access codes
#[derive(Parser, Debug)]
#[command(name = "digit-span")]
#[command(about = "Flattens study responses into a CSV table and generates participant codes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode the response export, score memory tests and write the measures table
    Analyze(AnalyzeArgs),
    /// Generate a batch of participant access codes on stdout
    Codes(CodesArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// JSON config file; flags below override its values
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Path to the database export with base64-encoded results
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Path where the decoded records are cached
    #[arg(long = "cache")]
    cache: Option<PathBuf>,

    /// Read the decoded cache instead of the raw export
    #[arg(long = "from-cache")]
    from_cache: bool,

    /// Path where the final CSV table will be written
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Payload code that marks a test submission
    #[arg(long = "sentinel")]
    sentinel: Option<String>,

    /// Number of memory-test trials to score
    #[arg(long = "trials")]
    trials: Option<usize>,

    /// Keep only this treatment group (repeatable)
    #[arg(long = "treatment-group")]
    treatment_groups: Vec<i64>,

    /// Text written for cells without a value
    #[arg(long = "missing-marker")]
    missing_marker: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodeFormat {
    Csv,
    Sql,
    Both,
}

#[derive(Args, Debug)]
struct CodesArgs {
    /// JSON config file; flags below override its values
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Characters per code
    #[arg(long = "length")]
    length: Option<usize>,

    /// Codes per batch
    #[arg(long = "count")]
    count: Option<usize>,

    /// Batch to issue; batches before it were issued by earlier runs
    #[arg(long = "batch")]
    batch: Option<usize>,

    #[arg(long = "format", value_enum, default_value_t = CodeFormat::Both)]
    format: CodeFormat,
}

impl AnalyzeArgs {
    fn into_config(self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(cache) = self.cache {
            config.cache_path = cache;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(sentinel) = self.sentinel {
            config.sentinel_code = sentinel;
        }
        if let Some(trials) = self.trials {
            config.memory_trials = trials;
        }
        if !self.treatment_groups.is_empty() {
            config.treatment_groups = self.treatment_groups;
        }
        if let Some(marker) = self.missing_marker {
            config.missing_marker = marker;
        }
        config.from_cache |= self.from_cache;
        config.validate()?;
        Ok(config)
    }
}

impl CodesArgs {
    fn to_config(&self) -> anyhow::Result<CodeConfig> {
        let base = match &self.config {
            Some(path) => CodeConfig::load(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => CodeConfig::default(),
        };
        let config = CodeConfig {
            seed: self.seed.unwrap_or(base.seed),
            length: self.length.unwrap_or(base.length),
            count: self.count.unwrap_or(base.count),
            batch: self.batch.unwrap_or(base.batch),
            ..base
        };
        config.validate()?;
        Ok(config)
    }
}

fn run_analysis(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;

    // Instantiate concrete implementations of secondary adapters
    let record_source: Box<dyn RecordSource> = if config.from_cache {
        Box::new(JsonRecordSource::from_cache(config.cache_path.clone()))
    } else {
        Box::new(JsonRecordSource::from_export(
            config.input_path.clone(),
            Some(config.cache_path.clone()),
        ))
    };
    let table_writer: Box<dyn TableWriter> = Box::new(CsvTableWriter::new(
        config.output_path.clone(),
        config.missing_marker.clone(),
    ));

    let service = AnalysisServiceImpl::new(
        record_source,
        table_writer,
        config.record_filter(),
        ColumnMapping::study(config.memory_trials, &config.questions),
    );

    let table = service
        .execute_analysis()
        .context("Analysis run failed")?;
    info!(
        rows = table.len(),
        path = %config.output_path.display(),
        "analysis complete"
    );
    Ok(())
}

fn run_codes(args: CodesArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;

    let mut code_writers: Vec<Box<dyn CodeWriter>> = Vec::new();
    if matches!(args.format, CodeFormat::Csv | CodeFormat::Both) {
        code_writers.push(Box::new(LineListWriter::new(config.label.clone())));
    }
    if matches!(args.format, CodeFormat::Sql | CodeFormat::Both) {
        code_writers.push(Box::new(SqlInsertWriter::new(config.table.clone())));
    }

    let service = CodeIssuanceServiceImpl::new(code_writers, config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    service
        .execute_issuance(&mut out)
        .context("Code generation failed")?;
    Ok(())
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze(args) => run_analysis(args),
        Commands::Codes(args) => run_codes(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
