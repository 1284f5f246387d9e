use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use resource_discovery::formatters::{
    render_json, render_plan, write_output, JsonCompactFormatter,
};
use resource_discovery::{
    DependencyPlan, NoMatch, ResourceDiscoverer, RuleClassifier, WalkOptions,
};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "resource-discovery",
    version,
    about = "Discover resource declarations and their same-file dependencies in Go source trees"
)]
struct Cli {
    /// Files or directories to scan
    #[arg(value_name = "ROOT", default_value = ".")]
    roots: Vec<PathBuf>,

    /// Resource type as `import/path.TypeName` (repeatable)
    #[arg(long = "type", value_name = "QUALIFIED_TYPE")]
    types: Vec<String>,

    /// Treat every type of this import path as a resource (repeatable)
    #[arg(long = "package", value_name = "IMPORT_PATH")]
    packages: Vec<String>,

    /// Additional directory names to skip (repeatable, or comma-separated)
    #[arg(long = "exclude-dir", value_name = "NAME", value_delimiter = ',')]
    exclude_dirs: Vec<String>,

    /// Descend into hidden directories
    #[arg(long)]
    include_hidden: bool,

    /// Descend into vendor directories
    #[arg(long)]
    include_vendor: bool,

    /// Descend into testdata directories
    #[arg(long)]
    include_testdata: bool,

    /// Scan *_test.go files
    #[arg(long)]
    include_tests: bool,

    /// Process files on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log per-file progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum OutputFormat {
    Json,
    JsonCompact,
    Plan,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        roots,
        types,
        packages,
        exclude_dirs,
        include_hidden,
        include_vendor,
        include_testdata,
        include_tests,
        sequential,
        format,
        output,
        verbose: _,
    } = cli;

    let options = exclude_dirs
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .fold(
            WalkOptions::default()
                .with_skip_hidden(!include_hidden)
                .with_skip_vendor(!include_vendor)
                .with_skip_testdata(!include_testdata)
                .with_skip_tests(!include_tests),
            |options, name| options.with_excluded_dir(name),
        );

    let classifier = build_classifier(&types, &packages)?;
    let discoverer = ResourceDiscoverer::new(options).with_parallel(!sequential);

    let start_time = Instant::now();
    let result = if classifier.is_empty() {
        info!("No resource rules given; tracking names only");
        discoverer.discover(&roots, &NoMatch)
    } else {
        discoverer.discover(&roots, &classifier)
    };
    info!(
        "Scanned {} root(s) in {:.2}s",
        roots.len(),
        start_time.elapsed().as_secs_f64()
    );

    if !result.errors.is_empty() {
        warn!("{} item(s) could not be scanned", result.errors.len());
    }

    let rendered = match format {
        OutputFormat::Json => render_json(&result)?,
        OutputFormat::JsonCompact => JsonCompactFormatter::new().format_result(&result)?,
        OutputFormat::Plan => render_plan(&DependencyPlan::build(&result)?)?,
    };
    write_output(&rendered, output.as_deref())
}

fn build_classifier(types: &[String], packages: &[String]) -> Result<RuleClassifier> {
    let mut classifier = packages
        .iter()
        .fold(RuleClassifier::new(), |classifier, package| {
            classifier.with_package(package.trim())
        });

    for qualified in types {
        classifier = match classifier.with_qualified_type(qualified.trim()) {
            Some(classifier) => classifier,
            None => bail!("invalid --type `{qualified}`: expected import/path.TypeName"),
        };
    }

    Ok(classifier)
}
