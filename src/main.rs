use clap::Parser;
use eyre::{Context, Result};
use inmake::{Cli, Config, OutputFormatter, RunReport, RunStats, Runner, get_formatter};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Apply CLI overrides to configuration
    cli.apply_overrides(&mut config)?;

    if cli.show_config {
        return show_config(&config);
    }

    let files = cli.get_files();
    if files.is_empty() {
        return Err(eyre::eyre!(
            "No input files specified! Use inmake --help for how to add input files."
        ));
    }

    let extractor = cli.build_extractor(&config)?;
    info!(mode = extractor.mode().name(), "searching for build commands");
    for rule in extractor.rules() {
        debug!(%rule, "substitution rule");
    }

    let ignore_nonmatched = config.ignore_nonmatched;
    let runner = Runner::new(extractor, config);
    let outcomes = runner.run(&files).context("Extraction failed")?;
    let report = RunReport::from_outcomes(outcomes, ignore_nonmatched);

    for path in &report.skipped {
        info!(path = %path.display(), "no build command found, skipped");
    }

    let formatter = get_formatter(&cli.format);
    let output = formatter.format_report(&report);
    if !output.is_empty() {
        println!("{}", output);
    }

    let stats = RunStats::from_report(&report);
    info!(
        files = stats.total_files,
        commands = stats.commands,
        skipped = stats.skipped,
        failures = stats.failures,
        "done"
    );

    if stats.has_failures() {
        for (path, error) in &report.failures {
            eprintln!("inmake: {}: {}", path.display(), error);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Show the effective configuration
fn show_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;

    println!("Effective configuration:");
    println!("{}", yaml);

    Ok(())
}

/// `--verbose` enables INFO level, otherwise RUST_LOG or WARN
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
