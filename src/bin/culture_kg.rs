use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use culture_kg::app::{BuildOptions, BuildResult, Pipeline, ProgressSink};
use culture_kg::config::ConfigLoader;
use culture_kg::error::KgError;
use culture_kg::ncbi::NcbiTaxonomyClient;
use culture_kg::output::{JsonOutput, LogSink, OutputMode};

#[derive(Parser)]
#[command(name = "culture-kg")]
#[command(about = "Builds a deduplicated KGX graph of microbial strains and growth media")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Parse, consolidate and export every configured source")]
    Build(BuildArgs),
}

#[derive(Args, Clone, Default)]
struct BuildArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    output_dir: Option<Utf8PathBuf>,

    #[arg(long)]
    enrich: bool,

    #[arg(long)]
    no_enrich: bool,

    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kg) = report.downcast_ref::<KgError>() {
            return ExitCode::from(map_exit_code(kg));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KgError) -> u8 {
    match error {
        KgError::MissingConfig | KgError::InvalidSourceSpecifier(_) => 2,
        KgError::NcbiHttp(_) | KgError::NcbiStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Some(Commands::Build(args)) => run_build(args, output_mode),
        None => run_build(BuildArgs::default(), output_mode),
    }
}

fn run_build(args: BuildArgs, output_mode: OutputMode) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref())?;
    let enrich = if args.enrich {
        Some(true)
    } else if args.no_enrich {
        Some(false)
    } else {
        None
    };
    let options = BuildOptions {
        output_dir: args.output_dir,
        enrich,
        limit: args.limit,
    };

    let taxonomy = NcbiTaxonomyClient::new()?;
    let pipeline = Pipeline::new(taxonomy);
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &LogSink,
        OutputMode::NonInteractive => &JsonOutput,
    };
    let result = pipeline.run(&config, options, sink)?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_build(&result).into_diagnostic()?,
        OutputMode::Interactive => print_build_summary(&result),
    }
    Ok(())
}

fn print_build_summary(result: &BuildResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}culture-kg build summary{reset}");
    for source in &result.sources {
        println!(
            "{cyan}  {} {} ({} records){reset}",
            source.kind, source.path, source.records
        );
    }
    println!(
        "{green}strains: {} (from {} parsed, {} merged){reset}",
        result.strains, result.parsed_records, result.consolidation.merged
    );
    if let Some(enrichment) = &result.enrichment {
        let color = if enrichment.failed > 0 { yellow } else { green };
        println!(
            "{color}enrichment: {} lookups, {} enriched, {} not found, {} failed{reset}",
            enrichment.lookups, enrichment.enriched, enrichment.not_found, enrichment.failed
        );
    }
    println!(
        "{green}graph: {} nodes, {} edges{reset}",
        result.graph.nodes_out, result.graph.edges_out
    );
    println!("{cyan}  {}{reset}", result.graph.nodes_path);
    println!("{cyan}  {}{reset}", result.graph.edges_path);
    println!("{cyan}  {}{reset}", result.strain_tsv.nodes_path);
    println!("{cyan}  {}{reset}", result.report_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_client_fails() -> miette::Result<()> {
        let client: Result<(), KgError> =
            Err(KgError::NcbiHttp("client build failed".to_string()));
        client?;
        Ok(())
    }

    #[test]
    fn propagated_errors_keep_their_exit_code() {
        let report = build_client_fails().unwrap_err();
        let kg = report.downcast_ref::<KgError>().unwrap();
        assert_eq!(map_exit_code(kg), 3);
    }

    #[test]
    fn exit_codes_by_error_family() {
        assert_eq!(map_exit_code(&KgError::MissingConfig), 2);
        assert_eq!(map_exit_code(&KgError::InvalidSourceSpecifier("x".to_string())), 2);
        assert_eq!(
            map_exit_code(&KgError::NcbiStatus {
                status: 503,
                message: "unavailable".to_string(),
            }),
            3
        );
        assert_eq!(map_exit_code(&KgError::InvalidRank("no rank".to_string())), 1);
    }
}
