use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_db_combine::app::{App, GatherRequest};
use kira_db_combine::config::{ConfigLoader, ResolvedConfig};
use kira_db_combine::contigs::FileContigCounter;
use kira_db_combine::domain::KeepPolicy;
use kira_db_combine::error::KiraError;
use kira_db_combine::fs_util::{FsLister, FsMaterializer};
use kira_db_combine::names::SanitizingNameSafety;
use kira_db_combine::output::{JsonOutput, OutputMode, report_sink};

#[derive(Parser)]
#[command(name = "kira-dbc")]
#[command(about = "Combine genome assembly databases with safe, collision-free file names")]
#[command(version, author)]
struct Cli {
    /// Print the final result as JSON on stdout; the report goes to stderr.
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Config file (defaults to ./kira-dbc.json when present).
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Check databases for illegal and duplicated file names")]
    Check(CheckArgs),
    #[command(about = "Combine databases (folders) into one target folder")]
    Combine(CombineArgs),
    #[command(about = "Pick one assembly per strain from an ncbi-genome-download run")]
    Gather(GatherArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Paths of databases (folders) to check.
    #[arg(required = true)]
    paths: Vec<Utf8PathBuf>,

    /// If duplicated file names are found, keep "first" or "all".
    #[arg(long)]
    keep: Option<KeepPolicy>,
}

#[derive(Args)]
struct CombineArgs {
    /// Paths of databases (folders) to combine.
    #[arg(required = true)]
    paths: Vec<Utf8PathBuf>,

    /// Target dir to store combined files; must not exist yet.
    #[arg(short = 't', long = "target")]
    target: Option<Utf8PathBuf>,

    /// If duplicated file names are found, keep "first" or "all".
    #[arg(long)]
    keep: Option<KeepPolicy>,
}

#[derive(Args)]
struct GatherArgs {
    /// The .tsv file generated by the `-m` switch.
    tsv: Utf8PathBuf,

    /// The directory generated by the `-o` parameter.
    dir: Utf8PathBuf,

    /// Exclusion list file, one item per line.
    #[arg(long)]
    exclude_list: Option<Utf8PathBuf>,

    /// Maximum number of contigs for a draft genome to be kept.
    #[arg(long)]
    max_ctg: Option<usize>,

    /// Target directory (defaults to `<dir>-ready`).
    #[arg(long)]
    target_dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::TargetExists(_)
        | KiraError::InvalidPolicy(_)
        | KiraError::MissingConfig(_)
        | KiraError::ConfigRead(_)
        | KiraError::ConfigParse(_) => 2,
        KiraError::Copy(_) | KiraError::ContigCount { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let app = App::new(FsLister, SanitizingNameSafety, FsMaterializer);

    match cli.command {
        Commands::Check(args) => run_check(args, &app, &config, output_mode),
        Commands::Combine(args) => run_combine(args, &app, &config, output_mode),
        Commands::Gather(args) => run_gather(args, &app, &config, output_mode),
    }
}

type FsApp = App<FsLister, SanitizingNameSafety, FsMaterializer>;

fn run_check(
    args: CheckArgs,
    app: &FsApp,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let policy = args.keep.unwrap_or(config.keep);
    let result = app.check(&args.paths, policy, report_sink(output_mode))?;
    if matches!(output_mode, OutputMode::NonInteractive) {
        JsonOutput::print_check(&result).into_diagnostic()?;
    }
    Ok(())
}

fn run_combine(
    args: CombineArgs,
    app: &FsApp,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let policy = args.keep.unwrap_or(config.keep);
    let result = app.combine(
        &args.paths,
        args.target.as_deref(),
        policy,
        report_sink(output_mode),
    )?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_combine(&result).into_diagnostic()?,
        OutputMode::Interactive => match &result.target_dir {
            Some(target) => println!("Copied {} file(s) into {target}", result.copies.len()),
            None => println!("No target given (-t), nothing copied."),
        },
    }
    Ok(())
}

fn run_gather(
    args: GatherArgs,
    app: &FsApp,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let request = GatherRequest {
        tsv: args.tsv,
        download_dir: args.dir,
        exclude_list: args.exclude_list.or_else(|| config.exclude_list.clone()),
        max_contigs: args.max_ctg.or(config.max_contigs),
        target_dir: args.target_dir,
    };
    let result = app.gather(&request, &FileContigCounter, report_sink(output_mode))?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_gather(&result).into_diagnostic()?,
        OutputMode::Interactive => {
            println!(
                "Gathered {} assemblies into {}",
                result.gathered.len(),
                result.target_dir
            );
            println!(
                "Excluded {}, skipped {}, too many contigs {}",
                result.excluded.len(),
                result.skipped.len(),
                result.too_many_contigs.len()
            );
            println!("Included list: {}", result.include_list);
            println!("Excluded list: {}", result.exclude_list);
        }
    }
    Ok(())
}
