use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use langpack_config::{load_config, Settings};
use langpack_services::{cache_translations, PipelineReport};
use std::io::IsTerminal;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Refresh translation metadata, compile catalogs and build one archive per language.
///
/// Paths, fetching and the compiler backend come from `langpack.toml`
/// (current directory, then the user config directory) and `LANGPACK_*` /
/// `CROWDIN_*` environment variables.
#[derive(Parser)]
#[command(name = "langpack", version, about)]
struct Cli {
    /// Plain output even on a terminal.
    #[arg(long)]
    no_color: bool,
}

// The returned guard flushes the file writer on drop; keep it alive for the whole run.
fn init_tracing() -> WorkerGuard {
    let file_appender = rolling::daily("logs", "langpack.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn run(use_color: bool) -> Result<()> {
    let cfg = load_config().wrap_err("failed to load configuration")?;
    let settings = Settings::resolve(cfg).wrap_err("invalid configuration")?;
    debug!(
        locale_root = %settings.locale_root.display(),
        language_pack_root = %settings.language_pack_root.display(),
        compile = ?settings.compile,
        fetch = settings.fetch.is_some()
    );

    let report = cache_translations(&settings)?;
    print_report(&report, use_color);
    Ok(())
}

fn print_report(report: &PipelineReport, use_color: bool) {
    use owo_colors::OwoColorize;

    for (lang, files) in &report.fetched {
        println!("fetched {lang}: {files} file(s)");
    }
    for meta in &report.metadata {
        let percent = format!("{:>5.1}%", meta.percent_translated * 100.0);
        let version = format!("v{}", meta.version);
        if use_color {
            println!(
                "{} {:<8} {:<24} {} {}",
                "✔".green(),
                meta.code.bold(),
                meta.name,
                percent.cyan(),
                version.yellow()
            );
        } else {
            println!("✔ {:<8} {:<24} {} {}", meta.code, meta.name, percent, version);
        }
    }
    match report.compiled.messages {
        Some(n) => println!(
            "compiled {} catalog(s), {} message(s) [{}]",
            report.compiled.catalogs, n, report.compiler
        ),
        None => println!(
            "compiled {} catalog(s) [{}]",
            report.compiled.catalogs, report.compiler
        ),
    }
    for pack in &report.packs {
        println!("{} -> {}", pack.code, pack.archive.display());
    }
    println!("manifest: {}", report.manifest.display());
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing();

    let cli = Cli::parse();
    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    info!(event = "langpack_start", version = env!("CARGO_PKG_VERSION"));
    let result = run(use_color);
    match &result {
        Ok(()) => info!(event = "langpack_done"),
        Err(e) => error!(event = "langpack_failed", error = %e),
    }
    result
}
