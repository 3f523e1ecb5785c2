//! emstage CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use emstage::colors;
use emstage::{BuildConfig, PipelineError, PipelineRunner, ServerConfig, ShutdownSignal, SystemRunner};

#[derive(Parser)]
#[command(name = "emstage")]
#[command(about = "Compile a C++ snippet to WebAssembly and serve it with a loader page")]
#[command(version)]
struct Cli {
    /// Port to serve the output directory on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Output directory, recreated on every run
    #[arg(short, long, default_value = "build")]
    out_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}error:{} {:#}", colors::RED, colors::RESET, err);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let format_error = |err: PipelineError| anyhow::anyhow!("{}", err.with_hint());

    let build = BuildConfig {
        out_dir: cli.out_dir,
        ..BuildConfig::default()
    };
    let server = ServerConfig {
        port: cli.port,
        ..ServerConfig::default()
    };
    let pipeline = PipelineRunner::new(build, server, SystemRunner).with_progress(true);

    println!(
        "\n{}emstage{} - C++ to WebAssembly\n",
        colors::BOLD,
        colors::RESET
    );

    let artifacts = pipeline.build().map_err(format_error)?;

    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Output:{} {}",
        colors::CYAN,
        colors::RESET,
        pipeline.server_config().root.display()
    );
    println!(
        "{}  ◆ Module:{} {}",
        colors::CYAN,
        colors::RESET,
        artifacts.module.display()
    );
    println!(
        "{}  ◆ Serving at:{} http://localhost:{}",
        colors::CYAN,
        colors::RESET,
        pipeline.server_config().port
    );
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    // Registered only now so Ctrl+C during the build still kills the process.
    pipeline
        .serve(ShutdownSignal::ctrl_c())
        .await
        .map_err(format_error)?;

    println!("Server interrupted by user. Shutting down.");
    Ok(())
}
