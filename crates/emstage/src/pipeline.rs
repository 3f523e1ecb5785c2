//! The build-and-serve pipeline.
//!
//! Steps run strictly in order and the first failure stops the run:
//!
//! ```text
//! validate config ─► prepare host ─► provision toolchain ─► compile ─► write page ─► serve
//! ```
//!
//! Nothing is rolled back; files written before a failure stay on disk.

use std::fmt;
use std::path::PathBuf;

use emstage_core::{
    ArtifactCompiler, BuildConfig, PageGenerator, Platform, ProcessRunner, Toolchain,
    ToolchainProvisioner,
};
use emstage_server::{ServerConfig, ServerError, ShutdownSignal, StaticServer};

use crate::colors;

/// A pipeline stage, named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Configure,
    Prepare,
    Provision,
    Compile,
    WritePage,
    Serve,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configure => "configuration",
            Self::Prepare => "host preparation",
            Self::Provision => "toolchain provisioning",
            Self::Compile => "compilation",
            Self::WritePage => "page generation",
            Self::Serve => "server",
        })
    }
}

/// What went wrong inside a step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Build(#[from] emstage_core::Error),

    #[error(transparent)]
    Serve(#[from] ServerError),
}

/// A failed step and its cause.
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct PipelineError {
    pub step: Step,
    #[source]
    pub source: StepError,
}

impl PipelineError {
    fn new(step: Step, source: impl Into<StepError>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }

    /// The error message followed by a recovery hint, if one applies.
    pub fn with_hint(&self) -> String {
        let hint = match &self.source {
            StepError::Build(e) => e.hint(),
            StepError::Serve(e) => e.hint(),
        };
        match hint {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Files produced by a successful build.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub toolchain: Toolchain,
    pub source: PathBuf,
    pub module: PathBuf,
    pub loader: PathBuf,
    pub page: PathBuf,
}

/// Runs provisioning, compilation, page generation and the server in order.
pub struct PipelineRunner<R> {
    build: BuildConfig,
    server: ServerConfig,
    runner: R,
    platform: Platform,
    progress: bool,
}

impl<R: ProcessRunner> PipelineRunner<R> {
    /// Create a runner. The server root and index always follow `build`.
    pub fn new(build: BuildConfig, server: ServerConfig, runner: R) -> Self {
        let server = ServerConfig {
            root: build.out_path(),
            index: build.page_name.clone(),
            ..server
        };
        Self {
            build,
            server,
            runner,
            platform: Platform::current(),
            progress: false,
        }
    }

    /// Override the detected platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Print a line per step to stdout.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Prepare the host, provision, compile and write the page.
    pub fn build(&self) -> PipelineResult<Artifacts> {
        self.build
            .validate()
            .map_err(|e| PipelineError::new(Step::Configure, e))?;

        let provisioner =
            ToolchainProvisioner::new(&self.runner, &self.build).with_platform(self.platform);

        self.step("Upgrading host packages", Step::Prepare, || {
            provisioner.upgrade_host_packages()
        })?;

        let toolchain = self.step("Provisioning toolchain", Step::Provision, || {
            provisioner.ensure_toolchain()
        })?;

        let compiled = self.step("Compiling to WebAssembly", Step::Compile, || {
            ArtifactCompiler::new(&self.runner, &self.build).compile(&toolchain)
        })?;

        let page = self.step("Writing page", Step::WritePage, || {
            PageGenerator::new(&self.build).write_page()
        })?;

        Ok(Artifacts {
            toolchain,
            source: compiled.source,
            module: compiled.module,
            loader: compiled.loader,
            page,
        })
    }

    /// Serve the output directory until `shutdown` fires.
    pub async fn serve(&self, shutdown: ShutdownSignal) -> PipelineResult<()> {
        StaticServer::new(self.server.clone())
            .serve(shutdown)
            .await
            .map_err(|e| PipelineError::new(Step::Serve, e))
    }

    /// Build, then serve until `shutdown` fires.
    pub async fn run(&self, shutdown: ShutdownSignal) -> PipelineResult<Artifacts> {
        let artifacts = self.build()?;
        self.serve(shutdown).await?;
        Ok(artifacts)
    }

    fn step<T>(
        &self,
        label: &str,
        step: Step,
        f: impl FnOnce() -> emstage_core::Result<T>,
    ) -> PipelineResult<T> {
        if self.progress {
            print!("{}  ◆ {}{} ... ", colors::BLUE, label, colors::RESET);
            colors::flush_stdout();
        }

        let result = f();

        if self.progress {
            match &result {
                Ok(_) => println!("{}done{}", colors::GREEN, colors::RESET),
                Err(_) => println!("{}failed{}", colors::RED, colors::RESET),
            }
        }

        result.map_err(|e| {
            tracing::error!("{} failed: {}", step, e);
            PipelineError::new(step, e)
        })
    }
}
