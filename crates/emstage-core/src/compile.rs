//! Compiles the source snippet into a WebAssembly module and loader script.

use std::fs;
use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::process::{CommandSpec, ProcessRunner};
use crate::toolchain::Toolchain;

/// Outputs of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub source: PathBuf,
    pub module: PathBuf,
    pub loader: PathBuf,
}

/// Writes the snippet to the output directory and runs the compiler on it.
pub struct ArtifactCompiler<'a, R> {
    runner: R,
    config: &'a BuildConfig,
}

impl<'a, R: ProcessRunner> ArtifactCompiler<'a, R> {
    pub fn new(runner: R, config: &'a BuildConfig) -> Self {
        Self { runner, config }
    }

    /// The compiler invocation for `toolchain`.
    pub fn command(&self, toolchain: &Toolchain) -> CommandSpec {
        let exports = &self.config.exports;
        CommandSpec::new(toolchain.compiler.to_string_lossy())
            .arg(self.config.source_path().to_string_lossy())
            .arg("-o")
            .arg(self.config.loader_path().to_string_lossy())
            .args(["-s".to_string(), exports.functions_setting()])
            .args(["-s".to_string(), exports.runtime_methods_setting()])
    }

    /// Recreate the output directory, write the source, and compile it.
    ///
    /// The source file is left on disk when the compiler fails.
    pub fn compile(&self, toolchain: &Toolchain) -> Result<CompiledArtifact> {
        self.prepare_output_dir()?;

        let source = self.config.source_path();
        fs::write(&source, self.config.snippet.as_str()).map_err(|e| Error::io(&source, e))?;
        tracing::debug!("Wrote {}", source.display());

        let cmd = self.command(toolchain);
        tracing::info!("Compiling {} to WebAssembly", self.config.source_name);
        self.runner.run(&cmd)?;

        let artifact = CompiledArtifact {
            source,
            module: self.config.module_path(),
            loader: self.config.loader_path(),
        };

        for path in [&artifact.module, &artifact.loader] {
            if !path.is_file() {
                return Err(Error::MissingArtifact(path.clone()));
            }
        }

        Ok(artifact)
    }

    /// Remove any previous output directory and create it empty.
    fn prepare_output_dir(&self) -> Result<()> {
        self.config.validate_out_dir()?;

        let out = self.config.out_path();
        if out.exists() {
            tracing::debug!("Removing previous output at {}", out.display());
            fs::remove_dir_all(&out).map_err(|e| Error::io(&out, e))?;
        }
        fs::create_dir_all(&out).map_err(|e| Error::io(&out, e))
    }
}
