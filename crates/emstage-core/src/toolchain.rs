//! Toolchain provisioning.
//!
//! Makes sure the Emscripten compiler is callable, installing it through a
//! local `emsdk` checkout when it is not.

use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::process::{CommandSpec, ProcessRunner};

/// Repository cloned when the compiler is missing.
pub const EMSDK_REPO: &str = "https://github.com/emscripten-core/emsdk.git";

/// Checkout directory, relative to the work directory.
pub const EMSDK_DIR: &str = "emsdk";

/// SDK version installed and activated.
pub const EMSDK_VERSION: &str = "latest";

/// Compiler executable looked up on the execution path.
pub const COMPILER: &str = "emcc";

/// Host packages upgraded before anything else runs.
const HOST_PACKAGES: &[&str] = &["setuptools"];

/// Shell family that decides how the SDK scripts are invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Python interpreter used for the host package upgrade.
    pub fn python(self) -> &'static str {
        match self {
            Self::Windows => "python",
            Self::Posix => "python3",
        }
    }

    /// Compiler file name inside an SDK checkout.
    pub fn compiler_file(self) -> &'static str {
        match self {
            Self::Windows => "emcc.bat",
            Self::Posix => "emcc",
        }
    }

    /// Ordered commands that install and activate `version` inside `checkout`.
    pub fn activation_commands(self, checkout: &Path, version: &str) -> Vec<CommandSpec> {
        match self {
            Self::Windows => vec![
                CommandSpec::new("cmd")
                    .args(["/C", "emsdk.bat", "install", version])
                    .current_dir(checkout),
                CommandSpec::new("cmd")
                    .args(["/C", "emsdk.bat", "activate", version])
                    .current_dir(checkout),
                CommandSpec::new("cmd")
                    .args(["/C", "emsdk_env.bat"])
                    .current_dir(checkout),
            ],
            Self::Posix => vec![
                CommandSpec::new("./emsdk")
                    .args(["install", version])
                    .current_dir(checkout),
                CommandSpec::new("./emsdk")
                    .args(["activate", version])
                    .current_dir(checkout),
                CommandSpec::new("sh")
                    .args(["-c", ". ./emsdk_env.sh"])
                    .current_dir(checkout),
            ],
        }
    }
}

/// A callable compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Path (or bare name) used to invoke the compiler.
    pub compiler: PathBuf,

    /// Whether this run installed it.
    pub installed: bool,
}

/// Finds or installs the Emscripten toolchain.
pub struct ToolchainProvisioner<R> {
    runner: R,
    work_dir: PathBuf,
    platform: Platform,
}

impl<R: ProcessRunner> ToolchainProvisioner<R> {
    pub fn new(runner: R, config: &BuildConfig) -> Self {
        Self {
            runner,
            work_dir: config.work_dir.clone(),
            platform: Platform::current(),
        }
    }

    /// Override the detected platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Directory of the local SDK checkout.
    pub fn checkout_dir(&self) -> PathBuf {
        self.work_dir.join(EMSDK_DIR)
    }

    /// Compiler path inside the local SDK checkout.
    pub fn checkout_compiler(&self) -> PathBuf {
        self.checkout_dir()
            .join("upstream")
            .join("emscripten")
            .join(self.platform.compiler_file())
    }

    /// Ensure the compiler is callable, installing it if needed.
    ///
    /// Runs no commands when the compiler is already on the path.
    pub fn ensure_toolchain(&self) -> Result<Toolchain> {
        if let Some(compiler) = self.runner.locate(COMPILER) {
            tracing::info!("Emscripten already installed at {}", compiler.display());
            return Ok(Toolchain {
                compiler,
                installed: false,
            });
        }

        let cached = self.checkout_compiler();
        if cached.is_file() {
            tracing::info!(
                "Emscripten not on PATH, reusing checkout at {}",
                self.checkout_dir().display()
            );
            return Ok(Toolchain {
                compiler: cached,
                installed: false,
            });
        }

        tracing::info!("Installing Emscripten...");
        let compiler = self.install()?;
        tracing::info!("Emscripten installed at {}", compiler.display());

        Ok(Toolchain {
            compiler,
            installed: true,
        })
    }

    /// Upgrade the host Python packages the SDK scripts depend on.
    pub fn upgrade_host_packages(&self) -> Result<()> {
        let cmd = CommandSpec::new(self.platform.python())
            .args(["-m", "pip", "install", "--upgrade"])
            .args(HOST_PACKAGES.iter().copied());

        tracing::debug!("Upgrading host packages: {}", HOST_PACKAGES.join(", "));
        self.runner.run(&cmd)?;
        Ok(())
    }

    fn install(&self) -> Result<PathBuf> {
        let checkout = self.checkout_dir();

        // An earlier interrupted run may have left the clone behind.
        if checkout.join(".git").is_dir() {
            tracing::info!("Reusing existing checkout at {}", checkout.display());
        } else {
            let clone = CommandSpec::new("git")
                .args(["clone", EMSDK_REPO, EMSDK_DIR])
                .current_dir(&self.work_dir);
            self.runner.run(&clone)?;
        }

        self.runner
            .run(&CommandSpec::new("git").arg("pull").current_dir(&checkout))?;

        for cmd in self.platform.activation_commands(&checkout, EMSDK_VERSION) {
            tracing::info!("Running {}", cmd);
            self.runner.run(&cmd)?;
        }

        let compiler = self.checkout_compiler();
        if !compiler.is_file() {
            return Err(Error::EnvironmentMissing(format!(
                "{} not found after activation",
                compiler.display()
            )));
        }

        Ok(compiler)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::ProcessError;
    use crate::testing::RecordingRunner;

    fn provisioner<'a>(
        runner: &'a RecordingRunner,
        dir: &Path,
    ) -> ToolchainProvisioner<&'a RecordingRunner> {
        ToolchainProvisioner::new(runner, &BuildConfig::in_dir(dir)).with_platform(Platform::Posix)
    }

    /// Fake `emsdk activate` that drops a compiler into the checkout.
    fn activating_runner() -> RecordingRunner {
        RecordingRunner::new().on_run("emsdk", |cmd| {
            if cmd.args.first().map(String::as_str) == Some("activate") {
                if let Some(checkout) = &cmd.cwd {
                    let dir = checkout.join("upstream").join("emscripten");
                    fs::create_dir_all(&dir).unwrap();
                    fs::write(dir.join("emcc"), "#!/bin/sh\n").unwrap();
                }
            }
        })
    }

    #[test]
    fn test_present_toolchain_installs_nothing() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().with_program("emcc", "/opt/emsdk/emcc");

        let toolchain = provisioner(&runner, temp.path()).ensure_toolchain().unwrap();

        assert_eq!(toolchain.compiler, PathBuf::from("/opt/emsdk/emcc"));
        assert!(!toolchain.installed);
        assert!(runner.commands().is_empty());
        assert!(!temp.path().join(EMSDK_DIR).exists());
    }

    #[test]
    fn test_missing_toolchain_installs_in_order() {
        let temp = TempDir::new().unwrap();
        let runner = activating_runner();

        let toolchain = provisioner(&runner, temp.path()).ensure_toolchain().unwrap();

        assert!(toolchain.installed);
        assert_eq!(
            toolchain.compiler,
            temp.path().join("emsdk/upstream/emscripten/emcc")
        );
        assert_eq!(
            runner.command_lines(),
            vec![
                format!("git clone {EMSDK_REPO} emsdk"),
                "git pull".to_string(),
                "./emsdk install latest".to_string(),
                "./emsdk activate latest".to_string(),
                r#"sh -c ". ./emsdk_env.sh""#.to_string(),
            ]
        );

        let commands = runner.commands();
        assert_eq!(commands[0].cwd.as_deref(), Some(temp.path()));
        let checkout = temp.path().join("emsdk");
        assert!(commands[1..].iter().all(|c| c.cwd.as_deref() == Some(checkout.as_path())));
    }

    #[test]
    fn test_existing_checkout_skips_clone() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("emsdk/.git")).unwrap();
        let runner = activating_runner();

        provisioner(&runner, temp.path()).ensure_toolchain().unwrap();

        let lines = runner.command_lines();
        assert!(!lines.iter().any(|l| l.starts_with("git clone")));
        assert_eq!(lines[0], "git pull");
    }

    #[test]
    fn test_cached_compiler_is_reused() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("emsdk/upstream/emscripten");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("emcc"), "").unwrap();
        let runner = RecordingRunner::new();

        let toolchain = provisioner(&runner, temp.path()).ensure_toolchain().unwrap();

        assert!(!toolchain.installed);
        assert_eq!(toolchain.compiler, dir.join("emcc"));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_failed_step_stops_install() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().failing("git", 128);

        let err = provisioner(&runner, temp.path()).ensure_toolchain().unwrap_err();

        assert!(matches!(
            err,
            Error::Process(ProcessError::Failed { code: Some(128), .. })
        ));
        // Only the failed clone; nothing after it.
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_upgrade_host_packages() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();

        provisioner(&runner, temp.path()).upgrade_host_packages().unwrap();

        assert_eq!(
            runner.command_lines(),
            vec!["python3 -m pip install --upgrade setuptools"]
        );
    }

    #[test]
    fn test_host_package_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().failing("python3", 1);

        let err = provisioner(&runner, temp.path()).upgrade_host_packages().unwrap_err();

        assert!(matches!(err, Error::Process(_)));
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_activation_without_compiler_is_environment_missing() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();

        let err = provisioner(&runner, temp.path()).ensure_toolchain().unwrap_err();

        assert!(matches!(err, Error::EnvironmentMissing(_)));
    }

    #[test]
    fn test_windows_activation_commands() {
        let commands = Platform::Windows.activation_commands(Path::new("emsdk"), "latest");
        let lines: Vec<String> = commands.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "cmd /C emsdk.bat install latest",
                "cmd /C emsdk.bat activate latest",
                "cmd /C emsdk_env.bat",
            ]
        );
        assert!(commands.iter().all(|c| c.cwd.as_deref() == Some(Path::new("emsdk"))));
        assert_eq!(Platform::Windows.python(), "python");
        assert_eq!(Platform::Windows.compiler_file(), "emcc.bat");
    }
}
