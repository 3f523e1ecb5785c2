//! Build configuration.
//!
//! Every component receives a [`BuildConfig`] at construction. The values are
//! fixed for the lifetime of the process.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::toolchain::EMSDK_DIR;

/// The C++ source compiled on every run.
const DEFAULT_SNIPPET: &str = r#"#include <emscripten/emscripten.h>
#include <cstdio>

extern "C" {

EMSCRIPTEN_KEEPALIVE
void executeOutSandbox() {
    printf("Executed outSandbox method in WebAssembly.\n");
}

}
"#;

/// The single compilable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSnippet(String);

impl SourceSnippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SourceSnippet {
    fn default() -> Self {
        Self::new(DEFAULT_SNIPPET)
    }
}

/// Symbols the compiler keeps alive through dead-code elimination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportList {
    /// C function names, without the leading underscore.
    pub functions: Vec<String>,

    /// Runtime helper methods retained in the loader script.
    pub runtime_methods: Vec<String>,
}

impl Default for ExportList {
    fn default() -> Self {
        Self {
            functions: vec!["executeOutSandbox".to_string()],
            runtime_methods: vec!["cwrap".to_string()],
        }
    }
}

impl ExportList {
    /// The function the generated page invokes after instantiation.
    pub fn entry_point(&self) -> Option<&str> {
        self.functions.first().map(String::as_str)
    }

    /// `EXPORTED_FUNCTIONS=[...]` setting, with C symbol mangling applied.
    pub fn functions_setting(&self) -> String {
        let mangled: Vec<String> = self.functions.iter().map(|f| format!("_{f}")).collect();
        format!("EXPORTED_FUNCTIONS={}", json_list(&mangled))
    }

    /// `EXPORTED_RUNTIME_METHODS=[...]` setting.
    pub fn runtime_methods_setting(&self) -> String {
        format!(
            "EXPORTED_RUNTIME_METHODS={}",
            json_list(&self.runtime_methods)
        )
    }
}

fn json_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Filenames and directories for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory the toolchain checkout and output directory live in.
    pub work_dir: PathBuf,

    /// Output directory, relative to `work_dir` unless absolute.
    pub out_dir: PathBuf,

    /// Name of the C++ source written into the output directory.
    pub source_name: String,

    /// Name of the compiled WebAssembly module.
    pub module_name: String,

    /// Name of the loader script emitted by the compiler.
    pub loader_name: String,

    /// Name of the generated HTML page.
    pub page_name: String,

    pub snippet: SourceSnippet,

    pub exports: ExportList,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            out_dir: PathBuf::from("build"),
            source_name: "module.cpp".to_string(),
            module_name: "module.wasm".to_string(),
            loader_name: "module.js".to_string(),
            page_name: "index.html".to_string(),
            snippet: SourceSnippet::default(),
            exports: ExportList::default(),
        }
    }
}

impl BuildConfig {
    /// Default configuration rooted at `work_dir`.
    pub fn in_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    pub fn out_path(&self) -> PathBuf {
        self.work_dir.join(&self.out_dir)
    }

    pub fn source_path(&self) -> PathBuf {
        self.out_path().join(&self.source_name)
    }

    pub fn module_path(&self) -> PathBuf {
        self.out_path().join(&self.module_name)
    }

    pub fn loader_path(&self) -> PathBuf {
        self.out_path().join(&self.loader_name)
    }

    pub fn page_path(&self) -> PathBuf {
        self.out_path().join(&self.page_name)
    }

    /// Check the configuration before any side effect happens.
    ///
    /// The compiler names the module after the loader output, so both must
    /// share a file stem.
    pub fn validate(&self) -> Result<()> {
        self.validate_out_dir()?;

        for (what, name) in [
            ("source", &self.source_name),
            ("module", &self.module_name),
            ("loader", &self.loader_name),
            ("page", &self.page_name),
        ] {
            validate_file_name(what, name)?;
        }

        let module_stem = Path::new(&self.module_name).file_stem();
        let loader_stem = Path::new(&self.loader_name).file_stem();
        if module_stem != loader_stem {
            return Err(Error::Config(format!(
                "module '{}' and loader '{}' must share a file stem",
                self.module_name, self.loader_name
            )));
        }

        if self.exports.entry_point().is_none() {
            return Err(Error::Config(
                "at least one exported function is required".to_string(),
            ));
        }

        Ok(())
    }

    /// The output directory is deleted on every build, so it must be a plain
    /// relative path strictly below `work_dir` and outside the SDK checkout.
    pub fn validate_out_dir(&self) -> Result<()> {
        let shown = self.out_dir.display();
        let mut components = self.out_dir.components().peekable();

        let Some(first) = components.peek() else {
            return Err(Error::Config("output directory is empty".to_string()));
        };
        if *first == Component::Normal(OsStr::new(EMSDK_DIR)) {
            return Err(Error::Config(format!(
                "output directory '{shown}' would overwrite the {EMSDK_DIR} checkout"
            )));
        }
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::Config(format!(
                "output directory '{shown}' must be a relative path below the work directory"
            )));
        }

        Ok(())
    }
}

fn validate_file_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config(format!("{what} filename is empty")));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Config(format!(
            "{what} filename '{name}' must be a plain file name"
        )));
    }
    Ok(())
}
