//! Generates the static HTML page that loads the compiled module.
//!
//! On `DOMContentLoaded` the page fetches the module bytes, instantiates them
//! with an empty import object and calls the entry point. Both suspension
//! points run in order; any failure is reported once to the browser console.

use std::fs;
use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::error::{Error, Result};

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>WebAssembly Integration</title>
    <script>
        async function loadWasm() {
            try {
                const response = await fetch('{{module}}');
                const wasmArrayBuffer = await response.arrayBuffer();
                const { instance } = await WebAssembly.instantiate(wasmArrayBuffer);
                return instance.exports;
            } catch (error) {
                console.error('Failed to load WebAssembly module:', error);
                throw error;
            }
        }

        async function init() {
            try {
                const wasmExports = await loadWasm();
                wasmExports.{{entry}}();
            } catch (error) {
                console.error('Initialization failed:', error);
            }
        }

        document.addEventListener('DOMContentLoaded', init);
    </script>
</head>
<body>
    <h1>WebAssembly Example</h1>
    <p>Check the console for WebAssembly output.</p>
</body>
</html>
"#;

pub struct PageGenerator<'a> {
    config: &'a BuildConfig,
}

impl<'a> PageGenerator<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    /// Render the page. Deterministic for a given configuration.
    pub fn render(&self) -> Result<String> {
        let entry = self.config.exports.entry_point().ok_or_else(|| {
            Error::Config("no exported function to call from the page".to_string())
        })?;

        Ok(PAGE_TEMPLATE
            .replace("{{module}}", &self.config.module_name)
            .replace("{{entry}}", entry))
    }

    /// Write the page into the output directory, replacing any previous one.
    pub fn write_page(&self) -> Result<PathBuf> {
        let html = self.render()?;
        let path = self.config.page_path();
        fs::write(&path, html).map_err(|e| Error::io(&path, e))?;
        tracing::info!("Wrote {}", path.display());
        Ok(path)
    }
}
