//! emstage - compile a C++ snippet to WebAssembly and serve it.
//!
//! The `emstage` binary provisions Emscripten, compiles the built-in snippet,
//! writes a page that instantiates the module, and serves the output
//! directory on `http://127.0.0.1:8000` until Ctrl+C.

pub mod colors;
pub mod pipeline;

pub use emstage_core::{BuildConfig, SystemRunner};
pub use emstage_server::{ServerConfig, ShutdownSignal, shutdown_channel};
pub use pipeline::{Artifacts, PipelineError, PipelineRunner, Step};
