//! ANSI colors for the pipeline's step progress and the serving banner.
//!
//! Each build step prints `◆ <step> ... ` in blue, then `done` in green or
//! `failed` in red. The banner uses bold and cyan for the page URL.

use std::io::{self, Write};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const GREEN: &str = "\x1b[32m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const RED: &str = "\x1b[31m";

/// Flush stdout so a progress line without a newline shows up immediately.
#[inline]
pub fn flush_stdout() {
    io::stdout().flush().ok();
}
