//! Output layer shared by the subcommands.
//!
//! Results go to stdout as plain text or JSON; errors always go to stderr
//! with their stable code and, where one exists, a hint.

use std::io::{self, Write};

use modgraph_core::ModgraphError;
use serde::Serialize;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    /// Returns `true` if JSON output was requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode the value is serialized with `serde_json`; otherwise
/// `text_fn` writes the human form.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        text_fn(value, &mut out)?;
    }
    Ok(())
}

/// Write a failed run's error to `w`.
///
/// Library errors carry a code and hint:
///
/// ```text
/// error[E2002]: module `x` not found
///   hint: Check the module name, or add its archive to the module path.
/// ```
pub fn write_error(w: &mut dyn Write, err: &anyhow::Error) -> io::Result<()> {
    match err.downcast_ref::<ModgraphError>() {
        Some(modgraph) => {
            let code = modgraph.code();
            writeln!(w, "error[{}]: {err:#}", code.code())?;
            if let Some(hint) = code.hint() {
                writeln!(w, "  hint: {hint}")?;
            }
        }
        None => writeln!(w, "error: {err:#}")?,
    }
    Ok(())
}
