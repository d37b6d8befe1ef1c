//! `symscope check`: validate a layout end to end.
//!
//! Loading alone checks names and references; building the registry also
//! checks widths, storage kinds and timescales. The fingerprint printed on
//! success identifies the layout's names and shapes, and `--expect` compares
//! it against one a harness cached earlier.

use std::error::Error;

use symscope_registry::{ContentHash, Registry};

use crate::model::with_registry;
use crate::{CheckArgs, GlobalArgs};

/// Runs the `symscope check` command.
///
/// Returns exit code 0 when the layout builds and matches `--expect` (if
/// given), 1 when the fingerprint differs. Load or build failures surface as
/// errors.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let expected = match &args.expect {
        Some(text) => Some(
            ContentHash::from_hex(text)
                .ok_or_else(|| format!("invalid fingerprint '{text}' (expected 32 hex digits)"))?,
        ),
        None => None,
    };

    let (summary, fingerprint) = with_registry(&args.layout, |registry| {
        Ok((summarize(registry)?, registry.layout().fingerprint()?))
    })?;

    if let Some(expected) = expected {
        if expected != fingerprint {
            eprintln!("stale: layout fingerprint {fingerprint}, expected {expected}");
            return Ok(1);
        }
    }
    if !global.quiet {
        println!("{summary}");
    }
    Ok(0)
}

/// One-line summary: counts and fingerprint.
pub fn summarize(registry: &Registry<'_>) -> Result<String, Box<dyn Error>> {
    let layout = registry.layout();
    Ok(format!(
        "ok: {} scope(s), {} variable(s), fingerprint {}",
        layout.scopes.len(),
        layout.variable_count(),
        layout.fingerprint()?
    ))
}
