//! `symscope console`: interactive peek/poke session on stdin/stdout.

use std::error::Error;
use std::io;
use std::path::Path;

use symscope_registry::console::Console;

use crate::model::with_registry;
use crate::GlobalArgs;

/// Runs the `symscope console` command until `quit` or end of input.
pub fn run(layout: &Path, _global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    with_registry(layout, |registry| {
        let mut console = Console::new(registry);
        let stdin = io::stdin();
        let stdout = io::stdout();
        console.run_repl(&mut stdin.lock(), &mut stdout.lock())?;
        tracing::info!(commands = console.history().len(), "console session ended");
        Ok(0)
    })
}
