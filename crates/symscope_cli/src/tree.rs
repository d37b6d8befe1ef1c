//! `symscope tree`: print the scope hierarchy.

use std::error::Error;
use std::io::{self, Write};
use std::path::Path;

use symscope_config::format_timescale;
use symscope_registry::{Registry, ScopeKind};

use crate::model::with_registry;
use crate::GlobalArgs;

/// Runs the `symscope tree` command. Always exits 0 once the layout loads.
pub fn run(layout: &Path, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    with_registry(layout, |registry| {
        if !global.quiet {
            let stdout = io::stdout();
            render(registry, &mut stdout.lock())?;
        }
        Ok(0)
    })
}

/// Writes one line per scope, indented by depth.
pub fn render<W: Write>(registry: &Registry<'_>, out: &mut W) -> Result<(), Box<dyn Error>> {
    writeln!(out, "{} ({})", registry.instance(), registry.context())?;
    for (id, depth) in registry.walk() {
        let scope = registry.scope(id)?;
        write!(out, "{}{}", "  ".repeat(depth + 1), scope)?;
        if scope.kind() == ScopeKind::Module {
            write!(out, " @ {}", format_timescale(scope.time_unit_exponent()))?;
        }
        writeln!(out, " [{} var(s)]", scope.variables().len())?;
    }
    Ok(())
}
