//! `symscope dump`: list every scope and variable with its value.

use std::error::Error;
use std::io::{self, Write};

use serde_json::{json, Map, Value};
use symscope_registry::console::format_value;
use symscope_registry::Registry;

use crate::model::with_registry;
use crate::{DumpArgs, GlobalArgs, ReportFormat};

/// Runs the `symscope dump` command.
pub fn run(args: &DumpArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    with_registry(&args.layout, |registry| {
        if global.quiet {
            return Ok(0);
        }
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match args.format {
            ReportFormat::Text => render_text(registry, &mut out)?,
            ReportFormat::Json => {
                let doc = render_json(registry)?;
                writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
            }
        }
        Ok(0)
    })
}

/// Writes each scope followed by its variables and their values.
pub fn render_text<W: Write>(registry: &Registry<'_>, out: &mut W) -> Result<(), Box<dyn Error>> {
    for (id, scope) in registry.scopes() {
        writeln!(out, "{scope}")?;
        for (_, var) in registry.variables(id)? {
            writeln!(out, "  {var} = {}", format_value(&var.read()))?;
        }
    }
    Ok(())
}

/// Layout, fingerprint and a qualified name → value map.
pub fn render_json(registry: &Registry<'_>) -> Result<Value, Box<dyn Error>> {
    let layout = registry.layout();
    let mut values = Map::new();
    for (id, _) in registry.scopes() {
        for (_, var) in registry.variables(id)? {
            values.insert(
                var.qualified_name().to_string(),
                Value::String(format_value(&var.read())),
            );
        }
    }
    Ok(json!({
        "fingerprint": layout.fingerprint()?.to_string(),
        "layout": serde_json::to_value(&layout)?,
        "values": Value::Object(values),
    }))
}
