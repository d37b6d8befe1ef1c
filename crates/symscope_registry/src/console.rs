//! Interactive peek/poke console over a registry.
//!
//! Provides [`Console`], which wraps a borrowed [`Registry`] with a
//! command-driven interface for browsing scopes, reading and writing
//! variables, and watching values between commands.
//!
//! # Usage
//!
//! ```ignore
//! use symscope_registry::console::Console;
//!
//! let mut console = Console::new(&registry);
//! console.run_repl(&mut std::io::stdin().lock(), &mut std::io::stdout())?;
//! ```

use std::io::{self, BufRead, Write};

use symscope_common::BitVector;

use crate::error::RegistryError;
use crate::registry::{Entry, Registry};

/// A console command parsed from user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Print the scope tree.
    Scopes,
    /// List the variables of a scope.
    Vars {
        /// Scope name, qualified or instance-relative.
        scope: String,
    },
    /// Describe a scope or variable.
    Info {
        /// Name, qualified or instance-relative.
        name: String,
    },
    /// Read one or more variables.
    Peek {
        /// Variable names or name fragments.
        names: Vec<String>,
    },
    /// Write a variable.
    Poke {
        /// Variable name.
        name: String,
        /// Value to store.
        value: BitVector,
    },
    /// Add a variable to the watch list.
    Watch {
        /// Variable name.
        name: String,
    },
    /// Remove a variable from the watch list.
    Unwatch {
        /// Variable name.
        name: String,
    },
    /// Show registry summary.
    Status,
    /// Display help text.
    Help,
    /// Quit the console.
    Quit,
}

/// Result of executing a console command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Command produced text output.
    Output(String),
    /// The console should quit.
    Quit,
}

/// REPL state over a borrowed registry.
///
/// Writes go through the registry's shared borrow, so the console never
/// needs exclusive access to the model.
pub struct Console<'r, 'm> {
    registry: &'r Registry<'m>,
    watches: Vec<String>,
    history: Vec<String>,
}

impl<'r, 'm> Console<'r, 'm> {
    /// Creates a console with an empty watch list.
    pub fn new(registry: &'r Registry<'m>) -> Self {
        Self {
            registry,
            watches: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Commands entered so far, in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Executes a single command.
    pub fn execute(&mut self, cmd: &ConsoleCommand) -> Result<CommandResult, RegistryError> {
        match cmd {
            ConsoleCommand::Scopes => self.cmd_scopes(),
            ConsoleCommand::Vars { scope } => self.cmd_vars(scope),
            ConsoleCommand::Info { name } => self.cmd_info(name),
            ConsoleCommand::Peek { names } => self.cmd_peek(names),
            ConsoleCommand::Poke { name, value } => self.cmd_poke(name, value),
            ConsoleCommand::Watch { name } => self.cmd_watch(name),
            ConsoleCommand::Unwatch { name } => self.cmd_unwatch(name),
            ConsoleCommand::Status => self.cmd_status(),
            ConsoleCommand::Help => Ok(CommandResult::Output(help_text())),
            ConsoleCommand::Quit => Ok(CommandResult::Quit),
        }
    }

    /// Runs the REPL loop, reading commands from `input` and writing to
    /// `output` until `quit` or end of input.
    pub fn run_repl<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        writeln!(output, "symscope console for '{}'", self.registry.instance())?;
        writeln!(output, "Type 'help' for available commands.")?;
        writeln!(output)?;

        let mut line = String::new();
        loop {
            write!(output, "symscope> ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            self.history.push(trimmed.to_string());

            let result = parse_command(trimmed).and_then(|cmd| {
                self.execute(&cmd).map_err(|e| e.to_string())
            });
            match result {
                Ok(CommandResult::Output(text)) => {
                    writeln!(output, "{text}")?;
                    self.print_watches(output)?;
                }
                Ok(CommandResult::Quit) => {
                    writeln!(output, "Goodbye.")?;
                    break;
                }
                Err(err) => writeln!(output, "Error: {err}")?,
            }
        }
        Ok(())
    }

    fn print_watches<W: Write>(&self, output: &mut W) -> io::Result<()> {
        for name in &self.watches {
            match self.resolve(name) {
                Ok(Entry::Variable(var)) => {
                    writeln!(output, "  [watch] {name} = {}", format_value(&var.read()))?;
                }
                Ok(Entry::Scope(_)) => {}
                Err(e) => writeln!(output, "  [watch] {name}: {e}")?,
            }
        }
        Ok(())
    }

    /// Looks `name` up as given, then relative to the instance.
    fn resolve(&self, name: &str) -> Result<Entry<'r, 'm>, RegistryError> {
        match self.registry.lookup(name) {
            Err(RegistryError::NotFound { .. }) => {
                let qualified = format!("{}.{name}", self.registry.instance());
                self.registry.lookup(&qualified).map_err(|e| match e {
                    RegistryError::NotFound { .. } => RegistryError::NotFound {
                        qualified_name: name.to_string(),
                    },
                    other => other,
                })
            }
            other => other,
        }
    }

    fn cmd_scopes(&self) -> Result<CommandResult, RegistryError> {
        let walk = self.registry.walk();
        if walk.is_empty() {
            return Ok(CommandResult::Output("No scopes".to_string()));
        }
        let mut lines = Vec::with_capacity(walk.len());
        for (id, depth) in walk {
            let scope = self.registry.scope(id)?;
            lines.push(format!(
                "{}{} ({} var(s))",
                "  ".repeat(depth),
                scope,
                scope.variables().len()
            ));
        }
        Ok(CommandResult::Output(lines.join("\n")))
    }

    fn cmd_vars(&self, scope: &str) -> Result<CommandResult, RegistryError> {
        let scope = match self.resolve(scope)? {
            Entry::Scope(s) => s,
            Entry::Variable(v) => {
                return Err(RegistryError::NotFound {
                    qualified_name: format!("scope '{}'", v.qualified_name()),
                })
            }
        };
        if scope.variables().is_empty() {
            return Ok(CommandResult::Output(format!(
                "{} has no variables",
                scope.qualified_name()
            )));
        }
        let mut lines = vec![format!(
            "{} variable(s) in {}:",
            scope.variables().len(),
            scope.qualified_name()
        )];
        for var in scope.variables().values() {
            let var = self.registry.variable(*var)?;
            lines.push(format!("  {var} = {}", format_value(&var.read())));
        }
        Ok(CommandResult::Output(lines.join("\n")))
    }

    fn cmd_info(&self, name: &str) -> Result<CommandResult, RegistryError> {
        let text = match self.resolve(name)? {
            Entry::Scope(scope) => {
                let mut text = format!(
                    "{scope}\n  name: {}\n  kind: {:?}\n  variables: {}",
                    scope.name(),
                    scope.kind(),
                    scope.variables().len()
                );
                if scope.time_unit_exponent() != 0 {
                    text.push_str(&format!(
                        "\n  precision: {}",
                        symscope_config::format_timescale(scope.time_unit_exponent())
                    ));
                }
                text
            }
            Entry::Variable(var) => format!(
                "{}\n  width: {}\n  direction: {}\n  storage: {}\n  writable: {}\n  value: {}",
                var.qualified_name(),
                var.width_bits(),
                var.direction(),
                var.storage_kind(),
                if var.is_writable() { "yes" } else { "no" },
                format_value(&var.read())
            ),
        };
        Ok(CommandResult::Output(text))
    }

    fn cmd_peek(&self, names: &[String]) -> Result<CommandResult, RegistryError> {
        let mut lines = Vec::new();
        for name in names {
            match self.resolve(name) {
                Ok(Entry::Variable(var)) => {
                    lines.push(format!("{name} = {}", format_value(&var.read())));
                }
                Ok(Entry::Scope(scope)) => {
                    lines.push(format!("{name} is a scope; try 'vars {}'", scope.qualified_name()));
                }
                Err(RegistryError::NotFound { .. }) => {
                    let matches = self.fragment_matches(name);
                    if matches.is_empty() {
                        lines.push(format!("Variable not found: {name}"));
                    }
                    lines.extend(matches);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(CommandResult::Output(lines.join("\n")))
    }

    /// `name = value` for every variable whose qualified name contains
    /// `fragment`.
    fn fragment_matches(&self, fragment: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (id, _) in self.registry.scopes() {
            let Ok(vars) = self.registry.variables(id) else {
                continue;
            };
            for (_, var) in vars {
                if var.qualified_name().contains(fragment) {
                    out.push(format!(
                        "{} = {}",
                        var.qualified_name(),
                        format_value(&var.read())
                    ));
                }
            }
        }
        out
    }

    fn cmd_poke(&self, name: &str, value: &BitVector) -> Result<CommandResult, RegistryError> {
        match self.resolve(name)? {
            Entry::Variable(var) => {
                var.write(value)?;
                Ok(CommandResult::Output(format!(
                    "{} = {}",
                    var.qualified_name(),
                    format_value(&var.read())
                )))
            }
            Entry::Scope(scope) => Err(RegistryError::NotFound {
                qualified_name: format!("variable '{}'", scope.qualified_name()),
            }),
        }
    }

    fn cmd_watch(&mut self, name: &str) -> Result<CommandResult, RegistryError> {
        match self.resolve(name)? {
            Entry::Variable(_) => {
                if !self.watches.iter().any(|w| w == name) {
                    self.watches.push(name.to_string());
                }
                Ok(CommandResult::Output(format!("Watching '{name}'")))
            }
            Entry::Scope(scope) => Ok(CommandResult::Output(format!(
                "'{}' is a scope and cannot be watched",
                scope.qualified_name()
            ))),
        }
    }

    fn cmd_unwatch(&mut self, name: &str) -> Result<CommandResult, RegistryError> {
        let before = self.watches.len();
        self.watches.retain(|w| w != name);
        if self.watches.len() < before {
            Ok(CommandResult::Output(format!("Unwatched '{name}'")))
        } else {
            Ok(CommandResult::Output(format!(
                "Variable '{name}' was not being watched"
            )))
        }
    }

    fn cmd_status(&self) -> Result<CommandResult, RegistryError> {
        let layout = self.registry.layout();
        let fingerprint = layout
            .fingerprint()
            .map(|h| h.to_string())
            .unwrap_or_else(|e| format!("unavailable ({e})"));
        Ok(CommandResult::Output(format!(
            "Instance: {}\nTimescale: {}\nScopes: {}\nVariables: {}\nWatches: {}\nFingerprint: {}",
            layout.instance,
            self.registry.context(),
            layout.scopes.len(),
            layout.variable_count(),
            self.watches.len(),
            fingerprint
        )))
    }
}

/// Parses a command string into a [`ConsoleCommand`].
///
/// Supports full command names and shortcuts: `ls`=scopes, `v`=vars,
/// `p`=peek, `w`=watch, `q`=quit, `h`=help.
pub fn parse_command(input: &str) -> Result<ConsoleCommand, String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((first, args)) = parts.split_first() else {
        return Err("empty command".to_string());
    };

    match first.to_lowercase().as_str() {
        "scopes" | "tree" | "ls" => Ok(ConsoleCommand::Scopes),
        "vars" | "v" => match args {
            [scope] => Ok(ConsoleCommand::Vars {
                scope: scope.to_string(),
            }),
            _ => Err("vars requires one scope name".to_string()),
        },
        "info" => match args {
            [name] => Ok(ConsoleCommand::Info {
                name: name.to_string(),
            }),
            _ => Err("info requires one name".to_string()),
        },
        "peek" | "p" => {
            if args.is_empty() {
                return Err("peek requires variable name(s)".to_string());
            }
            Ok(ConsoleCommand::Peek {
                names: args.iter().map(|s| s.to_string()).collect(),
            })
        }
        "poke" => match args {
            [name, value] => {
                let value =
                    BitVector::parse(value).map_err(|e| format!("invalid value '{value}': {e}"))?;
                Ok(ConsoleCommand::Poke {
                    name: name.to_string(),
                    value,
                })
            }
            _ => Err("poke requires a name and a value (e.g., 'poke threshold 16'h1234')".to_string()),
        },
        "watch" | "w" => match args {
            [name] => Ok(ConsoleCommand::Watch {
                name: name.to_string(),
            }),
            _ => Err("watch requires a variable name".to_string()),
        },
        "unwatch" => match args {
            [name] => Ok(ConsoleCommand::Unwatch {
                name: name.to_string(),
            }),
            _ => Err("unwatch requires a variable name".to_string()),
        },
        "status" => Ok(ConsoleCommand::Status),
        "help" | "h" => Ok(ConsoleCommand::Help),
        "quit" | "q" | "exit" => Ok(ConsoleCommand::Quit),
        _ => Err(format!("unknown command: '{first}'")),
    }
}

/// Formats a value for display.
///
/// Single-bit values render as `0` or `1`; wider values as sized hex
/// (e.g., `16'h1234`).
pub fn format_value(value: &BitVector) -> String {
    if value.width() == 1 {
        let bit = if value.get(0) { "1" } else { "0" };
        bit.to_string()
    } else {
        value.to_string()
    }
}

fn help_text() -> String {
    "\
Commands:
  scopes               (ls)  Show the scope tree
  vars <scope>         (v)   List variables of a scope
  info <name>                Describe a scope or variable
  peek <name>...       (p)   Show variable value(s)
  poke <name> <value>        Write a variable
  watch <name>         (w)   Show a variable after every command
  unwatch <name>             Remove a variable from the watch list
  status                     Show registry summary
  help                 (h)   Show this help
  quit                 (q)   Exit the console

Names may be fully qualified (top.distortion.threshold) or relative to the
instance (distortion.threshold).
Values: 4660, 0x1234, 0b1010, 16'h1234, 8'd255, 'b101"
        .to_string()
}
