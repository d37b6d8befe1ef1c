//! Layout file loading and validation.

use crate::error::ConfigError;
use crate::timescale::parse_timescale;
use crate::types::{LayoutConfig, StorageKindDecl};
use std::collections::HashSet;
use std::path::Path;

/// File name looked up when a directory is given to [`load_layout`].
pub const LAYOUT_FILE_NAME: &str = "symscope.toml";

/// Loads and validates a layout.
///
/// `path` may name the layout file itself or a directory containing
/// `symscope.toml`.
pub fn load_layout(path: &Path) -> Result<LayoutConfig, ConfigError> {
    let file = if path.is_dir() {
        path.join(LAYOUT_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&file)?;
    load_layout_from_str(&content)
}

/// Parses and validates a layout from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_layout_from_str(content: &str) -> Result<LayoutConfig, ConfigError> {
    let config: LayoutConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_layout(&config)?;
    Ok(config)
}

/// Checks required names, timescale strings, unique qualified names and
/// that every `parent` refers to a scope declared earlier, and that `words`
/// only appears on `array` variables.
///
/// Bit ranges and storage kinds are checked when the registry is built.
fn validate_layout(config: &LayoutConfig) -> Result<(), ConfigError> {
    if config.model.instance.is_empty() {
        return Err(ConfigError::MissingField("model.instance".to_string()));
    }
    let unit = parse_timescale(&config.model.time_unit)?;
    let precision = parse_timescale(&config.model.time_precision)?;
    if precision > unit {
        return Err(ConfigError::ValidationError(format!(
            "time precision '{}' is coarser than time unit '{}'",
            config.model.time_precision, config.model.time_unit
        )));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (i, scope) in config.scopes.iter().enumerate() {
        if scope.name.is_empty() {
            return Err(ConfigError::MissingField(format!("scope[{i}].name")));
        }
        let qualified = scope.qualified_name();
        if let Some(parent) = &scope.parent {
            if !seen.contains(parent.as_str()) {
                return Err(ConfigError::UnknownScope {
                    scope: qualified.to_string(),
                    parent: parent.clone(),
                });
            }
        }
        if !seen.insert(qualified) {
            return Err(ConfigError::ValidationError(format!(
                "scope '{qualified}' is declared more than once"
            )));
        }
        if let Some(tp) = &scope.time_precision {
            parse_timescale(tp)?;
        }
        for (j, var) in scope.vars.iter().enumerate() {
            if var.name.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "scope[{i}].var[{j}].name"
                )));
            }
            if var.words.is_some() && var.kind != StorageKindDecl::Array {
                return Err(ConfigError::ValidationError(format!(
                    "variable '{qualified}.{}' sets words but is not an array",
                    var.name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DirectionDecl, ScopeKindDecl, StorageKindDecl};

    const DISTORTION: &str = r#"
[model]
instance = "top"
time_unit = "1ps"
time_precision = "1ps"

[[scope]]
name = "TOP"
qualified = ""
kind = "other"

[[scope.var]]
name = "clk"
kind = "byte"
direction = "in"

[[scope.var]]
name = "threshold"
kind = "word"
direction = "in"
range = [15, 0]

[[scope]]
name = "distortion"
kind = "module"
time_precision = "1ps"

[[scope.var]]
name = "width"
kind = "double_word"
const = true
value = 16
range = [31, 0]
"#;

    #[test]
    fn parse_distortion_layout() {
        let config = load_layout_from_str(DISTORTION).unwrap();
        assert_eq!(config.model.instance, "top");
        assert_eq!(config.scopes.len(), 2);
        assert_eq!(config.scopes[0].kind, ScopeKindDecl::Other);
        assert_eq!(config.scopes[0].vars.len(), 2);
        assert_eq!(config.scopes[0].vars[1].kind, StorageKindDecl::Word);
        assert_eq!(config.scopes[0].vars[1].direction, DirectionDecl::In);
        assert!(config.scopes[1].vars[0].is_const);
    }

    #[test]
    fn timescale_defaults() {
        let config = load_layout_from_str("[model]\ninstance = \"dut\"\n").unwrap();
        assert_eq!(config.model.time_unit, "1ps");
        assert_eq!(config.model.time_precision, "1ps");
        assert!(config.scopes.is_empty());
    }

    #[test]
    fn missing_instance_errors() {
        let err = load_layout_from_str("[model]\ninstance = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn missing_model_table_is_parse_error() {
        let err = load_layout_from_str("[[scope]]\nname = \"a\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_layout_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn precision_coarser_than_unit_errors() {
        let toml = r#"
[model]
instance = "top"
time_unit = "1ns"
time_precision = "1us"
"#;
        let err = load_layout_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn bad_scope_precision_errors() {
        let toml = r#"
[model]
instance = "top"

[[scope]]
name = "core"
time_precision = "5ps"
"#;
        let err = load_layout_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn parent_must_be_declared_first() {
        let toml = r#"
[model]
instance = "top"

[[scope]]
name = "child"
qualified = "core.child"
parent = "core"

[[scope]]
name = "core"
"#;
        let err = load_layout_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScope { .. }));
    }

    #[test]
    fn duplicate_qualified_name_errors() {
        let toml = r#"
[model]
instance = "top"

[[scope]]
name = "core"

[[scope]]
name = "other"
qualified = "core"
"#;
        let err = load_layout_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_var_name_errors() {
        let toml = r#"
[model]
instance = "top"

[[scope]]
name = "core"

[[scope.var]]
name = ""
kind = "byte"
"#;
        let err = load_layout_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn load_from_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LAYOUT_FILE_NAME);
        std::fs::write(&path, DISTORTION).unwrap();

        let from_dir = load_layout(dir.path()).unwrap();
        assert_eq!(from_dir.scopes.len(), 2);
        let from_file = load_layout(&path).unwrap();
        assert_eq!(from_file.model.instance, "top");
    }

    #[test]
    fn io_error_from_nonexistent_path() {
        let err = load_layout(Path::new("/nonexistent/dir/symscope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn words_on_non_array_errors() {
        let toml = r#"
[model]
instance = "top"

[[scope]]
name = "core"

[[scope.var]]
name = "threshold"
kind = "word"
range = [15, 0]
words = 4
"#;
        let err = load_layout_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("'core.threshold' sets words"));

        let config = load_layout_from_str(&toml.replace("kind = \"word\"", "kind = \"array\"")).unwrap();
        assert_eq!(config.scopes[0].vars[0].words, Some(4));
    }
}
