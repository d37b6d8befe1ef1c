//! Shared layout loading for every subcommand.
//!
//! 1. Load and validate the layout file via `symscope_config`
//! 2. Allocate a signal store for its variables
//! 3. Build a registry over the store and hand it to the command

use std::error::Error;
use std::path::Path;

use symscope_registry::{build_registry, Registry, SignalStore};
use tracing::info;

/// Loads the layout at `path` (file or directory), builds a registry over
/// freshly allocated storage and runs `f` with it.
pub fn with_registry<T, F>(path: &Path, f: F) -> Result<T, Box<dyn Error>>
where
    F: for<'m> FnOnce(&Registry<'m>) -> Result<T, Box<dyn Error>>,
{
    let config = symscope_config::load_layout(path)?;
    info!(
        path = %path.display(),
        instance = %config.model.instance,
        scopes = config.scopes.len(),
        "loaded layout"
    );
    let store = SignalStore::from_layout(&config)?;
    let registry = build_registry(&config, &store)?;
    f(&registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = with_registry(&dir.path().join("absent.toml"), |_| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn registry_reaches_closure() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/distortion.toml");
        let count = with_registry(&path, |reg| Ok(reg.scopes().count())).unwrap();
        assert_eq!(count, 2);
    }
}
