//! Lua script loading.

use std::collections::BTreeMap;
use std::path::Path;

use super::CredentialError;

/// Script path → raw script bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptBundle(BTreeMap<String, Vec<u8>>);

impl ScriptBundle {
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.0.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split the comma separated `script` option.
///
/// An empty option yields no paths. Empty segments are kept, so `"a.lua,"`
/// fails on the empty path rather than silently dropping it.
pub fn split_script_list(raw: &str) -> Vec<&str> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(',').collect()
    }
}

/// Read every script in order; the first failure aborts the whole load.
pub fn load_scripts<'a, I>(paths: I) -> Result<ScriptBundle, CredentialError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut bundle = BTreeMap::new();
    for path in paths {
        let script = std::fs::read(Path::new(path)).map_err(|source| CredentialError::ReadScript {
            path: path.into(),
            source,
        })?;
        tracing::debug!(path, bytes = script.len(), "Loaded script");
        bundle.insert(path.to_string(), script);
    }
    Ok(ScriptBundle(bundle))
}
