//! `KEY=value` parameter files.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::params::DeferredParameters;

static SAFE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-./:@=+,]*$").expect("SAFE_VALUE must compile"));

/// Quote a value so a POSIX shell reads it back verbatim.
pub fn shell_quote(value: &str) -> Cow<'_, str> {
    if SAFE_VALUE.is_match(value) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}

/// Render parameters as sorted `KEY=value` lines.
pub fn format_parameters(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        out.push_str(key);
        out.push('=');
        out.push_str(&shell_quote(value));
        out.push('\n');
    }
    out
}

/// Resolve every parameter and write them to `path`.
pub fn write_parameters_file(path: &Path, params: &DeferredParameters) -> Result<()> {
    let values = params.map()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, format_parameters(&values))?;
    Ok(())
}
