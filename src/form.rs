use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::model::RiskInput;

/// Parse one `KEY=VALUE` form line. Blank lines and `#` comments yield `None`.
pub fn parse_form_line(line: &str) -> Result<Option<(String, String)>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let Some((key, value)) = trimmed.split_once('=') else {
        bail!("expected KEY=VALUE, got {:?}", trimmed);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty field name in {:?}", trimmed);
    }
    Ok(Some((key.to_string(), value.trim().to_string())))
}

/// Load form defaults. Every value is kept as text, like a serialized HTML form.
pub fn load_form(path: &Path) -> Result<RiskInput> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut input = RiskInput::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if let Some((key, value)) =
            parse_form_line(&line).with_context(|| format!("{}:{}", path.display(), n + 1))?
        {
            input.set_text(&key, &value);
        }
    }
    Ok(input)
}
