//! Trait-value assembly for commands.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use sonotype_spec::{decode_token, TraitValues};

/// Where a command's trait values come from.
///
/// Sources layer in a fixed order: a JSON value file, then a share
/// token, then explicit `--set` overrides. Later sources win per key.
#[derive(Debug, Args)]
pub struct ValueArgs {
    /// Path to a JSON file of trait values ({"key": score, ...})
    #[arg(long)]
    pub values: Option<String>,

    /// Share token to start from
    #[arg(long)]
    pub token: Option<String>,

    /// Override one trait, repeatable (e.g. --set merry-serious=0.7)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

impl ValueArgs {
    /// Builds the session snapshot the renderers will see.
    pub fn load(&self) -> Result<TraitValues> {
        let mut values = TraitValues::neutral();

        if let Some(path) = &self.values {
            let text = std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("reading value file {path}"))?;
            let map: BTreeMap<String, f64> =
                serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
            values = TraitValues::from_map(&map);
        }

        if let Some(token) = &self.token {
            values = decode_token(token).context("decoding share token")?;
        }

        for pair in &self.set {
            let (key, raw) = pair
                .split_once('=')
                .with_context(|| format!("--set expects KEY=VALUE, got '{pair}'"))?;
            let value: f64 = raw
                .parse()
                .with_context(|| format!("--set {key}: '{raw}' is not a number"))?;
            values
                .set(key, value)
                .with_context(|| format!("--set {key}"))?;
        }

        Ok(values)
    }
}

/// Parses and validates an output path, refusing to write without one.
pub fn require_wav_path(path: &str) -> Result<&Path> {
    let p = Path::new(path);
    if p.as_os_str().is_empty() {
        bail!("output path is empty");
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: Option<&str>, token: Option<&str>, set: &[&str]) -> ValueArgs {
        ValueArgs {
            values: values.map(String::from),
            token: token.map(String::from),
            set: set.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_defaults_to_neutral() {
        let values = args(None, None, &[]).load().unwrap();
        assert_eq!(values, TraitValues::neutral());
    }

    #[test]
    fn test_set_overrides_token() {
        let mut base = TraitValues::neutral();
        base.set("merry-serious", -0.5).unwrap();
        let token = sonotype_spec::encode_token(&base);

        let values = args(None, Some(&token), &["merry-serious=0.25"])
            .load()
            .unwrap();
        assert_eq!(values.score("merry-serious"), 0.25);
    }

    #[test]
    fn test_bad_set_is_an_error() {
        assert!(args(None, None, &["merry-serious"]).load().is_err());
        assert!(args(None, None, &["merry-serious=x"]).load().is_err());
        assert!(args(None, None, &["no-such-trait=0.5"]).load().is_err());
    }

    #[test]
    fn test_bad_token_fails_closed() {
        assert!(args(None, Some("%%%"), &[]).load().is_err());
    }
}
