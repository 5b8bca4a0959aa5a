//! `share` command: encode and decode state tokens.

use anyhow::{Context, Result};
use colored::Colorize;

use sonotype_spec::{decode_token, encode_token};

use crate::input::ValueArgs;

/// Prints the share token for the assembled values.
pub fn encode(value_args: &ValueArgs) -> Result<()> {
    let values = value_args.load()?;
    println!("{}", encode_token(&values));
    Ok(())
}

/// Decodes a token and prints the values as JSON.
///
/// A malformed token is an error here (there is no session state to
/// fall back to; the caller asked specifically about this token).
pub fn decode(token: &str, json: bool) -> Result<()> {
    let values = decode_token(token).context("decoding token")?;
    if json {
        println!("{}", serde_json::to_string_pretty(values.as_map())?);
    } else {
        println!("{}", "Decoded trait values".cyan().bold());
        for (key, score) in values.iter() {
            if score != 0.0 {
                println!("  {:<26} {:+.3}", key.green(), score);
            }
        }
    }
    Ok(())
}
