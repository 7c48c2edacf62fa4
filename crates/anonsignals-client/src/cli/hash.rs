use super::commands::{HashAction, OutputFormat};
use super::utils::{parse_field, print_json};
use anonsignals_crypto::{check_leaf, compute_leaf, hash_field, hash_string, normalize_text};
use anonsignals_types::{AnonResult, Bytes32};
use serde_json::json;

pub fn handle_hash(action: HashAction, format: &OutputFormat) -> AnonResult<()> {
    let (input, hash) = match action {
        HashAction::Text { text } => {
            let hash = hash_string(&text);
            (normalize_text(&text), hash)
        }
        HashAction::Number { value } => {
            let value = parse_field(&value)?;
            (value.to_string(), hash_field(&value))
        }
    };

    match format {
        OutputFormat::Json => print_json(&json!({ "normalized": input, "hash": hash }))?,
        OutputFormat::Text => println!("{}", hash),
    }
    Ok(())
}

pub fn handle_leaf(
    signals: &[String],
    vk_hash: &str,
    reported: Option<&str>,
    format: &OutputFormat,
) -> AnonResult<()> {
    let signals = signals
        .iter()
        .map(|s| parse_field(s))
        .collect::<AnonResult<Vec<_>>>()?;
    let vk_hash = Bytes32::from_hex(vk_hash.trim())?;
    let leaf = compute_leaf(&signals, &vk_hash)?;

    let matches = reported.map(|r| check_leaf(&leaf, r.trim()));

    match format {
        OutputFormat::Json => print_json(&json!({
            "leaf": leaf,
            "matches": matches.as_ref().map(|m| m.is_ok()),
        }))?,
        OutputFormat::Text => {
            println!("Leaf: {}", leaf);
            if let Some(m) = &matches {
                println!("Matches reported leaf: {}", if m.is_ok() { "yes" } else { "NO" });
            }
        }
    }

    match matches {
        Some(Err(e)) => Err(e),
        _ => Ok(()),
    }
}
