use anyhow::{bail, Context, Result};
use mine_core::Constants;
use std::collections::BTreeMap;

/// Replaces named fields of `constants` with the given JSON values.
///
/// Keys are the field names of `constants.json`. Unknown keys and values of
/// the wrong type are errors; on error `constants` is left untouched.
pub fn apply_overrides(
    constants: &mut Constants,
    overrides: &BTreeMap<String, serde_json::Value>,
) -> Result<()> {
    if overrides.is_empty() {
        return Ok(());
    }
    let mut value = serde_json::to_value(&*constants).context("serializing constants")?;
    let Some(fields) = value.as_object_mut() else {
        bail!("constants did not serialize to an object");
    };
    for (key, replacement) in overrides {
        let Some(slot) = fields.get_mut(key) else {
            let valid: Vec<&str> = fields.keys().map(String::as_str).collect();
            bail!(
                "unknown override key '{key}'. Valid keys: {}",
                valid.join(", ")
            );
        };
        *slot = replacement.clone();
    }
    *constants = serde_json::from_value(value).with_context(|| {
        let keys: Vec<&str> = overrides.keys().map(String::as_str).collect();
        format!("applying overrides [{}]", keys.join(", "))
    })?;
    Ok(())
}
