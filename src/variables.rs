// src/variables.rs

//! Variable resolution for runners and packagers
//!
//! Every strategy carries a flat string mapping built from its built-in
//! defaults overlaid by the parameters of its definition. When a runner is
//! rendered in the context of a packager, the two mappings are combined with
//! runner values taking precedence.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Flat key/value mapping handed to templates
pub type Variables = BTreeMap<String, String>;

/// Overlay `overrides` on top of `defaults`
///
/// Keys present only in `defaults` survive, keys present in `overrides`
/// replace or extend them. Unknown keys pass through untouched; strategies
/// only read the keys they understand.
pub fn resolve(defaults: &Variables, overrides: &Variables) -> Variables {
    let mut resolved = defaults.clone();
    for (key, value) in overrides {
        resolved.insert(key.clone(), value.clone());
    }
    resolved
}

/// Build the template parameter set for one (packager, runner) pair
///
/// Packager variables are applied first, runner variables on top, so a
/// runner-level value always wins over a packager-level value of the same key.
pub fn combine(packager: &Variables, runner: &Variables) -> Variables {
    resolve(packager, runner)
}

/// Check that every key in `required` is present and non-empty
pub fn require(variant: &str, variables: &Variables, required: &[&str]) -> Result<()> {
    for key in required {
        match variables.get(*key) {
            Some(value) if !value.trim().is_empty() => {}
            _ => {
                return Err(Error::MissingVariable {
                    variant: variant.to_string(),
                    key: (*key).to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Build a `Variables` mapping from string pairs
pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Variables
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
