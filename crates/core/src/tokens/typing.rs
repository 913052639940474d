//! Declared-type compatibility.

use crate::types::TypeKey;

pub(super) fn check_types(declared: &TypeKey, candidates: &[TypeKey], negate: bool) -> Result<(), String> {
    let matched = candidates.iter().any(|candidate| candidate == declared);
    match (matched, negate) {
        (true, false) | (false, true) => Ok(()),
        (false, false) => Err(format!(
            "The declared type {declared} is not one of: {}.",
            names(candidates)
        )),
        (true, true) => Err(format!(
            "The declared type {declared} must not be one of: {}.",
            names(candidates)
        )),
    }
}

fn names(candidates: &[TypeKey]) -> String {
    candidates
        .iter()
        .map(TypeKey::name)
        .collect::<Vec<_>>()
        .join(", ")
}
