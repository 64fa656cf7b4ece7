//! Candidate selection for autowired dependency slots
//!
//! Pure selection logic, independent of instantiation: given the candidate
//! definitions that can satisfy a slot, pick one (or report why none can be
//! picked). The container gathers candidates and performs the recursive
//! resolution; this module only decides.

use crate::types::{ConstructorSpec, ParamSpec};
use crate::{BeanError, Result};

/// One definition eligible to satisfy a by-type dependency slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub primary: bool,
}

/// Pick the unique candidate for a by-type slot.
///
/// Zero candidates is not an error here (the slot may be optional); the
/// caller decides whether an empty result is fatal. Multiple candidates
/// resolve to the single `primary` one, or fail with
/// [`BeanError::NoUniqueBeanOfType`] naming every contender.
pub fn select_unique(
    required_type: &'static str,
    candidates: &[Candidate],
) -> Result<Option<String>> {
    match candidates {
        [] => Ok(None),
        [only] => Ok(Some(only.name.clone())),
        many => {
            let mut primaries = many.iter().filter(|c| c.primary);
            match (primaries.next(), primaries.next()) {
                (Some(primary), None) => Ok(Some(primary.name.clone())),
                _ => Err(BeanError::NoUniqueBeanOfType {
                    type_name: required_type,
                    candidates: many.iter().map(|c| c.name.clone()).collect(),
                }),
            }
        }
    }
}

/// Pick the constructor for constructor autowiring.
///
/// Prefers the constructor with the most parameters whose every parameter is
/// resolvable; a zero-argument constructor is the natural fallback since it
/// is trivially resolvable. Returns `None` when the type declares no
/// resolvable constructor at all.
pub fn select_constructor<'a, F>(
    constructors: &'a [ConstructorSpec],
    mut resolvable: F,
) -> Option<&'a ConstructorSpec>
where
    F: FnMut(&ParamSpec) -> bool,
{
    let mut ranked: Vec<&ConstructorSpec> = constructors.iter().collect();
    ranked.sort_by(|a, b| b.arity().cmp(&a.arity()));

    ranked
        .into_iter()
        .find(|ctor| ctor.params().iter().all(&mut resolvable))
}
