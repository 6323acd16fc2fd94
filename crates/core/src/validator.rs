//! DCO compliance rule over a merged person set.
//!
//! A commit breaks the policy when someone external authored or co-authored
//! it without signing it off. Internal contributors are exempt whatever
//! their roles, and committers or signers who did not author anything never
//! make a commit invalid on their own.

use crate::models::{Person, Role};

/// `true` if this person makes the owning commit invalid.
pub fn requires_sign_off(person: &Person) -> bool {
    !person.is_internal()
        && person.roles().iter().any(|r| r.is_authorship())
        && !person.has_role(Role::Signer)
}

/// `true` if no person in the set violates the sign-off policy.
pub fn is_compliant(persons: &[Person]) -> bool {
    !persons.iter().any(requires_sign_off)
}

pub fn valid_persons(persons: &[Person]) -> Vec<&Person> {
    persons.iter().filter(|p| !requires_sign_off(p)).collect()
}

pub fn invalid_persons(persons: &[Person]) -> Vec<&Person> {
    persons.iter().filter(|p| requires_sign_off(p)).collect()
}
