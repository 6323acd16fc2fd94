//! Merging of person sets gathered from different sources of one commit.
//!
//! Sources are merged in the order given. When an email shows up again, the
//! roles are unioned into the entry seen first; the later name, handle and
//! classification are ignored.

use tracing::trace;

use crate::models::Person;

/// Merge person sets into one list holding each email at most once.
///
/// First-seen order is preserved.
pub fn merge<I, S>(sets: I) -> Vec<Person>
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = Person>,
{
    let mut merged: Vec<Person> = Vec::new();
    for set in sets {
        for person in set {
            match merged.iter().position(|p| p.email() == person.email()) {
                Some(index) => {
                    trace!(email = person.email(), "merging roles of repeated identity");
                    merged[index] = merged[index].with_roles_of(&person);
                }
                None => merged.push(person),
            }
        }
    }
    merged
}
