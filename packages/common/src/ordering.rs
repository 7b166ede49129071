//! Planning for re-sequencing a uniquely indexed ordered collection.
//!
//! Committed order indices are always positive. The negative range is reserved
//! for the temporary values of the first renumbering phase and must not be
//! used for anything else.

use std::collections::HashSet;
use std::hash::Hash;

/// First order index handed out in a collection.
pub const FIRST_ORDER_INDEX: i32 = 1;

/// What to do with a submitted ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderPlan<Id> {
    /// The submission names a different set of records than currently exists.
    Stale,
    /// The submission matches the current order already.
    Unchanged,
    /// Renumber the records in the given order.
    Apply(Vec<RenumberStep<Id>>),
}

/// A single-record index assignment, applied one at a time in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenumberStep<Id> {
    pub id: Id,
    pub order_index: i32,
}

/// Compare a submitted order against the current one and plan the writes.
///
/// `current` must be sorted by order index. The returned steps first move every
/// record to `-1, -2, ...` and then to `1, 2, ...` in submission order, so no
/// step ever assigns an index another record still holds.
pub fn plan_reorder<Id>(current: &[Id], submitted: &[Id]) -> ReorderPlan<Id>
where
    Id: Copy + Eq + Hash,
{
    let current_set: HashSet<Id> = current.iter().copied().collect();
    let submitted_set: HashSet<Id> = submitted.iter().copied().collect();

    if current_set != submitted_set {
        return ReorderPlan::Stale;
    }
    if current == submitted {
        return ReorderPlan::Unchanged;
    }

    let temporary = submitted
        .iter()
        .zip(temporary_indices())
        .map(|(&id, order_index)| RenumberStep { id, order_index });
    let committed = submitted
        .iter()
        .zip(FIRST_ORDER_INDEX..)
        .map(|(&id, order_index)| RenumberStep { id, order_index });

    ReorderPlan::Apply(temporary.chain(committed).collect())
}

/// `-1, -2, -3, ...`
pub fn temporary_indices() -> impl Iterator<Item = i32> {
    (1..).map(|i: i32| -i)
}

/// Split an applied plan into its temporary and committed phases.
pub fn phases<Id>(steps: &[RenumberStep<Id>]) -> (&[RenumberStep<Id>], &[RenumberStep<Id>]) {
    let split = steps
        .iter()
        .position(|step| step.order_index >= FIRST_ORDER_INDEX)
        .unwrap_or(steps.len());
    steps.split_at(split)
}
