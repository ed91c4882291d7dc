//! crates/text_review_core/src/contributions.rs
//!
//! Windowing of a single text's contribution list, newest first.

use crate::domain::Contribution;
use crate::pagination::{PageMeta, PageRequest};

/// One page of a collection plus the metadata of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window<T> {
    pub list: Vec<T>,
    pub meta: PageMeta,
}

/// Returns the requested page of `all`, ordered by `created_at` descending.
///
/// The sort is stable, so contributions sharing a timestamp keep their
/// insertion order. `meta.total` always counts every contribution.
pub fn window_contributions(all: &[Contribution], request: PageRequest) -> Window<Contribution> {
    let mut sorted: Vec<&Contribution> = all.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Window {
        list: request.window(&sorted).iter().map(|c| (*c).clone()).collect(),
        meta: request.meta(all.len() as u64),
    }
}
