//! Query methods on [`Database`](crate::Database), one module per table group.

mod audit;
mod channels;
mod comments;
mod files;
mod flagged_words;
mod gamification;
mod posts;
mod reactions;
mod saved_posts;
mod tokens;
mod users;

/// Builds `?1, ?2, ...` for an `IN (...)` clause.
pub(crate) fn placeholders(count: usize) -> String {
    (1..=count).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}
