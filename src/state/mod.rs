/// State management module
///
/// This module handles all screen state, including:
/// - Shared data structures (data.rs)
/// - The paginated, searchable list (list_store.rs)
/// - Per-card artwork and theme bookkeeping (cards.rs)

pub mod cards;
pub mod data;
pub mod list_store;
