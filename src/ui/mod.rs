/// UI building blocks for the list screen
///
/// - card.rs: one themed Pokédex card
/// - retry.rs: error text with a retry button

pub mod card;
pub mod retry;
