/// Data provider abstraction
///
/// The list store never talks to the network directly. It asks a
/// `DataProvider` for pages and, when the provider supports it, for
/// full-catalog search results.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::state::data::Entry;

pub mod pokeapi;

pub use pokeapi::PokeApiProvider;

/// One batch of entries returned by a provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub entries: Vec<Entry>,
    /// The provider knows more entries exist past this page
    pub has_more: bool,
}

#[async_trait]
pub trait DataProvider: Send + Sync + 'static {
    /// Fetch `page_size` entries starting at `offset`, in catalog order
    async fn get_page(&self, offset: usize, page_size: usize) -> Result<Page, ProviderError>;

    /// Server-side search over the whole catalog.
    ///
    /// `Ok(None)` means the provider has no search endpoint and the caller
    /// should filter what it already loaded.
    async fn search(&self, _query: &str) -> Result<Option<Vec<Entry>>, ProviderError> {
        Ok(None)
    }
}
