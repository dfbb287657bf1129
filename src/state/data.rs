/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the provider layer, the list store and the UI layer.

use image::DynamicImage;
use std::sync::Arc;

use crate::color::Color;

/// A single Pokémon in the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Display name (e.g., "Bulbasaur"), unique within the catalog
    pub name: String,
    /// Artwork URL for the card image
    pub image_url: String,
    /// National Pokédex number
    pub number: u32,
}

impl Entry {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
            number,
        }
    }

    /// Does this entry match a search query?
    ///
    /// `query` must already be trimmed and non-empty. A numeric query matches
    /// the Pokédex number exactly; any query also matches as a
    /// case-insensitive substring of the name.
    pub fn matches(&self, query: &str) -> bool {
        if let Ok(number) = query.parse::<u32>() {
            if number == self.number {
                return true;
            }
        }
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Snapshot of the list published to the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    /// Entries to display, in load order (or filtered order while searching)
    pub items: Vec<Entry>,
    /// Offset of the next page to request
    pub next_offset: usize,
    /// No further pages exist
    pub reached_end: bool,
    /// A page request is in flight
    pub is_loading: bool,
    /// `items` is a filtered view
    pub is_searching: bool,
    /// Last page-load failure, shown with a retry button
    pub load_error: Option<String>,
}

impl ListState {
    /// Should reaching the bottom of the list trigger another page?
    pub fn can_load_more(&self) -> bool {
        !self.is_loading && !self.reached_end && !self.is_searching
    }
}

/// Visual theme of one card, as produced by the artwork pipeline
#[derive(Debug, Clone)]
pub struct CardTheme {
    /// Decoded artwork
    pub image: Option<Arc<DynamicImage>>,
    /// Card tint
    pub color: Color,
}
