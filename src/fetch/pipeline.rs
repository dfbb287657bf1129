/// Fetch → dominant color pipeline, one per visible card
///
/// Results are pushed to a channel as `CardUpdate`s tagged with the slot and
/// Pokédex number they were requested for. A failed fetch sends nothing, so
/// the card keeps its placeholder and neutral color.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{FetchHandle, ImageFetcher};
use crate::color::spawn_dominant_color;
use crate::state::cards::CardUpdate;
use crate::state::data::{CardTheme, Entry};

pub struct CardPipeline {
    fetcher: ImageFetcher,
    updates: mpsc::UnboundedSender<CardUpdate>,
    /// slot -> (number, fetch) for requests that may still be running
    in_flight: HashMap<usize, (u32, FetchHandle)>,
}

impl CardPipeline {
    pub fn new(fetcher: ImageFetcher) -> (Self, mpsc::UnboundedReceiver<CardUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Self {
                fetcher,
                updates,
                in_flight: HashMap::new(),
            },
            rx,
        )
    }

    /// Request artwork and theme color for `entry` shown at `slot`.
    ///
    /// A pending request for a different entry at the same slot is cancelled.
    pub fn request(&mut self, slot: usize, entry: &Entry) {
        if let Some((number, handle)) = self.in_flight.get(&slot) {
            if *number == entry.number && !handle.is_finished() {
                return;
            }
        }

        let updates = self.updates.clone();
        let number = entry.number;

        let handle = self.fetcher.fetch(&entry.image_url, move |image| {
            let image = Arc::new(image);
            spawn_dominant_color(image.clone(), move |color| {
                // The receiver is gone when the screen closed
                let _ = updates.send(CardUpdate {
                    slot,
                    number,
                    theme: CardTheme {
                        image: Some(image),
                        color,
                    },
                });
            });
        });

        // Replacing the old handle drops it, which cancels that fetch
        self.in_flight.insert(slot, (number, handle));
    }

    /// Cancel the request for a slot that is no longer shown
    pub fn release(&mut self, slot: usize) {
        if let Some((_, handle)) = self.in_flight.remove(&slot) {
            handle.cancel();
        }
    }

    /// Number of requests still running
    pub fn pending(&self) -> usize {
        self.in_flight
            .values()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }
}
