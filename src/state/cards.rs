/// Per-card bookkeeping for the visible grid
///
/// Artwork and colors arrive asynchronously, one task per card. A result is
/// applied only if the slot it was requested for still shows the same
/// entry; anything else is a stale update from a card that scrolled away or
/// was replaced by a filter, and is dropped.

use std::collections::HashMap;
use std::fmt;

use super::data::{CardTheme, Entry};
use crate::color::Color;

/// Result of the fetch + color pipeline for one card
#[derive(Debug, Clone)]
pub struct CardUpdate {
    /// Grid position the request was made for
    pub slot: usize,
    /// Pokédex number of the entry the request was made for
    pub number: u32,
    pub theme: CardTheme,
}

/// Hand-off to the detail screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRoute {
    /// Card tint as signed 0xAARRGGBB, the form the detail screen parses
    pub dominant_color: i32,
    pub name: String,
}

impl fmt::Display for DetailRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pokemon_detail_screen/{}/{}", self.dominant_color, self.name)
    }
}

/// Only the tint is kept here; the shell owns the rendered artwork
#[derive(Debug)]
struct Slot {
    number: u32,
    name: String,
    color: Color,
}

#[derive(Debug, Default)]
pub struct CardBoard {
    slots: HashMap<usize, Slot>,
}

impl CardBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `entry` at `slot`.
    ///
    /// Returns true when the slot changed entry and artwork must be requested.
    /// Re-assigning the same entry keeps its color.
    pub fn assign(&mut self, slot: usize, entry: &Entry) -> bool {
        if let Some(current) = self.slots.get(&slot) {
            if current.number == entry.number {
                return false;
            }
        }
        self.slots.insert(
            slot,
            Slot {
                number: entry.number,
                name: entry.name.clone(),
                color: Color::NEUTRAL,
            },
        );
        true
    }

    /// Forget every slot at or past `len` (the list shrank)
    pub fn truncate(&mut self, len: usize) -> Vec<usize> {
        let gone: Vec<usize> = self.slots.keys().copied().filter(|&slot| slot >= len).collect();
        for slot in &gone {
            self.slots.remove(slot);
        }
        gone
    }

    /// Apply a pipeline result. Returns false if it was stale.
    pub fn apply(&mut self, update: CardUpdate) -> bool {
        match self.slots.get_mut(&update.slot) {
            Some(slot) if slot.number == update.number => {
                slot.color = update.theme.color;
                true
            }
            _ => {
                tracing::debug!(
                    "Dropping stale card update for #{} at slot {}",
                    update.number,
                    update.slot
                );
                false
            }
        }
    }

    /// Tint to render at `slot`; neutral until its artwork is loaded
    pub fn color(&self, slot: usize) -> Color {
        self.slots.get(&slot).map_or(Color::NEUTRAL, |s| s.color)
    }

    /// The card at `slot` was tapped
    pub fn select(&self, slot: usize) -> Option<DetailRoute> {
        self.slots.get(&slot).map(|s| DetailRoute {
            dominant_color: s.color.to_argb() as i32,
            name: s.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, number: u32) -> Entry {
        Entry::new(name, format!("https://img/{}.png", number), number)
    }

    fn update(slot: usize, number: u32, color: Color) -> CardUpdate {
        CardUpdate {
            slot,
            number,
            theme: CardTheme { image: None, color },
        }
    }

    #[test]
    fn test_assign_reports_changes() {
        let mut board = CardBoard::new();
        assert!(board.assign(0, &entry("Bulbasaur", 1)));
        assert!(!board.assign(0, &entry("Bulbasaur", 1)));
        assert!(board.assign(0, &entry("Ivysaur", 2)));
    }

    #[test]
    fn test_apply_matching_update() {
        let mut board = CardBoard::new();
        board.assign(3, &entry("Pikachu", 25));

        assert!(board.apply(update(3, 25, Color::rgb(250, 210, 50))));
        assert_eq!(board.color(3), Color::rgb(250, 210, 50));
    }

    #[test]
    fn test_stale_update_is_dropped() {
        let mut board = CardBoard::new();
        board.assign(0, &entry("Bulbasaur", 1));
        board.assign(1, &entry("Ivysaur", 2));

        // Slot 0 now shows a filtered result instead of Bulbasaur
        board.assign(0, &entry("Pikachu", 25));

        assert!(!board.apply(update(0, 1, Color::rgb(60, 160, 120))));
        assert_eq!(board.color(0), Color::NEUTRAL);
        assert_eq!(board.color(1), Color::NEUTRAL);
    }

    #[test]
    fn test_update_for_released_slot_is_dropped() {
        let mut board = CardBoard::new();
        board.assign(0, &entry("Bulbasaur", 1));
        board.assign(1, &entry("Ivysaur", 2));

        assert_eq!(board.truncate(1), vec![1]);
        assert!(!board.apply(update(1, 2, Color::rgb(1, 2, 3))));
    }

    #[test]
    fn test_unloaded_card_is_neutral() {
        let mut board = CardBoard::new();
        assert_eq!(board.color(7), Color::NEUTRAL);

        board.assign(7, &entry("Eevee", 133));
        assert_eq!(board.color(7), Color::NEUTRAL);
    }

    #[test]
    fn test_reassigned_slot_resets_color() {
        let mut board = CardBoard::new();
        board.assign(0, &entry("Bulbasaur", 1));
        board.apply(update(0, 1, Color::rgb(60, 160, 120)));

        board.assign(0, &entry("Pikachu", 25));
        assert_eq!(board.color(0), Color::NEUTRAL);
    }

    #[test]
    fn test_select_builds_route() {
        let mut board = CardBoard::new();
        board.assign(0, &entry("Pikachu", 25));
        board.apply(update(0, 25, Color::rgb(0x12, 0x34, 0x56)));

        let route = board.select(0).unwrap();
        assert_eq!(route.dominant_color, -15_584_170);
        assert_eq!(route.to_string(), "pokemon_detail_screen/-15584170/Pikachu");
        assert!(board.select(9).is_none());
    }
}
