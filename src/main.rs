use iced::widget::image::Handle;
use iced::widget::scrollable::Viewport;
use iced::widget::{column, container, horizontal_space, row, scrollable, text, text_input, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod color;
mod config;
mod error;
mod fetch;
mod provider;
mod state;
mod ui;

use config::Config;
use fetch::http::HttpImageSource;
use fetch::pipeline::CardPipeline;
use fetch::thumbnail::{self, CachedSource};
use fetch::{ImageFetcher, ImageSource};
use provider::PokeApiProvider;
use state::cards::{CardBoard, CardUpdate, DetailRoute};
use state::data::ListState;
use state::list_store::ListStore;

/// Load the next page once the list is scrolled this far down
const LOAD_THRESHOLD: f32 = 0.95;

/// Main application state
struct PokedexApp {
    /// The paginated, searchable list
    store: Arc<ListStore>,
    /// Latest snapshot published by the store
    state: Arc<ListState>,
    /// Which entry each card slot shows, and its theme
    board: CardBoard,
    /// Artwork fetch + color extraction per card
    pipeline: CardPipeline,
    /// Rendered artwork by slot; dropped when the slot changes or goes away
    artwork: HashMap<usize, Handle>,
    state_rx: Arc<Mutex<watch::Receiver<Arc<ListState>>>>,
    card_rx: Arc<Mutex<mpsc::UnboundedReceiver<CardUpdate>>>,
    /// Current search box text
    query: String,
    /// Last card tapped
    selected: Option<DetailRoute>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// The list was scrolled
    Scrolled(Viewport),
    /// User typed in the search box
    QueryChanged(String),
    /// User pressed the retry button after a failed load
    Retry,
    /// The store published a new snapshot (`None` once the store is gone)
    StateChanged(Option<Arc<ListState>>),
    /// A card's artwork and color are ready
    CardUpdated(Option<CardUpdate>),
    /// User tapped the card at this slot
    CardSelected(usize),
    /// A background store operation finished
    Settled,
}

impl PokedexApp {
    /// Create a new instance of the application
    fn new(config: Config, card_runtime: tokio::runtime::Handle) -> (Self, Task<Message>) {
        // The app cannot do anything without a provider, so fail loudly
        let provider = PokeApiProvider::new(&config)
            .expect("Failed to initialize the HTTP client. Check TLS support.");
        let store = Arc::new(ListStore::new(Arc::new(provider), config.page_size));

        let fetcher = ImageFetcher::new(artwork_source(&config), card_runtime);
        let (pipeline, card_rx) = CardPipeline::new(fetcher);

        info!("🎨 Pokédex ready (page size {}, API {})", config.page_size, config.api_base);

        let app = PokedexApp {
            state: store.snapshot(),
            state_rx: Arc::new(Mutex::new(store.subscribe())),
            card_rx: Arc::new(Mutex::new(card_rx)),
            store,
            board: CardBoard::new(),
            pipeline,
            artwork: HashMap::new(),
            query: String::new(),
            selected: None,
        };

        let startup = Task::batch([
            app.load_next_page(),
            watch_state(app.state_rx.clone()),
            watch_cards(app.card_rx.clone()),
        ]);

        (app, startup)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Scrolled(viewport) => {
                if viewport.relative_offset().y >= LOAD_THRESHOLD && self.state.can_load_more() {
                    return self.load_next_page();
                }
                Task::none()
            }
            Message::QueryChanged(query) => {
                // Local filtering runs here so keystrokes apply in order
                let search = self.store.filter_loaded(&query);
                self.query = query;
                match search {
                    Some(search) => {
                        let store = self.store.clone();
                        Task::perform(
                            async move { store.search_remote(search).await },
                            |()| Message::Settled,
                        )
                    }
                    None => Task::none(),
                }
            }
            Message::Retry => {
                let store = self.store.clone();
                Task::perform(async move { store.retry().await }, |()| Message::Settled)
            }
            Message::StateChanged(Some(state)) => {
                self.state = state;
                self.sync_cards();
                watch_state(self.state_rx.clone())
            }
            Message::StateChanged(None) => Task::none(),
            Message::CardUpdated(Some(update)) => {
                let slot = update.slot;
                let decoded = update.theme.image.clone();
                if self.board.apply(update) {
                    if let Some(decoded) = decoded {
                        self.artwork.insert(slot, ui::card::artwork(&decoded));
                    }
                }
                watch_cards(self.card_rx.clone())
            }
            Message::CardUpdated(None) => Task::none(),
            Message::CardSelected(slot) => {
                if let Some(route) = self.board.select(slot) {
                    info!("🧭 Navigate to {}", route);
                    self.selected = Some(route);
                }
                Task::none()
            }
            Message::Settled => Task::none(),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let search = text_input("Search...", &self.query)
            .on_input(Message::QueryChanged)
            .padding(12);

        // Two cards per row
        let rows: Vec<Element<Message>> = self
            .state
            .items
            .chunks(2)
            .enumerate()
            .map(|(row_index, pair)| {
                let cards: Vec<Element<Message>> = pair
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| {
                        let slot = row_index * 2 + i;
                        ui::card::view(
                            slot,
                            entry,
                            self.artwork.get(&slot),
                            self.board.color(slot),
                        )
                    })
                    .collect();
                let mut cards = cards.into_iter();
                match (cards.next(), cards.next()) {
                    (Some(left), Some(right)) => row![left, right].spacing(16).into(),
                    (Some(left), None) => row![left, horizontal_space()].spacing(16).into(),
                    _ => horizontal_space().into(),
                }
            })
            .collect();

        let list = scrollable(Column::with_children(rows).spacing(16).padding(16))
            .height(Length::Fill)
            .on_scroll(Message::Scrolled);

        let status: Element<Message> = if let Some(error) = &self.state.load_error {
            ui::retry::view(error)
        } else if self.state.is_loading {
            text("Loading...").size(16).into()
        } else if let Some(route) = &self.selected {
            text(format!("Selected: {}", route)).size(14).into()
        } else {
            text(format!("{} Pokémon", self.state.items.len())).size(14).into()
        };

        let content = column![
            text("Pokédex").size(48),
            search,
            list,
            container(status).center_x(Length::Fill),
        ]
        .spacing(16)
        .padding(20)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }

    fn load_next_page(&self) -> Task<Message> {
        let store = self.store.clone();
        Task::perform(async move { store.load_next_page().await }, |()| Message::Settled)
    }

    /// Point every card slot at its current entry and request new artwork
    fn sync_cards(&mut self) {
        for slot in self.board.truncate(self.state.items.len()) {
            self.pipeline.release(slot);
            self.artwork.remove(&slot);
        }
        for (slot, entry) in self.state.items.iter().enumerate() {
            if self.board.assign(slot, entry) {
                self.artwork.remove(&slot);
                self.pipeline.request(slot, entry);
            }
        }
        debug!("{} artwork requests pending", self.pipeline.pending());
    }
}

/// Wait for the next store snapshot
fn watch_state(rx: Arc<Mutex<watch::Receiver<Arc<ListState>>>>) -> Task<Message> {
    Task::perform(
        async move {
            let mut rx = rx.lock().await;
            match rx.changed().await {
                Ok(()) => Some(rx.borrow_and_update().clone()),
                Err(_) => None,
            }
        },
        Message::StateChanged,
    )
}

/// Wait for the next finished card
fn watch_cards(rx: Arc<Mutex<mpsc::UnboundedReceiver<CardUpdate>>>) -> Task<Message> {
    Task::perform(
        async move { rx.lock().await.recv().await },
        Message::CardUpdated,
    )
}

/// HTTP artwork source, behind the thumbnail cache when enabled
fn artwork_source(config: &Config) -> Arc<dyn ImageSource> {
    let timeout = std::time::Duration::from_secs(config.request_timeout_secs);
    let http = HttpImageSource::new(timeout)
        .expect("Failed to initialize the HTTP client. Check TLS support.");

    if !config.cache_thumbnails {
        return Arc::new(http);
    }

    let Some(dir) = thumbnail::default_cache_dir() else {
        return Arc::new(http);
    };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("⚠️  Thumbnail cache disabled ({}): {}", dir.display(), e);
        return Arc::new(http);
    }

    info!("📁 Thumbnail cache at: {}", dir.display());
    Arc::new(CachedSource::new(http, dir, config.thumbnail_size))
}

/// Console logging; `RUST_LOG` overrides the default `info` level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}

fn main() -> iced::Result {
    init_tracing();

    let config = Config::load();

    // Card fetches are started from the UI thread, so they get a runtime
    // of their own that outlives the window
    let card_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("artwork")
        .build()
        .expect("Failed to start the artwork runtime");
    let handle = card_runtime.handle().clone();

    iced::application("Pokédex", PokedexApp::update, PokedexApp::view)
        .theme(PokedexApp::theme)
        .centered()
        .run_with(move || PokedexApp::new(config, handle))
}
