/// PokéAPI-backed data provider
///
/// Pages come from `GET {api_base}/pokemon?limit=N&offset=M`, which returns
/// names and resource URLs only. The Pokédex number is the last path segment
/// of the resource URL, and the artwork URL is built from that number.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{DataProvider, Page};
use crate::config::Config;
use crate::error::ProviderError;
use crate::state::data::Entry;

/// Raw list response
#[derive(Debug, Deserialize)]
struct PokemonListResponse {
    #[allow(dead_code)]
    count: u32,
    next: Option<String>,
    results: Vec<PokemonListItem>,
}

#[derive(Debug, Deserialize)]
struct PokemonListItem {
    name: String,
    url: String,
}

pub struct PokeApiProvider {
    client: Client,
    config: Config,
}

impl PokeApiProvider {
    /// Create a provider from the application config
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn to_page(&self, response: PokemonListResponse) -> Result<Page, ProviderError> {
        let entries = response
            .results
            .into_iter()
            .map(|item| {
                let number = number_from_url(&item.url).ok_or_else(|| ProviderError::Malformed {
                    reason: format!("no Pokédex number in {}", item.url),
                })?;
                let image_url = self.config.artwork_url(number);
                Ok(Entry::new(capitalize(&item.name), image_url, number))
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        Ok(Page {
            entries,
            has_more: response.next.is_some(),
        })
    }
}

#[async_trait]
impl DataProvider for PokeApiProvider {
    async fn get_page(&self, offset: usize, page_size: usize) -> Result<Page, ProviderError> {
        let url = format!("{}/pokemon", self.config.api_base);
        debug!("Requesting {} (limit={}, offset={})", url, page_size, offset);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", page_size), ("offset", offset)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            // Keep error text short enough to show on screen
            let body: String = body.chars().take(200).collect();
            return Err(ProviderError::Status { status, body });
        }

        let data: PokemonListResponse = response.json().await?;
        self.to_page(data)
    }
}

/// Extract the trailing numeric id from a resource URL
/// (e.g., "https://pokeapi.co/api/v2/pokemon/25/" -> 25)
fn number_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

/// Uppercase the first character ("bulbasaur" -> "Bulbasaur")
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
