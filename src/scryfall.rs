use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

const API_BASE: &str = "https://api.scryfall.com";

/// One card as returned by the search endpoint. Read-only and transient:
/// fetched, mapped, discarded. Absent text fields deserialize to "".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub set_name: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub flavor_text: String,
    #[serde(default)]
    pub power: String,
    #[serde(default)]
    pub toughness: String,
    #[serde(default)]
    pub loyalty: String,
    #[serde(default)]
    pub artist: String,
    /// Format name -> legality status, upstream order.
    #[serde(default)]
    pub legalities: Map<String, Value>,
    pub image_uris: Option<ImageUris>,
    #[serde(default)]
    pub preview: Map<String, Value>,
    #[serde(default)]
    pub prices: Map<String, Value>,
    #[serde(default)]
    pub related_uris: Map<String, Value>,
    #[serde(default)]
    pub purchase_uris: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageUris {
    pub png: Option<String>,
    pub small: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SetInfo {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SetList {
    data: Vec<SetInfo>,
}

/// One page of paginated search results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<Card>,
    #[serde(default)]
    pub has_more: bool,
    pub next_page: Option<String>,
}

/// First search URL for a set: all printings, in set order.
pub fn search_url(set_code: &str) -> String {
    format!(
        "{}/cards/search?order=set&q=e:{}&unique=prints",
        API_BASE, set_code
    )
}

/// Upstream card catalog. `None` results mean the endpoint answered non-200,
/// which is end-of-availability for that query, not an error.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn sets(&self) -> Result<Option<Vec<SetInfo>>>;
    async fn search_page(&self, url: &str) -> Result<Option<SearchPage>>;
}

pub struct ScryfallClient {
    http: reqwest::Client,
}

impl ScryfallClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build Scryfall HTTP client")?;
        Ok(Self { http })
    }
}

impl Catalog for ScryfallClient {
    async fn sets(&self) -> Result<Option<Vec<SetInfo>>> {
        let url = format!("{}/sets", API_BASE);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Failed to fetch set list. Status code: {}", status.as_u16());
            return Ok(None);
        }
        let list: SetList = response
            .json()
            .await
            .context("Malformed set list response")?;
        Ok(Some(list.data))
    }

    async fn search_page(&self, url: &str) -> Result<Option<SearchPage>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                "Failed to fetch card page. Status code: {}",
                status.as_u16()
            );
            return Ok(None);
        }
        let page: SearchPage = response
            .json()
            .await
            .context("Malformed card search response")?;
        Ok(Some(page))
    }
}
