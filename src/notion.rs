use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::mapper::CardProperties;
use crate::mapper::table::TableRow;

const API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Destination store failure, classified so retry policies can tell transient
/// gateway conditions from permanent request errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("destination API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("destination request timed out")]
    Timeout,
    #[error("destination request failed: {0}")]
    Transport(reqwest::Error),
    #[error("unexpected destination response: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Only gateway errors and timeouts are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout | StoreError::Api { status: 502, .. })
    }
}

/// Reference to an existing destination page. Only the fields the sync needs:
/// the page id and the set tag recorded in its properties.
#[derive(Debug, Clone)]
pub struct PageRef {
    pub id: String,
    pub set_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockRef {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl BlockRef {
    pub fn is_table(&self) -> bool {
        self.kind == "table"
    }
}

/// One page write: the mapped property bag plus optional external cover and
/// icon URLs. Cover/icon are only sent when present so an update never clears
/// images the page already has.
#[derive(Debug, Clone, Copy)]
pub struct PageWrite<'a> {
    pub properties: &'a CardProperties,
    pub cover: Option<&'a str>,
    pub icon: Option<&'a str>,
}

/// Destination store operations used by the sync. Implemented over the Notion
/// HTTP API in production and by an in-memory fake in tests.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn find_by_scryfall_id(
        &self,
        database_id: &str,
        scryfall_id: &str,
    ) -> Result<Option<PageRef>, StoreError>;
    async fn most_recent_page(&self, database_id: &str) -> Result<Option<PageRef>, StoreError>;
    async fn create_page(
        &self,
        database_id: &str,
        write: &PageWrite<'_>,
    ) -> Result<String, StoreError>;
    async fn update_page(&self, page_id: &str, write: &PageWrite<'_>) -> Result<(), StoreError>;
    async fn list_children(&self, page_id: &str) -> Result<Vec<BlockRef>, StoreError>;
    async fn append_table(&self, page_id: &str, rows: &[TableRow]) -> Result<(), StoreError>;
    async fn delete_block(&self, block_id: &str) -> Result<(), StoreError>;
}

pub struct NotionClient {
    http: reqwest::Client,
    token: String,
}

impl NotionClient {
    pub fn new(token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build Notion HTTP client")?;
        Ok(Self { http, token })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", API_BASE, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout
            } else {
                StoreError::Transport(e)
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn query(&self, database_id: &str, body: Value) -> Result<Option<PageRef>, StoreError> {
        let response = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/databases/{}/query", database_id),
                )
                .json(&body),
            )
            .await?;
        let first = response
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first());
        Ok(first.and_then(page_from_result))
    }
}

impl Store for NotionClient {
    async fn find_by_scryfall_id(
        &self,
        database_id: &str,
        scryfall_id: &str,
    ) -> Result<Option<PageRef>, StoreError> {
        let body = json!({
            "filter": {
                "property": "Scryfall ID",
                "rich_text": { "equals": scryfall_id }
            }
        });
        self.query(database_id, body).await
    }

    async fn most_recent_page(&self, database_id: &str) -> Result<Option<PageRef>, StoreError> {
        let body = json!({
            "sorts": [{ "timestamp": "last_edited_time", "direction": "descending" }],
            "page_size": 1
        });
        self.query(database_id, body).await
    }

    async fn create_page(
        &self,
        database_id: &str,
        write: &PageWrite<'_>,
    ) -> Result<String, StoreError> {
        let mut body = write_body(write);
        body["parent"] = json!({ "database_id": database_id });
        let response = self
            .send(self.request(reqwest::Method::POST, "/pages").json(&body))
            .await?;
        response
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Malformed("created page has no id".into()))
    }

    async fn update_page(&self, page_id: &str, write: &PageWrite<'_>) -> Result<(), StoreError> {
        let body = write_body(write);
        self.send(
            self.request(reqwest::Method::PATCH, &format!("/pages/{}", page_id))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn list_children(&self, page_id: &str) -> Result<Vec<BlockRef>, StoreError> {
        let response = self
            .send(self.request(
                reqwest::Method::GET,
                &format!("/blocks/{}/children", page_id),
            ))
            .await?;
        let results = response
            .get("results")
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(results).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn append_table(&self, page_id: &str, rows: &[TableRow]) -> Result<(), StoreError> {
        let body = json!({ "children": [table_block(rows)] });
        self.send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/blocks/{}/children", page_id),
            )
            .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_block(&self, block_id: &str) -> Result<(), StoreError> {
        self.send(self.request(reqwest::Method::DELETE, &format!("/blocks/{}", block_id)))
            .await?;
        Ok(())
    }
}

fn page_from_result(result: &Value) -> Option<PageRef> {
    let id = result.get("id")?.as_str()?.to_string();
    let set_name = result
        .pointer("/properties/Set/multi_select/0/name")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(PageRef { id, set_name })
}

/// Page body shared by create and update: property bag plus cover/icon when
/// the corresponding image resolution exists.
fn write_body(write: &PageWrite<'_>) -> Value {
    let mut body = json!({ "properties": property_bag(write.properties) });
    if let Some(cover) = write.cover {
        body["cover"] = json!({ "type": "external", "external": { "url": cover } });
    }
    if let Some(icon) = write.icon {
        body["icon"] = json!({ "type": "external", "external": { "url": icon } });
    }
    body
}

/// Wire form of the fixed property schema.
fn property_bag(props: &CardProperties) -> Value {
    let mut bag = json!({
        "Name": { "title": [{ "text": { "content": props.name } }] },
        "Type": { "multi_select": select_names(props.card_types.iter().map(String::as_str)) },
        "Mana Cost": { "rich_text": rich_text(&props.mana_cost) },
        "Set": { "multi_select": select_names([props.set_name.as_str()]) },
        "Rarity": { "select": { "name": props.rarity } },
        "Text": { "rich_text": rich_text(&props.oracle_text) },
        "Flavor Text": { "rich_text": rich_text(&props.flavor_text) },
        "Power": { "rich_text": rich_text(&props.power) },
        "Toughness": { "rich_text": rich_text(&props.toughness) },
        "Power/Toughness": { "rich_text": rich_text(&props.power_toughness) },
        "Loyalty": { "rich_text": rich_text(&props.loyalty) },
        "Legalities": { "multi_select": select_names(props.legalities.iter().map(String::as_str)) },
        "Artist": { "rich_text": rich_text(&props.artist) },
        "Keywords": { "multi_select": select_names(props.keywords.iter().copied()) },
        "Scryfall ID": { "rich_text": rich_text(&props.scryfall_id) },
    });
    if let Some(illustration) = &props.illustration {
        bag["Illustration"] = json!({
            "files": [{
                "name": illustration.name,
                "external": { "url": illustration.url }
            }]
        });
    }
    bag
}

fn rich_text(content: &str) -> Value {
    json!([{ "text": { "content": content } }])
}

fn select_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Value {
    Value::Array(
        names
            .into_iter()
            .map(|name| json!({ "name": name }))
            .collect(),
    )
}

fn table_block(rows: &[TableRow]) -> Value {
    let children: Vec<Value> = rows.iter().map(row_block).collect();
    json!({
        "object": "block",
        "type": "table",
        "table": {
            "table_width": 2,
            "has_column_header": false,
            "has_row_header": false,
            "children": children,
        }
    })
}

fn row_block(row: &TableRow) -> Value {
    let link = row.link.as_ref().map(|url| json!({ "url": url }));
    json!({
        "object": "block",
        "type": "table_row",
        "table_row": {
            "cells": [
                [{ "text": { "content": row.key } }],
                [{ "text": { "content": row.text, "link": link } }],
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{map_card, Illustration};
    use crate::scryfall::Card;

    fn sample_props() -> CardProperties {
        map_card(&Card {
            id: "abc-123".into(),
            name: "Opt".into(),
            type_line: "Instant".into(),
            rarity: "common".into(),
            ..Card::default()
        })
    }

    #[test]
    fn property_bag_matches_schema() {
        let bag = property_bag(&sample_props());
        assert_eq!(bag["Name"]["title"][0]["text"]["content"], "Opt");
        assert_eq!(bag["Type"]["multi_select"][0]["name"], "Instant");
        assert_eq!(bag["Rarity"]["select"]["name"], "Common");
        assert_eq!(bag["Scryfall ID"]["rich_text"][0]["text"]["content"], "abc-123");
        // No illustration resolution present, so the property is omitted.
        assert!(bag.get("Illustration").is_none());
    }

    #[test]
    fn illustration_property_when_present() {
        let mut props = sample_props();
        props.illustration = Some(Illustration {
            name: "Opt".into(),
            url: "https://img.example/opt.png".into(),
        });
        let bag = property_bag(&props);
        assert_eq!(
            bag["Illustration"]["files"][0]["external"]["url"],
            "https://img.example/opt.png"
        );
    }

    #[test]
    fn write_body_omits_absent_cover_and_icon() {
        let props = sample_props();
        let write = PageWrite {
            properties: &props,
            cover: None,
            icon: Some("https://img.example/opt-small.jpg"),
        };
        let body = write_body(&write);
        assert!(body.get("cover").is_none());
        assert_eq!(
            body["icon"]["external"]["url"],
            "https://img.example/opt-small.jpg"
        );
    }

    #[test]
    fn table_rows_render_links_or_plain_text() {
        let rows = vec![
            TableRow {
                key: "usd".into(),
                text: "1.25".into(),
                link: None,
            },
            TableRow {
                key: "gatherer".into(),
                text: "https://gatherer.wizards.com/x".into(),
                link: Some("https://gatherer.wizards.com/x".into()),
            },
        ];
        let block = table_block(&rows);
        assert_eq!(block["table"]["table_width"], 2);
        let cells = &block["table"]["children"][0]["table_row"]["cells"];
        assert_eq!(cells[0][0]["text"]["content"], "usd");
        assert_eq!(cells[1][0]["text"]["link"], Value::Null);
        let linked = &block["table"]["children"][1]["table_row"]["cells"][1][0];
        assert_eq!(linked["text"]["link"]["url"], "https://gatherer.wizards.com/x");
    }

    #[test]
    fn page_ref_reads_set_tag() {
        let result = json!({
            "id": "page-1",
            "properties": {
                "Set": { "multi_select": [{ "name": "War of the Spark" }] }
            }
        });
        let page = page_from_result(&result).unwrap();
        assert_eq!(page.id, "page-1");
        assert_eq!(page.set_name.as_deref(), Some("War of the Spark"));
    }

    #[test]
    fn transient_classification() {
        let gateway = StoreError::Api {
            status: 502,
            message: String::new(),
        };
        let forbidden = StoreError::Api {
            status: 403,
            message: String::new(),
        };
        assert!(gateway.is_transient());
        assert!(StoreError::Timeout.is_transient());
        assert!(!forbidden.is_transient());
    }
}
