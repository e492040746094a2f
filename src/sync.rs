use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::mapper;
use crate::mapper::table::{self, TableRow};
use crate::notion::{PageWrite, Store, StoreError};
use crate::retry::{retry_if, GATEWAY, SLOW};
use crate::scryfall::{search_url, Card, Catalog, SetInfo};

pub struct SyncOptions {
    pub resume: bool,
    pub set_filter: Option<String>,
}

/// Totals for one sync pass, returned instead of mutated in place.
#[derive(Debug, Default)]
pub struct SyncStats {
    pub sets: usize,
    pub cards: usize,
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Created,
    Updated,
}

/// Walk every remaining set in upstream order, reconciling each card one at a
/// time. An unavailable card page halts only that set's walk; a card write
/// that exhausts its retries aborts the whole run.
pub async fn run(
    catalog: &impl Catalog,
    store: &impl Store,
    database_id: &str,
    opts: &SyncOptions,
) -> Result<SyncStats> {
    let mut stats = SyncStats::default();

    let Some(mut sets) = list_sets(catalog).await? else {
        return Ok(stats);
    };
    if let Some(code) = &opts.set_filter {
        sets.retain(|s| &s.code == code);
    }

    if opts.resume {
        let recent = retry_if(&SLOW, StoreError::is_transient, || {
            retry_if(&GATEWAY, StoreError::is_transient, move || {
                store.most_recent_page(database_id)
            })
        })
        .await?;
        if let Some(set_name) = recent.and_then(|page| page.set_name) {
            let total = sets.len();
            sets = plan_resume(sets, &set_name);
            info!(
                "Resuming from set \"{}\" ({} of {} sets remaining)",
                set_name,
                sets.len(),
                total
            );
        }
    }

    for set in &sets {
        info!("Fetching cards from set: {}", set.name);
        walk_set(catalog, store, database_id, set, &mut stats).await?;
        stats.sets += 1;
    }
    Ok(stats)
}

/// Drop leading sets until the most recently synced set is reached. No match
/// means every set has been synced past, so nothing remains.
pub fn plan_resume(mut sets: Vec<SetInfo>, most_recent_set: &str) -> Vec<SetInfo> {
    match sets.iter().position(|s| s.name == most_recent_set) {
        Some(i) => sets.split_off(i),
        None => Vec::new(),
    }
}

async fn walk_set(
    catalog: &impl Catalog,
    store: &impl Store,
    database_id: &str,
    set: &SetInfo,
    stats: &mut SyncStats,
) -> Result<()> {
    let mut next = Some(search_url(&set.code));
    while let Some(url) = next.take() {
        let url_ref = url.as_str();
        let page = retry_if(&SLOW, upstream_transient, move || {
            catalog.search_page(url_ref)
        })
        .await?;
        let Some(page) = page else {
            warn!("Halting set {}: card page unavailable", set.code);
            break;
        };

        let pb = ProgressBar::new(page.data.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}: {percent:>3}%|{bar:10}| {pos}/{len}")?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Processing cards for {}", set.name));

        for card in &page.data {
            match reconcile(store, database_id, card).await? {
                Outcome::Created => stats.created += 1,
                Outcome::Updated => stats.updated += 1,
            }
            stats.cards += 1;
            pb.inc(1);
        }
        pb.finish_and_clear();

        next = if page.has_more { page.next_page } else { None };
    }
    Ok(())
}

/// Create or update the destination page for one card. Exactly one page write,
/// at most one block deletion, and exactly one table append per successful
/// call. Every store interaction carries both retry policies.
pub async fn reconcile(
    store: &impl Store,
    database_id: &str,
    card: &Card,
) -> Result<Outcome, StoreError> {
    let existing = retry_if(&SLOW, StoreError::is_transient, || {
        retry_if(&GATEWAY, StoreError::is_transient, move || {
            store.find_by_scryfall_id(database_id, &card.id)
        })
    })
    .await?;

    let props = mapper::map_card(card);
    let rows = table::build_rows(card);
    let images = card.image_uris.as_ref();
    let write = PageWrite {
        properties: &props,
        cover: images.and_then(|uris| uris.png.as_deref()),
        icon: images.and_then(|uris| uris.small.as_deref()),
    };

    match existing {
        Some(page) => {
            let page_id = page.id.as_str();
            let rows = rows.as_slice();
            retry_if(&SLOW, StoreError::is_transient, || {
                retry_if(&GATEWAY, StoreError::is_transient, move || {
                    rebuild_existing(store, page_id, write, rows)
                })
            })
            .await?;
            Ok(Outcome::Updated)
        }
        None => {
            let rows = rows.as_slice();
            retry_if(&SLOW, StoreError::is_transient, || {
                retry_if(&GATEWAY, StoreError::is_transient, move || {
                    create_fresh(store, database_id, write, rows)
                })
            })
            .await?;
            Ok(Outcome::Created)
        }
    }
}

/// Update path: rewrite properties, then regenerate the attributes table by
/// deleting the first existing table child and appending a fresh one. Stale
/// rows never survive.
async fn rebuild_existing(
    store: &impl Store,
    page_id: &str,
    write: PageWrite<'_>,
    rows: &[TableRow],
) -> Result<(), StoreError> {
    store.update_page(page_id, &write).await?;
    let children = store.list_children(page_id).await?;
    if let Some(block) = children.iter().find(|b| b.is_table()) {
        store.delete_block(&block.id).await?;
    }
    store.append_table(page_id, rows).await
}

async fn create_fresh(
    store: &impl Store,
    database_id: &str,
    write: PageWrite<'_>,
    rows: &[TableRow],
) -> Result<(), StoreError> {
    let page_id = store.create_page(database_id, &write).await?;
    store.append_table(&page_id, rows).await
}

async fn list_sets(catalog: &impl Catalog) -> Result<Option<Vec<SetInfo>>> {
    retry_if(&SLOW, upstream_transient, move || catalog.sets()).await
}

/// Upstream fetches only retry on timeouts; a non-200 answer is already
/// end-of-availability and surfaces as a normal `None`.
fn upstream_transient(e: &anyhow::Error) -> bool {
    e.downcast_ref::<reqwest::Error>()
        .is_some_and(|e| e.is_timeout())
}
