//! Collection enumeration: one `_all_docs` count per collection.
//!
//! Collections are visited in declaration order and independently: a failure is
//! recorded on that collection's entry and the walk moves on to the next name.

use std::fmt;

use futures::{StreamExt, stream};
use tracing::{info, warn};

use kernelsync_core::{backend::StoreBackend, error::SyncError, store::DocumentStore};

/// Sample documents are cut to this many characters.
pub const SAMPLE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerateMode {
    /// Count, then fetch the first document as a truncated sample.
    Sample,
    /// Count, then list every document id.
    ListIds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionDetail {
    /// Nothing fetched beyond the count.
    Nothing,
    Sample(String),
    /// The count succeeded but fetching the sample did not.
    SampleFailed(SyncError),
    Ids(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    Counted {
        total_rows: u64,
        detail: CollectionDetail,
    },
    /// The database does not exist yet (404).
    Missing,
    Failed(SyncError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub name: String,
    pub outcome: CollectionOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationReport {
    pub mode: EnumerateMode,
    pub collections: Vec<CollectionReport>,
}

impl EnumerationReport {
    pub fn get(&self, name: &str) -> Option<&CollectionReport> {
        self.collections.iter().find(|report| report.name == name)
    }

    /// Collections whose count query failed for a reason other than a missing database.
    pub fn failures(&self) -> usize {
        self.collections
            .iter()
            .filter(|report| matches!(report.outcome, CollectionOutcome::Failed(_)))
            .count()
    }
}

/// Counts every collection in `collections`, in order, one query each.
pub async fn enumerate<B: StoreBackend>(
    store: &DocumentStore<B>,
    collections: &[String],
    mode: EnumerateMode,
) -> EnumerationReport {
    let collections = stream::iter(collections)
        .then(|name| inspect_collection(store, name, mode))
        .collect::<Vec<_>>()
        .await;

    EnumerationReport { mode, collections }
}

async fn inspect_collection<B: StoreBackend>(
    store: &DocumentStore<B>,
    name: &str,
    mode: EnumerateMode,
) -> CollectionReport {
    let collection = store.collection(name);

    let outcome = match collection.all_docs().await {
        Ok(all) => {
            info!(collection = name, total_rows = all.total_rows, "collection counted");

            let detail = match (mode, all.first_id()) {
                (EnumerateMode::ListIds, _) => {
                    CollectionDetail::Ids(all.ids().map(str::to_string).collect())
                }
                _ if all.total_rows == 0 => CollectionDetail::Nothing,
                (EnumerateMode::Sample, Some(id)) => match collection.get(id).await {
                    Ok(document) => CollectionDetail::Sample(truncate_sample(&document.to_string())),
                    Err(err) => {
                        warn!(collection = name, id, error = %err, "sample fetch failed");
                        CollectionDetail::SampleFailed(err)
                    }
                },
                (EnumerateMode::Sample, None) => CollectionDetail::Nothing,
            };

            CollectionOutcome::Counted {
                total_rows: all.total_rows,
                detail,
            }
        }
        Err(err) if err.is_not_found() => {
            warn!(collection = name, "database does not exist");
            CollectionOutcome::Missing
        }
        Err(err) => {
            warn!(collection = name, error = %err, "count query failed");
            CollectionOutcome::Failed(err)
        }
    };

    CollectionReport {
        name: name.to_string(),
        outcome,
    }
}

fn truncate_sample(json: &str) -> String {
    json.chars().take(SAMPLE_LIMIT).collect()
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CollectionOutcome::Counted { total_rows, detail } => {
                writeln!(f, "{}: {} documents", self.name, total_rows)?;
                match detail {
                    CollectionDetail::Nothing => Ok(()),
                    CollectionDetail::Sample(sample) => writeln!(f, "   Sample: {sample}..."),
                    CollectionDetail::SampleFailed(err) => {
                        writeln!(f, "   Sample unavailable: {err}")
                    }
                    CollectionDetail::Ids(ids) if ids.is_empty() => {
                        writeln!(f, "   (no documents)")
                    }
                    CollectionDetail::Ids(ids) => {
                        ids.iter().try_for_each(|id| writeln!(f, "   - {id}"))
                    }
                }
            }
            CollectionOutcome::Missing => {
                writeln!(f, "{}: database does not exist yet (not synced or created)", self.name)
            }
            CollectionOutcome::Failed(err) => writeln!(f, "{}: error: {err}", self.name),
        }
    }
}

impl fmt::Display for EnumerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.collections
            .iter()
            .try_for_each(|report| write!(f, "{report}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_cut_on_character_boundaries() {
        let long = "é".repeat(150);

        assert_eq!(truncate_sample(&long).chars().count(), SAMPLE_LIMIT);
        assert_eq!(truncate_sample("{}"), "{}");
    }

    #[test]
    fn counted_collections_render_their_total() {
        let report = CollectionReport {
            name: "projects".into(),
            outcome: CollectionOutcome::Counted {
                total_rows: 0,
                detail: CollectionDetail::Nothing,
            },
        };

        assert_eq!(report.to_string(), "projects: 0 documents\n");
    }
}
