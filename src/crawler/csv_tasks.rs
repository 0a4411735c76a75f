//! Task fetcher backed by a CSV listing file
//!
//! Detailed crawls typically start from the tabular output of an earlier
//! listing crawl; this fetcher turns those rows back into tasks. Rows
//! without an identifier are dropped, since they could never be tracked
//! in the ledger.

use crate::config::TaskSourceConfig;
use crate::crawler::session::FetchSession;
use crate::crawler::task::{CrawlTask, TaskFetcher};
use anyhow::Context;
use async_trait::async_trait;

/// Reads candidate tasks from a configured CSV file
pub struct CsvTaskFetcher {
    config: TaskSourceConfig,
}

impl CsvTaskFetcher {
    /// Creates a fetcher for the given task source
    pub fn new(config: TaskSourceConfig) -> Self {
        Self { config }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> anyhow::Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow::anyhow!("task source is missing column '{}'", name))
}

#[async_trait]
impl TaskFetcher for CsvTaskFetcher {
    async fn list(
        &self,
        _session: &FetchSession,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<CrawlTask>> {
        let mut reader = csv::Reader::from_path(&self.config.path)
            .with_context(|| format!("opening task source '{}'", self.config.path))?;
        let headers = reader.headers()?.clone();

        let id_index = column_index(&headers, &self.config.id_column)?;
        let label_index = column_index(&headers, &self.config.label_column)?;
        let key_indices = self
            .config
            .key_columns
            .iter()
            .map(|name| column_index(&headers, name))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut tasks = Vec::new();
        for result in reader.records() {
            let row = result.context("reading task source row")?;

            let id = row.get(id_index).unwrap_or("");
            if id.is_empty() {
                tracing::warn!("Skipping task row without an identifier");
                continue;
            }

            let label = row.get(label_index).unwrap_or("").to_string();
            let keys: Vec<String> = key_indices
                .iter()
                .map(|&i| row.get(i).unwrap_or("").to_string())
                .collect();

            tasks.push(CrawlTask::new(id, label, keys));
            if limit.is_some_and(|cap| tasks.len() >= cap) {
                break;
            }
        }

        tracing::info!("Listed {} tasks from '{}'", tasks.len(), self.config.path);
        Ok(tasks)
    }
}
