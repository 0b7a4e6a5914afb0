//! Table manager for spawning and managing multiple table actors.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{
    TableId,
    actor::{TableActor, TableHandle},
    config::TableConfig,
    messages::{TableError, TableSummary},
};

/// Table manager for managing multiple table instances
#[derive(Clone, Default)]
pub struct TableManager {
    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Next table ID
    next_table_id: Arc<RwLock<TableId>>,
}

impl TableManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `config`, spawn a table actor for it and return its id.
    pub async fn create_table(&self, config: TableConfig) -> Result<TableId, TableError> {
        config.validate()?;

        let mut next_id = self.next_table_id.write().await;
        *next_id += 1;
        let table_id = *next_id;
        drop(next_id);

        let name = config.name.clone();
        let (actor, handle) = TableActor::new(table_id, config);

        let mut tables = self.tables.write().await;
        tables.insert(table_id, handle);
        drop(tables);

        tokio::spawn(actor.run());

        log::info!("Created table {table_id} '{name}'");
        Ok(table_id)
    }

    /// Get a table handle
    pub async fn get_table(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    /// Summaries of every table still running, ordered by id.
    pub async fn list_tables(&self) -> Vec<TableSummary> {
        let handles: Vec<TableHandle> = {
            let tables = self.tables.read().await;
            tables.values().cloned().collect()
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.summary().await {
                Ok(summary) => summaries.push(summary),
                Err(e) => log::debug!("Skipping table {}: {e}", handle.table_id()),
            }
        }
        summaries.sort_by_key(|summary| summary.id);
        summaries
    }

    /// Stop a table's actor and forget it.
    pub async fn close_table(&self, table_id: TableId) -> Result<(), TableError> {
        let handle = self
            .tables
            .write()
            .await
            .remove(&table_id)
            .ok_or(TableError::NotFound(table_id))?;

        // Already stopped is as good as closed.
        if let Err(e) = handle.close().await {
            log::debug!("Table {table_id} was already down: {e}");
        }

        log::info!("Closed table {table_id}");
        Ok(())
    }

    /// Get active table count
    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }
}
