// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Record store behind the CRUD endpoints.
//!
//! The service depends only on [`RecordStore`]. [`MemoryStore`] is a
//! thread-safe in-process implementation; ids are assigned sequentially
//! from 1.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub value: serde_json::Value,
}

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Keyed storage the CRUD endpoints talk to.
pub trait RecordStore: Send + Sync {
    /// All records in id order.
    fn list(&self) -> Vec<Item>;

    fn get(&self, id: u64) -> Option<Item>;

    /// Record with the highest id.
    fn last(&self) -> Option<Item>;

    fn create(&self, item: NewItem) -> Item;
}

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<u64, Item>,
    next_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn list(&self) -> Vec<Item> {
        let lock = self.data.read().unwrap_or_else(PoisonError::into_inner);
        lock.items.values().cloned().collect()
    }

    fn get(&self, id: u64) -> Option<Item> {
        let lock = self.data.read().unwrap_or_else(PoisonError::into_inner);
        lock.items.get(&id).cloned()
    }

    fn last(&self) -> Option<Item> {
        let lock = self.data.read().unwrap_or_else(PoisonError::into_inner);
        lock.items.values().next_back().cloned()
    }

    fn create(&self, item: NewItem) -> Item {
        let mut lock = self.data.write().unwrap_or_else(PoisonError::into_inner);
        lock.next_id += 1;
        let item = Item {
            id: lock.next_id,
            name: item.name,
            value: item.value,
        };
        lock.items.insert(item.id, item.clone());
        item
    }
}
