use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Document, EntityStore, Filter, StoreError, StoreResult, from_document, to_document,
};

/// 进程内存储，用于本地运行和测试
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<&'static str, Vec<Map<String, Value>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique<T: Document>(
    existing: &[Map<String, Value>],
    incoming: &[Map<String, Value>],
) -> StoreResult<()> {
    let Some(key) = T::UNIQUE_KEY else {
        return Ok(());
    };
    let duplicate = StoreError::Duplicate {
        collection: T::COLLECTION,
        key,
    };
    for (i, doc) in incoming.iter().enumerate() {
        let Some(value) = doc.get(key) else {
            continue;
        };
        if existing.iter().any(|d| d.get(key) == Some(value))
            || incoming[..i].iter().any(|d| d.get(key) == Some(value))
        {
            return Err(duplicate);
        }
    }
    Ok(())
}

impl EntityStore for MemoryStore {
    async fn insert_one<T: Document>(&self, record: &T) -> StoreResult<String> {
        let ids = self.insert_many(std::slice::from_ref(record)).await?;
        Ok(ids.into_iter().next().unwrap_or_default())
    }

    async fn insert_many<T: Document>(&self, records: &[T]) -> StoreResult<Vec<String>> {
        let docs = records
            .iter()
            .map(to_document)
            .collect::<StoreResult<Vec<_>>>()?;

        let mut collections = self.collections.write().await;
        let collection = collections.entry(T::COLLECTION).or_default();
        check_unique::<T>(collection, &docs)?;

        let ids = docs
            .iter()
            .map(|_| Uuid::new_v4().to_string())
            .collect::<Vec<_>>();
        collection.extend(docs);
        tracing::debug!("Inserted {} documents into {}", ids.len(), T::COLLECTION);
        Ok(ids)
    }

    async fn find_one<T: Document>(&self, filter: &Filter) -> StoreResult<Option<T>> {
        let collections = self.collections.read().await;
        collections
            .get(T::COLLECTION)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .map(|d| from_document(d.clone()))
            .transpose()
    }

    async fn find<T: Document>(&self, filter: &Filter) -> StoreResult<Vec<T>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(T::COLLECTION) else {
            return Ok(Vec::new());
        };
        docs.iter()
            .filter(|d| filter.matches(d))
            .map(|d| from_document(d.clone()))
            .collect()
    }

    async fn count<T: Document>(&self, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        let count = collections
            .get(T::COLLECTION)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }
}
