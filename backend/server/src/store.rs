use std::cmp::Reverse;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    filters::{ListFilter, Pagination},
    models::{Influencer, InfluencerPayload, InfluencerSummary},
};

/// Persistence for influencer records.
///
/// Every call is a single attempt; failures surface as [`StoreError`].
#[async_trait]
pub trait InfluencerStore: Send + Sync {
    /// Matching records newest-first within the page, plus the unpaginated match count.
    async fn list(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Influencer>, u64), StoreError>;

    /// Atomically bumps `visits` and returns the record as it was before the bump.
    async fn find_and_record_visit(&self, id: ObjectId) -> Result<Option<Influencer>, StoreError>;

    /// `None` means no id filter.
    async fn quick_find(
        &self,
        ids: Option<&[ObjectId]>,
        limit: i64,
    ) -> Result<Vec<InfluencerSummary>, StoreError>;

    async fn exists(&self, id: ObjectId) -> Result<bool, StoreError>;

    async fn insert(
        &self,
        payload: InfluencerPayload,
        updated_on: i64,
    ) -> Result<Influencer, StoreError>;

    /// Returns whether a record matched.
    async fn replace_fields(
        &self,
        id: ObjectId,
        payload: InfluencerPayload,
        updated_on: i64,
    ) -> Result<bool, StoreError>;

    async fn close(&self) {}
}

/// In-process store, kept newest-last in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Influencer>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: ObjectId) -> Option<Influencer> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl InfluencerStore for MemoryStore {
    async fn list(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Influencer>, u64), StoreError> {
        let records = self.records.read().await;

        let mut matching: Vec<&Influencer> = records.iter().filter(|r| filter.matches(r)).collect();
        matching.sort_by_key(|r| Reverse(r.updated_on));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(pagination.skip as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn find_and_record_visit(&self, id: ObjectId) -> Result<Option<Influencer>, StoreError> {
        let mut records = self.records.write().await;

        Ok(records.iter_mut().find(|r| r.id == id).map(|record| {
            let before = record.clone();
            record.visits += 1;
            before
        }))
    }

    async fn quick_find(
        &self,
        ids: Option<&[ObjectId]>,
        limit: i64,
    ) -> Result<Vec<InfluencerSummary>, StoreError> {
        let records = self.records.read().await;

        Ok(records
            .iter()
            .filter(|r| ids.is_none_or(|ids| ids.contains(&r.id)))
            .take(limit.max(0) as usize)
            .map(Influencer::summary)
            .collect())
    }

    async fn exists(&self, id: ObjectId) -> Result<bool, StoreError> {
        Ok(self.records.read().await.iter().any(|r| r.id == id))
    }

    async fn insert(
        &self,
        payload: InfluencerPayload,
        updated_on: i64,
    ) -> Result<Influencer, StoreError> {
        let record = Influencer::new(ObjectId::new(), payload, updated_on);
        self.records.write().await.push(record.clone());

        Ok(record)
    }

    async fn replace_fields(
        &self,
        id: ObjectId,
        payload: InfluencerPayload,
        updated_on: i64,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;

        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.replace_fields(payload, updated_on);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
