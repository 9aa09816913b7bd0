//! # MongoDB
//!
//! Document store holding the `influencers` collection.
//!
//! ## Requirements
//!
//! - Listing sorted by last update, filtered by name / label / gender
//! - Lookup by id, with a visit counter bumped on every lookup
//! - No client-side retries, one attempt per request
//!
//! ## Implementation
//!
//! - Descending index on `updated_on` created at startup, backs the list sort
//! - Visit counter uses `findOneAndUpdate` with `$inc`, returning the document
//!   from before the update, so concurrent lookups never lose an increment
//! - Updates `$set` every client-writable field, omitted fields become null
//! - Search text is escaped before going into `$regex`, so it matches as a
//!   literal, case-insensitive substring
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{Bson, Document, doc, oid::ObjectId, to_document},
    options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::StoreError,
    filters::{ListFilter, Pagination},
    models::{
        GENDER, ID, Influencer, InfluencerPayload, InfluencerSummary, LABEL, NAME, UPDATED_ON,
        VISITS,
    },
    store::InfluencerStore,
};

pub struct MongoStore {
    client: Client,
    influencers: Collection<Influencer>,
}

pub async fn init_mongo(config: &Config) -> Result<MongoStore, StoreError> {
    let mut options = ClientOptions::parse(&config.mongo_uri).await?;
    options.app_name = Some("follooow".to_string());
    options.retry_reads = Some(false);
    options.retry_writes = Some(false);

    let client = Client::with_options(options)?;
    let influencers = client
        .database(&config.mongo_database)
        .collection::<Influencer>(&config.mongo_collection);

    let index = IndexModel::builder().keys(doc! { UPDATED_ON: -1 }).build();
    if let Err(e) = influencers.create_index(index, None).await {
        warn!("Could not ensure {UPDATED_ON} index: {e}");
    }

    info!(
        database = %config.mongo_database,
        collection = %config.mongo_collection,
        "Connected to MongoDB"
    );

    Ok(MongoStore {
        client,
        influencers,
    })
}

pub fn filter_document(filter: &ListFilter) -> Document {
    let mut document = Document::new();

    if let Some(search) = &filter.search {
        document.insert(
            NAME,
            doc! { "$regex": regex::escape(search), "$options": "i" },
        );
    }

    if !filter.labels.is_empty() {
        document.insert(LABEL, doc! { "$in": filter.labels.clone() });
    }

    if let Some(gender) = filter.gender {
        document.insert(GENDER, gender.as_str());
    }

    document
}

pub fn ids_document(ids: Option<&[ObjectId]>) -> Document {
    match ids {
        Some(ids) => doc! { ID: { "$in": ids.to_vec() } },
        None => Document::new(),
    }
}

fn fields_document(payload: &InfluencerPayload, updated_on: i64) -> Result<Document, StoreError> {
    let mut document = to_document(payload)?;
    document.insert(UPDATED_ON, updated_on);

    Ok(document)
}

fn summary_projection() -> Document {
    InfluencerSummary::FIELDS
        .iter()
        .map(|field| (field.to_string(), Bson::Int32(1)))
        .collect()
}

#[async_trait]
impl InfluencerStore for MongoStore {
    async fn list(
        &self,
        filter: &ListFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Influencer>, u64), StoreError> {
        let filter = filter_document(filter);
        let options = FindOptions::builder()
            .sort(doc! { UPDATED_ON: -1 })
            .skip(pagination.skip)
            .limit(pagination.limit as i64)
            .build();

        let influencers: Vec<Influencer> = self
            .influencers
            .find(filter.clone(), options)
            .await?
            .try_collect()
            .await?;

        let total = self.influencers.count_documents(filter, None).await?;

        Ok((influencers, total))
    }

    async fn find_and_record_visit(&self, id: ObjectId) -> Result<Option<Influencer>, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();

        Ok(self
            .influencers
            .find_one_and_update(doc! { ID: id }, doc! { "$inc": { VISITS: 1 } }, options)
            .await?)
    }

    async fn quick_find(
        &self,
        ids: Option<&[ObjectId]>,
        limit: i64,
    ) -> Result<Vec<InfluencerSummary>, StoreError> {
        let options = FindOptions::builder()
            .limit(limit)
            .projection(summary_projection())
            .build();

        Ok(self
            .influencers
            .clone_with_type::<InfluencerSummary>()
            .find(ids_document(ids), options)
            .await?
            .try_collect()
            .await?)
    }

    async fn exists(&self, id: ObjectId) -> Result<bool, StoreError> {
        let found = self
            .influencers
            .clone_with_type::<Document>()
            .find_one(doc! { ID: id }, None)
            .await?;

        Ok(found.is_some())
    }

    async fn insert(
        &self,
        payload: InfluencerPayload,
        updated_on: i64,
    ) -> Result<Influencer, StoreError> {
        let mut document = fields_document(&payload, updated_on)?;
        document.insert(VISITS, 1_i64);

        let result = self
            .influencers
            .clone_with_type::<Document>()
            .insert_one(document, None)
            .await?;

        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::Unavailable(format!("unexpected inserted id {}", result.inserted_id))
        })?;

        Ok(Influencer::new(id, payload, updated_on))
    }

    async fn replace_fields(
        &self,
        id: ObjectId,
        payload: InfluencerPayload,
        updated_on: i64,
    ) -> Result<bool, StoreError> {
        let update = doc! { "$set": fields_document(&payload, updated_on)? };

        let result = self
            .influencers
            .update_one(doc! { ID: id }, update, None)
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn close(&self) {
        info!("Closing MongoDB connections");
        self.client.clone().shutdown().await;
    }
}
