//! Per-verb resource service.
//!
//! Thin operations over named collections of the API: reads hydrate fresh
//! values without touching the cache; writes evict every cached key reachable
//! from the entity's links before the call.

use halcyon_core::constants::SEARCH_SEGMENT;
use halcyon_core::{
    hydrate_resource, to_payload, HalError, HalOptions, HalParam, HalResource, HalResult, Include,
    PagedCollection, TransportRequest,
};
use serde::Serialize;
use serde_json::Value;

use crate::client::HalClient;

const COUNT_ALL_QUERY: &str = "countAll";

impl HalClient {
    // ========================================================================
    // READS
    // ========================================================================

    /// Every item of the `resource` collection matching `options`.
    pub async fn get_all<T: HalResource + Default>(
        &self,
        resource: &str,
        embedded_key: Option<&str>,
        options: Option<&HalOptions>,
    ) -> HalResult<PagedCollection<T>> {
        let url = self.resolver().resource_url(Some(resource));
        self.query_collection(&url, embedded_key, options).await
    }

    /// Item `id` of the `resource` collection.
    pub async fn get<T: HalResource + Default>(
        &self,
        resource: &str,
        id: &str,
        params: &[HalParam],
    ) -> HalResult<T> {
        let url = format!("{}/{}", self.resolver().resource_url(Some(resource)), id);
        let query = params
            .iter()
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect();
        let payload = self.get_json(&url, query).await?;
        self.hydrate_one(payload)
    }

    /// The resource behind an absolute `self` href.
    pub async fn get_by_self_link<T: HalResource + Default>(&self, href: &str) -> HalResult<T> {
        let payload = self.get_json(&self.resolver().resolve(href), Vec::new()).await?;
        self.hydrate_one(payload)
    }

    /// Run the `query` search of the `resource` collection.
    pub async fn search<T: HalResource + Default>(
        &self,
        resource: &str,
        query: &str,
        embedded_key: Option<&str>,
        options: Option<&HalOptions>,
    ) -> HalResult<PagedCollection<T>> {
        let url = self.search_url(resource, query);
        self.query_collection(&url, embedded_key, options).await
    }

    /// Run a `query` search that answers a single resource.
    pub async fn search_single<T: HalResource + Default>(
        &self,
        resource: &str,
        query: &str,
        options: Option<&HalOptions>,
    ) -> HalResult<T> {
        let url = self.search_url(resource, query);
        let pairs = options.map(HalOptions::to_query_pairs).unwrap_or_default();
        let payload = self.get_json(&url, pairs).await?;
        self.hydrate_one(payload)
    }

    /// GET the collection at `<resource><query>`, e.g. `widgets/search/cheap`.
    pub async fn custom_query<T: HalResource + Default>(
        &self,
        resource: &str,
        query: &str,
        embedded_key: Option<&str>,
        options: Option<&HalOptions>,
    ) -> HalResult<PagedCollection<T>> {
        let url = self.resolver().resource_url(Some(format!("{resource}{query}").as_str()));
        self.query_collection(&url, embedded_key, options).await
    }

    /// POST `body` to `<resource><query>` and hydrate the collection answered.
    pub async fn custom_query_post<T, B>(
        &self,
        resource: &str,
        query: &str,
        body: &B,
        embedded_key: Option<&str>,
        options: Option<&HalOptions>,
    ) -> HalResult<PagedCollection<T>>
    where
        T: HalResource + Default,
        B: Serialize,
    {
        let url = self.resolver().resource_url(Some(format!("{resource}{query}").as_str()));
        let pairs = options.map(HalOptions::to_query_pairs).unwrap_or_default();
        let request = TransportRequest::post(url, serde_json::to_value(body)?).with_query(pairs);
        let payload = self.send(request).await?.into_body()?;
        let sort = options.map(|o| o.sort.clone()).unwrap_or_default();
        Ok(self
            .hydrate_many::<T>(payload, self.embedded_key_or_default(embedded_key))?
            .with_sort(sort))
    }

    /// The single resource behind a relation href.
    pub async fn get_by_relation<T: HalResource + Default>(&self, href: &str) -> HalResult<T> {
        self.get_by_self_link(href).await
    }

    /// The collection behind a relation href.
    pub async fn get_by_relation_array<T: HalResource + Default>(
        &self,
        href: &str,
        embedded_key: Option<&str>,
    ) -> HalResult<PagedCollection<T>> {
        let url = self.resolver().resolve(href);
        self.query_collection(&url, embedded_key, None).await
    }

    /// Element count reported by the `query` search (`countAll` when none).
    pub async fn count(
        &self,
        resource: &str,
        query: Option<&str>,
        options: Option<&HalOptions>,
    ) -> HalResult<u64> {
        let url = self.search_url(resource, query.unwrap_or(COUNT_ALL_QUERY));
        let pairs = options.map(HalOptions::to_query_pairs).unwrap_or_default();
        match self.get_json(&url, pairs).await? {
            Value::String(text) => Ok(serde_json::from_str(text.trim())?),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// POST `entity` to the `resource` collection and hydrate the answer into
    /// a clone of it.
    pub async fn create<T: HalResource>(&self, resource: &str, entity: &T) -> HalResult<T> {
        self.cache().evict_all_keys_for(entity);
        let url = self.resolver().resource_url(Some(resource));
        let payload = to_payload(entity, &Include::NoNulls)?;
        let response = self
            .send(TransportRequest::post(url, payload))
            .await?
            .into_checked()?;
        hydrate_resource(entity.clone(), response.body)
    }

    /// PUT `entity` to its `self` href.
    pub async fn update<T: HalResource>(&self, entity: &T) -> HalResult<T> {
        let url = self.evict_and_locate(entity)?;
        let payload = to_payload(entity, &Include::NoNulls)?;
        let response = self
            .send(TransportRequest::put(url, payload))
            .await?
            .into_checked()?;
        hydrate_resource(entity.clone(), response.body)
    }

    /// PATCH `entity` to its `self` href; `include` selects which null
    /// properties are sent.
    pub async fn patch<T: HalResource>(&self, entity: &T, include: &Include) -> HalResult<T> {
        let url = self.evict_and_locate(entity)?;
        let payload = to_payload(entity, include)?;
        let response = self
            .send(TransportRequest::patch(url, payload))
            .await?
            .into_checked()?;
        hydrate_resource(entity.clone(), response.body)
    }

    /// DELETE `entity` at its `self` href. Returns the response body.
    pub async fn delete<T: HalResource>(&self, entity: &T) -> HalResult<Value> {
        let url = self.evict_and_locate(entity)?;
        self.send(TransportRequest::delete(url)).await?.into_body()
    }

    // ------------------------------------------------------------------------

    fn search_url(&self, resource: &str, query: &str) -> String {
        format!(
            "{}/{}/{}",
            self.resolver().resource_url(Some(resource)),
            SEARCH_SEGMENT,
            query
        )
    }

    fn embedded_key_or_default<'a>(&'a self, embedded_key: Option<&'a str>) -> &'a str {
        embedded_key.unwrap_or(&self.config().embedded_key)
    }

    async fn query_collection<T: HalResource + Default>(
        &self,
        url: &str,
        embedded_key: Option<&str>,
        options: Option<&HalOptions>,
    ) -> HalResult<PagedCollection<T>> {
        let pairs = options.map(HalOptions::to_query_pairs).unwrap_or_default();
        let payload = self.get_json(url, pairs).await?;
        let sort = options.map(|o| o.sort.clone()).unwrap_or_default();
        Ok(self
            .hydrate_many::<T>(payload, self.embedded_key_or_default(embedded_key))?
            .with_sort(sort))
    }

    /// Evict the entity's cached relations and return its resolved `self`
    /// href. Fails before eviction when there is none.
    fn evict_and_locate<T: HalResource>(&self, entity: &T) -> HalResult<String> {
        let href = entity.self_link_href().ok_or(HalError::MissingSelfLink)?;
        let evicted = self.cache().evict_all_keys_for(entity);
        tracing::debug!(href = %href, evicted, "Evicted entity relations");
        Ok(self.resolver().resolve(&href))
    }
}
