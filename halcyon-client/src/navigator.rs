//! Relation navigation
//!
//! Reads resolve a named relation of a hydrated resource to a resource or a
//! paged collection, cache-first. Mutations bind, rebind or unbind related
//! resources through `text/uri-list` bodies, or post/patch JSON to a
//! relation; they fail before any network access when the relation or the
//! target's `self` link is missing, and evict the relation's cache entry
//! before the call.

use std::sync::Arc;

use halcyon_cache::CachePolicy;
use halcyon_core::url::{fill_template, strip_query};
use halcyon_core::{
    hydrate_resource, HalError, HalOptions, HalResource, HalResult, Link, LinkOptions, Method,
    PagedCollection, RequestBody, TransportRequest, TransportResponse,
};
use serde::Serialize;

use crate::client::HalClient;

/// Per-call options for relation reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationOptions {
    pub cache: CachePolicy,
    /// Embedded key of collection payloads; the configured key when unset.
    pub embedded_key: Option<String>,
    pub query: Option<HalOptions>,
}

impl RelationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_embedded_key(mut self, key: impl Into<String>) -> Self {
        self.embedded_key = Some(key.into());
        self
    }

    pub fn with_query(mut self, query: HalOptions) -> Self {
        self.query = Some(query);
        self
    }
}

impl HalClient {
    // ========================================================================
    // READS
    // ========================================================================

    /// Resolve `relation` of `source` to a single resource.
    ///
    /// `Ok(None)` when `source` has no such relation. The subtype, when a
    /// registry for `T` is known, is chosen from the fetched payload's `self`
    /// href.
    pub async fn get_relation<T, S>(
        &self,
        source: &S,
        relation: &str,
        options: &RelationOptions,
    ) -> HalResult<Option<Arc<T>>>
    where
        T: HalResource + Default,
        S: HalResource,
    {
        let Some(link) = source.link(relation) else {
            tracing::trace!(relation, "Relation absent, nothing to fetch");
            return Ok(None);
        };
        let key = link.resolved_href();
        let url = self.resolver().resolve(&key);
        self.fetch_resource(&url, options.query.as_ref(), options.cache, &key)
            .await
            .map(Some)
    }

    /// Resolve `relation` of `source` to a paged collection.
    ///
    /// An empty collection when `source` has no such relation. The href is
    /// fetched without its query string; the options' query is sent instead.
    /// Cached collections are only served when the options carry no query.
    pub async fn get_relation_array<T, S>(
        &self,
        source: &S,
        relation: &str,
        options: &RelationOptions,
    ) -> HalResult<Arc<PagedCollection<T>>>
    where
        T: HalResource + Default,
        S: HalResource,
    {
        let embedded_key = options
            .embedded_key
            .as_deref()
            .unwrap_or(&self.config().embedded_key)
            .to_string();

        let Some(link) = source.link(relation) else {
            tracing::trace!(relation, "Relation absent, returning empty collection");
            return Ok(Arc::new(PagedCollection::empty(embedded_key)));
        };
        let key = link.resolved_href();
        let url = self.resolver().resolve(strip_query(&key));
        self.fetch_collection(&url, options.query.as_ref(), options.cache, &embedded_key, &key)
            .await
    }

    /// Fetch `id` of the `resource` collection through a named projection.
    /// Cached under the full projection URL.
    pub async fn get_projection<T: HalResource + Default>(
        &self,
        resource: &str,
        id: &str,
        projection: &str,
        policy: CachePolicy,
    ) -> HalResult<Arc<T>> {
        let url = format!(
            "{}/{}?projection={}",
            self.resolver().resource_url(Some(resource)),
            id,
            halcyon_core::url::encode_component(projection)
        );
        self.fetch_resource(&url, None, policy, &url).await
    }

    /// Fetch the `resource` collection through a named projection. Items are
    /// read from the default `_embedded` key.
    pub async fn get_projection_array<T: HalResource + Default>(
        &self,
        resource: &str,
        projection: &str,
        policy: CachePolicy,
    ) -> HalResult<Arc<PagedCollection<T>>> {
        let url = format!(
            "{}?projection={}",
            self.resolver().resource_url(Some(resource)),
            halcyon_core::url::encode_component(projection)
        );
        self.fetch_collection(
            &url,
            None,
            policy,
            halcyon_core::constants::DEFAULT_EMBEDDED_KEY,
            &url,
        )
        .await
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Bind `target` to `relation` (PUT `text/uri-list`).
    pub async fn add_relation<S, R>(
        &self,
        source: &S,
        relation: &str,
        target: &R,
    ) -> HalResult<TransportResponse>
    where
        S: HalResource,
        R: HalResource,
    {
        self.send_uri_list(Method::Put, source, relation, target).await
    }

    /// Update the binding of `relation` to `target` (PATCH `text/uri-list`).
    pub async fn update_relation<S, R>(
        &self,
        source: &S,
        relation: &str,
        target: &R,
    ) -> HalResult<TransportResponse>
    where
        S: HalResource,
        R: HalResource,
    {
        self.send_uri_list(Method::Patch, source, relation, target).await
    }

    /// Replace whatever `relation` is bound to with `target` (PUT
    /// `text/uri-list`).
    pub async fn substitute_relation<S, R>(
        &self,
        source: &S,
        relation: &str,
        target: &R,
    ) -> HalResult<TransportResponse>
    where
        S: HalResource,
        R: HalResource,
    {
        self.send_uri_list(Method::Put, source, relation, target).await
    }

    /// Unbind `target` from `relation`: DELETE `<relation href>/<target id>`,
    /// the id being the last path segment of the target's `self` href.
    pub async fn delete_relation<S, R>(
        &self,
        source: &S,
        relation: &str,
        target: &R,
    ) -> HalResult<TransportResponse>
    where
        S: HalResource,
        R: HalResource,
    {
        let link = require_link(source, relation)?;
        let target_href = target.self_link_href().ok_or(HalError::MissingSelfLink)?;
        let id = target_href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        let key = link.resolved_href();
        let member = format!("{}/{}", key.trim_end_matches('/'), id);
        self.cache().evict_key(&key);
        self.cache().evict_key(&member);

        let request = TransportRequest::delete(self.resolver().resolve(&member));
        self.send(request).await?.error_for_status()
    }

    /// POST `body` as JSON to `relation` and re-hydrate the response into a
    /// clone of `source`.
    pub async fn post_relation<S, B>(
        &self,
        source: &S,
        relation: &str,
        body: &B,
        options: &LinkOptions,
    ) -> HalResult<S>
    where
        S: HalResource,
        B: Serialize,
    {
        self.send_json(Method::Post, source, relation, body, options).await
    }

    /// PATCH `body` as JSON to `relation` and re-hydrate the response into a
    /// clone of `source`.
    pub async fn patch_relation<S, B>(
        &self,
        source: &S,
        relation: &str,
        body: &B,
        options: &LinkOptions,
    ) -> HalResult<S>
    where
        S: HalResource,
        B: Serialize,
    {
        self.send_json(Method::Patch, source, relation, body, options).await
    }

    async fn send_uri_list<S, R>(
        &self,
        method: Method,
        source: &S,
        relation: &str,
        target: &R,
    ) -> HalResult<TransportResponse>
    where
        S: HalResource,
        R: HalResource,
    {
        let link = require_link(source, relation)?;
        let target_href = target.self_link_href().ok_or(HalError::MissingSelfLink)?;

        let key = link.resolved_href();
        self.cache().evict_key(&key);

        let request = TransportRequest::new(method, self.resolver().resolve(&key))
            .with_body(RequestBody::UriList(target_href));
        self.send(request).await?.error_for_status()
    }

    async fn send_json<S, B>(
        &self,
        method: Method,
        source: &S,
        relation: &str,
        body: &B,
        options: &LinkOptions,
    ) -> HalResult<S>
    where
        S: HalResource,
        B: Serialize,
    {
        let link = require_link(source, relation)?;
        let (url, query) = if link.templated && options.strict_params {
            (fill_template(&link.href, &options.params)?, Vec::new())
        } else {
            (link.resolved_href(), options.query_pairs())
        };
        self.cache().evict_key(&link.resolved_href());

        let request = TransportRequest::new(method, self.resolver().resolve(&url))
            .with_body(RequestBody::Json(serde_json::to_value(body)?))
            .with_query(query);
        let payload = self.send(request).await?.into_body()?;
        hydrate_resource(source.clone(), payload)
    }
}

fn require_link<'a, S: HalResource>(source: &'a S, relation: &str) -> HalResult<&'a Link> {
    source
        .link(relation)
        .ok_or_else(|| HalError::relation_not_found(relation))
}
