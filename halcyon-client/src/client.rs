//! The HAL client: owns the transport, cache, URL resolver and subtype
//! registries, and provides the fetch/hydrate/cache pipeline shared by the
//! navigator, paging and service operations.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use halcyon_cache::{sweep_task, CachePolicy, CacheStore, SweeperConfig, SweeperMetrics};
use halcyon_core::constants::PAGE_KEY;
use halcyon_core::{
    hydrate_collection, hydrate_single, HalConfig, HalOptions, HalResource, HalResult,
    PagedCollection, SubtypeRegistry, Transport, TransportRequest, TransportResponse,
};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::http::ReqwestTransport;
use crate::resolver::UrlResolver;

type SubtypeMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

// ============================================================================
// CLIENT
// ============================================================================

/// Cheap to clone; clones share the transport, the cache and the
/// background sweeper. The sweeper stops once the last clone is dropped.
#[derive(Clone)]
pub struct HalClient {
    transport: Arc<dyn Transport>,
    cache: Arc<CacheStore>,
    resolver: UrlResolver,
    config: Arc<HalConfig>,
    subtypes: Arc<SubtypeMap>,
    sweeper_shutdown: Option<Arc<watch::Sender<bool>>>,
}

impl HalClient {
    pub fn builder(config: HalConfig) -> HalClientBuilder {
        HalClientBuilder::new(config)
    }

    /// Client with the reqwest transport and a fresh cache.
    pub fn new(config: HalConfig) -> HalResult<Self> {
        HalClientBuilder::new(config).build()
    }

    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Subtype registry registered for `T`, if any.
    pub fn registry<T: HalResource>(&self) -> Option<&SubtypeRegistry<T>> {
        self.subtypes
            .get(&TypeId::of::<T>())
            .and_then(|registry| registry.downcast_ref::<SubtypeRegistry<T>>())
    }

    /// Whether `build` started a background sweeper for this client.
    pub fn has_background_sweeper(&self) -> bool {
        self.sweeper_shutdown.is_some()
    }

    /// Start an expired-entry sweeper for this client's cache under the
    /// caller's control, for clients built
    /// [`without_sweeper`](HalClientBuilder::without_sweeper). It runs until
    /// `shutdown_rx` flips to `true` or its sender is dropped.
    pub fn spawn_sweeper(&self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<Arc<SweeperMetrics>> {
        let config = SweeperConfig::default().with_interval(self.config.sweep_interval());
        tokio::spawn(sweep_task(Arc::clone(&self.cache), config, shutdown_rx))
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    pub(crate) async fn send(&self, request: TransportRequest) -> HalResult<TransportResponse> {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(method = %method, url = %url, query = ?request.query, "Sending request");

        let response = self.transport.execute(request).await?;
        tracing::debug!(method = %method, url = %url, status = response.status, "Received response");
        Ok(response)
    }

    /// GET `url` and return the body of a 2xx response.
    pub(crate) async fn get_json(&self, url: &str, query: Vec<(String, String)>) -> HalResult<Value> {
        let request = TransportRequest::get(url).with_query(query);
        self.send(request).await?.into_body()
    }

    /// Whether a read of `key` may be served from the cache.
    pub(crate) fn cache_readable(&self, key: &str, query: Option<&HalOptions>, policy: CachePolicy) -> bool {
        policy.reads_cache() && self.cache.has(key, query, self.config.cache_enabled)
    }

    pub(crate) fn ttl_for(&self, policy: CachePolicy) -> Duration {
        policy.effective_ttl(self.cache.default_ttl())
    }

    pub(crate) fn hydrate_one<T: HalResource + Default>(&self, payload: Value) -> HalResult<T> {
        hydrate_single(T::default(), payload, self.resolver.root_uri(), self.registry::<T>())
    }

    /// Collections without page metadata take the configured page size.
    pub(crate) fn hydrate_many<T: HalResource + Default>(
        &self,
        payload: Value,
        embedded_key: &str,
    ) -> HalResult<PagedCollection<T>> {
        let paged = payload.get(PAGE_KEY).is_some();
        let mut collection =
            hydrate_collection(T::default, payload, embedded_key, self.registry::<T>())?;
        if !paged {
            collection.page_size = self.config.page_size;
        }
        Ok(collection)
    }

    /// Cache-first read of a single resource stored under `key`.
    pub(crate) async fn fetch_resource<T: HalResource + Default>(
        &self,
        url: &str,
        query: Option<&HalOptions>,
        policy: CachePolicy,
        key: &str,
    ) -> HalResult<Arc<T>> {
        if self.cache_readable(key, query, policy) {
            if let Some(hit) = self.cache.get::<T>(key) {
                return Ok(hit);
            }
        }

        let pairs = query.map(HalOptions::to_query_pairs).unwrap_or_default();
        let payload = self.get_json(url, pairs).await?;
        let resource = Arc::new(self.hydrate_one::<T>(payload)?);
        self.cache.put(key, Arc::clone(&resource), self.ttl_for(policy));
        Ok(resource)
    }

    /// Cache-first read of a collection stored under `key`. The query
    /// options' sort spec is carried on the hydrated collection.
    pub(crate) async fn fetch_collection<T: HalResource + Default>(
        &self,
        url: &str,
        query: Option<&HalOptions>,
        policy: CachePolicy,
        embedded_key: &str,
        key: &str,
    ) -> HalResult<Arc<PagedCollection<T>>> {
        if self.cache_readable(key, query, policy) {
            if let Some(hit) = self.cache.get_array::<T>(key) {
                return Ok(hit);
            }
        }

        let pairs = query.map(HalOptions::to_query_pairs).unwrap_or_default();
        let payload = self.get_json(url, pairs).await?;
        let sort = query.map(|q| q.sort.clone()).unwrap_or_default();
        let collection = Arc::new(self.hydrate_many::<T>(payload, embedded_key)?.with_sort(sort));
        self.cache
            .put_array(key, Arc::clone(&collection), self.ttl_for(policy));
        Ok(collection)
    }
}

impl fmt::Debug for HalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HalClient")
            .field("resolver", &self.resolver)
            .field("cache", &self.cache)
            .field("subtypes", &self.subtypes.len())
            .field("background_sweeper", &self.sweeper_shutdown.is_some())
            .finish_non_exhaustive()
    }
}

/// Spawn the sweeper on the current tokio runtime, if there is one.
fn start_sweeper(cache: &Arc<CacheStore>, interval: Duration) -> Option<Arc<watch::Sender<bool>>> {
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let config = SweeperConfig::default().with_interval(interval);
    runtime.spawn(sweep_task(Arc::clone(cache), config, shutdown_rx));
    Some(Arc::new(shutdown_tx))
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct HalClientBuilder {
    config: HalConfig,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<Arc<CacheStore>>,
    subtypes: SubtypeMap,
    auto_sweep: bool,
}

impl HalClientBuilder {
    pub fn new(config: HalConfig) -> Self {
        Self {
            config,
            transport: None,
            cache: None,
            subtypes: HashMap::new(),
            auto_sweep: true,
        }
    }

    pub fn transport<T: Transport + 'static>(self, transport: T) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    /// Use a transport the caller keeps a handle to.
    pub fn shared_transport<T: Transport + 'static>(mut self, transport: Arc<T>) -> Self {
        self.transport = Some(transport as Arc<dyn Transport>);
        self
    }

    /// Share an existing cache instead of creating one.
    pub fn cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Register the subtype registry used when hydrating `T`. A second
    /// registry for the same `T` replaces the first.
    pub fn subtypes<T: HalResource>(mut self, registry: SubtypeRegistry<T>) -> Self {
        self.subtypes.insert(TypeId::of::<T>(), Arc::new(registry));
        self
    }

    /// Do not start the background sweeper in [`build`](Self::build).
    /// Expired entries then stay in the cache until evicted or swept by
    /// [`HalClient::spawn_sweeper`].
    pub fn without_sweeper(mut self) -> Self {
        self.auto_sweep = false;
        self
    }

    /// Validate the config and assemble the client. Outside a tokio runtime
    /// no background sweeper can be started and none is.
    pub fn build(self) -> HalResult<HalClient> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(CacheStore::new(self.config.cache_ttl())));
        let sweeper_shutdown = if self.auto_sweep {
            start_sweeper(&cache, self.config.sweep_interval())
        } else {
            None
        };

        tracing::debug!(
            root_uri = %self.config.root_uri,
            proxy_uri = ?self.config.proxy_uri,
            cache_enabled = self.config.cache_enabled,
            background_sweeper = sweeper_shutdown.is_some(),
            "Built HAL client"
        );

        Ok(HalClient {
            transport,
            cache,
            resolver: UrlResolver::from_config(&self.config),
            config: Arc::new(self.config),
            subtypes: Arc::new(self.subtypes),
            sweeper_shutdown,
        })
    }
}

impl fmt::Debug for HalClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HalClientBuilder")
            .field("config", &self.config)
            .field("has_transport", &self.transport.is_some())
            .field("subtypes", &self.subtypes.len())
            .field("auto_sweep", &self.auto_sweep)
            .finish_non_exhaustive()
    }
}
