//! HALCYON Client - HAL+JSON Relation Navigation
//!
//! Async client over a [`Transport`]: resolves link relations cache-first,
//! pages through collections and exposes per-verb operations on the API's
//! named collections.
//!
//! ```ignore
//! let client = HalClient::new(HalConfig::load()?)?;
//! let owner: Option<Arc<Owner>> = client
//!     .get_relation(&widget, "owner", &RelationOptions::default())
//!     .await?;
//! ```

pub mod client;
pub mod http;
pub mod navigator;
pub mod paging;
pub mod resolver;
pub mod service;

pub use client::{HalClient, HalClientBuilder};
pub use http::ReqwestTransport;
pub use navigator::RelationOptions;
pub use resolver::UrlResolver;

pub use halcyon_cache::{CachePolicy, CacheStats, CacheStore};
pub use halcyon_core::{
    HalConfig, HalError, HalOptions, HalParam, HalResource, HalResult, Include, Link, LinkOptions,
    Links, PageLink, PagedCollection, Resource, Sort, SortOrder, SubtypeRegistry, Transport,
};
