//! HALCYON Core - Link Model and Hydration
//!
//! HAL+JSON data model, hydration engine and the transport seam. Everything
//! here is synchronous and network-free; `halcyon-client` drives it.

pub mod config;
pub mod constants;
pub mod error;
pub mod hydrate;
pub mod links;
pub mod options;
pub mod paged;
pub mod payload;
pub mod resource;
pub mod subtype;
pub mod transport;
pub mod url;

pub use config::{ConfigError, HalConfig};
pub use error::{HalError, HalResult, PageLink};
pub use hydrate::{hydrate_collection, hydrate_resource, hydrate_single, merge_payload};
pub use links::{is_resource_links, links_from_value, Link, Links, LinksBuilder};
pub use options::{HalOptions, HalParam, Include, LinkOptions, Sort, SortOrder};
pub use paged::PagedCollection;
pub use payload::to_payload;
pub use resource::{is_embedded_value, EmbeddedResource, HalResource, Resource};
pub use subtype::{label_from_href, SubtypeRegistry};
pub use transport::{Method, RequestBody, Transport, TransportRequest, TransportResponse};
