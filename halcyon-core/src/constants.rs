//! Constants for HALCYON
//!
//! Default values shared by configuration, hydration and paging.

// ============================================================================
// HAL WIRE FORMAT
// ============================================================================

/// Property holding the link map of a HAL object.
pub const LINKS_KEY: &str = "_links";

/// Reserved relation naming a resource's canonical address.
pub const SELF_REL: &str = "self";

/// Default property holding embedded collection items.
pub const DEFAULT_EMBEDDED_KEY: &str = "_embedded";

/// Property holding HAL page metadata.
pub const PAGE_KEY: &str = "page";

/// Path segment under which a collection exposes its search queries.
pub const SEARCH_SEGMENT: &str = "search";

// ============================================================================
// PAGINATION
// ============================================================================

/// Page size assumed when the server sends no page metadata.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Page number assumed when the server sends no page metadata.
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Total pages assumed when the server sends no page metadata.
pub const DEFAULT_TOTAL_PAGES: u64 = 1;

// ============================================================================
// CACHE
// ============================================================================

/// Default time-to-live for cached relations (5 minutes)
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;

/// Default interval between expired-entry sweeps (60 seconds)
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;

// ============================================================================
// TRANSPORT
// ============================================================================

/// Default request timeout (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Content type for binding resources by URI.
pub const URI_LIST_CONTENT_TYPE: &str = "text/uri-list";

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "HALCYON_CONFIG";
