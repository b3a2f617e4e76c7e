//! Request options: query parameters, sorting, link parameters and null
//! handling for outgoing payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};
use crate::resource::HalResource;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(path, order)` element of a sort spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub path: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            order: SortOrder::Desc,
        }
    }

    /// Unencoded value of the `sort` query parameter, e.g. `name,DESC`.
    /// Encoding happens when the query string is written.
    pub fn query_value(&self) -> String {
        format!("{},{}", self.path, self.order)
    }
}

/// A single query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalParam {
    pub key: String,
    pub value: String,
}

impl HalParam {
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// A parameter whose value is a resource, sent as its self href.
    pub fn resource<R: HalResource>(key: impl Into<String>, resource: &R) -> HalResult<Self> {
        let href = resource.self_link_href().ok_or(HalError::MissingSelfLink)?;
        Ok(Self {
            key: key.into(),
            value: href,
        })
    }
}

/// Query options for collection reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HalOptions {
    pub params: Vec<HalParam>,
    pub size: Option<u64>,
    pub sort: Vec<Sort>,
}

impl HalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, param: HalParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Whether these options put anything on the query string. Cached
    /// collections are only trusted when this is false.
    pub fn has_query(&self) -> bool {
        !self.params.is_empty() || self.size.is_some() || !self.sort.is_empty()
    }

    /// Query pairs in wire order: params, then `size`, then each `sort`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .params
            .iter()
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect();
        if let Some(size) = self.size {
            pairs.push(("size".to_string(), size.to_string()));
        }
        for sort in &self.sort {
            let value = if sort.path.is_empty() {
                sort.order.to_string()
            } else {
                format!("{},{}", sort.path, sort.order)
            };
            pairs.push(("sort".to_string(), value));
        }
        pairs
    }
}

/// Options for `post_relation`/`patch_relation`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub params: BTreeMap<String, String>,
    /// Fill templated links from `params` instead of sending them as query
    /// parameters.
    pub strict_params: bool,
}

impl LinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_params = true;
        self
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Which `null` properties survive payload preparation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Include {
    /// Drop every null property.
    #[default]
    NoNulls,
    /// Keep every null property.
    NullValues,
    /// Keep null properties with these names only.
    NullValuesFor(Vec<String>),
}

impl Include {
    pub fn keeps_null(&self, key: &str) -> bool {
        match self {
            Self::NoNulls => false,
            Self::NullValues => true,
            Self::NullValuesFor(props) => props.iter().any(|p| p == key),
        }
    }
}
