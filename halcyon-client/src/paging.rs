//! Paged collection transitions.
//!
//! Every transition fetches a sibling page and hydrates it into a new
//! collection with the same embedded key; the source collection is left
//! untouched. The sort spec carries forward unless the transition changes it.

use halcyon_core::url::strip_template_vars;
use halcyon_core::{HalResource, HalResult, PageLink, PagedCollection, Sort};

use crate::client::HalClient;

impl HalClient {
    pub async fn next<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
    ) -> HalResult<PagedCollection<T>> {
        self.follow(collection, PageLink::Next).await
    }

    pub async fn prev<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
    ) -> HalResult<PagedCollection<T>> {
        self.follow(collection, PageLink::Prev).await
    }

    pub async fn first<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
    ) -> HalResult<PagedCollection<T>> {
        self.follow(collection, PageLink::First).await
    }

    pub async fn last<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
    ) -> HalResult<PagedCollection<T>> {
        self.follow(collection, PageLink::Last).await
    }

    /// Page `page` at the current page size.
    pub async fn page<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
        page: u64,
    ) -> HalResult<PagedCollection<T>> {
        let base = self.self_base(collection)?;
        let url = collection.page_request_uri(&base, page)?;
        self.fetch_page(&url, collection, collection.sort.clone()).await
    }

    /// First page at a new page size.
    pub async fn size<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
        size: u64,
    ) -> HalResult<PagedCollection<T>> {
        let base = self.self_base(collection)?;
        let url = collection.size_request_uri(&base, size)?;
        self.fetch_page(&url, collection, collection.sort.clone()).await
    }

    /// Current page under a new sort spec, which the result carries.
    pub async fn sort<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
        sort: Vec<Sort>,
    ) -> HalResult<PagedCollection<T>> {
        let base = self.self_base(collection)?;
        let url = collection.sort_request_uri(&base, &sort)?;
        self.fetch_page(&url, collection, sort).await
    }

    async fn follow<T: HalResource + Default>(
        &self,
        collection: &PagedCollection<T>,
        link: PageLink,
    ) -> HalResult<PagedCollection<T>> {
        let uri = collection.link_uri(link)?;
        tracing::debug!(link = %link, uri = %uri, "Following page link");
        self.fetch_page(uri, collection, collection.sort.clone()).await
    }

    async fn fetch_page<T: HalResource + Default>(
        &self,
        url: &str,
        source: &PagedCollection<T>,
        sort: Vec<Sort>,
    ) -> HalResult<PagedCollection<T>> {
        let payload = self.get_json(&self.resolver().resolve(url), Vec::new()).await?;
        Ok(self
            .hydrate_many::<T>(payload, &source.embedded_key)?
            .with_sort(sort))
    }

    /// The collection's self URI, untemplated and absolute.
    fn self_base<T>(&self, collection: &PagedCollection<T>) -> HalResult<String> {
        let uri = collection.link_uri(PageLink::Current)?;
        Ok(self.resolver().absolute(&strip_template_vars(uri)))
    }
}
