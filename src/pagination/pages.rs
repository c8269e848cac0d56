//! Lazy page sessions

use super::link::next_link;
use crate::error::{Error, Result};
use crate::http::{no_headers, HeaderSupplier, Request, Resource, Transport};
use crate::types::JsonValue;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;
use url::{Position, Url};

/// A link-paginated collection
#[derive(Clone)]
pub struct Paginator {
    transport: Arc<dyn Transport>,
    uri: String,
    headers: HeaderSupplier,
    rel: String,
}

impl Paginator {
    /// Collection starting at `uri`
    pub fn new(transport: Arc<dyn Transport>, uri: impl Into<String>) -> Self {
        Self {
            transport,
            uri: uri.into(),
            headers: no_headers(),
            rel: "next".to_string(),
        }
    }

    /// Headers sent with every page request
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderSupplier) -> Self {
        self.headers = headers;
        self
    }

    /// Follow another relation than `next`
    #[must_use]
    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = rel.into();
        self
    }

    /// First page URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Open a new session from the first page
    pub fn pages(&self) -> Pages {
        Pages {
            transport: Arc::clone(&self.transport),
            headers: Arc::clone(&self.headers),
            rel: self.rel.clone(),
            cursor: Cursor::Pending(self.uri.clone()),
            fetched: 0,
        }
    }

    /// New session as a stream of pages
    pub fn stream(&self) -> BoxStream<'static, Result<Resource>> {
        self.pages().into_stream()
    }

    /// New session as a stream of the elements of every page
    pub fn items(&self) -> BoxStream<'static, Result<JsonValue>> {
        self.stream()
            .map_ok(|page| stream::iter(page.into_items().into_iter().map(Ok::<JsonValue, Error>)))
            .try_flatten()
            .boxed()
    }
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("uri", &self.uri)
            .field("rel", &self.rel)
            .finish_non_exhaustive()
    }
}

/// Session state.
///
/// `Pending -> Ready -> Pending | Exhausted`, and any fetch may end in
/// `Failed`. `Exhausted` and `Failed` are terminal.
#[derive(Debug)]
enum Cursor {
    /// Next page to fetch
    Pending(String),
    /// Fetched page waiting for `next_page`
    Ready {
        resource: Resource,
        next: Option<String>,
    },
    Exhausted,
    Failed,
}

/// Forward-only sequence of pages.
///
/// `has_next` performs the fetch of the upcoming page and buffers it;
/// `next_page` hands it out. Nothing is read ahead beyond one page.
pub struct Pages {
    transport: Arc<dyn Transport>,
    headers: HeaderSupplier,
    rel: String,
    cursor: Cursor,
    fetched: usize,
}

impl Pages {
    /// Whether another page exists, fetching it if needed.
    ///
    /// A transport error or a non-success status is returned here and ends
    /// the session; later calls answer `false`.
    pub async fn has_next(&mut self) -> Result<bool> {
        match &self.cursor {
            Cursor::Ready { .. } => Ok(true),
            Cursor::Exhausted | Cursor::Failed => Ok(false),
            Cursor::Pending(uri) => {
                let uri = uri.clone();
                // Failed until the fetch proves otherwise.
                self.cursor = Cursor::Failed;
                self.cursor = self.fetch(uri).await?;
                Ok(true)
            }
        }
    }

    /// The next page, or [`Error::NoSuchElement`] past the end
    pub async fn next_page(&mut self) -> Result<Resource> {
        if !self.has_next().await? {
            return Err(Error::NoSuchElement);
        }

        match std::mem::replace(&mut self.cursor, Cursor::Exhausted) {
            Cursor::Ready { resource, next } => {
                if let Some(next) = next {
                    self.cursor = Cursor::Pending(next);
                }
                Ok(resource)
            }
            other => {
                self.cursor = other;
                Err(Error::NoSuchElement)
            }
        }
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    /// Adapt the session to a stream; it ends after the first error
    pub fn into_stream(self) -> BoxStream<'static, Result<Resource>> {
        stream::unfold(self, |mut pages| async move {
            match pages.has_next().await {
                Ok(true) => {
                    let page = pages.next_page().await;
                    Some((page, pages))
                }
                Ok(false) => None,
                Err(e) => Some((Err(e), pages)),
            }
        })
        .boxed()
    }

    async fn fetch(&mut self, uri: String) -> Result<Cursor> {
        let request = Request::get(uri.as_str())
            .headers(Arc::clone(&self.headers))
            .no_cache();
        let resource = self.transport.execute(request).await?;

        let status = resource.status();
        if !self.transport.statuses().is_success(status) {
            debug!("Pagination of {uri} stopped by HTTP {status}");
            return Err(Error::unexpected_status(uri, status));
        }

        let next = next_link(resource.headers(), &self.rel).map(|link| resolve(&uri, &link));
        if next.as_deref() == Some(uri.as_str()) {
            return Err(Error::PaginationLoop { uri });
        }

        self.fetched += 1;
        debug!(
            "Fetched page {} from {uri}, next: {}",
            self.fetched,
            next.as_deref().unwrap_or("none")
        );

        Ok(Cursor::Ready { resource, next })
    }
}

impl std::fmt::Debug for Pages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages")
            .field("cursor", &self.cursor)
            .field("fetched", &self.fetched)
            .finish_non_exhaustive()
    }
}

/// Placeholder origin for resolving links against a relative page URI
const RELATIVE_ORIGIN: &str = "http://relative.invalid/";

/// Resolve a possibly relative link against the page it came from.
///
/// A relative page URI stays relative: the link is resolved under a
/// placeholder origin which is stripped again afterwards.
fn resolve(base: &str, link: &str) -> String {
    if let Ok(base) = Url::parse(base) {
        return base
            .join(link)
            .map_or_else(|_| link.to_string(), String::from);
    }

    let Ok(origin) = Url::parse(RELATIVE_ORIGIN) else {
        return link.to_string();
    };
    match origin.join(base).and_then(|page| page.join(link)) {
        Ok(url) if url.origin() == origin.origin() => url[Position::BeforePath..].to_string(),
        Ok(url) => url.into(),
        Err(_) => link.to_string(),
    }
}
