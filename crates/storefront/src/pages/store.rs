//! Generated product pages with background regeneration.
//!
//! Pages are generated once and served from memory. A page older than its
//! revalidation interval is still served while one background task
//! regenerates it; if that regeneration fails the stale page stays.
//! Identifiers without a page are generated inline when pre-rendered, and in
//! the background otherwise, with callers seeing [`PageState::Loading`]
//! until the page exists.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use moka::future::Cache;
use tracing::instrument;
use vitrine_core::{ProductDisplay, ProductId};

use super::loader::ProductLoader;
use super::paths::{PathResolution, StaticPaths};
use crate::catalog::CatalogError;

/// Maximum number of generated pages kept in memory.
const MAX_PAGES: u64 = 1000;

/// What the product route should render for an identifier.
#[derive(Debug, Clone)]
pub enum PageState {
    /// Page generated; render it.
    Ready(Arc<ProductDisplay>),
    /// Generation in progress; render the loading indicator.
    Loading,
    /// The catalog has no such product.
    NotFound,
    /// Generation failed.
    Failed(Arc<str>),
}

#[derive(Clone)]
enum PageEntry {
    Ready {
        product: Arc<ProductDisplay>,
        generated_at: Instant,
        revalidate: Duration,
    },
    Missing {
        generated_at: Instant,
        revalidate: Duration,
    },
    /// First generation failed; reported once, then forgotten.
    Failed { message: Arc<str> },
}

impl PageEntry {
    fn is_stale(&self) -> bool {
        match self {
            Self::Ready {
                generated_at,
                revalidate,
                ..
            }
            | Self::Missing {
                generated_at,
                revalidate,
            } => generated_at.elapsed() >= *revalidate,
            Self::Failed { .. } => false,
        }
    }
}

impl From<PageEntry> for PageState {
    fn from(entry: PageEntry) -> Self {
        match entry {
            PageEntry::Ready { product, .. } => Self::Ready(product),
            PageEntry::Missing { .. } => Self::NotFound,
            PageEntry::Failed { message } => Self::Failed(message),
        }
    }
}

/// Store of generated product pages.
///
/// Cheap to clone; clones share the pages and the in-progress set.
#[derive(Clone)]
pub struct PageStore {
    inner: Arc<PageStoreInner>,
}

struct PageStoreInner {
    loader: ProductLoader,
    paths: StaticPaths,
    pages: Cache<ProductId, PageEntry>,
    generating: Mutex<HashSet<ProductId>>,
}

impl PageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(loader: ProductLoader, paths: StaticPaths) -> Self {
        Self {
            inner: Arc::new(PageStoreInner {
                loader,
                paths,
                pages: Cache::builder().max_capacity(MAX_PAGES).build(),
                generating: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// The declared pre-rendered paths.
    #[must_use]
    pub fn paths(&self) -> &StaticPaths {
        &self.inner.paths
    }

    /// How long generated pages stay fresh.
    #[must_use]
    pub fn revalidate(&self) -> Duration {
        self.inner.loader.revalidate()
    }

    /// Generate every pre-rendered path.
    ///
    /// # Errors
    ///
    /// Returns the first catalog error, including not-found: a declared
    /// path that cannot be generated is a deployment error.
    #[instrument(skip(self))]
    pub async fn prerender(&self) -> Result<usize, CatalogError> {
        for id in self.inner.paths.paths() {
            let loaded = self.inner.loader.load(id).await?;
            self.inner
                .pages
                .insert(
                    id.clone(),
                    PageEntry::Ready {
                        product: Arc::new(loaded.product),
                        generated_at: Instant::now(),
                        revalidate: loaded.revalidate,
                    },
                )
                .await;
            tracing::info!(product_id = %id, "Pre-rendered product page");
        }

        Ok(self.inner.paths.paths().len())
    }

    /// Look up the page for a product, starting generation when needed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn lookup(&self, id: &ProductId) -> PageState {
        let entry = self.inner.pages.get(id).await;

        if let Some(entry) = &entry
            && entry.is_stale()
        {
            tracing::debug!("Page is stale, regenerating in background");
            self.spawn_generation(id.clone());
        }

        match entry {
            Some(PageEntry::Failed { .. }) => self.take_failure(id).await,
            Some(entry) => entry.into(),
            None => self.generate_missing(id).await,
        }
    }

    /// Report a failed first generation to exactly one caller.
    async fn take_failure(&self, id: &ProductId) -> PageState {
        match self.inner.pages.remove(id).await {
            Some(PageEntry::Failed { message }) => PageState::Failed(message),
            Some(entry) => {
                self.inner.pages.insert(id.clone(), entry.clone()).await;
                entry.into()
            }
            None => self.generate_missing(id).await,
        }
    }

    async fn generate_missing(&self, id: &ProductId) -> PageState {
        match self.inner.paths.resolve(id) {
            PathResolution::Found => self.generate_inline(id).await,
            PathResolution::RenderOnDemand => {
                self.spawn_generation(id.clone());
                PageState::Loading
            }
        }
    }

    /// Generate a declared page while the caller waits.
    ///
    /// Concurrent callers for the same product share one catalog request.
    /// Failures are not stored, so the next request tries again.
    async fn generate_inline(&self, id: &ProductId) -> PageState {
        match self
            .inner
            .pages
            .try_get_with(id.clone(), self.load_entry(id))
            .await
        {
            Ok(entry) => entry.into(),
            Err(e) => PageState::Failed(e.to_string().into()),
        }
    }

    /// Load a product into a cacheable entry. Not-found is cached as
    /// [`PageEntry::Missing`]; other errors are returned.
    async fn load_entry(&self, id: &ProductId) -> Result<PageEntry, CatalogError> {
        match self.inner.loader.load(id).await {
            Ok(loaded) => {
                tracing::info!(product_id = %id, "Generated product page");
                Ok(PageEntry::Ready {
                    product: Arc::new(loaded.product),
                    generated_at: Instant::now(),
                    revalidate: loaded.revalidate,
                })
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(product_id = %id, "Product not found in catalog");
                Ok(PageEntry::Missing {
                    generated_at: Instant::now(),
                    revalidate: self.revalidate(),
                })
            }
            Err(e) => {
                tracing::error!(product_id = %id, error = %e, "Product page generation failed");
                Err(e)
            }
        }
    }

    /// Generate a page in the background unless a generation for the same
    /// product is already running.
    fn spawn_generation(&self, id: ProductId) {
        if !self.begin_generation(&id) {
            return;
        }

        let store = self.clone();
        tokio::spawn(async move {
            let had_page = store.inner.pages.contains_key(&id);

            match store.load_entry(&id).await {
                Ok(entry) => store.inner.pages.insert(id.clone(), entry).await,
                Err(_) if had_page => {
                    tracing::warn!(product_id = %id, "Keeping stale page after failed regeneration");
                }
                Err(e) => {
                    store
                        .inner
                        .pages
                        .insert(
                            id.clone(),
                            PageEntry::Failed {
                                message: e.to_string().into(),
                            },
                        )
                        .await;
                }
            }

            store.finish_generation(&id);
        });
    }

    fn begin_generation(&self, id: &ProductId) -> bool {
        self.inner
            .generating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone())
    }

    fn finish_generation(&self, id: &ProductId) {
        self.inner
            .generating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}
