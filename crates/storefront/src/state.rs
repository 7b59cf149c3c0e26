//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::pages::{PageStore, ProductLoader, StaticPaths};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the catalog and the generated product pages.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn Catalog>,
    pages: PageStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The page store is built from the configured pre-rendered paths and
    /// revalidation interval; no page is generated until
    /// [`PageStore::prerender`] or the first request.
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: Arc<dyn Catalog>) -> Self {
        let loader = ProductLoader::new(Arc::clone(&catalog), config.pages.revalidate);
        let paths = StaticPaths::new(config.pages.prerendered.clone());
        let pages = PageStore::new(loader, paths);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                pages,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.inner.catalog.as_ref()
    }

    /// Get a reference to the product page store.
    #[must_use]
    pub fn pages(&self) -> &PageStore {
        &self.inner.pages
    }
}
