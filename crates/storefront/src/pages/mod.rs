//! Product page generation.
//!
//! - [`paths`]: which products are generated at startup
//! - [`loader`]: fetches and shapes product data
//! - [`store`]: keeps generated pages and regenerates them in the background

pub mod loader;
pub mod paths;
pub mod store;

pub use loader::{LoadedProduct, ProductLoader, shape_product};
pub use paths::{PathResolution, StaticPaths};
pub use store::{PageState, PageStore};
