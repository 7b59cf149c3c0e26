//! Product paths generated ahead of the first request.

use vitrine_core::ProductId;

/// How a product path is served when no page has been generated for it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathResolution {
    /// Declared up front: generated at startup and, if missing, inline.
    Found,
    /// Not declared: render on demand, then cache.
    RenderOnDemand,
}

/// The set of pre-rendered product paths.
///
/// Unknown identifiers are never a routing failure: they resolve to
/// [`PathResolution::RenderOnDemand`] and the catalog decides whether they
/// exist.
#[derive(Debug, Clone, Default)]
pub struct StaticPaths {
    prerendered: Vec<ProductId>,
}

impl StaticPaths {
    /// Declare the pre-rendered product identifiers.
    #[must_use]
    pub fn new(prerendered: Vec<ProductId>) -> Self {
        Self { prerendered }
    }

    /// Identifiers generated at startup, in declaration order.
    #[must_use]
    pub fn paths(&self) -> &[ProductId] {
        &self.prerendered
    }

    /// Decide how to serve a product that has no generated page.
    #[must_use]
    pub fn resolve(&self, id: &ProductId) -> PathResolution {
        if self.prerendered.contains(id) {
            PathResolution::Found
        } else {
            PathResolution::RenderOnDemand
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_path_is_found() {
        let paths = StaticPaths::new(vec![ProductId::new("prod_PclE2yieTKx1Xd")]);
        assert_eq!(
            paths.resolve(&ProductId::new("prod_PclE2yieTKx1Xd")),
            PathResolution::Found
        );
    }

    #[test]
    fn test_unknown_path_renders_on_demand() {
        let paths = StaticPaths::new(vec![ProductId::new("prod_PclE2yieTKx1Xd")]);
        assert_eq!(
            paths.resolve(&ProductId::new("prod_other")),
            PathResolution::RenderOnDemand
        );
        assert_eq!(
            StaticPaths::default().resolve(&ProductId::new("anything")),
            PathResolution::RenderOnDemand
        );
    }

    #[test]
    fn test_paths_keep_declaration_order() {
        let paths = StaticPaths::new(vec![ProductId::new("b"), ProductId::new("a")]);
        assert_eq!(paths.paths(), &[ProductId::new("b"), ProductId::new("a")]);
    }
}
