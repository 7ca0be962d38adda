//! Idempotency Guard
//!
//! A check-then-act existence test against the destination platform. It is
//! not atomic; the orchestrator re-checks after upload to settle races.

use geobridge_core::ports::{ContentItem, DestinationPlatform};
use geobridge_core::Result;
use std::sync::Arc;

/// Category of asset an identity snippet is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Design,
    Tags,
}

impl AssetCategory {
    /// Destination item type searched for this category
    pub fn item_type(&self) -> &'static str {
        match self {
            AssetCategory::Design => "GeoJson",
            AssetCategory::Tags => "Feature Collection",
        }
    }
}

#[derive(Clone)]
pub struct IdempotencyGuard {
    destination: Arc<dyn DestinationPlatform>,
}

impl IdempotencyGuard {
    pub fn new(destination: Arc<dyn DestinationPlatform>) -> Self {
        Self { destination }
    }

    /// Whether the caller already owns an asset carrying `snippet`
    pub async fn exists(&self, snippet: &str, category: AssetCategory) -> Result<bool> {
        Ok(!self.owned_matches(snippet, category).await?.is_empty())
    }

    /// Owned items whose snippet equals `snippet` exactly, oldest first
    pub async fn owned_matches(
        &self,
        snippet: &str,
        category: AssetCategory,
    ) -> Result<Vec<ContentItem>> {
        let owner = self.destination.current_user().await?;
        let query = format!("snippet:\"{}\" AND owner:{}", snippet, owner);

        let mut items: Vec<ContentItem> = self
            .destination
            .search_content(&query, category.item_type())
            .await?
            .into_iter()
            // Search matches on tokens; keep exact snippets only
            .filter(|item| item.snippet == snippet && item.owner == owner)
            .collect();
        items.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

        tracing::debug!(snippet, matches = items.len(), "Checked for existing asset");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geobridge_clients::MemoryDestination;

    #[tokio::test]
    async fn test_exists_matches_exact_snippet_and_type() {
        let destination = Arc::new(MemoryDestination::new("planner"));
        destination.seed_item("Design", "GeoJson", "s9-p1");
        let guard = IdempotencyGuard::new(destination.clone());

        assert!(guard.exists("s9-p1", AssetCategory::Design).await.unwrap());
        assert!(!guard.exists("s9-p1", AssetCategory::Tags).await.unwrap());
        assert!(!guard.exists("s9", AssetCategory::Design).await.unwrap());
        assert!(!guard.exists("s9-p10", AssetCategory::Design).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let guard = IdempotencyGuard::new(Arc::new(MemoryDestination::new("planner")));
        assert!(!guard.exists("p1-tags", AssetCategory::Tags).await.unwrap());
    }
}
