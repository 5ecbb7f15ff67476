//! Nutrition catalog backed by USDA FoodData Central.
//!
//! [`FoodCatalog`] pairs a [`NutritionSource`] with a [`FoodCache`] and is
//! shared by reference wherever food lookups are needed; there is no
//! process-wide cache.

mod cache;
mod nutrients;
mod source;
mod types;

use std::sync::Arc;

use tracing::debug;

pub use cache::{CacheStats, DEFAULT_CAPACITY, DEFAULT_TTL, FoodCache};
pub use nutrients::{NutrientProfile, ServingInfo, extract_nutrients, serving_info};
pub use source::{DEFAULT_BASE_URL, NutritionSource, UsdaClient, UsdaConfig};
pub use types::{
    AbridgedFood, FoodDetail, FoodNutrient, FoodPortion, MeasureUnit, NutrientRef, SearchQuery,
    SearchResult,
};

#[derive(Debug, thiserror::Error)]
pub enum NutritionError {
    #[error("no USDA API key configured")]
    MissingApiKey,

    #[error("food {0} not found")]
    NotFound(i64),

    #[error("nutrition provider returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("nutrition provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Read-through food lookup.
pub struct FoodCatalog {
    source: Arc<dyn NutritionSource>,
    cache: FoodCache,
}

impl FoodCatalog {
    pub fn new(source: Arc<dyn NutritionSource>, cache: FoodCache) -> Self {
        Self { source, cache }
    }

    /// Search is never cached: results depend on paging and ranking.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, NutritionError> {
        self.source.search_foods(query).await
    }

    pub async fn food(&self, fdc_id: i64) -> Result<FoodDetail, NutritionError> {
        if let Some(hit) = self.cache.get(fdc_id) {
            debug!(fdc_id, "food cache hit");
            return Ok(hit);
        }
        debug!(fdc_id, "food cache miss");
        let food = self.source.food_details(fdc_id).await?;
        self.cache.insert(food.clone());
        Ok(food)
    }

    /// Fetch several foods, asking the provider only for the ones not
    /// already cached. Foods the provider does not know are left out;
    /// the rest come back in the order requested.
    pub async fn foods(&self, fdc_ids: &[i64]) -> Result<Vec<FoodDetail>, NutritionError> {
        let mut found: Vec<Option<FoodDetail>> = fdc_ids.iter().map(|id| self.cache.get(*id)).collect();
        let mut misses: Vec<i64> = fdc_ids
            .iter()
            .zip(&found)
            .filter(|(_, hit)| hit.is_none())
            .map(|(id, _)| *id)
            .collect();
        misses.sort_unstable();
        misses.dedup();

        if !misses.is_empty() {
            debug!(requested = fdc_ids.len(), misses = misses.len(), "fetching uncached foods");
            for food in self.source.foods(&misses).await? {
                for (slot, id) in found.iter_mut().zip(fdc_ids) {
                    if slot.is_none() && *id == food.fdc_id {
                        *slot = Some(food.clone());
                    }
                }
                self.cache.insert(food);
            }
        }

        Ok(found.into_iter().flatten().collect())
    }

    pub fn cache(&self) -> &FoodCache {
        &self.cache
    }
}
