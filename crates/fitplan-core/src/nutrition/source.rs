use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{FoodDetail, NutritionError, SearchQuery, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// Where food data comes from. The USDA client is the production
/// implementation; tests substitute their own.
#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn search_foods(&self, query: &SearchQuery) -> Result<SearchResult, NutritionError>;

    async fn food_details(&self, fdc_id: i64) -> Result<FoodDetail, NutritionError>;

    /// Fetch several foods in one request. Unknown ids are omitted.
    async fn foods(&self, fdc_ids: &[i64]) -> Result<Vec<FoodDetail>, NutritionError>;
}

#[derive(Debug, Clone)]
pub struct UsdaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

pub struct UsdaClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FoodsRequest<'a> {
    fdc_ids: &'a [i64],
}

impl UsdaClient {
    pub fn new(config: &UsdaConfig) -> Result<Self, NutritionError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(NutritionError::MissingApiKey)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NutritionError> {
        let response = request.query(&[("api_key", &self.api_key)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NutritionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl NutritionSource for UsdaClient {
    async fn search_foods(&self, query: &SearchQuery) -> Result<SearchResult, NutritionError> {
        debug!(query = %query.query, page = query.page_number, "usda search");
        self.send(self.http.post(self.url("/foods/search")).json(query))
            .await
    }

    async fn food_details(&self, fdc_id: i64) -> Result<FoodDetail, NutritionError> {
        debug!(fdc_id, "usda food details");
        match self.send(self.http.get(self.url(&format!("/food/{fdc_id}")))).await {
            Err(NutritionError::Upstream { status: 404, .. }) => Err(NutritionError::NotFound(fdc_id)),
            other => other,
        }
    }

    async fn foods(&self, fdc_ids: &[i64]) -> Result<Vec<FoodDetail>, NutritionError> {
        if fdc_ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = fdc_ids.len(), "usda batch food details");
        self.send(
            self.http
                .post(self.url("/foods"))
                .json(&FoodsRequest { fdc_ids }),
        )
        .await
    }
}
