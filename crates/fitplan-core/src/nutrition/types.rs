//! FoodData Central response shapes. Only the fields fitplan reads are
//! modelled; everything else in the payload is ignored.

use serde::{Deserialize, Serialize};

/// Parameters of a `/foods/search` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_type: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            data_type: Vec::new(),
            page_size: default_page_size(),
            page_number: default_page_number(),
            sort_by: None,
            sort_order: None,
        }
    }
}

fn default_page_size() -> u32 {
    25
}

fn default_page_number() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub total_hits: u64,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub foods: Vec<AbridgedFood>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbridgedFood {
    pub fdc_id: i64,
    pub description: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDetail {
    pub fdc_id: i64,
    pub description: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub serving_size: Option<f64>,
    #[serde(default)]
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub household_serving_full_text: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
    #[serde(default)]
    pub food_portions: Vec<FoodPortion>,
}

/// A nutrient value. Search results use the flat `nutrientId`/`value`
/// form, detail responses nest the id under `nutrient` and call the
/// value `amount`; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient: Option<NutrientRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
}

impl FoodNutrient {
    pub fn id(&self) -> Option<i64> {
        self.nutrient_id.or(self.nutrient.as_ref().map(|n| n.id))
    }

    pub fn quantity(&self) -> Option<f64> {
        self.value.or(self.amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPortion {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub gram_weight: Option<f64>,
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(default)]
    pub measure_unit: Option<MeasureUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureUnit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}
