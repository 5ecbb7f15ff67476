use serde::Serialize;

use super::{FoodDetail, FoodNutrient};

pub const ENERGY_KCAL: i64 = 1008;
pub const PROTEIN: i64 = 1003;
pub const CARBOHYDRATE: i64 = 1005;
pub const TOTAL_FAT: i64 = 1004;
pub const FIBER: i64 = 1079;

/// Macronutrients per 100 g as reported by the provider. Missing values
/// are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutrientProfile {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl NutrientProfile {
    /// Scale to `grams` of the food.
    pub fn for_grams(&self, grams: f64) -> Self {
        let f = grams / 100.0;
        Self {
            calories: self.calories * f,
            protein_g: self.protein_g * f,
            carbs_g: self.carbs_g * f,
            fat_g: self.fat_g * f,
            fiber_g: self.fiber_g * f,
        }
    }
}

pub fn extract_nutrients(nutrients: &[FoodNutrient]) -> NutrientProfile {
    let mut profile = NutrientProfile::default();
    for n in nutrients {
        let (Some(id), Some(value)) = (n.id(), n.quantity()) else {
            continue;
        };
        let field = match id {
            ENERGY_KCAL => &mut profile.calories,
            PROTEIN => &mut profile.protein_g,
            CARBOHYDRATE => &mut profile.carbs_g,
            TOTAL_FAT => &mut profile.fat_g,
            FIBER => &mut profile.fiber_g,
            _ => continue,
        };
        // First value wins when the provider repeats a nutrient.
        if *field == 0.0 {
            *field = value;
        }
    }
    profile
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServingInfo {
    pub size: f64,
    pub unit: String,
}

/// Pick a default serving for a food: the labelled serving size, then the
/// household description, then the first portion, then 100 g.
pub fn serving_info(food: &FoodDetail) -> ServingInfo {
    if let (Some(size), Some(unit)) = (food.serving_size, food.serving_size_unit.as_deref()) {
        return ServingInfo {
            size,
            unit: unit.to_owned(),
        };
    }
    if let Some(text) = food
        .household_serving_full_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        return ServingInfo {
            size: 1.0,
            unit: text.trim().to_owned(),
        };
    }
    if let Some(portion) = food.food_portions.first() {
        let unit = portion
            .measure_unit
            .as_ref()
            .and_then(|m| m.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "serving".to_owned());
        return ServingInfo {
            size: portion.amount.unwrap_or(1.0),
            unit,
        };
    }
    ServingInfo {
        size: 100.0,
        unit: "g".to_owned(),
    }
}
