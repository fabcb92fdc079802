use crate::error::ApiError;

use super::dto::{Macronutrients, MacronutrientsInput};

pub fn validate_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len < 1 || len > 200 {
        return Err(ApiError::Validation(
            "Product name must be between 1 and 200 characters".into(),
        ));
    }
    Ok(trimmed.to_string())
}

/// A macronutrient record is valid iff every field is a non-negative
/// integer; the first violating field names itself in the message.
pub fn validate_macronutrients(input: &MacronutrientsInput) -> Result<Macronutrients, ApiError> {
    Ok(Macronutrients {
        calories: field(input.calories, "Calories")?,
        protein: field(input.protein, "Protein")?,
        carbs: field(input.carbs, "Carbs")?,
        fat: field(input.fat, "Fat")?,
    })
}

fn field(value: f64, label: &str) -> Result<i32, ApiError> {
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > i32::MAX as f64 {
        return Err(ApiError::Validation(format!(
            "{label} must be a non-negative integer"
        )));
    }
    Ok(value as i32)
}
