//! Sale channel models.

use serde::{Deserialize, Serialize};

use shopsync::{records::Entity, validation::ValidationError};

/// A channel a shop sells through, with its gross-profit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleChannel {
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub gp: f64,

    #[serde(default)]
    pub gp_type: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

impl Entity for SaleChannel {
    const MODULE: &'static str = "saleChannel";
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];

    fn natural_key(&self) -> &str {
        &self.code
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::BlankNaturalKey);
        }

        if !self.gp.is_finite() {
            return Err(ValidationError::InvalidField {
                field: "gp",
                reason: "must be a finite number".to_string(),
            });
        }

        Ok(())
    }
}
