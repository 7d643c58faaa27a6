use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder used when an extractor cannot determine a field.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record field `{0}` cannot be empty")]
    EmptyField(&'static str),
}

/// One product listing: name, regular price and promotional price.
///
/// Fields are never blank. Use [`Record::new`] when every field is known and
/// [`Record::coerce`] when an extractor has to fill in the gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct Record {
    name: String,
    price: String,
    promo_price: String,
}

#[derive(Deserialize)]
struct RawRecord {
    name: String,
    price: String,
    promo_price: String,
}

impl TryFrom<RawRecord> for Record {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        Record::new(raw.name, raw.price, raw.promo_price)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        promo_price: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let name = name.into();
        let price = price.into();
        let promo_price = promo_price.into();

        for (field, value) in [("name", &name), ("price", &price), ("promo_price", &promo_price)] {
            if value.trim().is_empty() {
                return Err(RecordError::EmptyField(field));
            }
        }

        Ok(Self {
            name,
            price,
            promo_price,
        })
    }

    /// Builds a record from partially known fields.
    ///
    /// A missing or blank name or price becomes [`NOT_AVAILABLE`]; a missing
    /// promotional price falls back to the regular price.
    pub fn coerce(name: Option<&str>, price: Option<&str>, promo_price: Option<&str>) -> Self {
        let name = non_blank(name).unwrap_or(NOT_AVAILABLE).to_string();
        let price = non_blank(price).unwrap_or(NOT_AVAILABLE).to_string();
        let promo_price = non_blank(promo_price)
            .map(str::to_string)
            .unwrap_or_else(|| price.clone());

        Self {
            name,
            price,
            promo_price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn promo_price(&self) -> &str {
        &self.promo_price
    }
}
