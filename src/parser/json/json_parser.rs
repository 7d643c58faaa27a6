use crate::core::ExtractError;
use crate::http::RawContent;
use crate::models::Record;
use crate::parser::{Extraction, FieldExtractor};
use log::{debug, trace};
use serde_json::Value;

/// Reads records from an array inside a JSON API response.
#[derive(Debug, Clone)]
pub struct JsonProductExtractor {
    items_pointer: String,
    name_key: String,
    price_key: String,
    promo_price_key: String,
}

impl Default for JsonProductExtractor {
    fn default() -> Self {
        Self::new("/products")
    }
}

impl JsonProductExtractor {
    /// `items_pointer` is an RFC 6901 pointer to the array of items; an
    /// empty pointer means the document itself is the array.
    pub fn new(items_pointer: impl Into<String>) -> Self {
        Self {
            items_pointer: items_pointer.into(),
            name_key: "name".to_string(),
            price_key: "price".to_string(),
            promo_price_key: "promo_price".to_string(),
        }
    }

    pub fn with_keys(
        mut self,
        name: impl Into<String>,
        price: impl Into<String>,
        promo_price: impl Into<String>,
    ) -> Self {
        self.name_key = name.into();
        self.price_key = price.into();
        self.promo_price_key = promo_price.into();
        self
    }

    fn field(item: &Value, key: &str) -> Option<String> {
        let value = match item.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!value.is_empty()).then_some(value)
    }

    fn extract_value(&self, document: &Value) -> Result<Extraction, ExtractError> {
        let items = document
            .pointer(&self.items_pointer)
            .ok_or_else(|| ExtractError::Parse(format!("no value at `{}`", self.items_pointer)))?
            .as_array()
            .ok_or_else(|| ExtractError::Parse(format!("`{}` is not an array", self.items_pointer)))?;

        let mut records = Vec::with_capacity(items.len());
        let mut skipped = 0;

        for (index, item) in items.iter().enumerate() {
            if !item.is_object() {
                trace!("Skipping item {}: not an object", index);
                skipped += 1;
                continue;
            }

            let name = Self::field(item, &self.name_key);
            let price = Self::field(item, &self.price_key);
            if name.is_none() && price.is_none() {
                trace!("Skipping item {}: no name or price", index);
                skipped += 1;
                continue;
            }

            let promo_price = Self::field(item, &self.promo_price_key);
            records.push(Record::coerce(
                name.as_deref(),
                price.as_deref(),
                promo_price.as_deref(),
            ));
        }

        if !items.is_empty() && records.is_empty() {
            return Err(ExtractError::Parse(format!(
                "{} items at `{}` but none were usable",
                items.len(),
                self.items_pointer
            )));
        }

        debug!("Extracted {} products ({} skipped)", records.len(), skipped);
        Ok(Extraction::new(records, skipped))
    }
}

impl FieldExtractor for JsonProductExtractor {
    fn extract(&self, content: &RawContent) -> Result<Extraction, ExtractError> {
        match content {
            RawContent::Json(value) => self.extract_value(value),
            RawContent::Text(body) => {
                let value: Value = serde_json::from_str(body)
                    .map_err(|e| ExtractError::Parse(format!("body is not JSON: {}", e)))?;
                self.extract_value(&value)
            }
            RawContent::Html(_) => Err(ExtractError::Parse(
                "expected a JSON document, got HTML".to_string(),
            )),
        }
    }
}
