use crate::core::{ExtractError, ScraperResult};
use crate::fetchers::DocumentFetcher;
use crate::http::RawContent;
use log::{error, info};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LOCALE: &str = "es-CR";

const CUSTOM_ATTRIBUTES: &str = "custom_attributes";

/// Dietary and packaging attributes of a single product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductAttributes {
    pub allergens: Vec<String>,
    pub sku: String,
    pub vegan: bool,
    pub kosher: bool,
    pub organic: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
    pub lactose_free: bool,
    pub package_quantity: Decimal,
    pub unit_size: Decimal,
    pub net_weight: Decimal,
}

impl ProductAttributes {
    pub const CSV_HEADER: [&'static str; 11] = [
        "allergens",
        "sku",
        "vegan",
        "kosher",
        "organic",
        "vegetarian",
        "gluten_free",
        "lactose_free",
        "package_quantity",
        "unit_size",
        "net_weight",
    ];

    /// Builds attributes from the decoded `custom_attributes` object, where
    /// every field is wrapped as `{"value": ...}`.
    pub fn from_custom(custom: &Value) -> Result<Self, ExtractError> {
        let allergens = field(custom, "allergens")?
            .as_array()
            .ok_or_else(|| invalid("allergens", "expected an array"))?
            .iter()
            .map(|allergen| {
                allergen
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| invalid("allergens", "allergen without a name"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sku = match field(custom, "sku")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(invalid("sku", "expected a string")),
        };

        Ok(Self {
            allergens,
            sku,
            vegan: flag(custom, "vegan")?,
            kosher: flag(custom, "kosher")?,
            organic: flag(custom, "organic")?,
            vegetarian: flag(custom, "vegetarian")?,
            gluten_free: flag(custom, "gluten_free")?,
            lactose_free: flag(custom, "lactose_free")?,
            package_quantity: decimal(custom, "package_quantity")?,
            unit_size: decimal(custom, "unit_size")?,
            net_weight: decimal(custom, "net_weight")?,
        })
    }

    pub fn to_csv_record(&self) -> Vec<String> {
        vec![
            self.allergens.join(";"),
            self.sku.clone(),
            self.vegan.to_string(),
            self.kosher.to_string(),
            self.organic.to_string(),
            self.vegetarian.to_string(),
            self.gluten_free.to_string(),
            self.lactose_free.to_string(),
            self.package_quantity.to_string(),
            self.unit_size.to_string(),
            self.net_weight.to_string(),
        ]
    }
}

fn invalid(name: &str, reason: &str) -> ExtractError {
    ExtractError::Parse(format!("attribute `{}`: {}", name, reason))
}

fn field<'a>(custom: &'a Value, name: &str) -> Result<&'a Value, ExtractError> {
    custom
        .get(name)
        .and_then(|attribute| attribute.get("value"))
        .ok_or_else(|| invalid(name, "missing"))
}

fn flag(custom: &Value, name: &str) -> Result<bool, ExtractError> {
    field(custom, name)?
        .as_bool()
        .ok_or_else(|| invalid(name, "expected a boolean"))
}

fn decimal(custom: &Value, name: &str) -> Result<Decimal, ExtractError> {
    let raw = match field(custom, name)? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(invalid(name, "expected a number")),
    };
    Decimal::from_str(&raw).map_err(|e| invalid(name, &e.to_string()))
}

/// Finds the `custom_attributes` entry of the first variant and decodes the
/// JSON string stored under `locale`.
pub fn extract_custom_attributes(product: &Value, locale: &str) -> Result<Value, ExtractError> {
    let encoded = product
        .get("allVariants")
        .and_then(|variants| variants.get(0))
        .and_then(|variant| variant.get("attributesRaw"))
        .and_then(Value::as_array)
        .and_then(|attributes| {
            attributes
                .iter()
                .find(|attribute| attribute.get("name").and_then(Value::as_str) == Some(CUSTOM_ATTRIBUTES))
        })
        .and_then(|attribute| attribute.get("value"))
        .and_then(|value| value.get(locale))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ExtractError::Parse(format!("custom attributes not found for locale {}", locale))
        })?;

    serde_json::from_str(encoded)
        .map_err(|e| ExtractError::Parse(format!("custom attributes are not valid JSON: {}", e)))
}

pub fn write_attributes_csv<W: io::Write>(writer: W, attributes: &ProductAttributes) -> ScraperResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ProductAttributes::CSV_HEADER)?;
    wtr.write_record(attributes.to_csv_record())?;
    wtr.flush()?;
    Ok(())
}

/// Fetches a product document, pulls out its custom attributes and writes
/// them as a one-row CSV.
pub struct AttributeProcessor {
    fetcher: Arc<dyn DocumentFetcher>,
    timeout: Duration,
    locale: String,
}

impl AttributeProcessor {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            timeout,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub async fn fetch_attributes(&self, url: &str) -> ScraperResult<ProductAttributes> {
        let url = Url::parse(url)?;
        info!("Fetching product attributes from {}", url);

        let document = match self.fetcher.fetch(&url, self.timeout).await? {
            RawContent::Json(value) => value,
            RawContent::Text(body) | RawContent::Html(body) => serde_json::from_str(&body)?,
        };

        let custom = extract_custom_attributes(&document, &self.locale)?;
        Ok(ProductAttributes::from_custom(&custom)?)
    }

    pub async fn process<P: AsRef<Path>>(&self, url: &str, output: P) -> ScraperResult<ProductAttributes> {
        let output = output.as_ref();
        let attributes = match self.fetch_attributes(url).await {
            Ok(attributes) => attributes,
            Err(e) => {
                error!("Failed to process product attributes: {}", e);
                return Err(e);
            }
        };

        write_attributes_csv(File::create(output)?, &attributes)?;
        info!("CSV file '{}' has been created successfully", output.display());
        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FetchError, ScraperError};
    use crate::fetchers::{MockDocument, MockFetcher};
    use serde_json::json;

    fn sample_product() -> Value {
        let custom = json!({
            "allergens": {"value": [{"name": "Milk"}]},
            "sku": {"value": "12345"},
            "vegan": {"value": false},
            "kosher": {"value": true},
            "organic": {"value": false},
            "vegetarian": {"value": true},
            "gluten_free": {"value": true},
            "lactose_free": {"value": false},
            "package_quantity": {"value": 1},
            "unit_size": {"value": "500"},
            "net_weight": {"value": "500"}
        });
        json!({
            "allVariants": [{
                "attributesRaw": [
                    {"name": "brand", "value": "Dos Pinos"},
                    {"name": "custom_attributes", "value": {"es-CR": custom.to_string()}}
                ]
            }]
        })
    }

    fn expected() -> ProductAttributes {
        ProductAttributes {
            allergens: vec!["Milk".to_string()],
            sku: "12345".to_string(),
            vegan: false,
            kosher: true,
            organic: false,
            vegetarian: true,
            gluten_free: true,
            lactose_free: false,
            package_quantity: Decimal::from(1),
            unit_size: Decimal::from(500),
            net_weight: Decimal::from(500),
        }
    }

    #[test]
    fn test_extracts_and_parses_attributes() {
        let custom = extract_custom_attributes(&sample_product(), DEFAULT_LOCALE).unwrap();
        assert_eq!(ProductAttributes::from_custom(&custom).unwrap(), expected());
    }

    #[test]
    fn test_missing_locale_or_section() {
        assert!(extract_custom_attributes(&sample_product(), "en-US").is_err());
        assert!(extract_custom_attributes(&json!({"allVariants": []}), DEFAULT_LOCALE).is_err());
        assert!(extract_custom_attributes(&json!({}), DEFAULT_LOCALE).is_err());
    }

    #[test]
    fn test_missing_or_mistyped_field() {
        let custom = json!({"sku": {"value": "1"}});
        assert!(ProductAttributes::from_custom(&custom).is_err());

        let mut custom = extract_custom_attributes(&sample_product(), DEFAULT_LOCALE).unwrap();
        custom["net_weight"]["value"] = json!("heavy");
        let err = ProductAttributes::from_custom(&custom).unwrap_err();
        assert!(err.to_string().contains("net_weight"));
    }

    #[test]
    fn test_csv_row() {
        let mut buffer = Vec::new();
        write_attributes_csv(&mut buffer, &expected()).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "allergens,sku,vegan,kosher,organic,vegetarian,gluten_free,lactose_free,package_quantity,unit_size,net_weight\n\
             Milk,12345,false,true,false,true,true,false,1,500,500\n"
        );
    }

    #[tokio::test]
    async fn test_process_writes_file() {
        let fetcher = MockFetcher::new().with_document(
            "https://api.test/product.json",
            MockDocument::ok(RawContent::Json(sample_product())),
        );
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output-product.csv");

        let processor = AttributeProcessor::new(Arc::new(fetcher), Duration::from_secs(1));
        let attributes = processor
            .process("https://api.test/product.json", &output)
            .await
            .unwrap();

        assert_eq!(attributes, expected());
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_process_surfaces_fetch_error() {
        let fetcher = MockFetcher::new().with_document(
            "https://api.test/product.json",
            MockDocument::err(FetchError::Network("HTTP 500".to_string())),
        );
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");

        let processor = AttributeProcessor::new(Arc::new(fetcher), Duration::from_secs(1));
        let err = processor
            .process("https://api.test/product.json", &output)
            .await
            .unwrap_err();

        assert!(matches!(err, ScraperError::FetchError(FetchError::Network(_))));
        assert!(!output.exists());
    }
}
