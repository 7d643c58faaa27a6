use crate::core::ExtractError;
use crate::http::RawContent;
use crate::models::Record;
use crate::parser::{Extraction, FieldExtractor};
use log::{debug, trace};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// CSS selectors locating a product card and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlSelectors {
    pub product: String,
    pub name: String,
    pub price: String,
    pub promo_price: String,
}

impl HtmlSelectors {
    /// Selectors for VTEX storefront product summaries.
    pub fn vtex() -> Self {
        Self {
            product: ".vtex-product-summary-2-x-element".to_string(),
            name: ".vtex-product-summary-2-x-productNameContainer".to_string(),
            price: ".tiendasjumboqaio-jumbo-minicart-2-x-price".to_string(),
            promo_price: ".tiendasjumboqaio-jumbo-minicart-2-x-priceWithDiscounts".to_string(),
        }
    }
}

impl Default for HtmlSelectors {
    fn default() -> Self {
        Self::vtex()
    }
}

pub struct HtmlProductExtractor {
    product: Selector,
    name: Selector,
    price: Selector,
    promo_price: Selector,
    whitespace: Regex,
}

impl Default for HtmlProductExtractor {
    fn default() -> Self {
        Self::new(&HtmlSelectors::default()).expect("Failed to create default HtmlProductExtractor")
    }
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::InvalidSelector(css.to_string()))
}

impl HtmlProductExtractor {
    pub fn new(selectors: &HtmlSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            product: selector(&selectors.product)?,
            name: selector(&selectors.name)?,
            price: selector(&selectors.price)?,
            promo_price: selector(&selectors.promo_price)?,
            whitespace: Regex::new(r"\s+").map_err(|e| ExtractError::Parse(e.to_string()))?,
        })
    }

    fn field_text(&self, element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
        let text = element.select(selector).next()?.text().collect::<String>();
        let text = self.whitespace.replace_all(text.trim(), " ").into_owned();
        (!text.is_empty()).then_some(text)
    }

    fn extract_html(&self, body: &str) -> Result<Extraction, ExtractError> {
        let document = Html::parse_document(body);
        let mut records = Vec::new();
        let mut skipped = 0;
        let mut matched = 0;

        for element in document.select(&self.product) {
            matched += 1;
            let name = self.field_text(&element, &self.name);
            let price = self.field_text(&element, &self.price);

            if name.is_none() && price.is_none() {
                trace!("Skipping product element without name or price: {}", element.html());
                skipped += 1;
                continue;
            }

            let promo_price = self.field_text(&element, &self.promo_price);
            records.push(Record::coerce(
                name.as_deref(),
                price.as_deref(),
                promo_price.as_deref(),
            ));
        }

        if matched > 0 && records.is_empty() {
            return Err(ExtractError::Parse(format!(
                "{} product elements matched but none were usable",
                matched
            )));
        }

        debug!("Extracted {} products ({} skipped)", records.len(), skipped);
        Ok(Extraction::new(records, skipped))
    }
}

impl FieldExtractor for HtmlProductExtractor {
    fn extract(&self, content: &RawContent) -> Result<Extraction, ExtractError> {
        match content {
            RawContent::Html(body) | RawContent::Text(body) => self.extract_html(body),
            RawContent::Json(_) => Err(ExtractError::Parse(
                "expected an HTML document, got JSON".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_AVAILABLE;

    fn card(name: Option<&str>, price: Option<&str>, promo: Option<&str>) -> String {
        let mut html = String::from(r#"<div class="vtex-product-summary-2-x-element">"#);
        if let Some(name) = name {
            html.push_str(&format!(
                r#"<span class="vtex-product-summary-2-x-productNameContainer">{}</span>"#,
                name
            ));
        }
        if let Some(price) = price {
            html.push_str(&format!(
                r#"<span class="tiendasjumboqaio-jumbo-minicart-2-x-price">{}</span>"#,
                price
            ));
        }
        if let Some(promo) = promo {
            html.push_str(&format!(
                r#"<span class="tiendasjumboqaio-jumbo-minicart-2-x-priceWithDiscounts">{}</span>"#,
                promo
            ));
        }
        html.push_str("</div>");
        html
    }

    fn page(cards: &[String]) -> RawContent {
        RawContent::Html(format!("<html><body>{}</body></html>", cards.concat()))
    }

    #[test]
    fn test_extracts_records_in_document_order() {
        let extractor = HtmlProductExtractor::default();
        let content = page(&[
            card(Some("Leche  Entera\n 1L"), Some("₡1 250"), Some("₡1 100")),
            card(Some("Pan"), Some("₡900"), None),
        ]);

        let extraction = extractor.extract(&content).unwrap();
        assert_eq!(extraction.skipped, 0);
        assert_eq!(
            extraction.records,
            vec![
                Record::new("Leche Entera 1L", "₡1 250", "₡1 100").unwrap(),
                Record::new("Pan", "₡900", "₡900").unwrap(),
            ]
        );
    }

    #[test]
    fn test_missing_name_becomes_sentinel() {
        let extractor = HtmlProductExtractor::default();
        let content = page(&[card(Some("   "), Some("5"), None)]);

        let extraction = extractor.extract(&content).unwrap();
        assert_eq!(extraction.records[0].name(), NOT_AVAILABLE);
        assert_eq!(extraction.records[0].promo_price(), "5");
    }

    #[test]
    fn test_skips_cards_without_name_or_price() {
        let extractor = HtmlProductExtractor::default();
        let content = page(&[
            card(Some("Pan"), Some("5"), None),
            card(None, None, Some("3")),
        ]);

        let extraction = extractor.extract(&content).unwrap();
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.skipped, 1);
    }

    #[test]
    fn test_page_without_products_is_empty_not_error() {
        let extractor = HtmlProductExtractor::default();
        let extraction = extractor
            .extract(&RawContent::Html("<html><body><p>Sin resultados</p></body></html>".into()))
            .unwrap();
        assert!(extraction.records.is_empty());
    }

    #[test]
    fn test_all_cards_unusable_is_parse_error() {
        let extractor = HtmlProductExtractor::default();
        let content = page(&[card(None, None, None), card(None, None, None)]);
        assert!(matches!(extractor.extract(&content), Err(ExtractError::Parse(_))));
    }

    #[test]
    fn test_json_content_is_parse_error() {
        let extractor = HtmlProductExtractor::default();
        let content = RawContent::Json(serde_json::json!({"products": []}));
        assert!(matches!(extractor.extract(&content), Err(ExtractError::Parse(_))));
    }

    #[test]
    fn test_custom_selectors() {
        let selectors = HtmlSelectors {
            product: "li.item".to_string(),
            name: "h3".to_string(),
            price: ".price".to_string(),
            promo_price: ".sale".to_string(),
        };
        let extractor = HtmlProductExtractor::new(&selectors).unwrap();
        let content = RawContent::Html(
            r#"<ul><li class="item"><h3>Queso</h3><b class="price">7</b><b class="sale">6</b></li></ul>"#
                .to_string(),
        );

        let extraction = extractor.extract(&content).unwrap();
        assert_eq!(extraction.records, vec![Record::new("Queso", "7", "6").unwrap()]);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let selectors = HtmlSelectors {
            product: "div[".to_string(),
            ..HtmlSelectors::default()
        };
        assert!(matches!(
            HtmlProductExtractor::new(&selectors),
            Err(ExtractError::InvalidSelector(_))
        ));
    }
}
