//! Prompt construction for the extraction oracle.

use std::fmt::Write as _;

use super::{AiInput, AiRequest};

/// Storefront platforms with known price-markup conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Shopify,
    WooCommerce,
    Magento,
    BigCommerce,
}

impl Platform {
    /// Detects the storefront platform from well-known asset and markup markers.
    #[must_use]
    pub fn detect(html: &str) -> Option<Self> {
        if html.contains("cdn.shopify.com") || html.contains("Shopify.theme") {
            Some(Self::Shopify)
        } else if html.contains("woocommerce") || html.contains("wp-content/plugins/woocommerce") {
            Some(Self::WooCommerce)
        } else if html.contains("Magento_") || html.contains("mage/cookies") {
            Some(Self::Magento)
        } else if html.contains("bigcommerce.com") || html.contains("data-product-price-with-tax") {
            Some(Self::BigCommerce)
        } else {
            None
        }
    }

    /// Where this platform usually puts the two prices.
    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Self::Shopify => {
                "Shopify store: the sale price is usually in an element with class \
                 'price-item--sale' or 'price__sale', the original in 'price-item--regular' \
                 or 'compare-at-price'. Product JSON prices may be in cents."
            }
            Self::WooCommerce => {
                "WooCommerce store: the original price is inside <del>, the sale price \
                 inside <ins>, both within a 'price' element."
            }
            Self::Magento => {
                "Magento store: look for data-price-type=\"finalPrice\" (sale) and \
                 data-price-type=\"oldPrice\" (original)."
            }
            Self::BigCommerce => {
                "BigCommerce store: 'data-product-price-without-tax' holds the sale price, \
                 'data-product-rrp-price-without-tax' or 'price--non-sale' the original."
            }
        }
    }
}

const SCHEMA: &str = r#"{
  "name": string,
  "brand": string | null,
  "imageUrl": string,
  "originalPrice": number | null,
  "salePrice": number,
  "confidence": integer 0-100
}"#;

/// The system prompt: pricing rules, platform hints, schema, refusal rule.
#[must_use]
pub fn system_prompt(request: &AiRequest<'_>) -> String {
    let mut prompt = String::from(
        "You extract product data from e-commerce pages. Respond with a single JSON object and nothing else.\n\n\
         Pricing rules:\n\
         - If two prices are shown, the higher \"was\"/crossed-out price is originalPrice and the lower active price is salePrice.\n\
         - If only one price is shown, it is salePrice and originalPrice is null.\n\
         - Report prices as plain numbers in the page's currency, without symbols.\n\n",
    );

    if let Some(platform) = request.platform {
        let _ = writeln!(prompt, "Platform hint: {}", platform.hint());
    }
    if let Some(hints) = request.domain_hints {
        let _ = writeln!(prompt, "Site hint: {hints}");
    }

    let _ = write!(
        prompt,
        "\nRequired schema:\n{SCHEMA}\n\n\
         imageUrl must be the main product image as an absolute URL.\n\
         If you cannot find the product name, image, or sale price, respond with \
         {{\"error\": \"<reason>\"}} instead. Never guess or invent values."
    );
    prompt
}

/// The user prompt: page URL, extraction input, image hint and ground truth.
#[must_use]
pub fn user_prompt(request: &AiRequest<'_>) -> String {
    let mut prompt = format!("Page URL: {}\n", request.page_url);

    if let Some(image) = &request.image_hint {
        let _ = writeln!(prompt, "Likely product image (from og:image): {image}");
    }
    if let Some(truth) = request.ground_truth {
        let original = truth
            .original()
            .map_or_else(|| "null".to_string(), |o| o.to_string());
        let _ = writeln!(
            prompt,
            "Verified prices (use exactly these): originalPrice={original}, salePrice={}",
            truth.sale()
        );
    }

    match &request.input {
        AiInput::Structured(raw) => {
            let _ = write!(
                prompt,
                "\nPartial structured data found on the page. Complete the missing fields:\n{raw}"
            );
        }
        AiInput::Fragments(fragments) => {
            let _ = write!(prompt, "\nRelevant HTML fragments:\n{fragments}");
        }
    }
    prompt
}
