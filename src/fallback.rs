//! Deterministic substitutes for generated output.
//!
//! Both generators are pure: the same input always yields the same output
//! and no external service is involved.

use crate::model::{Faq, FaqCategory, ParsedProduct, SimilarProduct};

/// Base price used when the listed price has no usable digits.
pub const DEFAULT_BASE_PRICE: i64 = 800;

/// Extracts the digits of a price string as a number.
///
/// All digits are concatenated, so `"Rs 1,299"` reads as `1299`. Returns
/// [`DEFAULT_BASE_PRICE`] when there are no digits or the value is not
/// positive.
pub fn base_price(price: Option<&str>) -> i64 {
    let digits: String = price
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    match digits.parse::<i64>() {
        Ok(value) if value > 0 => value,
        _ => DEFAULT_BASE_PRICE,
    }
}

/// Three fixed competitors priced around the given product.
///
/// Prices are `base - 50`, `base` and `base + 150`, in that order.
///
/// # Examples
///
/// ```
/// use product_pipeline::fallback_products;
///
/// let products = fallback_products(Some("Rs 800"));
/// let prices: Vec<_> = products.iter().map(|p| p.price.as_str()).collect();
/// assert_eq!(prices, ["Rs 750", "Rs 800", "Rs 950"]);
/// ```
pub fn fallback_products(price: Option<&str>) -> Vec<SimilarProduct> {
    let base = base_price(price);

    vec![
        competitor(
            "Minimalist",
            "Hyaluronic Acid 2% + B5 Serum",
            "2% Hyaluronic Acid, Vitamin B5",
            base.saturating_sub(50),
            4.4,
            "Fragrance-free, simple formulation",
        ),
        competitor(
            "Mamaearth",
            "Hyaluronic Acid Serum",
            "Hyaluronic Acid, Vitamin B5",
            base,
            4.3,
            "Toxin-free, cruelty-free",
        ),
        competitor(
            "Lakme",
            "9 to 5 Hyaluronic Acid Serum",
            "Hyaluronic Acid, Vitamin E",
            base.saturating_add(150),
            4.2,
            "Lightweight daily-use serum",
        ),
    ]
}

fn competitor(
    brand: &str,
    product_name: &str,
    key_features: &str,
    price: i64,
    rating: f64,
    differentiators: &str,
) -> SimilarProduct {
    SimilarProduct {
        brand: brand.to_string(),
        product_name: product_name.to_string(),
        key_features: key_features.to_string(),
        price: format!("Rs {}", price),
        rating,
        rating_source: SimilarProduct::ESTIMATED.to_string(),
        differentiators: differentiators.to_string(),
    }
}

/// Fifteen generic FAQs, three per category, templated on the product.
pub fn fallback_faqs(product: &ParsedProduct) -> Vec<Faq> {
    let name = product.product_name.as_str();
    let price = product
        .price
        .as_deref()
        .unwrap_or("available on the product listing");

    vec![
        Faq::new(
            format!("What is {}?", name),
            format!(
                "{} is a skincare product designed to address specific skin concerns. It contains carefully selected ingredients to deliver effective results.",
                name
            ),
            FaqCategory::Informational,
        ),
        Faq::new(
            format!("Who should use {}?", name),
            format!(
                "{} is suitable for individuals looking to improve their skin health. Consult with a dermatologist to ensure it matches your skin type and concerns.",
                name
            ),
            FaqCategory::Informational,
        ),
        Faq::new(
            format!("What makes {} unique?", name),
            format!(
                "{} stands out due to its formulation and ingredient selection. It's designed to provide targeted benefits for your skincare routine.",
                name
            ),
            FaqCategory::Informational,
        ),
        Faq::new(
            format!("Is {} safe for sensitive skin?", name),
            "Always perform a patch test before using any new skincare product. If you have sensitive skin, consult a dermatologist before use.",
            FaqCategory::Safety,
        ),
        Faq::new(
            format!("Are there any side effects of using {}?", name),
            "Side effects vary by individual. Common reactions may include mild irritation or redness. Discontinue use if severe reactions occur and consult a healthcare professional.",
            FaqCategory::Safety,
        ),
        Faq::new(
            "What ingredients should I be cautious about?",
            "Check the ingredient list for any known allergens or irritants specific to your skin. If you have allergies, consult with a dermatologist before use.",
            FaqCategory::Safety,
        ),
        Faq::new(
            format!("How do I use {}?", name),
            "Follow the instructions on the product packaging. Typically, skincare products are applied to clean, dry skin in the recommended amounts.",
            FaqCategory::Usage,
        ),
        Faq::new(
            format!("When should I apply {}?", name),
            "Application timing depends on the product type. Serums are often applied in the morning or evening, while some products are designed for specific times of day.",
            FaqCategory::Usage,
        ),
        Faq::new(
            "How much product should I use per application?",
            "Use as directed on the packaging. Typically, a few drops or a pea-sized amount is sufficient for most skincare products to avoid waste and ensure effectiveness.",
            FaqCategory::Usage,
        ),
        Faq::new(
            format!("What is the price of {}?", name),
            format!(
                "The price is {}. Prices may vary by retailer and location.",
                price
            ),
            FaqCategory::Purchase,
        ),
        Faq::new(
            format!("Is {} worth the investment?", name),
            "Value depends on your skincare goals and budget. Consider the ingredient quality, brand reputation, and your specific needs when evaluating worth.",
            FaqCategory::Purchase,
        ),
        Faq::new(
            format!("Where can I buy {}?", name),
            format!(
                "{} is typically available through authorized retailers, online marketplaces, and official brand websites. Ensure you purchase from trusted sources.",
                name
            ),
            FaqCategory::Purchase,
        ),
        Faq::new(
            format!("How does {} compare to similar products?", name),
            format!(
                "{} has its own unique formulation and benefits. Compare ingredient lists, concentrations, and reviews to find the best match for your needs.",
                name
            ),
            FaqCategory::Comparison,
        ),
        Faq::new(
            "What are some alternatives to this product?",
            "There are various alternatives in the market with similar active ingredients. Research and compare products based on your specific skin concerns and budget.",
            FaqCategory::Comparison,
        ),
        Faq::new(
            format!("Why should I choose {} over other options?", name),
            format!(
                "Choose {} based on its specific formulation, ingredient quality, and how well it addresses your skincare needs compared to alternatives.",
                name
            ),
            FaqCategory::Comparison,
        ),
    ]
}
