//! Retailer-agnostic mapping from raw records to [`Product`].
//!
//! Each retailer declares a [`RetailerSchema`]: which raw field holds which
//! product attribute, how the price is rendered and how a promotion is
//! detected. [`normalize`] applies it.

use grocer_core::{Product, RetailerId};

use crate::error::ExtractionFailure;
use crate::extract::RawRecord;

/// Where a price lives in a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Single(&'static str),
    /// Whole and fractional parts rendered separately, joined by `separator`.
    Split {
        whole: &'static str,
        fraction: &'static str,
        separator: &'static str,
    },
}

/// How the `sale` label is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleRule {
    None,
    /// Copied from a raw field when present.
    Field(&'static str),
    /// The same label on every record.
    Fixed(&'static str),
    /// One label when `field` is present, another when it is not.
    Marker {
        field: &'static str,
        present: &'static str,
        absent: &'static str,
    },
}

/// Declarative field mapping for one retailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetailerSchema {
    pub retailer: RetailerId,
    pub id: Option<&'static str>,
    pub name: &'static str,
    pub url: &'static str,
    pub image: &'static str,
    pub price: PriceField,
    /// Previous price; when absent from a record the product is not
    /// discounted and `old_price` repeats `price`.
    pub old_price: Option<PriceField>,
    pub description: Option<&'static str>,
    pub sale: SaleRule,
}

fn field<'a>(raw: &'a RawRecord, key: &str) -> Option<&'a str> {
    raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required(raw: &RawRecord, key: &str) -> Result<String, ExtractionFailure> {
    field(raw, key)
        .map(str::to_owned)
        .ok_or_else(|| ExtractionFailure::missing(key))
}

fn price(raw: &RawRecord, field: PriceField) -> Result<String, ExtractionFailure> {
    match field {
        PriceField::Single(key) => required(raw, key),
        PriceField::Split {
            whole,
            fraction,
            separator,
        } => {
            let whole = required(raw, whole)?;
            let fraction = required(raw, fraction)?;
            Ok(format!("{whole}{separator}{fraction}"))
        }
    }
}

fn sale(raw: &RawRecord, rule: SaleRule) -> Option<String> {
    match rule {
        SaleRule::None => None,
        SaleRule::Field(key) => field(raw, key).map(str::to_owned),
        SaleRule::Fixed(label) => Some(label.to_owned()),
        SaleRule::Marker {
            field: key,
            present,
            absent,
        } => Some(if raw.contains_key(key) { present } else { absent }.to_owned()),
    }
}

/// Builds a [`Product`] from a raw record.
///
/// Values are trimmed; an empty value counts as missing. `name`, `url`,
/// `image` and `price` are required.
///
/// # Errors
///
/// Returns [`ExtractionFailure`] naming the first required field that is
/// missing.
pub fn normalize(raw: &RawRecord, schema: &RetailerSchema) -> Result<Product, ExtractionFailure> {
    let name = required(raw, schema.name)?;
    let url = required(raw, schema.url)?;
    let image_url = required(raw, schema.image)?;
    let price_text = price(raw, schema.price)?;
    let old_price = schema
        .old_price
        .and_then(|field| price(raw, field).ok())
        .unwrap_or_else(|| price_text.clone());

    Ok(Product {
        id: schema
            .id
            .and_then(|key| field(raw, key))
            .map(str::to_owned),
        retailer: schema.retailer.as_str().to_owned(),
        name,
        url,
        image_url,
        price: price_text,
        old_price,
        description: schema
            .description
            .and_then(|key| field(raw, key))
            .map(str::to_owned),
        sale: sale(raw, schema.sale),
    })
}

/// Concatenates per-retailer product streams in input order.
///
/// No deduplication and no sorting: the same product listed in two
/// categories appears twice.
pub fn merge<I>(streams: I) -> Vec<Product>
where
    I: IntoIterator<Item = Vec<Product>>,
{
    streams.into_iter().flatten().collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
