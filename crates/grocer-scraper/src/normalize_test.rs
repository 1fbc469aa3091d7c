use super::*;

const SCHEMA: RetailerSchema = RetailerSchema {
    retailer: RetailerId::Aldi,
    id: Some("sku"),
    name: "title",
    url: "href",
    image: "img",
    price: PriceField::Single("price"),
    old_price: Some(PriceField::Single("was")),
    description: Some("unit"),
    sale: SaleRule::Field("promo"),
};

fn raw(pairs: &[(&str, &str)]) -> RawRecord {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn milk() -> RawRecord {
    raw(&[
        ("sku", "1"),
        ("title", "  Milk "),
        ("href", "http://x"),
        ("img", "http://x.png"),
        ("price", "1.29"),
        ("unit", "1L"),
    ])
}

#[test]
fn maps_fields_and_trims_whitespace() {
    let product = normalize(&milk(), &SCHEMA).unwrap();
    assert_eq!(product.id.as_deref(), Some("1"));
    assert_eq!(product.retailer, "aldi");
    assert_eq!(product.name, "Milk");
    assert_eq!(product.url, "http://x");
    assert_eq!(product.image_url, "http://x.png");
    assert_eq!(product.description.as_deref(), Some("1L"));
    assert!(product.sale.is_none());
}

#[test]
fn old_price_equals_price_without_discount_field() {
    let product = normalize(&milk(), &SCHEMA).unwrap();
    assert_eq!(product.price, "1.29");
    assert_eq!(product.old_price, "1.29");
    assert!(!product.is_discounted());
}

#[test]
fn old_price_taken_from_previous_price_field() {
    let mut record = milk();
    record.insert("was".to_owned(), "1.59".to_owned());
    let product = normalize(&record, &SCHEMA).unwrap();
    assert_eq!(product.old_price, "1.59");
    assert!(product.is_discounted());
}

#[test]
fn blank_previous_price_counts_as_absent() {
    let mut record = milk();
    record.insert("was".to_owned(), "   ".to_owned());
    let product = normalize(&record, &SCHEMA).unwrap();
    assert_eq!(product.old_price, "1.29");
}

#[test]
fn missing_required_field_is_reported_by_name() {
    for key in ["title", "href", "img", "price"] {
        let mut record = milk();
        record.remove(key);
        let err = normalize(&record, &SCHEMA).unwrap_err();
        assert_eq!(err, ExtractionFailure::missing(key));
    }
}

#[test]
fn empty_required_field_is_missing() {
    let mut record = milk();
    record.insert("title".to_owned(), String::new());
    assert!(normalize(&record, &SCHEMA).is_err());
}

#[test]
fn optional_fields_may_be_absent() {
    let mut record = milk();
    record.remove("sku");
    record.remove("unit");
    let product = normalize(&record, &SCHEMA).unwrap();
    assert!(product.id.is_none());
    assert!(product.description.is_none());
}

#[test]
fn split_price_joins_parts_with_separator() {
    let schema = RetailerSchema {
        price: PriceField::Split {
            whole: "euros",
            fraction: "cents",
            separator: ".",
        },
        old_price: Some(PriceField::Split {
            whole: "old_euros",
            fraction: "old_cents",
            separator: ".",
        }),
        ..SCHEMA
    };
    let mut record = milk();
    record.insert("euros".to_owned(), "2".to_owned());
    record.insert("cents".to_owned(), "49".to_owned());
    let product = normalize(&record, &schema).unwrap();
    assert_eq!(product.price, "2.49");
    assert_eq!(product.old_price, "2.49");

    record.insert("old_euros".to_owned(), "2".to_owned());
    record.insert("old_cents".to_owned(), "99".to_owned());
    let product = normalize(&record, &schema).unwrap();
    assert_eq!(product.old_price, "2.99");
}

#[test]
fn split_price_requires_both_parts() {
    let schema = RetailerSchema {
        price: PriceField::Split {
            whole: "euros",
            fraction: "cents",
            separator: "",
        },
        ..SCHEMA
    };
    let mut record = milk();
    record.insert("euros".to_owned(), "2".to_owned());
    let err = normalize(&record, &schema).unwrap_err();
    assert_eq!(err.field, "cents");
}

#[test]
fn sale_rules() {
    let mut record = milk();
    record.insert("promo".to_owned(), "2e halve prijs".to_owned());
    let product = normalize(&record, &SCHEMA).unwrap();
    assert_eq!(product.sale.as_deref(), Some("2e halve prijs"));

    let fixed = RetailerSchema {
        sale: SaleRule::Fixed("0%"),
        ..SCHEMA
    };
    assert_eq!(
        normalize(&milk(), &fixed).unwrap().sale.as_deref(),
        Some("0%")
    );

    let marker = RetailerSchema {
        sale: SaleRule::Marker {
            field: "badge",
            present: "discount",
            absent: "no discount",
        },
        ..SCHEMA
    };
    assert_eq!(
        normalize(&milk(), &marker).unwrap().sale.as_deref(),
        Some("no discount")
    );
    let mut badged = milk();
    badged.insert("badge".to_owned(), String::new());
    assert_eq!(
        normalize(&badged, &marker).unwrap().sale.as_deref(),
        Some("discount")
    );
}

#[test]
fn merge_concatenates_in_input_order_without_dedup() {
    let product = normalize(&milk(), &SCHEMA).unwrap();
    let mut other = product.clone();
    other.name = "Bread".to_owned();

    let merged = merge(vec![
        vec![product.clone(), other.clone()],
        Vec::new(),
        vec![product.clone()],
    ]);
    let names: Vec<&str> = merged.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Milk", "Bread", "Milk"]);
}
