use grocer_core::{OutputFormat, Product};
use grocer_export::save;

fn product(id: &str, name: &str) -> Product {
    Product {
        id: Some(id.to_owned()),
        retailer: "vomar".to_owned(),
        name: name.to_owned(),
        url: format!("http://x/{id}"),
        image_url: format!("http://x/{id}.png"),
        price: "2.00".to_owned(),
        old_price: "2.50".to_owned(),
        description: None,
        sale: Some("discount".to_owned()),
    }
}

#[test]
fn save_csv_writes_rows_in_collection_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.csv");

    save(
        &path,
        OutputFormat::Csv,
        &[product("1", "Kaas"), product("2", "Brood")],
    )
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<&str> = text.split_terminator('\r').collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], "1,http://x/1,http://x/1.png,Kaas,,2.00,2.50,discount");
    assert_eq!(rows[2], "2,http://x/2,http://x/2.png,Brood,,2.00,2.50,discount");
}

#[test]
fn save_json_round_trips_products() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.json");
    let products = vec![product("1", "Kaas")];

    save(&path, OutputFormat::Json, &products).unwrap();

    let read: Vec<Product> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(read, products);
}

#[test]
fn save_into_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("products.csv");

    let err = save(&path, OutputFormat::Csv, &[]).unwrap_err();
    assert!(matches!(err, grocer_export::ExportError::Io { .. }));
}
