use super::*;
use grocer_scraper::RetailerReport;

fn retailers() -> Vec<RetailerConfig> {
    let mut disabled = RetailerConfig::new(RetailerId::Jumbo);
    disabled.enabled = false;
    vec![
        RetailerConfig::new(RetailerId::Aldi),
        disabled,
        RetailerConfig::new(RetailerId::Vomar),
    ]
}

#[test]
fn configure_keeps_enabled_retailers_in_file_order() {
    let configured = configure(&retailers(), &CollectArgs::default()).unwrap();
    let ids: Vec<RetailerId> = configured.iter().map(|r| r.id).collect();
    assert_eq!(ids, [RetailerId::Aldi, RetailerId::Vomar]);
    assert!(configured.iter().all(|r| r.target.is_none()));
}

#[test]
fn configure_applies_target_only_to_filtered_retailers() {
    let args = CollectArgs {
        retailers: vec![RetailerId::Vomar],
        category: Some("Zuivel".to_owned()),
        pin: true,
        ..CollectArgs::default()
    };

    let configured = configure(&retailers(), &args).unwrap();

    assert!(configured[0].target.is_none());
    assert_eq!(
        configured[1].target,
        Some(TargetConfig {
            category: Some("Zuivel".to_owned()),
            subcategory: None,
            pin: true,
        })
    );
}

#[test]
fn configure_replaces_file_target_when_cli_names_one() {
    let mut aldi = RetailerConfig::new(RetailerId::Aldi);
    aldi.target = Some(TargetConfig {
        category: Some("Brood".to_owned()),
        ..TargetConfig::default()
    });
    let args = CollectArgs {
        subcategory: Some("Melk".to_owned()),
        ..CollectArgs::default()
    };

    let configured = configure(&[aldi], &args).unwrap();
    let target = configured[0].target.as_ref().unwrap();
    assert_eq!(target.category, None);
    assert_eq!(target.subcategory.as_deref(), Some("Melk"));
}

#[test]
fn pin_without_target_is_rejected() {
    let args = CollectArgs {
        pin: true,
        ..CollectArgs::default()
    };
    let err = configure(&retailers(), &args).unwrap_err();
    assert!(err.to_string().contains("--pin"), "got: {err}");
}

#[test]
fn summary_reports_each_outcome() {
    let collection = ProductCollection {
        products: Vec::new(),
        reports: vec![
            RetailerReport {
                retailer: RetailerId::Aldi,
                outcome: RetailerOutcome::Collected {
                    products: 12,
                    dropped: 1,
                    failed: Vec::new(),
                },
            },
            RetailerReport {
                retailer: RetailerId::Poiesz,
                outcome: RetailerOutcome::Collected {
                    products: 3,
                    dropped: 0,
                    failed: vec![grocer_core::Capability::OfferListing],
                },
            },
            RetailerReport {
                retailer: RetailerId::Vomar,
                outcome: RetailerOutcome::Unreachable {
                    reason: "connection refused".to_owned(),
                },
            },
        ],
    };

    let lines = summary_lines(&collection);

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "aldi       12 products, 1 dropped");
    assert!(lines[1].ends_with("failed: offer-listing"));
    assert_eq!(lines[2], "vomar      unreachable: connection refused");
    assert_eq!(lines[3], "total      0 products, 0 discounted");
}

fn product(price: &str, old_price: &str) -> grocer_core::Product {
    grocer_core::Product {
        id: None,
        retailer: "dirk".to_owned(),
        name: "Halfvolle melk".to_owned(),
        url: "https://www.dirk.nl/melk".to_owned(),
        image_url: "https://www.dirk.nl/melk.png".to_owned(),
        price: price.to_owned(),
        old_price: old_price.to_owned(),
        description: None,
        sale: None,
    }
}

#[test]
fn summary_total_counts_discounted_products() {
    let collection = ProductCollection {
        products: vec![product("0.99", "1.29"), product("1.09", "1.09")],
        reports: Vec::new(),
    };

    let lines = summary_lines(&collection);

    assert_eq!(lines, ["total      2 products, 1 discounted"]);
}
