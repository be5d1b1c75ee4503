//! Login, user administration and validated catalog maintenance.

mod common;

use chrono::{Duration, Utc};
use common::setup;
use tally_core::settings::{keys, AppType};
use tally_core::{ContactInfo, StoreSettings, UserRole};
use tally_ledger::{ErrorCode, NewProduct};

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_roundtrip() {
    let fx = setup().await;
    let auth = fx.ledger.auth();

    let user = auth.create_user("manager", "hunter22", UserRole::Admin).await.unwrap();
    assert!(user.password_hash.starts_with("$argon2"));

    let acting = auth.login("manager", "hunter22").await.unwrap();
    assert_eq!(acting.id, user.id);
    assert_eq!(acting.role, UserRole::Admin);
    assert!(acting.is_admin());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let fx = setup().await;
    let auth = fx.ledger.auth();
    auth.create_user("manager", "hunter22", UserRole::Admin).await.unwrap();

    let wrong_password = auth.login("manager", "hunter23").await.unwrap_err();
    let unknown_user = auth.login("nobody", "hunter22").await.unwrap_err();

    assert_eq!(wrong_password.code, ErrorCode::Unauthorized);
    assert_eq!(unknown_user.code, ErrorCode::Unauthorized);
    assert_eq!(wrong_password.message, unknown_user.message);
}

#[tokio::test]
async fn test_user_administration() {
    let fx = setup().await;
    let auth = fx.ledger.auth();

    let user = auth.create_user("clerk", "first-pass", UserRole::Cashier).await.unwrap();

    let err = auth.create_user("clerk", "other-pass", UserRole::Cashier).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = auth.create_user("x", "long-enough", UserRole::Cashier).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = auth.create_user("shorty", "123", UserRole::Cashier).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    auth.change_password(&user.id, "second-pass").await.unwrap();
    assert!(auth.login("clerk", "first-pass").await.is_err());
    assert!(auth.login("clerk", "second-pass").await.is_ok());

    auth.change_role(&user.id, UserRole::Admin).await.unwrap();
    assert_eq!(auth.user_by_username("clerk").await.unwrap().role, UserRole::Admin);

    // Fixture cashier plus clerk
    assert_eq!(auth.list_users().await.unwrap().len(), 2);

    auth.delete_user(&user.id).await.unwrap();
    assert!(auth.user_by_username("clerk").await.unwrap_err().is_not_found());
    assert!(auth.change_role(&user.id, UserRole::Cashier).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_user_with_invoices_cannot_be_deleted() {
    let fx = setup().await;
    let kettle = fx.product("Kettle", 3_499, 10).await;
    fx.sell(&kettle, 1).await;

    let err = fx.ledger.auth().delete_user(&fx.cashier.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);
}

// =============================================================================
// Products and categories
// =============================================================================

#[tokio::test]
async fn test_product_validation() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    let blank_name = NewProduct {
        name: "   ".to_string(),
        price_cents: 100,
        ..Default::default()
    };
    let err = catalog.create_product(&blank_name).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, "name is required");

    let negative_stock = NewProduct {
        name: "Kettle".to_string(),
        stock: -1,
        ..Default::default()
    };
    assert_eq!(
        catalog.create_product(&negative_stock).await.unwrap_err().code,
        ErrorCode::ValidationError
    );

    assert_eq!(catalog.product_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_barcode_rejected() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    let input = NewProduct {
        name: "Cola 330ml".to_string(),
        price_cents: 150,
        stock: 24,
        category_id: None,
        barcode: Some("5901234123457".to_string()),
    };
    catalog.create_product(&input).await.unwrap();

    let err = catalog
        .create_product(&NewProduct {
            name: "Other Cola".to_string(),
            ..input
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(err.message.contains("5901234123457"));
}

#[tokio::test]
async fn test_search_by_barcode_and_name() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    let cola = catalog
        .create_product(&NewProduct {
            name: "Cola 330ml".to_string(),
            price_cents: 150,
            stock: 24,
            barcode: Some("5901234123457".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    fx.product("Diet Cola 330ml", 150, 24).await;
    fx.product("Orange Juice", 349, 12).await;

    let hits = catalog.search_products("5901234123457", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, cola.id);

    let hits = catalog.search_products("cola", None).await.unwrap();
    assert_eq!(hits.len(), 2);

    let hits = catalog.search_products("cola", Some(1)).await.unwrap();
    assert_eq!(hits.len(), 1);

    assert_eq!(
        catalog.product_by_barcode("5901234123457").await.unwrap().id,
        cola.id
    );
    assert!(catalog.product_by_barcode("0000").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_adjust_stock_never_negative() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();
    let kettle = fx.product("Kettle", 3_499, 2).await;

    let updated = catalog.adjust_stock(&kettle.id, 5).await.unwrap();
    assert_eq!(updated.stock, 7);

    let err = catalog.adjust_stock(&kettle.id, -8).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(fx.stock_of(&kettle.id).await, 7);

    assert!(catalog.adjust_stock("missing", 1).await.unwrap_err().is_not_found());

    let low = catalog.low_stock(7).await.unwrap();
    assert_eq!(low.len(), 1);
    assert!(catalog.low_stock(6).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sold_product_cannot_be_deleted() {
    let fx = setup().await;
    let kettle = fx.product("Kettle", 3_499, 10).await;
    fx.sell(&kettle, 1).await;

    let err = fx.ledger.catalog().delete_product(&kettle.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);
    assert_eq!(fx.stock_of(&kettle.id).await, 9);
}

#[tokio::test]
async fn test_category_lifecycle() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    let appliances = catalog.create_category("Appliances", Some("Small electricals")).await.unwrap();
    let err = catalog.create_category("Appliances", None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let kettle = catalog
        .create_product(&NewProduct {
            name: "Kettle".to_string(),
            price_cents: 3_499,
            stock: 4,
            category_id: Some(appliances.id.clone()),
            barcode: None,
        })
        .await
        .unwrap();
    assert_eq!(catalog.products_in_category(&appliances.id).await.unwrap().len(), 1);

    let renamed = catalog
        .update_category(&appliances.id, "Home Appliances", None)
        .await
        .unwrap();
    assert_eq!(catalog.category(&appliances.id).await.unwrap().name, renamed.name);

    catalog.delete_category(&appliances.id).await.unwrap();
    assert!(catalog.list_categories().await.unwrap().is_empty());
    assert!(catalog.product(&kettle.id).await.unwrap().category_id.is_none());

    let err = catalog.delete_category(&appliances.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

// =============================================================================
// Contacts, expenses, settings
// =============================================================================

#[tokio::test]
async fn test_customer_and_supplier_maintenance() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    let customer = catalog
        .create_customer(&ContactInfo {
            name: " Sara Malik ".to_string(),
            phone: Some("0300-1234567".to_string()),
            email: Some("".to_string()),
            address: None,
        })
        .await
        .unwrap();
    assert_eq!(customer.name, "Sara Malik");
    assert!(customer.email.is_none());

    let updated = catalog
        .update_customer(
            &customer.id,
            &ContactInfo {
                name: "Sara Malik".to_string(),
                address: Some("12 Mall Road".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.created_at, customer.created_at);
    assert_eq!(catalog.list_customers(Some("sara")).await.unwrap().len(), 1);

    let supplier = catalog
        .create_supplier(&ContactInfo {
            name: "Wholesale Traders".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(catalog.list_suppliers().await.unwrap().len(), 1);
    catalog.delete_supplier(&supplier.id).await.unwrap();
    assert!(catalog.supplier(&supplier.id).await.unwrap_err().is_not_found());

    let err = catalog
        .create_customer(&ContactInfo::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    catalog.delete_customer(&customer.id).await.unwrap();
    assert!(catalog.customer(&customer.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_expenses_require_positive_amount() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    let err = catalog.record_expense("Rent", 0).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = catalog.record_expense("", 500).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let expense = catalog.record_expense("Rent", 50_000).await.unwrap();
    catalog.delete_expense(&expense.id).await.unwrap();
    assert!(catalog.delete_expense(&expense.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_expense_window_and_total() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();
    let now = Utc::now();

    let rent = catalog.record_expense("Rent", 50_000).await.unwrap();
    catalog.record_expense(" Electricity ", 12_500).await.unwrap();

    let from = now - Duration::hours(1);
    let to = Utc::now() + Duration::hours(1);
    let expenses = catalog.expenses_between(from, to).await.unwrap();
    assert_eq!(expenses.len(), 2);
    assert!(expenses.iter().any(|e| e.description == "Electricity"));
    assert_eq!(catalog.expense_total(from, to).await.unwrap().cents(), 62_500);

    // Windows are half-open and can miss everything
    let earlier = now - Duration::hours(2);
    assert!(catalog.expenses_between(earlier, from).await.unwrap().is_empty());
    assert_eq!(catalog.expense_total(earlier, from).await.unwrap().cents(), 0);

    catalog.delete_expense(&rent.id).await.unwrap();
    assert_eq!(catalog.expense_total(from, to).await.unwrap().cents(), 12_500);
}

#[tokio::test]
async fn test_update_supplier() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    let supplier = catalog
        .create_supplier(&ContactInfo {
            name: "Wholesale Traders".to_string(),
            phone: Some("042-111222".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let updated = catalog
        .update_supplier(
            &supplier.id,
            &ContactInfo {
                name: "  Lahore Wholesale  ".to_string(),
                phone: Some(" ".to_string()),
                email: Some("orders@lw.pk".to_string()),
                address: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, supplier.id);
    assert_eq!(updated.name, "Lahore Wholesale");
    assert!(updated.phone.is_none());

    let stored = catalog.supplier(&supplier.id).await.unwrap();
    assert_eq!(stored.name, "Lahore Wholesale");
    assert_eq!(stored.email.as_deref(), Some("orders@lw.pk"));
    assert!(stored.phone.is_none());

    let err = catalog
        .update_supplier(&supplier.id, &ContactInfo::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = catalog
        .update_supplier(
            "missing",
            &ContactInfo {
                name: "Nobody".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_list_products_by_name_with_limit() {
    let fx = setup().await;
    fx.product("Kettle", 3_499, 10).await;
    fx.product("Blender", 10_000, 5).await;
    fx.product("Iron", 4_250, 8).await;

    let names: Vec<String> = fx
        .ledger
        .catalog()
        .list_products(2)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Blender", "Iron"]);

    assert_eq!(fx.ledger.catalog().list_products(10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_all_settings_sorted_by_key() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();
    assert!(catalog.all_settings().await.unwrap().is_empty());

    catalog.set_setting("receipt_footer", "Shukriya").await.unwrap();
    catalog.set_setting(keys::CURRENCY, "PKR").await.unwrap();
    catalog.set_setting(keys::CURRENCY, "USD").await.unwrap();

    let rows = catalog.all_settings().await.unwrap();
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .map(|s| (s.key.as_str(), s.value.as_str()))
        .collect();
    assert_eq!(pairs, vec![(keys::CURRENCY, "USD"), ("receipt_footer", "Shukriya")]);
}

#[tokio::test]
async fn test_store_settings() {
    let fx = setup().await;
    let catalog = fx.ledger.catalog();

    assert_eq!(catalog.store_settings().await.unwrap(), StoreSettings::default());

    catalog.set_setting(keys::APP_TYPE, "wholesale").await.unwrap();
    assert_eq!(catalog.store_settings().await.unwrap().app_type, AppType::Wholesale);

    let settings = StoreSettings {
        currency: "PKR".to_string(),
        ..StoreSettings::default()
    };
    catalog.save_store_settings(&settings).await.unwrap();
    assert_eq!(catalog.setting(keys::CURRENCY).await.unwrap().as_deref(), Some("PKR"));
    assert_eq!(catalog.store_settings().await.unwrap().app_type, AppType::Retail);

    let err = catalog
        .save_store_settings(&StoreSettings {
            currency: " ".to_string(),
            ..StoreSettings::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    catalog.delete_setting(keys::CURRENCY).await.unwrap();
    assert!(catalog.setting(keys::CURRENCY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_report_range_must_be_ordered() {
    let fx = setup().await;
    let now = chrono::Utc::now();

    let err = fx.ledger.catalog().sales_summary(now, now).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_settings_export_import() {
    let source = setup().await;
    let catalog = source.ledger.catalog();
    catalog.set_setting(keys::CURRENCY, "PKR").await.unwrap();
    catalog.set_setting("receipt_footer", "Shukriya").await.unwrap();

    let json = catalog.export_settings().await.unwrap();

    let target = setup().await;
    let imported = target.ledger.catalog().import_settings(&json).await.unwrap();
    assert_eq!(imported, 2);
    assert_eq!(
        target.ledger.catalog().store_settings().await.unwrap().currency,
        "PKR"
    );
    assert_eq!(
        target.ledger.catalog().setting("receipt_footer").await.unwrap().as_deref(),
        Some("Shukriya")
    );

    let err = target
        .ledger
        .catalog()
        .import_settings(r#"{"currency": 5}"#)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = target
        .ledger
        .catalog()
        .import_settings(r#"{" ": "x", "language": "ur"}"#)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(target.ledger.catalog().setting(keys::LANGUAGE).await.unwrap().is_none());
}
