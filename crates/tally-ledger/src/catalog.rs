//! # Catalog Service
//!
//! Validated maintenance of products, categories, contacts, expenses and
//! settings, plus report pass-throughs.
//!
//! Repositories in `tally-db` store whatever they are given. Everything
//! arriving from the UI goes through here first:
//!
//! ```text
//! UI form ──► Catalog::create_product(NewProduct)
//!                 │  validate_name / validate_price_cents / validate_stock
//!                 │  validate_barcode, blank optionals → None
//!                 ▼
//!             ProductRepository::insert ──► UNIQUE(barcode) → VALIDATION_ERROR
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{LedgerError, LedgerResult};
use tally_core::validation::{
    validate_amount_cents, validate_barcode, validate_name, validate_price_cents,
    validate_search_query, validate_stock,
};
use tally_core::{
    Category, ContactInfo, CoreError, Customer, Expense, Money, Product, Setting,
    StoreSettings, Supplier,
};
use tally_db::repository::category::generate_category_id;
use tally_db::repository::contact::generate_contact_id;
use tally_db::repository::expense::generate_expense_id;
use tally_db::repository::product::generate_product_id;
use tally_db::{Database, OutstandingInstallments, SalesSummary};

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Upper bound on search results.
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Product fields editable from the UI.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub category_id: Option<String>,
    pub barcode: Option<String>,
}

impl NewProduct {
    fn validate(&self) -> LedgerResult<()> {
        validate_name("name", &self.name).map_err(CoreError::from)?;
        validate_price_cents(self.price_cents).map_err(CoreError::from)?;
        validate_stock(self.stock).map_err(CoreError::from)?;

        if let Some(barcode) = non_blank(&self.barcode) {
            validate_barcode(&barcode).map_err(CoreError::from)?;
        }

        Ok(())
    }
}

/// Barcode scanners produce 8 to 13 digits (EAN-8, UPC-A, EAN-13).
fn is_barcode_query(query: &str) -> bool {
    (8..=13).contains(&query.len()) && query.chars().all(|c| c.is_ascii_digit())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn clean_contact(info: &ContactInfo) -> LedgerResult<ContactInfo> {
    validate_name("name", &info.name).map_err(CoreError::from)?;

    Ok(ContactInfo {
        name: info.name.trim().to_string(),
        phone: non_blank(&info.phone),
        email: non_blank(&info.email),
        address: non_blank(&info.address),
    })
}

/// Validated CRUD over catalog, contact, expense and settings tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
}

impl Catalog {
    /// Creates a new Catalog.
    pub fn new(db: Database) -> Self {
        Catalog { db }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product.
    pub async fn create_product(&self, input: &NewProduct) -> LedgerResult<Product> {
        input.validate()?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            stock: input.stock,
            category_id: non_blank(&input.category_id),
            barcode: non_blank(&input.barcode),
            created_at: now,
            updated_at: now,
        };

        let product = self.db.products().insert(&product).await?;
        info!(id = %product.id, name = %product.name, "Product created");

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn product(&self, id: &str) -> LedgerResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", id))
    }

    /// Gets a product by barcode.
    pub async fn product_by_barcode(&self, barcode: &str) -> LedgerResult<Product> {
        let barcode = barcode.trim();

        self.db
            .products()
            .get_by_barcode(barcode)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", barcode))
    }

    /// Searches by name or barcode substring.
    ///
    /// A query shaped like a scanned barcode is tried as an exact barcode
    /// lookup first.
    pub async fn search_products(&self, query: &str, limit: Option<u32>) -> LedgerResult<Vec<Product>> {
        let start = Instant::now();
        let query = validate_search_query(query).map_err(CoreError::from)?;
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT);

        if is_barcode_query(&query) {
            if let Some(product) = self.db.products().get_by_barcode(&query).await? {
                debug!(barcode = %query, "Exact barcode hit");
                return Ok(vec![product]);
            }
        }

        let products = self.db.products().search(&query, limit).await?;

        debug!(
            query = %query,
            count = products.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "search_products complete"
        );

        Ok(products)
    }

    /// Lists products by name.
    pub async fn list_products(&self, limit: u32) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().list(limit).await?)
    }

    /// Products of one category.
    pub async fn products_in_category(&self, category_id: &str) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().list_by_category(category_id).await?)
    }

    /// Products at or below `threshold` units.
    pub async fn low_stock(&self, threshold: i64) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().low_stock(threshold).await?)
    }

    /// Replaces the editable fields of a product.
    pub async fn update_product(&self, id: &str, input: &NewProduct) -> LedgerResult<Product> {
        input.validate()?;

        let existing = self.product(id).await?;
        let product = Product {
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            stock: input.stock,
            category_id: non_blank(&input.category_id),
            barcode: non_blank(&input.barcode),
            updated_at: Utc::now(),
            ..existing
        };

        self.db.products().update(&product).await?;
        info!(id = %id, "Product updated");

        Ok(product)
    }

    /// Adds `delta` units (negative to remove). Stock never goes below zero.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> LedgerResult<Product> {
        if !self.db.products().adjust_stock(id, delta).await? {
            let product = self.product(id).await?;
            warn!(id = %id, delta, stock = product.stock, "Stock adjustment rejected");
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: -delta,
            }
            .into());
        }

        info!(id = %id, delta, "Stock adjusted");
        self.product(id).await
    }

    /// Deletes a product that no invoice or return references.
    pub async fn delete_product(&self, id: &str) -> LedgerResult<()> {
        self.db.products().delete(id).await?;
        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Number of products.
    pub async fn product_count(&self) -> LedgerResult<i64> {
        Ok(self.db.products().count().await?)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Creates a category. Names are unique.
    pub async fn create_category(&self, name: &str, description: Option<&str>) -> LedgerResult<Category> {
        validate_name("category name", name).map_err(CoreError::from)?;

        let category = Category {
            id: generate_category_id(),
            name: name.trim().to_string(),
            description: non_blank(&description.map(str::to_string)),
        };

        let category = self.db.categories().insert(&category).await?;
        info!(id = %category.id, name = %category.name, "Category created");

        Ok(category)
    }

    /// Gets a category by ID.
    pub async fn category(&self, id: &str) -> LedgerResult<Category> {
        self.db
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Category", id))
    }

    /// Lists categories by name.
    pub async fn list_categories(&self) -> LedgerResult<Vec<Category>> {
        Ok(self.db.categories().list().await?)
    }

    /// Renames or redescribes a category.
    pub async fn update_category(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> LedgerResult<Category> {
        validate_name("category name", name).map_err(CoreError::from)?;

        let category = Category {
            id: id.to_string(),
            name: name.trim().to_string(),
            description: non_blank(&description.map(str::to_string)),
        };

        self.db.categories().update(&category).await?;
        Ok(category)
    }

    /// Deletes a category. Its products stay, uncategorized.
    pub async fn delete_category(&self, id: &str) -> LedgerResult<()> {
        self.db.categories().delete(id).await?;
        info!(id = %id, "Category deleted");
        Ok(())
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Creates a customer.
    pub async fn create_customer(&self, info: &ContactInfo) -> LedgerResult<Customer> {
        let info = clean_contact(info)?;

        let customer = Customer {
            id: generate_contact_id(),
            name: info.name,
            phone: info.phone,
            email: info.email,
            address: info.address,
            created_at: Utc::now(),
        };

        let customer = self.db.customers().insert(&customer).await?;
        info!(id = %customer.id, "Customer created");

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn customer(&self, id: &str) -> LedgerResult<Customer> {
        self.db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Customer", id))
    }

    /// Lists customers, optionally filtered by name or phone substring.
    pub async fn list_customers(&self, filter: Option<&str>) -> LedgerResult<Vec<Customer>> {
        Ok(self.db.customers().list(filter).await?)
    }

    /// Replaces a customer's contact details.
    pub async fn update_customer(&self, id: &str, info: &ContactInfo) -> LedgerResult<Customer> {
        let info = clean_contact(info)?;
        let existing = self.customer(id).await?;

        let customer = Customer {
            name: info.name,
            phone: info.phone,
            email: info.email,
            address: info.address,
            ..existing
        };

        self.db.customers().update(&customer).await?;
        Ok(customer)
    }

    /// Deletes a customer without invoices.
    pub async fn delete_customer(&self, id: &str) -> LedgerResult<()> {
        self.db.customers().delete(id).await?;
        info!(id = %id, "Customer deleted");
        Ok(())
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    /// Creates a supplier.
    pub async fn create_supplier(&self, info: &ContactInfo) -> LedgerResult<Supplier> {
        let info = clean_contact(info)?;

        let supplier = Supplier {
            id: generate_contact_id(),
            name: info.name,
            phone: info.phone,
            email: info.email,
            address: info.address,
            created_at: Utc::now(),
        };

        let supplier = self.db.suppliers().insert(&supplier).await?;
        info!(id = %supplier.id, "Supplier created");

        Ok(supplier)
    }

    /// Gets a supplier by ID.
    pub async fn supplier(&self, id: &str) -> LedgerResult<Supplier> {
        self.db
            .suppliers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Supplier", id))
    }

    /// Lists suppliers by name.
    pub async fn list_suppliers(&self) -> LedgerResult<Vec<Supplier>> {
        Ok(self.db.suppliers().list().await?)
    }

    /// Replaces a supplier's contact details.
    pub async fn update_supplier(&self, id: &str, info: &ContactInfo) -> LedgerResult<Supplier> {
        let info = clean_contact(info)?;
        let existing = self.supplier(id).await?;

        let supplier = Supplier {
            name: info.name,
            phone: info.phone,
            email: info.email,
            address: info.address,
            ..existing
        };

        self.db.suppliers().update(&supplier).await?;
        Ok(supplier)
    }

    /// Deletes a supplier.
    pub async fn delete_supplier(&self, id: &str) -> LedgerResult<()> {
        self.db.suppliers().delete(id).await?;
        info!(id = %id, "Supplier deleted");
        Ok(())
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Records an expense now.
    pub async fn record_expense(&self, description: &str, amount_cents: i64) -> LedgerResult<Expense> {
        validate_name("description", description).map_err(CoreError::from)?;
        validate_amount_cents("amount", amount_cents).map_err(CoreError::from)?;

        let expense = Expense {
            id: generate_expense_id(),
            description: description.trim().to_string(),
            amount_cents,
            created_at: Utc::now(),
        };

        let expense = self.db.expenses().insert(&expense).await?;
        info!(id = %expense.id, amount = amount_cents, "Expense recorded");

        Ok(expense)
    }

    /// Expenses in `[from, to)`, newest first.
    pub async fn expenses_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerResult<Vec<Expense>> {
        Ok(self.db.expenses().list_between(from, to).await?)
    }

    /// Sum of expenses in `[from, to)`.
    pub async fn expense_total(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> LedgerResult<Money> {
        let cents = self.db.expenses().total_between(from, to).await?;
        Ok(Money::from_cents(cents))
    }

    /// Deletes an expense.
    pub async fn delete_expense(&self, id: &str) -> LedgerResult<()> {
        self.db.expenses().delete(id).await?;
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Reads one setting.
    pub async fn setting(&self, key: &str) -> LedgerResult<Option<String>> {
        Ok(self.db.settings().get(key).await?)
    }

    /// Writes one setting.
    pub async fn set_setting(&self, key: &str, value: &str) -> LedgerResult<()> {
        validate_name("setting key", key).map_err(CoreError::from)?;
        self.db.settings().set(key.trim(), value).await?;
        Ok(())
    }

    /// Removes one setting.
    pub async fn delete_setting(&self, key: &str) -> LedgerResult<()> {
        self.db.settings().delete(key).await?;
        Ok(())
    }

    /// All settings by key.
    pub async fn all_settings(&self) -> LedgerResult<Vec<Setting>> {
        Ok(self.db.settings().all().await?)
    }

    /// Typed store settings, defaults filled in.
    pub async fn store_settings(&self) -> LedgerResult<StoreSettings> {
        Ok(self.db.settings().store_settings().await?)
    }

    /// Saves every store setting in one transaction.
    pub async fn save_store_settings(&self, settings: &StoreSettings) -> LedgerResult<()> {
        validate_name("currency", &settings.currency).map_err(CoreError::from)?;
        validate_name("store name", &settings.store_name).map_err(CoreError::from)?;

        self.db.settings().save_store_settings(settings).await?;
        info!(currency = %settings.currency, "Store settings saved");
        Ok(())
    }

    /// Every setting as a flat JSON object, keys sorted.
    pub async fn export_settings(&self) -> LedgerResult<String> {
        let rows = self.db.settings().all().await?;
        let map: BTreeMap<String, String> = rows.into_iter().map(|s| (s.key, s.value)).collect();

        serde_json::to_string_pretty(&map)
            .map_err(|e| LedgerError::internal(format!("Failed to encode settings: {}", e)))
    }

    /// Upserts every key of a JSON object produced by `export_settings`.
    ///
    /// Keys absent from the document are left alone. A malformed document
    /// or a blank key writes nothing.
    pub async fn import_settings(&self, json: &str) -> LedgerResult<usize> {
        let map: BTreeMap<String, String> = serde_json::from_str(json).map_err(|e| {
            warn!(error = %e, "Rejected settings document");
            LedgerError::validation(format!("settings document is not a string map: {}", e))
        })?;

        let mut rows = Vec::with_capacity(map.len());
        for (key, value) in map {
            validate_name("setting key", &key).map_err(CoreError::from)?;
            rows.push(Setting {
                key: key.trim().to_string(),
                value,
            });
        }

        let count = self.db.settings().upsert_many(&rows).await?;
        info!(count, "Settings imported");
        Ok(count)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Revenue, refunds and expenses over `[from, to)`.
    pub async fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LedgerResult<SalesSummary> {
        if from >= to {
            return Err(LedgerError::validation("report start must be before its end"));
        }

        Ok(self.db.reports().sales_summary(from, to).await?)
    }

    /// Unpaid installment count and amount.
    pub async fn outstanding_installments(&self) -> LedgerResult<OutstandingInstallments> {
        Ok(self.db.reports().outstanding_installments().await?)
    }
}
