//! # Store Settings
//!
//! Typed view over the flat `settings` key/value table.
//!
//! ## Sources (Priority Order)
//! 1. `settings` table rows (written by the admin screens)
//! 2. Defaults (this file)
//!
//! Unknown keys are kept in the table but ignored here; unparseable values
//! fall back to the default for that key.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Setting;

/// Setting keys understood by [`StoreSettings`].
pub mod keys {
    pub const CURRENCY: &str = "currency";
    pub const LANGUAGE: &str = "language";
    pub const APP_TYPE: &str = "app_type";
    pub const PRINTER_TYPE: &str = "printer_type";
    pub const STORE_NAME: &str = "store_name";
}

/// Kind of business the installation serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    #[default]
    Retail,
    Wholesale,
    Restaurant,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Retail => "retail",
            AppType::Wholesale => "wholesale",
            AppType::Restaurant => "restaurant",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retail" => Some(AppType::Retail),
            "wholesale" => Some(AppType::Wholesale),
            "restaurant" => Some(AppType::Restaurant),
            _ => None,
        }
    }
}

/// Receipt printer the installation prints to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PrinterType {
    /// 58/80mm roll printer
    #[default]
    Thermal,
    /// Full-page office printer
    A4,
}

impl PrinterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterType::Thermal => "thermal",
            PrinterType::A4 => "a4",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "thermal" => Some(PrinterType::Thermal),
            "a4" => Some(PrinterType::A4),
            _ => None,
        }
    }
}

/// Known store settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    /// ISO 4217 currency code
    pub currency: String,
    /// UI language tag
    pub language: String,
    pub app_type: AppType,
    pub printer_type: PrinterType,
    /// Shown on receipts
    pub store_name: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            currency: "USD".to_string(),
            language: "en".to_string(),
            app_type: AppType::Retail,
            printer_type: PrinterType::Thermal,
            store_name: "Tally Store".to_string(),
        }
    }
}

impl StoreSettings {
    /// Builds the typed view from raw setting rows.
    pub fn from_pairs<'a>(rows: impl IntoIterator<Item = &'a Setting>) -> Self {
        let mut settings = StoreSettings::default();

        for row in rows {
            let value = row.value.trim();
            match row.key.as_str() {
                keys::CURRENCY if !value.is_empty() => {
                    settings.currency = value.to_ascii_uppercase();
                }
                keys::LANGUAGE if !value.is_empty() => settings.language = value.to_string(),
                keys::APP_TYPE => {
                    if let Some(app_type) = AppType::parse(value) {
                        settings.app_type = app_type;
                    }
                }
                keys::PRINTER_TYPE => {
                    if let Some(printer_type) = PrinterType::parse(value) {
                        settings.printer_type = printer_type;
                    }
                }
                keys::STORE_NAME if !value.is_empty() => settings.store_name = value.to_string(),
                _ => {}
            }
        }

        settings
    }

    /// Raw rows for persisting this view.
    pub fn to_pairs(&self) -> Vec<Setting> {
        [
            (keys::CURRENCY, self.currency.clone()),
            (keys::LANGUAGE, self.language.clone()),
            (keys::APP_TYPE, self.app_type.as_str().to_string()),
            (keys::PRINTER_TYPE, self.printer_type.as_str().to_string()),
            (keys::STORE_NAME, self.store_name.clone()),
        ]
        .into_iter()
        .map(|(key, value)| Setting {
            key: key.to_string(),
            value,
        })
        .collect()
    }

    /// Display symbol for the configured currency.
    pub fn currency_symbol(&self) -> &str {
        match self.currency.as_str() {
            "USD" | "CAD" | "AUD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "JPY" => "¥",
            "PKR" => "Rs",
            other => other,
        }
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::settings::StoreSettings;
    ///
    /// let settings = StoreSettings::default();
    /// assert_eq!(settings.format_currency(18_900), "$189.00");
    /// assert_eq!(settings.format_currency(-550), "-$5.50");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let symbol = self.currency_symbol();
        let separator = if symbol.chars().all(|c| c.is_ascii_alphabetic()) { " " } else { "" };

        format!(
            "{}{}{}{}.{:02}",
            sign,
            symbol,
            separator,
            (cents / 100).abs(),
            (cents % 100).abs()
        )
    }
}
