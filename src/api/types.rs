//! Wire types of the Feenox API.
//!
//! Items are kept close to the JSON the API returns; conversion into store
//! records (timestamp parsing, genre rules, derived keys) happens in `models`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Entry of the toll group listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TollGroupItem {
    #[serde(rename = "tollsGroup")]
    pub code: String,
    #[serde(rename = "tollsGroupDescription", default)]
    pub description: String,
}

/// Raw toll returned by the daily and invoice toll searches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TollItem {
    pub id: String,
    pub nation: String,
    pub toll_group_code: String,
    #[serde(rename = "type")]
    pub toll_type: String,
    /// Acquisition file (daily tolls only)
    #[serde(default)]
    pub filename: Option<String>,
    pub acquisition_date: String,
    pub customer_code: String,
    pub contract_code: String,
    pub sign_of_transaction: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub amount_no_vat: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub amount_including_vat: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub vat: Option<Decimal>,
    pub currency_code: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub exchange_rate: Option<Decimal>,
    #[serde(default)]
    pub network_code: Option<String>,
    #[serde(default)]
    pub entry_global_gate_identifier: Option<String>,
    #[serde(default)]
    pub entry_global_gate_identifier_description: Option<String>,
    #[serde(default)]
    pub entry_timestamp: Option<String>,
    pub exit_global_gate_identifier: String,
    pub exit_global_gate_identifier_description: String,
    pub exit_timestamp: String,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub km: Option<Decimal>,
    pub device_type: String,
    pub obu: String,
    #[serde(default)]
    pub pan_number: Option<String>,
    pub vehicle_plate: String,
    pub vehicle_country: String,
    #[serde(default)]
    pub vehicle_euro_class: Option<String>,
    #[serde(default)]
    pub vehicle_tariff_class: Option<String>,
    /// Invoice linkage (invoice tolls only)
    #[serde(default)]
    pub invoice_article: Option<String>,
    #[serde(default)]
    pub invoice_nr: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
}

/// `{ "name": ... }` wrapper used for document type and category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedValue {
    pub name: String,
}

/// Raw document returned by the document search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    pub document_id: String,
    pub customer: String,
    pub company_name: String,
    /// The API spells this field `fineName`.
    #[serde(rename = "fineName")]
    pub file_name: String,
    pub document_date: String,
    pub document_publication_date: String,
    pub document_type: NamedValue,
    #[serde(default)]
    pub document_category: Option<NamedValue>,
}

/// Document search response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentSearchResponse {
    #[serde(default)]
    pub documents: Vec<DocumentItem>,
}

/// Parse a decimal from its shortest textual form, accepting plain and scientific notation.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Amounts arrive as JSON numbers, sometimes as strings; go through text to stay exact.
fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let text = match &value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.clone(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a decimal, found {}",
                other
            )))
        }
    };
    parse_decimal(&text)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal: {}", text)))
}
