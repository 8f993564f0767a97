//! Toll records and their derived global identifier.

use super::{parse_optional_timestamp, parse_timestamp};
use crate::api::TollItem;
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Separator between global identifier parts.
pub const GLOBAL_IDENTIFIER_SEPARATOR: &str = "#";

/// Fractional digits kept for decimal key parts.
const KEY_DECIMAL_PLACES: u32 = 5;

/// Width decimal key parts are zero-padded to.
const KEY_DECIMAL_WIDTH: usize = 11;

/// Origin of a toll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TollGenre {
    /// Daily acquired tolls ("P")
    Daily,
    /// Invoiced tolls ("D")
    Invoice,
}

impl TollGenre {
    pub const ALL: [TollGenre; 2] = [TollGenre::Daily, TollGenre::Invoice];

    /// Code stored in `toll.toll_genre`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Daily => "P",
            Self::Invoice => "D",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Invoice => "invoice",
        }
    }
}

impl fmt::Display for TollGenre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TollGenre {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P" | "DAILY" => Ok(Self::Daily),
            "D" | "INVOICE" => Ok(Self::Invoice),
            other => bail!("unknown toll genre '{}' (expected P or D)", other),
        }
    }
}

/// Source fields of a toll, as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TollFields {
    pub id: String,
    pub toll_country: String,
    pub toll_group: String,
    pub toll_genre: String,
    pub toll_source: Option<String>,
    pub acquisition_date: NaiveDateTime,
    pub customer_code: String,
    pub contract_code: String,
    pub sign_of_transaction: String,
    pub net_amount: Decimal,
    pub gross_amount: Decimal,
    pub vat_rate: Decimal,
    pub currency_code: String,
    pub exchange_rate: Option<Decimal>,
    pub network_code: Option<String>,
    pub entry_gate_code: Option<String>,
    pub entry_gate_description: Option<String>,
    pub entry_date: Option<NaiveDateTime>,
    pub exit_gate_code: String,
    pub exit_gate_description: String,
    pub exit_date: NaiveDateTime,
    pub distance: Option<Decimal>,
    pub device_type: String,
    pub device_serial_number: String,
    pub device_service_pan: Option<String>,
    pub vehicle_plate: String,
    pub vehicle_country: String,
    pub vehicle_euro_class: Option<String>,
    pub tariff_class: Option<String>,
    pub invoice_article: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDateTime>,
    pub recording_date: NaiveDateTime,
}

/// An immutable toll with its derived deduplication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TollRecord {
    fields: TollFields,
    global_identifier: String,
}

impl TollRecord {
    pub fn new(fields: TollFields) -> Self {
        let global_identifier = global_identifier(&fields);
        Self {
            fields,
            global_identifier,
        }
    }

    /// Map an API item, applying the population rules of the requested genre.
    pub fn from_item(
        item: &TollItem,
        genre: TollGenre,
        recording_date: NaiveDateTime,
    ) -> Result<Self> {
        let is_daily = genre == TollGenre::Daily;
        let is_invoice = genre == TollGenre::Invoice;
        let required = |value: Option<Decimal>, name: &str| {
            value.ok_or_else(|| anyhow!("toll {} has no {}", item.id, name))
        };

        let fields = TollFields {
            id: item.id.clone(),
            toll_country: item.nation.clone(),
            toll_group: item.toll_group_code.clone(),
            toll_genre: item.toll_type.clone(),
            toll_source: if is_daily { item.filename.clone() } else { None },
            acquisition_date: parse_timestamp(&item.acquisition_date)
                .with_context(|| format!("toll {} acquisition_date", item.id))?,
            customer_code: item.customer_code.clone(),
            contract_code: item.contract_code.clone(),
            sign_of_transaction: item.sign_of_transaction.clone(),
            net_amount: required(item.amount_no_vat, "amount_no_vat")?,
            gross_amount: required(item.amount_including_vat, "amount_including_vat")?,
            vat_rate: required(item.vat, "vat")?,
            currency_code: item.currency_code.clone(),
            exchange_rate: item.exchange_rate.filter(|d| !d.is_zero()),
            network_code: item.network_code.clone(),
            entry_gate_code: item.entry_global_gate_identifier.clone(),
            entry_gate_description: item.entry_global_gate_identifier_description.clone(),
            entry_date: parse_optional_timestamp(item.entry_timestamp.as_deref())
                .with_context(|| format!("toll {} entry_timestamp", item.id))?,
            exit_gate_code: item.exit_global_gate_identifier.clone(),
            exit_gate_description: item.exit_global_gate_identifier_description.clone(),
            exit_date: parse_timestamp(&item.exit_timestamp)
                .with_context(|| format!("toll {} exit_timestamp", item.id))?,
            distance: item.km.filter(|d| !d.is_zero()),
            device_type: item.device_type.clone(),
            device_serial_number: item.obu.clone(),
            device_service_pan: item.pan_number.clone(),
            vehicle_plate: item.vehicle_plate.clone(),
            vehicle_country: item.vehicle_country.clone(),
            vehicle_euro_class: item.vehicle_euro_class.clone(),
            tariff_class: item.vehicle_tariff_class.clone(),
            invoice_article: if is_invoice { item.invoice_article.clone() } else { None },
            invoice_number: if is_invoice { item.invoice_nr.clone() } else { None },
            invoice_date: if is_invoice {
                parse_optional_timestamp(item.invoice_date.as_deref())
                    .with_context(|| format!("toll {} invoice_date", item.id))?
            } else {
                None
            },
            recording_date,
        };

        Ok(Self::new(fields))
    }

    pub fn fields(&self) -> &TollFields {
        &self.fields
    }

    pub fn id(&self) -> &str {
        &self.fields.id
    }

    pub fn global_identifier(&self) -> &str {
        &self.global_identifier
    }
}

/// One component of the global identifier.
enum KeyPart<'a> {
    Text(&'a str),
    Stamp(NaiveDateTime),
    Amount(Decimal),
}

impl KeyPart<'_> {
    fn render(&self) -> String {
        match self {
            Self::Text(text) => (*text).to_string(),
            Self::Stamp(ts) => ts.format("%Y%m%d%H%M%S").to_string(),
            Self::Amount(amount) => format_key_decimal(*amount),
        }
    }
}

/// Fixed-precision decimal, point removed, zero-padded on the left.
fn format_key_decimal(amount: Decimal) -> String {
    let mut quantized =
        amount.round_dp_with_strategy(KEY_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven);
    quantized.rescale(KEY_DECIMAL_PLACES);
    let digits = quantized.to_string().replace('.', "");
    format!("{:0>width$}", digits, width = KEY_DECIMAL_WIDTH)
}

fn text_part(value: &Option<String>) -> Option<KeyPart<'_>> {
    value.as_deref().map(KeyPart::Text)
}

/// Derive the deduplication key of a toll.
///
/// Parts keep a fixed order; absent parts are skipped.
pub fn global_identifier(fields: &TollFields) -> String {
    let parts = [
        Some(KeyPart::Text(&fields.toll_group)),
        Some(KeyPart::Text(&fields.toll_genre)),
        Some(KeyPart::Stamp(fields.acquisition_date)),
        Some(KeyPart::Text(&fields.customer_code)),
        Some(KeyPart::Text(&fields.contract_code)),
        Some(KeyPart::Text(&fields.sign_of_transaction)),
        Some(KeyPart::Amount(fields.net_amount)),
        Some(KeyPart::Amount(fields.gross_amount)),
        Some(KeyPart::Amount(fields.vat_rate)),
        fields.exchange_rate.map(KeyPart::Amount),
        text_part(&fields.network_code),
        text_part(&fields.entry_gate_code),
        fields.entry_date.map(KeyPart::Stamp),
        Some(KeyPart::Text(&fields.exit_gate_code)),
        Some(KeyPart::Stamp(fields.exit_date)),
        Some(KeyPart::Text(&fields.device_serial_number)),
        text_part(&fields.device_service_pan),
        text_part(&fields.invoice_number),
        fields.invoice_date.map(KeyPart::Stamp),
    ];

    parts
        .iter()
        .flatten()
        .map(KeyPart::render)
        .collect::<Vec<_>>()
        .join(GLOBAL_IDENTIFIER_SEPARATOR)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    pub(crate) fn sample_fields() -> TollFields {
        TollFields {
            id: "T-1".to_string(),
            toll_country: "IT".to_string(),
            toll_group: "A1".to_string(),
            toll_genre: "P".to_string(),
            toll_source: Some("daily_20240510.csv".to_string()),
            acquisition_date: ts(2024, 5, 10, 6, 0, 0),
            customer_code: "C001".to_string(),
            contract_code: "K9".to_string(),
            sign_of_transaction: "+".to_string(),
            net_amount: dec("10.5"),
            gross_amount: dec("12.81"),
            vat_rate: dec("22"),
            currency_code: "EUR".to_string(),
            exchange_rate: None,
            network_code: Some("NET".to_string()),
            entry_gate_code: Some("G100".to_string()),
            entry_gate_description: Some("MILANO".to_string()),
            entry_date: Some(ts(2024, 5, 9, 8, 15, 0)),
            exit_gate_code: "G200".to_string(),
            exit_gate_description: "BOLOGNA".to_string(),
            exit_date: ts(2024, 5, 9, 10, 45, 30),
            distance: Some(dec("215.3")),
            device_type: "OBU".to_string(),
            device_serial_number: "SN123".to_string(),
            device_service_pan: None,
            vehicle_plate: "AB123CD".to_string(),
            vehicle_country: "IT".to_string(),
            vehicle_euro_class: Some("6".to_string()),
            tariff_class: Some("B".to_string()),
            invoice_article: None,
            invoice_number: None,
            invoice_date: None,
            recording_date: ts(2024, 5, 11, 3, 0, 0),
        }
    }

    #[test]
    fn test_global_identifier_layout() {
        let record = TollRecord::new(sample_fields());
        assert_eq!(
            record.global_identifier(),
            "A1#P#20240510060000#C001#K9#+#00001050000#00001281000#00002200000\
             #NET#G100#20240509081500#G200#20240509104530#SN123"
        );
    }

    #[test]
    fn test_key_decimal_format() {
        assert_eq!(format_key_decimal(dec("0")), "00000000000");
        assert_eq!(format_key_decimal(dec("1.234567")), "00000123457");
        // Banker's rounding at the fifth digit
        assert_eq!(format_key_decimal(dec("0.000005")), "00000000000");
        assert_eq!(format_key_decimal(dec("0.000015")), "00000000002");
        assert_eq!(format_key_decimal(dec("-1.5")), "0000-150000");
        assert_eq!(format_key_decimal(dec("123456.7")), "12345670000");
    }

    #[test]
    fn test_global_identifier_is_deterministic() {
        let a = TollRecord::new(sample_fields());
        let b = TollRecord::new(sample_fields());
        assert_eq!(a.global_identifier(), b.global_identifier());

        // Fields outside the key do not influence it
        let mut other = sample_fields();
        other.id = "T-2".to_string();
        other.vehicle_plate = "ZZ999ZZ".to_string();
        other.recording_date = ts(2030, 1, 1, 0, 0, 0);
        other.distance = None;
        assert_eq!(
            TollRecord::new(other).global_identifier(),
            a.global_identifier()
        );
    }

    #[test]
    fn test_each_key_field_changes_identifier() {
        let base = global_identifier(&sample_fields());
        let mutations: Vec<(&str, Box<dyn Fn(&mut TollFields)>)> = vec![
            ("toll_group", Box::new(|f: &mut TollFields| f.toll_group = "A2".into())),
            ("toll_genre", Box::new(|f: &mut TollFields| f.toll_genre = "D".into())),
            ("acquisition_date", Box::new(|f: &mut TollFields| f.acquisition_date = ts(2024, 5, 10, 6, 0, 1))),
            ("customer_code", Box::new(|f: &mut TollFields| f.customer_code = "C002".into())),
            ("contract_code", Box::new(|f: &mut TollFields| f.contract_code = "K8".into())),
            ("sign_of_transaction", Box::new(|f: &mut TollFields| f.sign_of_transaction = "-".into())),
            ("net_amount", Box::new(|f: &mut TollFields| f.net_amount = dec("10.50001"))),
            ("gross_amount", Box::new(|f: &mut TollFields| f.gross_amount = dec("12.82"))),
            ("vat_rate", Box::new(|f: &mut TollFields| f.vat_rate = dec("10"))),
            ("exchange_rate", Box::new(|f: &mut TollFields| f.exchange_rate = Some(dec("1.1")))),
            ("network_code", Box::new(|f: &mut TollFields| f.network_code = Some("NET2".into()))),
            ("entry_gate_code", Box::new(|f: &mut TollFields| f.entry_gate_code = Some("G101".into()))),
            ("entry_date", Box::new(|f: &mut TollFields| f.entry_date = Some(ts(2024, 5, 9, 8, 15, 1)))),
            ("exit_gate_code", Box::new(|f: &mut TollFields| f.exit_gate_code = "G201".into())),
            ("exit_date", Box::new(|f: &mut TollFields| f.exit_date = ts(2024, 5, 9, 10, 45, 31))),
            ("device_serial_number", Box::new(|f: &mut TollFields| f.device_serial_number = "SN124".into())),
            ("device_service_pan", Box::new(|f: &mut TollFields| f.device_service_pan = Some("PAN".into()))),
            ("invoice_number", Box::new(|f: &mut TollFields| f.invoice_number = Some("F-1".into()))),
            ("invoice_date", Box::new(|f: &mut TollFields| f.invoice_date = Some(ts(2024, 5, 31, 0, 0, 0)))),
        ];

        for (name, mutate) in mutations {
            let mut fields = sample_fields();
            mutate(&mut fields);
            assert_ne!(global_identifier(&fields), base, "{} did not change the key", name);
        }
    }

    #[test]
    fn test_absent_fields_are_skipped_in_order() {
        let mut fields = sample_fields();
        fields.network_code = None;
        fields.entry_gate_code = None;
        fields.entry_date = None;

        let key = global_identifier(&fields);
        let parts: Vec<&str> = key.split(GLOBAL_IDENTIFIER_SEPARATOR).collect();
        assert_eq!(parts.len(), 12);
        assert_eq!(parts[8], "00002200000");
        assert_eq!(parts[9], "G200");
        assert_eq!(parts[10], "20240509104530");
        assert_eq!(parts[11], "SN123");
    }

    fn sample_item() -> TollItem {
        TollItem {
            id: "T-1".to_string(),
            nation: "IT".to_string(),
            toll_group_code: "A1".to_string(),
            toll_type: "P".to_string(),
            filename: Some("daily_20240510.csv".to_string()),
            acquisition_date: "2024-05-10T06:00:00".to_string(),
            customer_code: "C001".to_string(),
            contract_code: "K9".to_string(),
            sign_of_transaction: "+".to_string(),
            amount_no_vat: Some(dec("10.5")),
            amount_including_vat: Some(dec("12.81")),
            vat: Some(dec("22")),
            currency_code: "EUR".to_string(),
            exchange_rate: Some(dec("0")),
            network_code: Some("NET".to_string()),
            entry_global_gate_identifier: Some("G100".to_string()),
            entry_global_gate_identifier_description: Some("MILANO".to_string()),
            entry_timestamp: Some("2024-05-09T08:15:00".to_string()),
            exit_global_gate_identifier: "G200".to_string(),
            exit_global_gate_identifier_description: "BOLOGNA".to_string(),
            exit_timestamp: "2024-05-09T10:45:30".to_string(),
            km: Some(dec("215.3")),
            device_type: "OBU".to_string(),
            obu: "SN123".to_string(),
            pan_number: None,
            vehicle_plate: "AB123CD".to_string(),
            vehicle_country: "IT".to_string(),
            vehicle_euro_class: Some("6".to_string()),
            vehicle_tariff_class: Some("B".to_string()),
            invoice_article: Some("ART-7".to_string()),
            invoice_nr: Some("F-2024-01".to_string()),
            invoice_date: Some("2024-05-31T00:00:00".to_string()),
        }
    }

    #[test]
    fn test_from_item_daily_rules() -> Result<()> {
        let recorded = ts(2024, 5, 11, 3, 0, 0);
        let record = TollRecord::from_item(&sample_item(), TollGenre::Daily, recorded)?;

        assert_eq!(record.fields(), &sample_fields());
        assert_eq!(record.fields().toll_source.as_deref(), Some("daily_20240510.csv"));
        assert!(record.fields().invoice_article.is_none());
        assert!(record.fields().invoice_number.is_none());
        assert!(record.fields().invoice_date.is_none());
        // Zero exchange rate counts as absent
        assert!(record.fields().exchange_rate.is_none());
        Ok(())
    }

    #[test]
    fn test_from_item_invoice_rules() -> Result<()> {
        let mut item = sample_item();
        item.toll_type = "D".to_string();
        let record = TollRecord::from_item(&item, TollGenre::Invoice, ts(2024, 6, 1, 0, 0, 0))?;

        let fields = record.fields();
        assert!(fields.toll_source.is_none());
        assert_eq!(fields.invoice_article.as_deref(), Some("ART-7"));
        assert_eq!(fields.invoice_number.as_deref(), Some("F-2024-01"));
        assert_eq!(fields.invoice_date, Some(ts(2024, 5, 31, 0, 0, 0)));
        assert!(record
            .global_identifier()
            .ends_with("#F-2024-01#20240531000000"));
        Ok(())
    }

    #[test]
    fn test_from_item_missing_amount() {
        let mut item = sample_item();
        item.vat = None;
        let err = TollRecord::from_item(&item, TollGenre::Daily, ts(2024, 5, 11, 0, 0, 0))
            .unwrap_err();
        assert!(err.to_string().contains("vat"));
    }

    #[test]
    fn test_genre_codes() -> Result<()> {
        assert_eq!("p".parse::<TollGenre>()?, TollGenre::Daily);
        assert_eq!("invoice".parse::<TollGenre>()?, TollGenre::Invoice);
        assert!("X".parse::<TollGenre>().is_err());
        assert_eq!(TollGenre::Invoice.to_string(), "D");
        Ok(())
    }
}
