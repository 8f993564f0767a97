//! Invoice documents.

use super::parse_date;
use crate::api::DocumentItem;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// A document as persisted, written once before its content is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: String,
    pub customer_code: String,
    pub company_name: String,
    pub filename: String,
    pub document_date: NaiveDate,
    pub publication_date: NaiveDate,
    pub document_type: String,
    pub document_category: Option<String>,
    pub recording_date: NaiveDateTime,
}

impl DocumentRecord {
    pub fn from_item(item: &DocumentItem, recording_date: NaiveDateTime) -> Result<Self> {
        Ok(Self {
            id: item.document_id.clone(),
            customer_code: item.customer.clone(),
            company_name: item.company_name.clone(),
            filename: item.file_name.clone(),
            document_date: parse_date(&item.document_date)
                .with_context(|| format!("document {} documentDate", item.document_id))?,
            publication_date: parse_date(&item.document_publication_date).with_context(|| {
                format!("document {} documentPublicationDate", item.document_id)
            })?,
            document_type: item.document_type.name.clone(),
            document_category: item.document_category.as_ref().map(|c| c.name.clone()),
            recording_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::NamedValue;

    fn item() -> DocumentItem {
        DocumentItem {
            document_id: "doc-1".to_string(),
            customer: "C001".to_string(),
            company_name: "ACME SPA".to_string(),
            file_name: "fattura_1.pdf".to_string(),
            document_date: "2024-05-31".to_string(),
            document_publication_date: "2024-06-03".to_string(),
            document_type: NamedValue {
                name: "FATTURA".to_string(),
            },
            document_category: Some(NamedValue {
                name: "PEDAGGI".to_string(),
            }),
        }
    }

    #[test]
    fn test_from_item() -> Result<()> {
        let recorded = NaiveDate::from_ymd_opt(2024, 6, 4)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        let record = DocumentRecord::from_item(&item(), recorded)?;
        assert_eq!(record.id, "doc-1");
        assert_eq!(record.document_date, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(record.publication_date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(record.document_category.as_deref(), Some("PEDAGGI"));
        assert_eq!(record.recording_date, recorded);
        Ok(())
    }

    #[test]
    fn test_invalid_date() {
        let mut bad = item();
        bad.document_publication_date = "03/06/2024".to_string();
        let err = DocumentRecord::from_item(&bad, NaiveDateTime::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("documentPublicationDate"));
    }
}
