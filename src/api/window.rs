//! Date windows and the date axis they apply to.
//!
//! Toll searches need exactly one axis; document searches take at most one.
//! The enums make that a type-level fact, and `from_filters` covers callers
//! that collect optional filters (the CLI).

use crate::error::ApiError;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

/// Maximum span of a toll search window.
pub const MAX_WINDOW_DAYS: i64 = 7;

/// Oldest window start accepted by the toll search, counted back from today.
pub const MAX_LOOKBACK_DAYS: i64 = 90;

/// A `[from, to]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Earliest start accepted on `today`.
    pub fn earliest_start(today: NaiveDate) -> NaiveDate {
        today - Duration::days(MAX_LOOKBACK_DAYS)
    }

    /// Check the remote toll search limits.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ApiError> {
        let earliest = Self::earliest_start(today);
        if self.from < earliest {
            return Err(ApiError::WindowTooOld {
                from: self.from,
                earliest,
                max_days: MAX_LOOKBACK_DAYS,
            });
        }
        if (self.to - self.from).num_days().abs() > MAX_WINDOW_DAYS {
            return Err(ApiError::WindowTooWide {
                from: self.from,
                to: self.to,
                max_days: MAX_WINDOW_DAYS,
            });
        }
        Ok(())
    }

    /// Request body fragment.
    pub fn to_json(&self) -> Value {
        json!({
            "date_from": self.from.format("%Y-%m-%d").to_string(),
            "date_to": self.to.format("%Y-%m-%d").to_string(),
        })
    }
}

/// Date dimension of a toll search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TollDateAxis {
    /// Toll exit gate date
    Exit(DateWindow),
    /// Data acquisition date
    Acquisition(DateWindow),
    /// Invoice date
    Invoice(DateWindow),
}

impl TollDateAxis {
    /// Build from optional filters; exactly one must be present.
    pub fn from_filters(
        exit: Option<DateWindow>,
        acquisition: Option<DateWindow>,
        invoice: Option<DateWindow>,
    ) -> Result<Self, ApiError> {
        match (exit, acquisition, invoice) {
            (Some(w), None, None) => Ok(Self::Exit(w)),
            (None, Some(w), None) => Ok(Self::Acquisition(w)),
            (None, None, Some(w)) => Ok(Self::Invoice(w)),
            (None, None, None) => Err(ApiError::AxisSelection(
                "a toll search needs one date filter (exit, acquisition or invoice)".to_string(),
            )),
            _ => Err(ApiError::AxisSelection(
                "only one toll date filter can be specified".to_string(),
            )),
        }
    }

    pub fn window(&self) -> &DateWindow {
        match self {
            Self::Exit(w) | Self::Acquisition(w) | Self::Invoice(w) => w,
        }
    }

    /// Body key understood by the toll search endpoints.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Exit(_) => "tolls",
            Self::Acquisition(_) => "acquisition",
            Self::Invoice(_) => "invoice",
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), ApiError> {
        self.window().validate(today)
    }
}

/// Date dimension of a document search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentDateAxis {
    /// Document date
    Document(DateWindow),
    /// Publication date
    Publication(DateWindow),
}

impl DocumentDateAxis {
    /// Build from optional filters; at most one may be present.
    pub fn from_filters(
        document: Option<DateWindow>,
        publication: Option<DateWindow>,
    ) -> Result<Option<Self>, ApiError> {
        match (document, publication) {
            (None, None) => Ok(None),
            (Some(w), None) => Ok(Some(Self::Document(w))),
            (None, Some(w)) => Ok(Some(Self::Publication(w))),
            (Some(_), Some(_)) => Err(ApiError::AxisSelection(
                "only one document date filter can be specified".to_string(),
            )),
        }
    }

    pub fn window(&self) -> &DateWindow {
        match self {
            Self::Document(w) | Self::Publication(w) => w,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Document(_) => "documentDate",
            Self::Publication(_) => "documentPublicationDate",
        }
    }
}
