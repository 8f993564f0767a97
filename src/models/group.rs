//! Toll groups.

use crate::api::TollGroupItem;

/// A toll group; the code is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TollGroup {
    pub code: String,
    pub description: String,
}

impl From<&TollGroupItem> for TollGroup {
    /// Descriptions are stored trimmed and upper-cased.
    fn from(item: &TollGroupItem) -> Self {
        Self {
            code: item.code.clone(),
            description: item.description.trim().to_uppercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_normalized() {
        let group = TollGroup::from(&TollGroupItem {
            code: "A1".to_string(),
            description: "  autostrade nord ".to_string(),
        });
        assert_eq!(group.code, "A1");
        assert_eq!(group.description, "AUTOSTRADE NORD");
    }
}
