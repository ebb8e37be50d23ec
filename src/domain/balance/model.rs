//! Consumer balance domain entity

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Balance record as stored: key and active flag are indexed columns,
/// the account profile is a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDocument {
    pub id: i64,
    pub is_active: bool,
    pub document: String,
}

/// Decoded account profile of one consumer
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerBalance {
    pub id: i64,
    pub account_number: String,
    pub is_active: bool,
    pub consumer_class: String,
    pub meter_number: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceBody {
    account_number: String,
    consumer_class: String,
    meter_number: String,
}

impl ConsumerBalance {
    pub fn decode(doc: &BalanceDocument) -> DomainResult<Self> {
        let body: BalanceBody = serde_json::from_str(&doc.document)
            .map_err(|e| DomainError::decode("ConsumerBalance", doc.id, e))?;

        if body.account_number.trim().is_empty() {
            return Err(DomainError::decode(
                "ConsumerBalance",
                doc.id,
                "empty accountNumber",
            ));
        }

        Ok(Self {
            id: doc.id,
            account_number: body.account_number,
            is_active: doc.is_active,
            consumer_class: body.consumer_class,
            meter_number: body.meter_number,
        })
    }

    pub fn to_document(&self) -> DomainResult<BalanceDocument> {
        let body = BalanceBody {
            account_number: self.account_number.clone(),
            consumer_class: self.consumer_class.clone(),
            meter_number: self.meter_number.clone(),
        };
        let document = serde_json::to_string(&body)
            .map_err(|e| DomainError::Validation(format!("Unserializable balance: {}", e)))?;

        Ok(BalanceDocument {
            id: self.id,
            is_active: self.is_active,
            document,
        })
    }
}

/// Result of a point update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn matched_none(&self) -> bool {
        self.matched == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(document: &str) -> BalanceDocument {
        BalanceDocument {
            id: 1001,
            is_active: true,
            document: document.into(),
        }
    }

    #[test]
    fn decodes_camel_case_profile() {
        let balance = ConsumerBalance::decode(&doc(
            r#"{"accountNumber": "ACC-1001", "consumerClass": "Residential", "meterNumber": "M-77"}"#,
        ))
        .unwrap();

        assert_eq!(balance.id, 1001);
        assert_eq!(balance.account_number, "ACC-1001");
        assert_eq!(balance.consumer_class, "Residential");
        assert_eq!(balance.meter_number, "M-77");
        assert!(balance.is_active);
    }

    #[test]
    fn missing_field_is_a_decode_error() {
        let err = ConsumerBalance::decode(&doc(r#"{"accountNumber": "ACC-1"}"#)).unwrap_err();
        assert!(matches!(err, DomainError::Decode { entity: "ConsumerBalance", .. }));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(ConsumerBalance::decode(&doc("{not json")).is_err());
    }

    #[test]
    fn blank_account_number_is_rejected() {
        let err = ConsumerBalance::decode(&doc(
            r#"{"accountNumber": " ", "consumerClass": "C", "meterNumber": "M"}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("empty accountNumber"));
    }

    #[test]
    fn to_document_decodes_back() {
        let balance = ConsumerBalance {
            id: 5,
            account_number: "ACC-5".into(),
            is_active: false,
            consumer_class: "Commercial".into(),
            meter_number: "M-5".into(),
        };
        let decoded = ConsumerBalance::decode(&balance.to_document().unwrap()).unwrap();
        assert_eq!(decoded, balance);
    }

    #[test]
    fn zero_match_is_detected() {
        assert!(UpdateOutcome::default().matched_none());
        assert!(!UpdateOutcome { matched: 1, modified: 1 }.matched_none());
    }
}
