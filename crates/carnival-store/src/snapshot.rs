//! Point-in-time values delivered by live subscriptions.

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::Fields;

/// State of a single document at one moment.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSnapshot {
    /// No document exists at the path.
    Missing,
    /// The document exists with these fields.
    Present(Fields),
}

impl DocumentSnapshot {
    pub fn exists(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Self::Present(fields) => Some(fields),
            Self::Missing => None,
        }
    }

    /// Decode the document into a typed value. `Ok(None)` when missing.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self {
            Self::Present(fields) => {
                let value = serde_json::Value::Object(fields.clone());
                Ok(Some(serde_json::from_value(value)?))
            }
            Self::Missing => Ok(None),
        }
    }
}

/// One document inside a collection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub id: String,
    pub data: Fields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Flag {
        #[serde(rename = "premiumActive")]
        premium_active: bool,
    }

    #[test]
    fn decode_present_and_missing() {
        let fields = json!({ "premiumActive": true })
            .as_object()
            .cloned()
            .unwrap();
        let snap = DocumentSnapshot::Present(fields);
        assert!(snap.exists());
        assert_eq!(
            snap.decode::<Flag>().unwrap(),
            Some(Flag {
                premium_active: true
            })
        );

        assert_eq!(DocumentSnapshot::Missing.decode::<Flag>().unwrap(), None);
    }

    #[test]
    fn decode_type_mismatch_is_error() {
        let fields = json!({ "premiumActive": "yes" })
            .as_object()
            .cloned()
            .unwrap();
        assert!(DocumentSnapshot::Present(fields).decode::<Flag>().is_err());
    }
}
