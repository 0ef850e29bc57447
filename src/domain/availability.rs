use super::payment_method::PaymentMethod;
use serde::{Deserialize, Serialize};

/// The latest known availability of one payment method.
///
/// Records carry no timestamp of their own; their age is the age of the
/// cache's freshness marker.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct AvailabilityRecord {
    pub id: u32,
    pub name: String,
    pub available: bool,
}

impl AvailabilityRecord {
    pub fn new(method: &PaymentMethod, available: bool) -> Self {
        Self {
            id: method.id,
            name: method.name.clone(),
            available,
        }
    }

    /// The record written when the probe for `method` could not give an answer.
    pub fn unavailable(method: &PaymentMethod) -> Self {
        Self::new(method, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_shape() {
        let record = AvailabilityRecord::new(&PaymentMethod::new(1, "A"), true);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 1, "name": "A", "available": true })
        );
    }

    #[test]
    fn test_unavailable_record() {
        let record = AvailabilityRecord::unavailable(&PaymentMethod::new(2, "B"));
        assert_eq!(record.id, 2);
        assert_eq!(record.name, "B");
        assert!(!record.available);
    }
}
