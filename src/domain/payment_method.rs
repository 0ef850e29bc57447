use serde::Serialize;
use std::fmt;

/// Compiled-in catalog of payment methods: `(identifier, display name)`.
pub const CATALOG: [(u32, &str); 5] = [
    (1, "Red Envelope"),
    (2, "Balance"),
    (3, "Coupon"),
    (4, "Voucher"),
    (5, "Other"),
];

/// A payment method from the catalog.
///
/// Identifiers are stable and unique within a catalog; they key the
/// availability store and are the only input the remote probe receives.
#[derive(Debug, Serialize, PartialEq, Eq, Hash, Clone)]
pub struct PaymentMethod {
    pub id: u32,
    pub name: String,
}

impl PaymentMethod {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Returns every payment method of the compiled-in catalog, in identifier order.
pub fn catalog() -> Vec<PaymentMethod> {
    CATALOG
        .iter()
        .map(|(id, name)| PaymentMethod::new(*id, *name))
        .collect()
}
