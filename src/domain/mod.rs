//! Domain types and the ports the cache depends on.

pub mod availability;
pub mod payment_method;
pub mod ports;
