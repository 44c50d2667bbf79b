//! Billing records: fee heads and structures, invoices, payments and their
//! allocations.
//!
//! Amounts are in the smallest currency unit (e.g. cents). Settlement rules are
//! deterministic domain logic (no IO, no storage, no payment gateway).

pub mod fees;
pub mod invoice;
pub mod payment;

pub use fees::{FeeHead, FeeStructure, FeeStructureItem};
pub use invoice::{Invoice, InvoiceItem, InvoiceStatus};
pub use payment::{Payment, PaymentAllocation, PaymentMethod};
