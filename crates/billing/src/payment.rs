use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    DomainError, DomainResult, Entity, EntityRef, InvoiceId, OwnerLink, PaymentAllocationId,
    PaymentId, ResourceKind, SchoolLink, StudentId, TenantScoped,
};

use crate::invoice::Invoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Bank,
    Mobile,
}

/// Money received from (or on behalf of) a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub student: StudentId,
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub amount: u64,
}

impl Payment {
    pub fn new(student: StudentId, method: PaymentMethod, amount: u64) -> Self {
        Self {
            id: PaymentId::new(),
            student,
            paid_on: Utc::now().date_naive(),
            method,
            reference: None,
            amount,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.amount == 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        Ok(())
    }
}

impl Entity for Payment {
    type Id = PaymentId;
    const KIND: ResourceKind = ResourceKind::Payment;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Payment(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::Student(self.student)]
    }
}

impl TenantScoped for Payment {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Student(self.student))
    }

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Student(self.student)
    }
}

/// The part of a payment applied to one invoice. Unique per (payment, invoice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub id: PaymentAllocationId,
    pub payment: PaymentId,
    pub invoice: InvoiceId,
    pub amount: u64,
}

impl PaymentAllocation {
    pub fn new(payment: PaymentId, invoice: InvoiceId, amount: u64) -> Self {
        Self {
            id: PaymentAllocationId::new(),
            payment,
            invoice,
            amount,
        }
    }

    /// Check this allocation against its payment and invoice.
    ///
    /// `allocated_from_payment` and `settled_on_invoice` are the totals of the
    /// *other* allocations already recorded against the same payment and invoice.
    pub fn validate_against(
        &self,
        payment: &Payment,
        invoice: &Invoice,
        invoice_total: u64,
        allocated_from_payment: u64,
        settled_on_invoice: u64,
    ) -> DomainResult<()> {
        if self.amount == 0 {
            return Err(DomainError::validation("allocation amount must be positive"));
        }
        if payment.student != invoice.student {
            return Err(DomainError::invariant(
                "payment and invoice belong to different students",
            ));
        }
        if allocated_from_payment.saturating_add(self.amount) > payment.amount {
            return Err(DomainError::invariant(format!(
                "allocation of {} exceeds unallocated payment balance of {}",
                self.amount,
                payment.amount.saturating_sub(allocated_from_payment)
            )));
        }
        if settled_on_invoice.saturating_add(self.amount) > invoice_total {
            return Err(DomainError::invariant(format!(
                "allocation of {} exceeds outstanding invoice balance of {}",
                self.amount,
                invoice_total.saturating_sub(settled_on_invoice)
            )));
        }
        Ok(())
    }
}

impl Entity for PaymentAllocation {
    type Id = PaymentAllocationId;
    const KIND: ResourceKind = ResourceKind::PaymentAllocation;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::Payment(self.payment), EntityRef::Invoice(self.invoice)]
    }
}

impl TenantScoped for PaymentAllocation {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Payment(self.payment))
    }

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Via(EntityRef::Payment(self.payment))
    }
}
