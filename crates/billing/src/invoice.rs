use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    AcademicYearId, DomainError, DomainResult, Entity, EntityRef, FeeHeadId, InvoiceId,
    InvoiceItemId, OwnerLink, ResourceKind, SchoolLink, StudentId, TenantScoped,
};

/// Settlement status of an invoice.
///
/// Derived from the invoice total and the amount allocated to it; never set by
/// hand once allocations exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl InvoiceStatus {
    pub fn from_amounts(total: u64, settled: u64) -> Self {
        if settled == 0 {
            InvoiceStatus::Unpaid
        } else if settled >= total {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Partial
        }
    }
}

/// Aggregate root: Invoice. Lines live in [`InvoiceItem`] rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub student: StudentId,
    pub academic_year: AcademicYearId,
    pub issued_on: NaiveDate,
    pub due_on: Option<NaiveDate>,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn new(student: StudentId, academic_year: AcademicYearId) -> Self {
        Self {
            id: InvoiceId::new(),
            student,
            academic_year,
            issued_on: Utc::now().date_naive(),
            due_on: None,
            status: InvoiceStatus::Unpaid,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(due_on) = self.due_on {
            if due_on < self.issued_on {
                return Err(DomainError::invariant(format!(
                    "invoice due on {due_on} before it was issued on {}",
                    self.issued_on
                )));
            }
        }
        Ok(())
    }

    /// Sum of line amounts for this invoice.
    pub fn total<'a>(&self, items: impl IntoIterator<Item = &'a InvoiceItem>) -> u64 {
        items
            .into_iter()
            .filter(|item| item.invoice == self.id)
            .map(|item| item.amount)
            .sum()
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;
    const KIND: ResourceKind = ResourceKind::Invoice;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Invoice(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::Student(self.student),
            EntityRef::AcademicYear(self.academic_year),
        ]
    }
}

impl TenantScoped for Invoice {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Student(self.student))
    }

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Student(self.student)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: InvoiceItemId,
    pub invoice: InvoiceId,
    pub fee_head: FeeHeadId,
    pub amount: u64,
}

impl InvoiceItem {
    pub fn new(invoice: InvoiceId, fee_head: FeeHeadId, amount: u64) -> Self {
        Self {
            id: InvoiceItemId::new(),
            invoice,
            fee_head,
            amount,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.amount == 0 {
            return Err(DomainError::validation("invoice item amount must be positive"));
        }
        Ok(())
    }
}

impl Entity for InvoiceItem {
    type Id = InvoiceItemId;
    const KIND: ResourceKind = ResourceKind::InvoiceItem;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::Invoice(self.invoice), EntityRef::FeeHead(self.fee_head)]
    }
}

impl TenantScoped for InvoiceItem {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Invoice(self.invoice))
    }

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Via(EntityRef::Invoice(self.invoice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_settled_amount() {
        assert_eq!(InvoiceStatus::from_amounts(10_000, 0), InvoiceStatus::Unpaid);
        assert_eq!(InvoiceStatus::from_amounts(10_000, 2_500), InvoiceStatus::Partial);
        assert_eq!(InvoiceStatus::from_amounts(10_000, 10_000), InvoiceStatus::Paid);
    }

    #[test]
    fn total_only_counts_own_lines() {
        let invoice = Invoice::new(StudentId::new(), AcademicYearId::new());
        let fee = FeeHeadId::new();
        let items = vec![
            InvoiceItem::new(invoice.id, fee, 5_000),
            InvoiceItem::new(invoice.id, fee, 1_500),
            InvoiceItem::new(InvoiceId::new(), fee, 9_999),
        ];
        assert_eq!(invoice.total(&items), 6_500);
    }

    #[test]
    fn due_date_before_issue_is_rejected() {
        let mut invoice = Invoice::new(StudentId::new(), AcademicYearId::new());
        invoice.due_on = invoice.issued_on.pred_opt();
        assert!(invoice.validate().is_err());
    }

    #[test]
    fn item_owner_is_resolved_through_invoice() {
        let invoice = InvoiceId::new();
        let item = InvoiceItem::new(invoice, FeeHeadId::new(), 100);
        assert_eq!(item.owner_link(), OwnerLink::Via(EntityRef::Invoice(invoice)));
    }
}
