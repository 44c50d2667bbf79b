//! `schoolerp-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the record crates and
//! the authorization core: identifiers, the resource-kind table and tenancy links.

pub mod entity;
pub mod error;
pub mod id;
pub mod kind;
pub mod tenancy;

pub use entity::{Entity, EntityRef};
pub use error::{DomainError, DomainResult, require_text};
pub use id::{
    AcademicYearId, AssessmentId, AssessmentScoreId, AttendanceRecordId, AttendanceSessionId,
    EnrollmentId, FeeHeadId, FeeStructureId, FeeStructureItemId, GradeId, InvoiceId,
    InvoiceItemId, PaymentAllocationId, PaymentId, SchoolId, SectionId, StudentId, SubjectId,
    TeacherAssignmentId, TeacherId, TermId, UserId,
};
pub use kind::{ResourceKind, Tenancy};
pub use tenancy::{LinkResolver, MAX_LINK_DEPTH, OwnerLink, RecordLinks, SchoolLink, TenantScoped};
