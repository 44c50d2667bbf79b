//! Typed, borrowed view of any stored record.
//!
//! Object-level decisions take a [`ResourceRef`] so the engine can read the
//! record's kind, tenancy links and authorization key without knowing its
//! concrete type.

use schoolerp_academics::{
    AcademicYear, Assessment, AssessmentScore, AttendanceRecord, AttendanceSession, Enrollment,
    Grade, School, Section, Student, Subject, Teacher, TeacherAssignment, Term,
};
use schoolerp_billing::{
    FeeHead, FeeStructure, FeeStructureItem, Invoice, InvoiceItem, Payment, PaymentAllocation,
};
use schoolerp_core::{Entity, RecordLinks, ResourceKind, TeacherId, TenantScoped};

use crate::UserAccount;

/// A stored record the authorization core can reason about.
pub trait Resource: Entity + TenantScoped {
    fn as_resource(&self) -> ResourceRef<'_>;
}

macro_rules! resource_refs {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        /// Borrowed reference to one record of any kind.
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        pub enum ResourceRef<'a> {
            $($variant(&'a $ty),)*
        }

        impl ResourceRef<'_> {
            pub fn kind(&self) -> ResourceKind {
                match self {
                    $(ResourceRef::$variant(_) => <$ty as Entity>::KIND,)*
                }
            }

            pub fn links(&self) -> RecordLinks {
                match self {
                    $(ResourceRef::$variant(record) => record.links(),)*
                }
            }

            pub fn teacher_profile(&self) -> Option<TeacherId> {
                match self {
                    $(ResourceRef::$variant(record) => record.teacher_profile(),)*
                }
            }
        }

        $(
            impl<'a> From<&'a $ty> for ResourceRef<'a> {
                fn from(value: &'a $ty) -> Self {
                    ResourceRef::$variant(value)
                }
            }

            impl Resource for $ty {
                fn as_resource(&self) -> ResourceRef<'_> {
                    ResourceRef::$variant(self)
                }
            }
        )*
    };
}

resource_refs!(
    School => School,
    UserAccount => UserAccount,
    Student => Student,
    Teacher => Teacher,
    AcademicYear => AcademicYear,
    Term => Term,
    Grade => Grade,
    Section => Section,
    Subject => Subject,
    Enrollment => Enrollment,
    TeacherAssignment => TeacherAssignment,
    AttendanceSession => AttendanceSession,
    AttendanceRecord => AttendanceRecord,
    Assessment => Assessment,
    AssessmentScore => AssessmentScore,
    FeeHead => FeeHead,
    FeeStructure => FeeStructure,
    FeeStructureItem => FeeStructureItem,
    Invoice => Invoice,
    InvoiceItem => InvoiceItem,
    Payment => Payment,
    PaymentAllocation => PaymentAllocation,
);
