//! Strongly-typed identifiers used across the school domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype!(
    /// Identifier of a school (the tenant boundary).
    SchoolId,
    "SchoolId"
);
uuid_newtype!(
    /// Identifier of a user account; authenticated principals carry the same id.
    UserId,
    "UserId"
);
uuid_newtype!(StudentId, "StudentId");
uuid_newtype!(TeacherId, "TeacherId");
uuid_newtype!(AcademicYearId, "AcademicYearId");
uuid_newtype!(TermId, "TermId");
uuid_newtype!(GradeId, "GradeId");
uuid_newtype!(SectionId, "SectionId");
uuid_newtype!(SubjectId, "SubjectId");
uuid_newtype!(EnrollmentId, "EnrollmentId");
uuid_newtype!(TeacherAssignmentId, "TeacherAssignmentId");
uuid_newtype!(AttendanceSessionId, "AttendanceSessionId");
uuid_newtype!(AttendanceRecordId, "AttendanceRecordId");
uuid_newtype!(AssessmentId, "AssessmentId");
uuid_newtype!(AssessmentScoreId, "AssessmentScoreId");
uuid_newtype!(FeeHeadId, "FeeHeadId");
uuid_newtype!(FeeStructureId, "FeeStructureId");
uuid_newtype!(FeeStructureItemId, "FeeStructureItemId");
uuid_newtype!(InvoiceId, "InvoiceId");
uuid_newtype!(InvoiceItemId, "InvoiceItemId");
uuid_newtype!(PaymentId, "PaymentId");
uuid_newtype!(PaymentAllocationId, "PaymentAllocationId");
