//! Resource-kind classification table.
//!
//! Every record the school backend stores has exactly one [`ResourceKind`]. The
//! authorization core keys its policy table, scoping rules and ownership rules on
//! this tag instead of on concrete types.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind tag of a stored record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    School,
    UserAccount,
    Student,
    Teacher,
    AcademicYear,
    Term,
    Grade,
    Section,
    Subject,
    Enrollment,
    TeacherAssignment,
    AttendanceSession,
    AttendanceRecord,
    Assessment,
    AssessmentScore,
    FeeHead,
    FeeStructure,
    FeeStructureItem,
    Invoice,
    InvoiceItem,
    Payment,
    PaymentAllocation,
}

/// How a kind reaches its school of record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenancy {
    /// The record carries a school column itself.
    Direct,
    /// The school is only reachable through the record's reference chain.
    Inherited,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 22] = [
        ResourceKind::School,
        ResourceKind::UserAccount,
        ResourceKind::Student,
        ResourceKind::Teacher,
        ResourceKind::AcademicYear,
        ResourceKind::Term,
        ResourceKind::Grade,
        ResourceKind::Section,
        ResourceKind::Subject,
        ResourceKind::Enrollment,
        ResourceKind::TeacherAssignment,
        ResourceKind::AttendanceSession,
        ResourceKind::AttendanceRecord,
        ResourceKind::Assessment,
        ResourceKind::AssessmentScore,
        ResourceKind::FeeHead,
        ResourceKind::FeeStructure,
        ResourceKind::FeeStructureItem,
        ResourceKind::Invoice,
        ResourceKind::InvoiceItem,
        ResourceKind::Payment,
        ResourceKind::PaymentAllocation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::School => "school",
            ResourceKind::UserAccount => "user_account",
            ResourceKind::Student => "student",
            ResourceKind::Teacher => "teacher",
            ResourceKind::AcademicYear => "academic_year",
            ResourceKind::Term => "term",
            ResourceKind::Grade => "grade",
            ResourceKind::Section => "section",
            ResourceKind::Subject => "subject",
            ResourceKind::Enrollment => "enrollment",
            ResourceKind::TeacherAssignment => "teacher_assignment",
            ResourceKind::AttendanceSession => "attendance_session",
            ResourceKind::AttendanceRecord => "attendance_record",
            ResourceKind::Assessment => "assessment",
            ResourceKind::AssessmentScore => "assessment_score",
            ResourceKind::FeeHead => "fee_head",
            ResourceKind::FeeStructure => "fee_structure",
            ResourceKind::FeeStructureItem => "fee_structure_item",
            ResourceKind::Invoice => "invoice",
            ResourceKind::InvoiceItem => "invoice_item",
            ResourceKind::Payment => "payment",
            ResourceKind::PaymentAllocation => "payment_allocation",
        }
    }

    pub fn tenancy(&self) -> Tenancy {
        match self {
            ResourceKind::School
            | ResourceKind::UserAccount
            | ResourceKind::Student
            | ResourceKind::Teacher
            | ResourceKind::AcademicYear
            | ResourceKind::Grade
            | ResourceKind::Subject
            | ResourceKind::FeeHead => Tenancy::Direct,
            _ => Tenancy::Inherited,
        }
    }

    /// Kinds whose rows belong to a single student and are therefore restricted
    /// to that student's own rows for STUDENT principals.
    pub fn is_student_owned(&self) -> bool {
        matches!(
            self,
            ResourceKind::Student
                | ResourceKind::Enrollment
                | ResourceKind::AttendanceRecord
                | ResourceKind::AssessmentScore
                | ResourceKind::Invoice
                | ResourceKind::InvoiceItem
                | ResourceKind::Payment
                | ResourceKind::PaymentAllocation
        )
    }

    /// Kinds whose writes by teachers require a matching teacher assignment.
    pub fn is_assignment_gated(&self) -> bool {
        matches!(
            self,
            ResourceKind::AttendanceSession
                | ResourceKind::AttendanceRecord
                | ResourceKind::Assessment
                | ResourceKind::AssessmentScore
        )
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown resource kind '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&ResourceKind::AssessmentScore).unwrap();
        assert_eq!(json, "\"assessment_score\"");
    }

    #[test]
    fn gated_kinds_have_no_direct_school() {
        for kind in ResourceKind::ALL.iter().filter(|k| k.is_assignment_gated()) {
            assert_eq!(kind.tenancy(), Tenancy::Inherited, "{kind}");
        }
    }

    #[test]
    fn student_rows_are_owned_but_grades_are_not() {
        assert!(ResourceKind::Invoice.is_student_owned());
        assert!(ResourceKind::Student.is_student_owned());
        assert!(!ResourceKind::Grade.is_student_owned());
        assert!(!ResourceKind::Teacher.is_student_owned());
    }
}
