//! Entity trait: identity, kind tag and outgoing references.

use serde::{Deserialize, Serialize};

use crate::id::{
    AcademicYearId, AssessmentId, AttendanceSessionId, FeeHeadId, FeeStructureId, GradeId,
    InvoiceId, PaymentId, SchoolId, SectionId, StudentId, SubjectId, TeacherId, TermId, UserId,
};
use crate::kind::ResourceKind;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Kind tag shared by every row of this type.
    const KIND: ResourceKind;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// This row as a reference target, for kinds other rows can point at.
    fn entity_ref(&self) -> Option<EntityRef> {
        None
    }

    /// Foreign keys held by this row.
    fn references(&self) -> Vec<EntityRef> {
        Vec::new()
    }
}

/// Typed pointer to a row that other rows reference.
///
/// Only kinds that appear as the target of a foreign key have a variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    School(SchoolId),
    UserAccount(UserId),
    Student(StudentId),
    Teacher(TeacherId),
    AcademicYear(AcademicYearId),
    Term(TermId),
    Grade(GradeId),
    Section(SectionId),
    Subject(SubjectId),
    AttendanceSession(AttendanceSessionId),
    Assessment(AssessmentId),
    FeeHead(FeeHeadId),
    FeeStructure(FeeStructureId),
    Invoice(InvoiceId),
    Payment(PaymentId),
}

impl EntityRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            EntityRef::School(_) => ResourceKind::School,
            EntityRef::UserAccount(_) => ResourceKind::UserAccount,
            EntityRef::Student(_) => ResourceKind::Student,
            EntityRef::Teacher(_) => ResourceKind::Teacher,
            EntityRef::AcademicYear(_) => ResourceKind::AcademicYear,
            EntityRef::Term(_) => ResourceKind::Term,
            EntityRef::Grade(_) => ResourceKind::Grade,
            EntityRef::Section(_) => ResourceKind::Section,
            EntityRef::Subject(_) => ResourceKind::Subject,
            EntityRef::AttendanceSession(_) => ResourceKind::AttendanceSession,
            EntityRef::Assessment(_) => ResourceKind::Assessment,
            EntityRef::FeeHead(_) => ResourceKind::FeeHead,
            EntityRef::FeeStructure(_) => ResourceKind::FeeStructure,
            EntityRef::Invoice(_) => ResourceKind::Invoice,
            EntityRef::Payment(_) => ResourceKind::Payment,
        }
    }
}

impl core::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let id: &dyn core::fmt::Display = match self {
            EntityRef::School(id) => id,
            EntityRef::UserAccount(id) => id,
            EntityRef::Student(id) => id,
            EntityRef::Teacher(id) => id,
            EntityRef::AcademicYear(id) => id,
            EntityRef::Term(id) => id,
            EntityRef::Grade(id) => id,
            EntityRef::Section(id) => id,
            EntityRef::Subject(id) => id,
            EntityRef::AttendanceSession(id) => id,
            EntityRef::Assessment(id) => id,
            EntityRef::FeeHead(id) => id,
            EntityRef::FeeStructure(id) => id,
            EntityRef::Invoice(id) => id,
            EntityRef::Payment(id) => id,
        };
        write!(f, "{}:{}", self.kind(), id)
    }
}

macro_rules! entity_ref_from {
    ($($id:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$id> for EntityRef {
                fn from(value: $id) -> Self {
                    EntityRef::$variant(value)
                }
            }
        )*
    };
}

entity_ref_from!(
    SchoolId => School,
    UserId => UserAccount,
    StudentId => Student,
    TeacherId => Teacher,
    AcademicYearId => AcademicYear,
    TermId => Term,
    GradeId => Grade,
    SectionId => Section,
    SubjectId => Subject,
    AttendanceSessionId => AttendanceSession,
    AssessmentId => Assessment,
    FeeHeadId => FeeHead,
    FeeStructureId => FeeStructure,
    InvoiceId => Invoice,
    PaymentId => Payment,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_kind() {
        let id = SectionId::new();
        let r = EntityRef::from(id);
        assert_eq!(r.kind(), ResourceKind::Section);
        assert_eq!(r.to_string(), format!("section:{id}"));
    }
}
