//! Academic structure: years, terms, grades, sections, subjects, enrollments and
//! teacher assignments.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    AcademicYearId, DomainError, DomainResult, EnrollmentId, Entity, EntityRef, GradeId,
    OwnerLink, ResourceKind, SchoolId, SchoolLink, SectionId, StudentId, SubjectId,
    TeacherAssignmentId, TeacherId, TenantScoped, TermId, require_text,
};

fn require_range(what: &str, starts_on: NaiveDate, ends_on: NaiveDate) -> DomainResult<()> {
    if starts_on > ends_on {
        return Err(DomainError::invariant(format!(
            "{what} starts on {starts_on} after it ends on {ends_on}"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Academic year / term
// ─────────────────────────────────────────────────────────────────────────────

/// A school year, e.g. "2025/2026". Unique per school by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub school: SchoolId,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub is_active: bool,
}

impl AcademicYear {
    pub fn new(school: SchoolId, name: impl Into<String>, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        Self {
            id: AcademicYearId::new(),
            school,
            name: name.into(),
            starts_on,
            ends_on,
            is_active: false,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("academic year name", &self.name)?;
        require_range("academic year", self.starts_on, self.ends_on)
    }
}

impl Entity for AcademicYear {
    type Id = AcademicYearId;
    const KIND: ResourceKind = ResourceKind::AcademicYear;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::AcademicYear(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::School(self.school)]
    }
}

impl TenantScoped for AcademicYear {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Direct(self.school)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub academic_year: AcademicYearId,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl Term {
    pub fn new(
        academic_year: AcademicYearId,
        name: impl Into<String>,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> Self {
        Self {
            id: TermId::new(),
            academic_year,
            name: name.into(),
            starts_on,
            ends_on,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("term name", &self.name)?;
        require_range("term", self.starts_on, self.ends_on)
    }
}

impl Entity for Term {
    type Id = TermId;
    const KIND: ResourceKind = ResourceKind::Term;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Term(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::AcademicYear(self.academic_year)]
    }
}

impl TenantScoped for Term {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::AcademicYear(self.academic_year))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grade / section / subject
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub school: SchoolId,
    pub name: String,
    pub sort_order: i32,
}

impl Grade {
    pub fn new(school: SchoolId, name: impl Into<String>) -> Self {
        Self {
            id: GradeId::new(),
            school,
            name: name.into(),
            sort_order: 0,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("grade name", &self.name)
    }
}

impl Entity for Grade {
    type Id = GradeId;
    const KIND: ResourceKind = ResourceKind::Grade;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Grade(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::School(self.school)]
    }
}

impl TenantScoped for Grade {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Direct(self.school)
    }
}

/// A class within a grade, e.g. "10 A".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub grade: GradeId,
    pub name: String,
}

impl Section {
    pub fn new(grade: GradeId, name: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            grade,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("section name", &self.name)
    }
}

impl Entity for Section {
    type Id = SectionId;
    const KIND: ResourceKind = ResourceKind::Section;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Section(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::Grade(self.grade)]
    }
}

impl TenantScoped for Section {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Grade(self.grade))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub school: SchoolId,
    pub code: Option<String>,
    pub name: String,
}

impl Subject {
    pub fn new(school: SchoolId, name: impl Into<String>) -> Self {
        Self {
            id: SubjectId::new(),
            school,
            code: None,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("subject name", &self.name)
    }
}

impl Entity for Subject {
    type Id = SubjectId;
    const KIND: ResourceKind = ResourceKind::Subject;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Subject(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::School(self.school)]
    }
}

impl TenantScoped for Subject {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Direct(self.school)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Enrollment
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Left,
    Suspended,
}

/// A student's placement in a section for one academic year.
///
/// Unique per (student, academic_year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student: StudentId,
    pub academic_year: AcademicYearId,
    pub section: SectionId,
    pub enrolled_on: NaiveDate,
    pub status: EnrollmentStatus,
}

impl Enrollment {
    pub fn new(student: StudentId, academic_year: AcademicYearId, section: SectionId) -> Self {
        Self {
            id: EnrollmentId::new(),
            student,
            academic_year,
            section,
            enrolled_on: Utc::now().date_naive(),
            status: EnrollmentStatus::Active,
        }
    }
}

impl Entity for Enrollment {
    type Id = EnrollmentId;
    const KIND: ResourceKind = ResourceKind::Enrollment;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::Student(self.student),
            EntityRef::AcademicYear(self.academic_year),
            EntityRef::Section(self.section),
        ]
    }
}

impl TenantScoped for Enrollment {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Student(self.student))
    }

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Student(self.student)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Teacher assignment
// ─────────────────────────────────────────────────────────────────────────────

/// The unit of teaching authority: `teacher` teaches `subject` to `section`
/// during `term`.
///
/// Unique on the full (teacher, term, section, subject) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherAssignment {
    pub id: TeacherAssignmentId,
    pub teacher: TeacherId,
    pub term: TermId,
    pub section: SectionId,
    pub subject: SubjectId,
}

impl TeacherAssignment {
    pub fn new(teacher: TeacherId, term: TermId, section: SectionId, subject: SubjectId) -> Self {
        Self {
            id: TeacherAssignmentId::new(),
            teacher,
            term,
            section,
            subject,
        }
    }

    pub fn same_grant(&self, other: &TeacherAssignment) -> bool {
        self.teacher == other.teacher
            && self.term == other.term
            && self.section == other.section
            && self.subject == other.subject
    }
}

impl Entity for TeacherAssignment {
    type Id = TeacherAssignmentId;
    const KIND: ResourceKind = ResourceKind::TeacherAssignment;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::Teacher(self.teacher),
            EntityRef::Term(self.term),
            EntityRef::Section(self.section),
            EntityRef::Subject(self.subject),
        ]
    }
}

impl TenantScoped for TeacherAssignment {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Teacher(self.teacher))
    }
}
