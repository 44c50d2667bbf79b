//! Student and teacher profiles.
//!
//! A profile may be linked to at most one user account (`user`). The link is a
//! nullable reference owned by the profile; the account never points back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    DomainResult, Entity, EntityRef, OwnerLink, ResourceKind, SchoolId, SchoolLink, StudentId,
    TeacherId, TenantScoped, UserId, require_text,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub school: SchoolId,
    /// Owning user account (STUDENT principal), if provisioned.
    pub user: Option<UserId>,
    /// Unique within the school.
    pub admission_no: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn new(
        school: SchoolId,
        admission_no: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: StudentId::new(),
            school,
            user: None,
            admission_no: admission_no.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            dob: None,
            gender: None,
            created_at: Utc::now(),
        }
    }

    pub fn linked_to(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("admission number", &self.admission_no)?;
        require_text("first name", &self.first_name)?;
        require_text("last name", &self.last_name)
    }
}

impl Entity for Student {
    type Id = StudentId;
    const KIND: ResourceKind = ResourceKind::Student;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Student(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        let mut refs = vec![EntityRef::School(self.school)];
        refs.extend(self.user.map(EntityRef::UserAccount));
        refs
    }
}

impl TenantScoped for Student {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Direct(self.school)
    }

    // A student row is owned by the student it describes.
    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Student(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub school: SchoolId,
    /// Owning user account (TEACHER principal), if provisioned.
    pub user: Option<UserId>,
    pub staff_no: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl Teacher {
    pub fn new(school: SchoolId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: TeacherId::new(),
            school,
            user: None,
            staff_no: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at: Utc::now(),
        }
    }

    pub fn linked_to(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("first name", &self.first_name)?;
        require_text("last name", &self.last_name)
    }
}

impl Entity for Teacher {
    type Id = TeacherId;
    const KIND: ResourceKind = ResourceKind::Teacher;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Teacher(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        let mut refs = vec![EntityRef::School(self.school)];
        refs.extend(self.user.map(EntityRef::UserAccount));
        refs
    }
}

impl TenantScoped for Teacher {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Direct(self.school)
    }

    fn teacher_profile(&self) -> Option<TeacherId> {
        Some(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_owns_itself() {
        let student = Student::new(SchoolId::new(), "A-001", "Alice", "Doe");
        assert_eq!(student.owner_link(), OwnerLink::Student(student.id));
        assert_eq!(student.full_name(), "Alice Doe");
    }

    #[test]
    fn blank_admission_number_is_rejected() {
        let student = Student::new(SchoolId::new(), "  ", "Alice", "Doe");
        assert!(student.validate().is_err());
    }

    #[test]
    fn linked_profile_references_its_user() {
        let user = UserId::new();
        let teacher = Teacher::new(SchoolId::new(), "Tom", "Hill").linked_to(user);
        assert!(teacher.references().contains(&EntityRef::UserAccount(user)));
        assert_eq!(teacher.teacher_profile(), Some(teacher.id));
    }
}
