use serde::Serialize;

use schoolerp_core::{DomainError, DomainResult, SchoolId, UserId};

use crate::Role;

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the request layer
/// builds one from validated token claims (see [`crate::claims`]) or from a
/// stored [`crate::UserAccount`].
///
/// # Invariants
/// - The role never changes for the lifetime of the value.
/// - Only ADMIN principals may lack a school; such a principal is the
///   superuser and bypasses tenant scoping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    id: UserId,
    school: Option<SchoolId>,
    role: Role,
    active: bool,
}

impl Principal {
    pub fn new(id: UserId, school: Option<SchoolId>, role: Role) -> DomainResult<Self> {
        if school.is_none() && role != Role::Admin {
            return Err(DomainError::invariant(format!(
                "{role} principal must belong to a school"
            )));
        }
        Ok(Self {
            id,
            school,
            role,
            active: true,
        })
    }

    /// A principal affiliated with `school`.
    pub fn member(id: UserId, school: SchoolId, role: Role) -> Self {
        Self {
            id,
            school: Some(school),
            role,
            active: true,
        }
    }

    /// A global administrator with no school affiliation.
    pub fn superuser(id: UserId) -> Self {
        Self {
            id,
            school: None,
            role: Role::Admin,
            active: true,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn school(&self) -> Option<SchoolId> {
        self.school
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_superuser(&self) -> bool {
        self.school.is_none()
    }
}
