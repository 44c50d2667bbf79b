//! Stored user accounts.
//!
//! A [`UserAccount`] is the persisted form of a principal. Accounts are
//! provisioned administratively; this module only models the row and its
//! invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    DomainError, DomainResult, Entity, EntityRef, ResourceKind, SchoolId, SchoolLink,
    TenantScoped, UserId,
};

use crate::{Principal, Role};

/// User account row.
///
/// # Invariants
/// - `email` is unique across all schools and stored normalized.
/// - Only ADMIN accounts may be unaffiliated (`school == None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub school: Option<SchoolId>,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(school: Option<SchoolId>, email: &str, role: Role) -> Self {
        Self {
            id: UserId::new(),
            school,
            email: normalize_email(email),
            role,
            is_active: true,
            is_staff: role != Role::Student,
            date_joined: Utc::now(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let email = self.email.as_str();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(DomainError::validation(format!("invalid email '{email}'")));
        }
        if email != normalize_email(email) {
            return Err(DomainError::validation("email must be stored normalized"));
        }
        if self.school.is_none() && self.role != Role::Admin {
            return Err(DomainError::invariant(format!(
                "{} account must belong to a school",
                self.role
            )));
        }
        Ok(())
    }

    /// The principal this account authenticates as.
    pub fn principal(&self) -> DomainResult<Principal> {
        Ok(Principal::new(self.id, self.school, self.role)?.with_active(self.is_active))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Entity for UserAccount {
    type Id = UserId;
    const KIND: ResourceKind = ResourceKind::UserAccount;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::UserAccount(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        self.school.map(EntityRef::School).into_iter().collect()
    }
}

impl TenantScoped for UserAccount {
    fn school_link(&self) -> SchoolLink {
        match self.school {
            Some(school) => SchoolLink::Direct(school),
            None => SchoolLink::Unaffiliated,
        }
    }
}
