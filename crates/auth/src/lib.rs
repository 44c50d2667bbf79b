//! `schoolerp-auth` — pure authorization core for the school backend.
//!
//! Decides who may do what to which record and narrows collections to what a
//! principal may see. Decoupled from HTTP and storage: the record store is
//! reached only through the [`AuthzStore`] lookup trait.

pub mod assignment;
pub mod authorize;
pub mod claims;
pub mod ownership;
pub mod policy;
pub mod principal;
pub mod resource;
pub mod roles;
pub mod scope;
pub mod store;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use assignment::{AuthorizationKey, AuthorizationKeyed, teacher_may_modify};
pub use authorize::{
    AccessDecisionEngine, AuthorizationExplanation, AuthzError, Decision, DenialKind, Grant,
    PrincipalState,
};
pub use claims::{TokenClaims, TokenKind, TokenLifetimes, TokenValidationError, validate_claims};
pub use ownership::{resolve_owned_student, resolve_owned_teacher};
pub use policy::{Action, ActionClass, PolicyEntry, PolicyRule, PolicyTable, RoleSummary};
pub use principal::Principal;
pub use resource::{Resource, ResourceRef};
pub use roles::Role;
pub use scope::{OwnerFilter, RowFilter, ScopingMode, TenantFilter, TenantScoper};
pub use store::AuthzStore;
pub use user::{UserAccount, normalize_email};
