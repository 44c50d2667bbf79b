use serde::Serialize;
use thiserror::Error;

use schoolerp_core::{EntityRef, ResourceKind, SchoolId, StudentId, TeacherId, UserId};

use crate::assignment::teacher_may_modify;
use crate::ownership::{resolve_owned_student, resolve_owned_teacher};
use crate::policy::{Action, ActionClass, PolicyRule, PolicyTable};
use crate::scope::{ScopingMode, TenantScoper};
use crate::{AuthzStore, Principal, ResourceRef, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("forbidden: {action} on {kind} ({reason})")]
    Denied {
        kind: ResourceKind,
        action: Action,
        reason: DenialKind,
    },

    #[error("invalid resource kind '{found}' (expected {expected})")]
    InvalidResourceKind { expected: String, found: ResourceKind },

    #[error("dangling reference to {0}")]
    DanglingReference(EntityRef),
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Unauthenticated,
    Inactive,
    /// The policy entry exists but does not list the principal's role.
    RoleNotPermitted,
    /// No policy entry covers the (kind, action class) pair.
    NoPolicy,
    MissingTeacherProfile,
    /// Assignment-gated writes need the object to derive a key from.
    ObjectRequired,
    NoMatchingAssignment,
    OutsideTenant,
}

impl DenialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialKind::Unauthenticated => "unauthenticated",
            DenialKind::Inactive => "inactive",
            DenialKind::RoleNotPermitted => "role_not_permitted",
            DenialKind::NoPolicy => "no_policy",
            DenialKind::MissingTeacherProfile => "missing_teacher_profile",
            DenialKind::ObjectRequired => "object_required",
            DenialKind::NoMatchingAssignment => "no_matching_assignment",
            DenialKind::OutsideTenant => "outside_tenant",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            DenialKind::Unauthenticated => "no authenticated principal",
            DenialKind::Inactive => "principal account is inactive",
            DenialKind::RoleNotPermitted => "role is not permitted by the policy entry",
            DenialKind::NoPolicy => "no policy entry covers this kind and action",
            DenialKind::MissingTeacherProfile => "principal has no teacher record",
            DenialKind::ObjectRequired => "assignment check needs the target record",
            DenialKind::NoMatchingAssignment => "no teacher assignment covers the record",
            DenialKind::OutsideTenant => "record belongs to another school",
        }
    }
}

impl core::fmt::Display for DenialKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What granted an allowed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Admin,
    Role,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow(Grant),
    Deny(DenialKind),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// Single entry point for authorization decisions.
///
/// - No IO beyond read-only store lookups
/// - No panics
/// - Deterministic for a fixed store snapshot
pub struct AccessDecisionEngine<S> {
    store: S,
    policy: PolicyTable,
    scoping: ScopingMode,
}

impl<S> AccessDecisionEngine<S>
where
    S: AuthzStore,
{
    /// Engine with the standard policy and transitive scoping.
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: PolicyTable::standard(),
            scoping: ScopingMode::default(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_scoping(mut self, scoping: ScopingMode) -> Self {
        self.scoping = scoping;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn scoping(&self) -> ScopingMode {
        self.scoping
    }

    pub fn scoper(&self) -> TenantScoper<'_, S> {
        TenantScoper::new(&self.store, self.scoping)
    }

    pub fn scope<T, I>(&self, principal: &Principal, rows: I) -> Vec<T>
    where
        T: schoolerp_core::Entity + schoolerp_core::TenantScoped,
        I: IntoIterator<Item = T>,
    {
        self.scoper().scope(principal, rows)
    }

    pub fn is_visible<T>(&self, principal: &Principal, row: &T) -> bool
    where
        T: schoolerp_core::Entity + schoolerp_core::TenantScoped,
    {
        self.scoper().is_visible(principal, row)
    }

    pub fn resolve_owned_student(&self, principal: &Principal) -> Option<StudentId> {
        resolve_owned_student(&self.store, principal)
    }

    pub fn resolve_owned_teacher(&self, principal: &Principal) -> Option<TeacherId> {
        resolve_owned_teacher(&self.store, principal)
    }

    pub fn teacher_may_modify(
        &self,
        teacher: TeacherId,
        resource: ResourceRef<'_>,
    ) -> Result<bool, AuthzError> {
        teacher_may_modify(&self.store, teacher, resource)
    }

    /// Decide whether `principal` may perform `action` on `kind`.
    ///
    /// `object` is the record for object-level checks. Its kind must equal
    /// `kind`. Errors are reserved for programming mistakes and unresolvable
    /// references; every policy outcome is a [`Decision`].
    pub fn decide(
        &self,
        principal: Option<&Principal>,
        action: Action,
        kind: ResourceKind,
        object: Option<ResourceRef<'_>>,
    ) -> Result<Decision, AuthzError> {
        let result = self.evaluate(principal, action, kind, object);
        let principal_id = principal.map(Principal::id);
        match &result {
            Ok(decision) => tracing::debug!(
                principal = ?principal_id,
                action = %action,
                kind = %kind,
                decision = ?decision,
                "authorization decision"
            ),
            Err(err @ AuthzError::InvalidResourceKind { .. }) => tracing::error!(
                principal = ?principal_id,
                action = %action,
                kind = %kind,
                "authorization called with mismatched resource: {err}"
            ),
            Err(err) => tracing::debug!(
                principal = ?principal_id,
                action = %action,
                kind = %kind,
                "authorization failed: {err}"
            ),
        }
        result
    }

    /// [`decide`](Self::decide) as a `Result`: denials become errors.
    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        action: Action,
        kind: ResourceKind,
        object: Option<ResourceRef<'_>>,
    ) -> Result<Grant, AuthzError> {
        match self.decide(principal, action, kind, object)? {
            Decision::Allow(grant) => Ok(grant),
            Decision::Deny(DenialKind::Unauthenticated | DenialKind::Inactive) => {
                Err(AuthzError::AuthenticationRequired)
            }
            Decision::Deny(reason) => Err(AuthzError::Denied {
                kind,
                action,
                reason,
            }),
        }
    }

    /// Explain why a decision was (or would be) made.
    pub fn explain(
        &self,
        principal: Option<&Principal>,
        action: Action,
        kind: ResourceKind,
        object: Option<ResourceRef<'_>>,
    ) -> Result<AuthorizationExplanation, AuthzError> {
        let decision = self.decide(principal, action, kind, object)?;
        let reason = match decision {
            Decision::Allow(Grant::Admin) => "ADMIN principals may perform every action".to_string(),
            Decision::Allow(Grant::Role) => {
                let role = principal.map(|p| p.role().as_str()).unwrap_or("?");
                format!("{role} is listed for {:?} on {kind}", action.class())
            }
            Decision::Allow(Grant::Assignment) => {
                "teacher holds an assignment covering the record".to_string()
            }
            Decision::Deny(denial) => denial.message().to_string(),
        };

        Ok(AuthorizationExplanation {
            action,
            kind,
            granted: decision.is_allow(),
            decision,
            rule: self.policy.rule(kind, action.class()).cloned(),
            reason,
            scoping: self.scoping,
            principal: principal.map(|p| PrincipalState {
                id: p.id(),
                school: p.school(),
                role: p.role(),
                active: p.is_active(),
                superuser: p.is_superuser(),
                student_profile: self.resolve_owned_student(p),
                teacher_profile: self.resolve_owned_teacher(p),
            }),
        })
    }

    /// First applicable rule wins.
    ///
    /// Object-level writes by a principal with a school are contained to that
    /// school before the ADMIN rule runs, so a school ADMIN is denied
    /// (`OutsideTenant`) on another school's records rather than allowed
    /// unconditionally. Only the superuser writes across schools.
    fn evaluate(
        &self,
        principal: Option<&Principal>,
        action: Action,
        kind: ResourceKind,
        object: Option<ResourceRef<'_>>,
    ) -> Result<Decision, AuthzError> {
        if let Some(object) = object {
            if object.kind() != kind {
                return Err(AuthzError::InvalidResourceKind {
                    expected: kind.to_string(),
                    found: object.kind(),
                });
            }
        }

        let Some(principal) = principal else {
            return Ok(Decision::Deny(DenialKind::Unauthenticated));
        };
        if !principal.is_active() {
            return Ok(Decision::Deny(DenialKind::Inactive));
        }

        let class = action.class();
        if let (ActionClass::Write, Some(object), Some(school)) = (class, object, principal.school()) {
            let of_record = self
                .store
                .try_school_of(object.links().school)
                .map_err(AuthzError::DanglingReference)?;
            if of_record != Some(school) {
                return Ok(Decision::Deny(DenialKind::OutsideTenant));
            }
        }

        if principal.role() == Role::Admin {
            return Ok(Decision::Allow(Grant::Admin));
        }

        match self.policy.rule(kind, class) {
            None => Ok(Decision::Deny(DenialKind::NoPolicy)),
            Some(PolicyRule::Roles { roles }) => Ok(if roles.contains(&principal.role()) {
                Decision::Allow(Grant::Role)
            } else {
                Decision::Deny(DenialKind::RoleNotPermitted)
            }),
            Some(PolicyRule::AssignmentGated) => {
                if principal.role() != Role::Teacher {
                    return Ok(Decision::Deny(DenialKind::RoleNotPermitted));
                }
                let Some(object) = object else {
                    return Ok(Decision::Deny(DenialKind::ObjectRequired));
                };
                let Some(teacher) = self.resolve_owned_teacher(principal) else {
                    return Ok(Decision::Deny(DenialKind::MissingTeacherProfile));
                };
                Ok(if teacher_may_modify(&self.store, teacher, object)? {
                    Decision::Allow(Grant::Assignment)
                } else {
                    Decision::Deny(DenialKind::NoMatchingAssignment)
                })
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Serializable account of one decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub action: Action,
    pub kind: ResourceKind,
    pub granted: bool,
    pub decision: Decision,
    /// The policy entry consulted, if any (ADMIN decisions never consult it).
    pub rule: Option<PolicyRule>,
    pub reason: String,
    pub scoping: ScopingMode,
    pub principal: Option<PrincipalState>,
}

/// Current state of the principal being checked.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub id: UserId,
    pub school: Option<SchoolId>,
    pub role: Role,
    pub active: bool,
    pub superuser: bool,
    pub student_profile: Option<StudentId>,
    pub teacher_profile: Option<TeacherId>,
}
