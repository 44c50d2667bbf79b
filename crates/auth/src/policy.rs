//! Declarative access policy.
//!
//! One table maps `(resource kind, action class)` to the rule that governs it.
//! The decision engine consults only this table; there is no per-endpoint role
//! logic. ADMIN is handled before the table is consulted and never appears in it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use schoolerp_core::ResourceKind;

use crate::Role;

/// Request action against a resource kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Create,
    Retrieve,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::List,
        Action::Create,
        Action::Retrieve,
        Action::Update,
        Action::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Create => "create",
            Action::Retrieve => "retrieve",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    pub fn class(&self) -> ActionClass {
        match self {
            Action::List | Action::Retrieve => ActionClass::Read,
            Action::Create | Action::Update | Action::Delete => ActionClass::Write,
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    Read,
    Write,
}

/// What a policy entry requires of a non-admin principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PolicyRule {
    /// Allowed for exactly these roles.
    Roles { roles: BTreeSet<Role> },
    /// Allowed for TEACHER principals holding an assignment that covers the
    /// object; denied for every other non-admin role.
    AssignmentGated,
}

impl PolicyRule {
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        PolicyRule::Roles {
            roles: roles.into_iter().collect(),
        }
    }
}

/// One row of the policy table, in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub kind: ResourceKind,
    pub class: ActionClass,
    #[serde(flatten)]
    pub rule: PolicyRule,
}

/// Kinds written by back-office staff.
pub const GENERAL_KINDS: [ResourceKind; 15] = [
    ResourceKind::School,
    ResourceKind::AcademicYear,
    ResourceKind::Term,
    ResourceKind::Grade,
    ResourceKind::Section,
    ResourceKind::Subject,
    ResourceKind::Enrollment,
    ResourceKind::TeacherAssignment,
    ResourceKind::FeeHead,
    ResourceKind::FeeStructure,
    ResourceKind::FeeStructureItem,
    ResourceKind::Invoice,
    ResourceKind::InvoiceItem,
    ResourceKind::Payment,
    ResourceKind::PaymentAllocation,
];

/// The policy table. Missing entries deny.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PolicyEntry>", into = "Vec<PolicyEntry>")]
pub struct PolicyTable {
    rules: BTreeMap<(ResourceKind, ActionClass), PolicyRule>,
}

impl PolicyTable {
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// The standard school policy:
    ///
    /// - reads on every kind: REGISTRAR, FINANCE, TEACHER, STUDENT (students
    ///   are narrowed to their own rows by scoping, never denied outright);
    /// - writes on general kinds: REGISTRAR, FINANCE;
    /// - writes on attendance and assessment kinds: assignment-gated;
    /// - writes on students, teachers and user accounts: admins only.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for kind in ResourceKind::ALL {
            table.set(
                kind,
                ActionClass::Read,
                PolicyRule::roles([Role::Registrar, Role::Finance, Role::Teacher, Role::Student]),
            );
            if kind.is_assignment_gated() {
                table.set(kind, ActionClass::Write, PolicyRule::AssignmentGated);
            }
        }
        for kind in GENERAL_KINDS {
            table.set(
                kind,
                ActionClass::Write,
                PolicyRule::roles([Role::Registrar, Role::Finance]),
            );
        }
        table
    }

    pub fn rule(&self, kind: ResourceKind, class: ActionClass) -> Option<&PolicyRule> {
        self.rules.get(&(kind, class))
    }

    pub fn set(&mut self, kind: ResourceKind, class: ActionClass, rule: PolicyRule) {
        self.rules.insert((kind, class), rule);
    }

    pub fn remove(&mut self, kind: ResourceKind, class: ActionClass) -> Option<PolicyRule> {
        self.rules.remove(&(kind, class))
    }

    pub fn entries(&self) -> Vec<PolicyEntry> {
        self.rules
            .iter()
            .map(|(&(kind, class), rule)| PolicyEntry {
                kind,
                class,
                rule: rule.clone(),
            })
            .collect()
    }

    /// Per-role view of the table (for audit/display).
    pub fn summarize(&self) -> Vec<RoleSummary> {
        Role::ALL
            .iter()
            .map(|&role| {
                let mut summary = RoleSummary {
                    role,
                    description: role.description(),
                    reads: Vec::new(),
                    writes: Vec::new(),
                    assignment_gated_writes: Vec::new(),
                };
                for kind in ResourceKind::ALL {
                    if role == Role::Admin {
                        summary.reads.push(kind);
                        summary.writes.push(kind);
                        continue;
                    }
                    if self.permits_role(kind, ActionClass::Read, role) {
                        summary.reads.push(kind);
                    }
                    match self.rule(kind, ActionClass::Write) {
                        Some(PolicyRule::Roles { roles }) if roles.contains(&role) => {
                            summary.writes.push(kind)
                        }
                        Some(PolicyRule::AssignmentGated) if role == Role::Teacher => {
                            summary.assignment_gated_writes.push(kind)
                        }
                        _ => {}
                    }
                }
                summary
            })
            .collect()
    }

    fn permits_role(&self, kind: ResourceKind, class: ActionClass, role: Role) -> bool {
        matches!(self.rule(kind, class), Some(PolicyRule::Roles { roles }) if roles.contains(&role))
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Vec<PolicyEntry>> for PolicyTable {
    fn from(entries: Vec<PolicyEntry>) -> Self {
        let mut table = Self::empty();
        for entry in entries {
            table.set(entry.kind, entry.class, entry.rule);
        }
        table
    }
}

impl From<PolicyTable> for Vec<PolicyEntry> {
    fn from(table: PolicyTable) -> Self {
        table.entries()
    }
}

/// What one role may do under a policy table.
#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub role: Role,
    pub description: &'static str,
    pub reads: Vec<ResourceKind>,
    pub writes: Vec<ResourceKind>,
    pub assignment_gated_writes: Vec<ResourceKind>,
}
