//! Tenant scoping of collections.
//!
//! Scoping narrows what a principal sees; it never denies. The filter for one
//! `(principal, kind)` pair is computed once and then applied row by row as a
//! pure predicate, so output order always equals input order.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use schoolerp_core::{
    DomainError, Entity, LinkResolver, ResourceKind, SchoolId, StudentId, Tenancy, TeacherId,
    TenantScoped,
};

use crate::ownership::{resolve_owned_student, resolve_owned_teacher};
use crate::{AuthzStore, Principal, Role};

/// How a row's school of record is determined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopingMode {
    /// Walk the reference chain to the owning school.
    #[default]
    Transitive,
    /// Only honour a direct school column; kinds without one pass unfiltered.
    DirectOnly,
}

impl FromStr for ScopingMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transitive" => Ok(ScopingMode::Transitive),
            "direct_only" | "direct-only" | "direct" => Ok(ScopingMode::DirectOnly),
            other => Err(DomainError::validation(format!("unknown scoping mode '{other}'"))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TenantFilter {
    Unfiltered,
    School(SchoolId),
    Nothing,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OwnerFilter {
    Any,
    Student(StudentId),
    Teacher(TeacherId),
    Nothing,
}

/// Row predicate for one principal and one kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub tenant: TenantFilter,
    pub owner: OwnerFilter,
}

impl RowFilter {
    pub const NOTHING: RowFilter = RowFilter {
        tenant: TenantFilter::Nothing,
        owner: OwnerFilter::Nothing,
    };

    pub fn admits<R, T>(&self, resolver: &R, row: &T) -> bool
    where
        R: LinkResolver + ?Sized,
        T: TenantScoped + ?Sized,
    {
        let tenant_ok = match self.tenant {
            TenantFilter::Unfiltered => true,
            TenantFilter::School(school) => resolver.school_of(row.school_link()) == Some(school),
            TenantFilter::Nothing => false,
        };
        if !tenant_ok {
            return false;
        }
        match self.owner {
            OwnerFilter::Any => true,
            OwnerFilter::Student(student) => resolver.owner_of(row.owner_link()) == Some(student),
            OwnerFilter::Teacher(teacher) => row.teacher_profile() == Some(teacher),
            OwnerFilter::Nothing => false,
        }
    }
}

/// Applies tenant and ownership scoping against a store.
pub struct TenantScoper<'s, S: ?Sized> {
    store: &'s S,
    mode: ScopingMode,
}

impl<'s, S> TenantScoper<'s, S>
where
    S: AuthzStore + ?Sized,
{
    pub fn new(store: &'s S, mode: ScopingMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> ScopingMode {
        self.mode
    }

    /// The filter `principal` sees `kind` through.
    pub fn filter_for(&self, principal: &Principal, kind: ResourceKind) -> RowFilter {
        if !principal.is_active() {
            return RowFilter::NOTHING;
        }

        let tenant = match principal.school() {
            None => TenantFilter::Unfiltered,
            Some(_) if self.mode == ScopingMode::DirectOnly && kind.tenancy() == Tenancy::Inherited => {
                TenantFilter::Unfiltered
            }
            Some(school) => TenantFilter::School(school),
        };

        let owner = match principal.role() {
            Role::Student if kind.is_student_owned() => {
                match resolve_owned_student(self.store, principal) {
                    Some(student) => OwnerFilter::Student(student),
                    None => OwnerFilter::Nothing,
                }
            }
            Role::Teacher if kind == ResourceKind::Teacher => {
                match resolve_owned_teacher(self.store, principal) {
                    Some(teacher) => OwnerFilter::Teacher(teacher),
                    None => OwnerFilter::Nothing,
                }
            }
            _ => OwnerFilter::Any,
        };

        RowFilter { tenant, owner }
    }

    /// The subset of `rows` visible to `principal`, in input order.
    pub fn scope<T, I>(&self, principal: &Principal, rows: I) -> Vec<T>
    where
        T: Entity + TenantScoped,
        I: IntoIterator<Item = T>,
    {
        let filter = self.filter_for(principal, T::KIND);
        rows.into_iter()
            .filter(|row| filter.admits(self.store, row))
            .collect()
    }

    pub fn is_visible<T>(&self, principal: &Principal, row: &T) -> bool
    where
        T: Entity + TenantScoped,
    {
        self.filter_for(principal, T::KIND).admits(self.store, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureStore, date};
    use proptest::prelude::*;
    use schoolerp_academics::{
        AttendanceRecord, AttendanceSession, AttendanceStatus, Grade, Section, Student, Teacher,
    };
    use schoolerp_billing::{Invoice, InvoiceItem};
    use schoolerp_core::{AcademicYearId, FeeHeadId, GradeId, SectionId, TermId, UserId};

    fn member(school: SchoolId, role: Role) -> Principal {
        Principal::member(UserId::new(), school, role)
    }

    #[test]
    fn non_admin_sees_only_own_school() {
        let (x, y) = (SchoolId::new(), SchoolId::new());
        let store = FixtureStore::default();
        let grades = vec![
            Grade::new(x, "Grade 1"),
            Grade::new(y, "Grade 1"),
            Grade::new(x, "Grade 2"),
        ];
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);

        let visible = scoper.scope(&member(x, Role::Registrar), grades.clone());
        assert_eq!(visible, vec![grades[0].clone(), grades[2].clone()]);
    }

    #[test]
    fn school_admin_is_filtered_superuser_is_not() {
        let (x, y) = (SchoolId::new(), SchoolId::new());
        let store = FixtureStore::default();
        let grades = vec![Grade::new(x, "Grade 1"), Grade::new(y, "Grade 1")];
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);

        assert_eq!(scoper.scope(&member(x, Role::Admin), grades.clone()).len(), 1);
        let superuser = Principal::superuser(UserId::new());
        assert_eq!(scoper.scope(&superuser, grades.clone()), grades);
    }

    #[test]
    fn sections_are_scoped_through_their_grade() {
        let (x, y) = (SchoolId::new(), SchoolId::new());
        let mut store = FixtureStore::default();
        let gx = Grade::new(x, "Grade 1");
        let gy = Grade::new(y, "Grade 1");
        store.put(&gx);
        store.put(&gy);
        let sections = vec![Section::new(gx.id, "A"), Section::new(gy.id, "A")];

        let transitive = TenantScoper::new(&store, ScopingMode::Transitive);
        let visible = transitive.scope(&member(x, Role::Teacher), sections.clone());
        assert_eq!(visible, vec![sections[0].clone()]);

        let direct = TenantScoper::new(&store, ScopingMode::DirectOnly);
        assert_eq!(direct.scope(&member(x, Role::Teacher), sections.clone()), sections);
    }

    #[test]
    fn dangling_chain_excludes_row() {
        let store = FixtureStore::default();
        let orphan = Section::new(GradeId::new(), "A");
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);
        assert!(!scoper.is_visible(&member(SchoolId::new(), Role::Registrar), &orphan));
    }

    #[test]
    fn student_sees_only_own_attendance_records() {
        let school = SchoolId::new();
        let mut store = FixtureStore::default();
        let user = UserId::new();
        let me = Student::new(school, "A-001", "Alice", "Ames").linked_to(user);
        let other = Student::new(school, "A-002", "Bob", "Birch");
        store.put(&me);
        store.put(&other);
        store.link_student(user, me.id);

        let session = AttendanceSession::new(TermId::new(), SectionId::new(), date(2025, 10, 6));
        let records = vec![
            AttendanceRecord::new(session.id, me.id, AttendanceStatus::Present),
            AttendanceRecord::new(session.id, other.id, AttendanceStatus::Absent),
        ];
        let principal = Principal::member(user, school, Role::Student);
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);

        let visible = scoper.scope(&principal, records.clone());
        assert_eq!(visible, vec![records[0].clone()]);
    }

    #[test]
    fn student_invoice_items_follow_invoice_owner() {
        let school = SchoolId::new();
        let mut store = FixtureStore::default();
        let user = UserId::new();
        let me = Student::new(school, "A-001", "Alice", "Ames").linked_to(user);
        let other = Student::new(school, "A-002", "Bob", "Birch");
        store.put(&me);
        store.put(&other);
        store.link_student(user, me.id);
        let mine = Invoice::new(me.id, AcademicYearId::new());
        let theirs = Invoice::new(other.id, AcademicYearId::new());
        store.put(&mine);
        store.put(&theirs);

        let fee = FeeHeadId::new();
        let items = vec![
            InvoiceItem::new(theirs.id, fee, 4_000),
            InvoiceItem::new(mine.id, fee, 5_000),
        ];
        let principal = Principal::member(user, school, Role::Student);
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);
        assert_eq!(scoper.scope(&principal, items.clone()), vec![items[1].clone()]);
    }

    #[test]
    fn student_without_profile_sees_nothing_owned() {
        let school = SchoolId::new();
        let mut store = FixtureStore::default();
        let alice = Student::new(school, "A-001", "Alice", "Ames");
        store.put(&alice);
        let invoices = vec![Invoice::new(alice.id, AcademicYearId::new())];
        let principal = member(school, Role::Student);
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);

        assert!(scoper.scope(&principal, invoices).is_empty());
        // Unowned kinds are still visible.
        assert_eq!(scoper.scope(&principal, vec![Grade::new(school, "Grade 1")]).len(), 1);
    }

    #[test]
    fn teacher_lists_only_own_teacher_row() {
        let school = SchoolId::new();
        let mut store = FixtureStore::default();
        let user = UserId::new();
        let me = Teacher::new(school, "Ada", "Byron").linked_to(user);
        let colleague = Teacher::new(school, "Alan", "Turing");
        store.link_teacher(user, me.id);
        let principal = Principal::member(user, school, Role::Teacher);
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);

        let visible = scoper.scope(&principal, vec![colleague.clone(), me.clone()]);
        assert_eq!(visible, vec![me]);
    }

    #[test]
    fn inactive_principal_sees_nothing() {
        let school = SchoolId::new();
        let store = FixtureStore::default();
        let principal = member(school, Role::Registrar).with_active(false);
        let scoper = TenantScoper::new(&store, ScopingMode::Transitive);
        assert!(scoper.scope(&principal, vec![Grade::new(school, "Grade 1")]).is_empty());
    }

    #[test]
    fn scoping_mode_parses() {
        assert_eq!("transitive".parse::<ScopingMode>().unwrap(), ScopingMode::Transitive);
        assert_eq!("Direct-Only".parse::<ScopingMode>().unwrap(), ScopingMode::DirectOnly);
        assert!("fuzzy".parse::<ScopingMode>().is_err());
    }

    proptest! {
        #[test]
        fn scope_is_an_order_preserving_filter(owners in proptest::collection::vec(0usize..3, 0..40)) {
            let schools = [SchoolId::new(), SchoolId::new(), SchoolId::new()];
            let store = FixtureStore::default();
            let grades: Vec<Grade> = owners
                .iter()
                .enumerate()
                .map(|(i, &s)| Grade::new(schools[s], format!("Grade {i}")))
                .collect();
            let principal = member(schools[0], Role::Finance);
            let scoper = TenantScoper::new(&store, ScopingMode::Transitive);

            let visible = scoper.scope(&principal, grades.clone());
            let expected: Vec<Grade> =
                grades.iter().filter(|g| g.school == schools[0]).cloned().collect();
            prop_assert_eq!(&visible, &expected);
            // Idempotent.
            prop_assert_eq!(scoper.scope(&principal, visible.clone()), visible);
        }
    }
}
