//! Table layout of the in-memory school store.
//!
//! One ordered map per record type plus the secondary indexes the
//! authorization core queries (principal → profile, teaching context →
//! assignments). Every mutation goes through [`Tables::insert`],
//! [`Tables::update`] or [`Tables::remove`], which enforce foreign keys,
//! record checks and delete restrictions before touching a map.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use schoolerp_academics::{
    AcademicYear, Assessment, AssessmentScore, AttendanceRecord, AttendanceSession, Enrollment,
    Grade, School, Section, Student, Subject, Teacher, TeacherAssignment, Term,
};
use schoolerp_auth::{Resource, UserAccount};
use schoolerp_billing::{
    FeeHead, FeeStructure, FeeStructureItem, Invoice, InvoiceItem, InvoiceStatus, Payment,
    PaymentAllocation,
};
use schoolerp_core::{
    Entity, EntityRef, InvoiceId, InvoiceItemId, LinkResolver, RecordLinks, SchoolId, SectionId,
    StudentId, TeacherAssignmentId, TeacherId, TenantScoped, TermId, UserId,
};

use super::StoreError;

/// Typed access to the map holding one record type.
pub trait Table: Entity + Sized {
    fn table(tables: &Tables) -> &BTreeMap<Self::Id, Self>;
    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self::Id, Self>;
}

/// A record type the store can hold.
///
/// Hooks run inside the store's write lock, in the same critical section as
/// the write itself.
pub trait Stored: Resource + Table + Clone + Send + Sync + 'static {
    /// Record checks that may consult other rows (ranges, uniqueness, balances).
    fn check(&self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(())
    }

    /// Audit attributes set when the row is created.
    fn stamp_created(&mut self, _actor: UserId, _now: DateTime<Utc>) {}

    /// Audit attributes set when the row is updated.
    fn stamp_updated(&mut self, _actor: UserId, _now: DateTime<Utc>) {}

    /// Copy attributes an update must not change from the stored row.
    fn carry_over(&mut self, _stored: &Self) {}

    /// Derived state and index maintenance after an insert or update.
    fn after_write(_tables: &mut Tables, _row: &Self, _previous: Option<&Self>) {}

    /// Checks a delete must pass besides the reference restriction.
    fn check_remove(&self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(())
    }

    fn after_remove(_tables: &mut Tables, _row: &Self) {}
}

macro_rules! tables {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// All tables of the school store.
        #[derive(Debug, Default)]
        pub struct Tables {
            $($field: BTreeMap<<$ty as Entity>::Id, $ty>,)*
            students_by_user: HashMap<UserId, StudentId>,
            teachers_by_user: HashMap<UserId, TeacherId>,
            assignments_by_context: BTreeMap<(TeacherId, TermId, SectionId), BTreeSet<TeacherAssignmentId>>,
        }

        $(
            impl Table for $ty {
                fn table(tables: &Tables) -> &BTreeMap<Self::Id, Self> {
                    &tables.$field
                }

                fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self::Id, Self> {
                    &mut tables.$field
                }
            }
        )*

        impl Tables {
            /// Whether any stored row holds a foreign key to `target`.
            fn is_referenced(&self, target: EntityRef) -> bool {
                false $(|| self.$field.values().any(|row| row.references().contains(&target)))*
            }
        }
    };
}

tables!(
    schools: School,
    users: UserAccount,
    students: Student,
    teachers: Teacher,
    academic_years: AcademicYear,
    terms: Term,
    grades: Grade,
    sections: Section,
    subjects: Subject,
    enrollments: Enrollment,
    teacher_assignments: TeacherAssignment,
    attendance_sessions: AttendanceSession,
    attendance_records: AttendanceRecord,
    assessments: Assessment,
    assessment_scores: AssessmentScore,
    fee_heads: FeeHead,
    fee_structures: FeeStructure,
    fee_structure_items: FeeStructureItem,
    invoices: Invoice,
    invoice_items: InvoiceItem,
    payments: Payment,
    payment_allocations: PaymentAllocation,
);

impl Tables {
    pub fn get<T: Table>(&self, id: &T::Id) -> Option<&T> {
        T::table(self).get(id)
    }

    pub fn rows<'a, T: Table + 'a>(&'a self) -> impl Iterator<Item = &'a T> + 'a
    where
        T::Id: 'a,
    {
        T::table(self).values()
    }

    /// Tenancy and ownership links of a reference target.
    pub fn links(&self, target: EntityRef) -> Option<RecordLinks> {
        match target {
            EntityRef::School(id) => self.schools.get(&id).map(TenantScoped::links),
            EntityRef::UserAccount(id) => self.users.get(&id).map(TenantScoped::links),
            EntityRef::Student(id) => self.students.get(&id).map(TenantScoped::links),
            EntityRef::Teacher(id) => self.teachers.get(&id).map(TenantScoped::links),
            EntityRef::AcademicYear(id) => self.academic_years.get(&id).map(TenantScoped::links),
            EntityRef::Term(id) => self.terms.get(&id).map(TenantScoped::links),
            EntityRef::Grade(id) => self.grades.get(&id).map(TenantScoped::links),
            EntityRef::Section(id) => self.sections.get(&id).map(TenantScoped::links),
            EntityRef::Subject(id) => self.subjects.get(&id).map(TenantScoped::links),
            EntityRef::AttendanceSession(id) => {
                self.attendance_sessions.get(&id).map(TenantScoped::links)
            }
            EntityRef::Assessment(id) => self.assessments.get(&id).map(TenantScoped::links),
            EntityRef::FeeHead(id) => self.fee_heads.get(&id).map(TenantScoped::links),
            EntityRef::FeeStructure(id) => self.fee_structures.get(&id).map(TenantScoped::links),
            EntityRef::Invoice(id) => self.invoices.get(&id).map(TenantScoped::links),
            EntityRef::Payment(id) => self.payments.get(&id).map(TenantScoped::links),
        }
    }

    pub fn exists(&self, target: EntityRef) -> bool {
        self.links(target).is_some()
    }

    pub fn student_owned_by(&self, user: UserId) -> Option<StudentId> {
        self.students_by_user.get(&user).copied()
    }

    pub fn teacher_owned_by(&self, user: UserId) -> Option<TeacherId> {
        self.teachers_by_user.get(&user).copied()
    }

    pub fn assignments_for(
        &self,
        teacher: TeacherId,
        term: TermId,
        section: SectionId,
    ) -> Vec<TeacherAssignment> {
        self.assignments_by_context
            .get(&(teacher, term, section))
            .into_iter()
            .flatten()
            .filter_map(|id| self.teacher_assignments.get(id).cloned())
            .collect()
    }

    pub fn insert<T: Stored>(&mut self, row: T) -> Result<(), StoreError> {
        if T::table(self).contains_key(row.id()) {
            return Err(StoreError::integrity(format!(
                "{} {} already exists",
                T::KIND,
                row.id()
            )));
        }
        self.check_write(&row)?;
        T::table_mut(self).insert(*row.id(), row.clone());
        T::after_write(self, &row, None);
        Ok(())
    }

    pub fn update<T: Stored>(&mut self, row: T) -> Result<(), StoreError> {
        let previous = T::table(self).get(row.id()).cloned().ok_or(StoreError::NotFound)?;
        self.check_write(&row)?;
        T::table_mut(self).insert(*row.id(), row.clone());
        T::after_write(self, &row, Some(&previous));
        Ok(())
    }

    /// Delete a row. Rows other rows still reference cannot be deleted.
    pub fn remove<T: Stored>(&mut self, id: &T::Id) -> Result<T, StoreError> {
        let row = T::table(self).get(id).ok_or(StoreError::NotFound)?;
        if let Some(target) = row.entity_ref() {
            if self.is_referenced(target) {
                return Err(StoreError::integrity(format!(
                    "{target} is still referenced by other records"
                )));
            }
        }
        row.check_remove(self)?;
        let row = T::table_mut(self).remove(id).ok_or(StoreError::NotFound)?;
        T::after_remove(self, &row);
        Ok(row)
    }

    /// Foreign keys exist and every school reached through them (and through
    /// the row's own school link) is the same school.
    fn check_write<T: Stored>(&self, row: &T) -> Result<(), StoreError> {
        let missing = |target: EntityRef| {
            StoreError::integrity(format!("{} {} references missing {target}", T::KIND, row.id()))
        };

        let mut schools: Vec<(SchoolId, Option<EntityRef>)> = Vec::new();
        for target in row.references() {
            let links = self.links(target).ok_or_else(|| missing(target))?;
            if let Some(school) = self.try_school_of(links.school).map_err(missing)? {
                schools.push((school, Some(target)));
            }
        }
        if let Some(school) = self.try_school_of(row.school_link()).map_err(missing)? {
            schools.push((school, None));
        }
        if let Some(&(first, first_via)) = schools.first() {
            if let Some(&(other, other_via)) = schools.iter().find(|(school, _)| *school != first) {
                let describe = |via: Option<EntityRef>| {
                    via.map_or_else(|| "own link".to_string(), |target| format!("via {target}"))
                };
                return Err(StoreError::integrity(format!(
                    "{} {} spans two schools: {first} ({}) and {other} ({})",
                    T::KIND,
                    row.id(),
                    describe(first_via),
                    describe(other_via),
                )));
            }
        }

        row.check(self)
    }

    fn invoice_total(&self, invoice: InvoiceId, excluding: Option<InvoiceItemId>) -> u64 {
        self.invoice_items
            .values()
            .filter(|item| item.invoice == invoice && excluding != Some(item.id))
            .map(|item| item.amount)
            .sum()
    }

    /// Reject an invoice total that would fall below what is already settled.
    fn ensure_settlement_within(&self, invoice: InvoiceId, total: u64) -> Result<(), StoreError> {
        let settled = self.settled_on(invoice, None);
        if settled > total {
            return Err(StoreError::integrity(format!(
                "invoice {invoice} is settled at {settled}, above its new total of {total}"
            )));
        }
        Ok(())
    }

    fn refresh_invoice_status(&mut self, invoice: InvoiceId) {
        let total = self.invoice_total(invoice, None);
        let settled = self.settled_on(invoice, None);
        if let Some(row) = self.invoices.get_mut(&invoice) {
            row.status = InvoiceStatus::from_amounts(total, settled);
        }
    }

    fn settled_on(&self, invoice: InvoiceId, excluding: Option<&PaymentAllocation>) -> u64 {
        self.payment_allocations
            .values()
            .filter(|a| a.invoice == invoice && excluding.is_none_or(|e| e.id != a.id))
            .map(|a| a.amount)
            .sum()
    }
}

impl LinkResolver for Tables {
    fn links(&self, target: EntityRef) -> Option<RecordLinks> {
        Tables::links(self, target)
    }
}

/// Reject a second row with the same key.
fn ensure_unique<T, K>(tables: &Tables, row: &T, what: &str, key: impl Fn(&T) -> K) -> Result<(), StoreError>
where
    T: Table,
    K: PartialEq,
{
    let wanted = key(row);
    let clash = tables
        .rows::<T>()
        .any(|other| other.id() != row.id() && key(other) == wanted);
    if clash {
        return Err(StoreError::integrity(format!(
            "{} with the same {what} already exists",
            T::KIND
        )));
    }
    Ok(())
}

/// Like [`ensure_unique`], but rows without a key never clash.
fn ensure_unique_when_set<T, K>(
    tables: &Tables,
    row: &T,
    what: &str,
    key: impl Fn(&T) -> Option<K>,
) -> Result<(), StoreError>
where
    T: Table,
    K: PartialEq,
{
    if key(row).is_none() {
        return Ok(());
    }
    ensure_unique(tables, row, what, key)
}

fn index_profile<I: Copy>(index: &mut HashMap<UserId, I>, previous: Option<UserId>, current: Option<UserId>, id: I) {
    if let Some(user) = previous {
        index.remove(&user);
    }
    if let Some(user) = current {
        index.insert(user, id);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// People and accounts
// ─────────────────────────────────────────────────────────────────────────────

impl Stored for School {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique_when_set(tables, self, "code", |s| s.code.clone())
    }

    fn carry_over(&mut self, stored: &Self) {
        self.created_at = stored.created_at;
    }
}

impl Stored for UserAccount {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique(tables, self, "email", |u| u.email.clone())
    }

    fn carry_over(&mut self, stored: &Self) {
        self.date_joined = stored.date_joined;
    }
}

impl Stored for Student {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique(tables, self, "admission number", |s| (s.school, s.admission_no.clone()))?;
        ensure_unique_when_set(tables, self, "user account", |s| s.user)
    }

    fn carry_over(&mut self, stored: &Self) {
        self.created_at = stored.created_at;
    }

    fn after_write(tables: &mut Tables, row: &Self, previous: Option<&Self>) {
        index_profile(&mut tables.students_by_user, previous.and_then(|p| p.user), row.user, row.id);
    }

    fn after_remove(tables: &mut Tables, row: &Self) {
        index_profile(&mut tables.students_by_user, row.user, None, row.id);
    }
}

impl Stored for Teacher {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique_when_set(tables, self, "user account", |t| t.user)
    }

    fn carry_over(&mut self, stored: &Self) {
        self.created_at = stored.created_at;
    }

    fn after_write(tables: &mut Tables, row: &Self, previous: Option<&Self>) {
        index_profile(&mut tables.teachers_by_user, previous.and_then(|p| p.user), row.user, row.id);
    }

    fn after_remove(tables: &mut Tables, row: &Self) {
        index_profile(&mut tables.teachers_by_user, row.user, None, row.id);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Academic structure
// ─────────────────────────────────────────────────────────────────────────────

impl Stored for AcademicYear {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique(tables, self, "name", |y| (y.school, y.name.clone()))
    }
}

impl Stored for Term {
    fn check(&self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(self.validate()?)
    }
}

impl Stored for Grade {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique(tables, self, "name", |g| (g.school, g.name.clone()))
    }
}

impl Stored for Section {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique(tables, self, "name", |s| (s.grade, s.name.clone()))
    }
}

impl Stored for Subject {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique(tables, self, "name", |s| (s.school, s.name.clone()))
    }
}

impl Stored for Enrollment {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        ensure_unique(tables, self, "academic year", |e| (e.student, e.academic_year))
    }
}

impl Stored for TeacherAssignment {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        ensure_unique(tables, self, "teaching context", |a| (a.teacher, a.term, a.section, a.subject))
    }

    fn after_write(tables: &mut Tables, row: &Self, previous: Option<&Self>) {
        if let Some(previous) = previous {
            Self::after_remove(tables, previous);
        }
        tables
            .assignments_by_context
            .entry((row.teacher, row.term, row.section))
            .or_default()
            .insert(row.id);
    }

    fn after_remove(tables: &mut Tables, row: &Self) {
        let key = (row.teacher, row.term, row.section);
        if let Some(ids) = tables.assignments_by_context.get_mut(&key) {
            ids.remove(&row.id);
            if ids.is_empty() {
                tables.assignments_by_context.remove(&key);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attendance and assessment
// ─────────────────────────────────────────────────────────────────────────────

impl Stored for AttendanceSession {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        ensure_unique(tables, self, "date", |s| (s.term, s.section, s.session_date))
    }

    fn stamp_created(&mut self, actor: UserId, _now: DateTime<Utc>) {
        self.created_by = Some(actor);
    }

    fn carry_over(&mut self, stored: &Self) {
        self.created_by = stored.created_by;
    }
}

impl Stored for AttendanceRecord {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        ensure_unique(tables, self, "student", |r| (r.session, r.student))
    }
}

impl Stored for Assessment {
    fn check(&self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(self.validate()?)
    }
}

impl Stored for AssessmentScore {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        let assessment = tables
            .get::<Assessment>(&self.assessment)
            .ok_or_else(|| StoreError::integrity(format!("assessment {} not found", self.assessment)))?;
        self.validate_against(assessment)?;
        ensure_unique(tables, self, "student", |s| (s.assessment, s.student))
    }

    fn stamp_created(&mut self, actor: UserId, now: DateTime<Utc>) {
        self.graded_by = Some(actor);
        self.graded_at = now;
    }

    fn stamp_updated(&mut self, actor: UserId, now: DateTime<Utc>) {
        self.stamp_created(actor, now);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Billing
// ─────────────────────────────────────────────────────────────────────────────

impl Stored for FeeHead {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        ensure_unique(tables, self, "name", |f| (f.school, f.name.clone()))
    }
}

impl Stored for FeeStructure {
    fn check(&self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(self.validate()?)
    }
}

impl Stored for FeeStructureItem {
    fn check(&self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(self.validate()?)
    }
}

impl Stored for Invoice {
    fn check(&self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(self.validate()?)
    }

    fn after_write(tables: &mut Tables, row: &Self, _previous: Option<&Self>) {
        tables.refresh_invoice_status(row.id);
    }
}

impl Stored for InvoiceItem {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        let total = tables.invoice_total(self.invoice, Some(self.id)).saturating_add(self.amount);
        tables.ensure_settlement_within(self.invoice, total)?;
        if let Some(stored) = tables.get::<InvoiceItem>(&self.id).filter(|s| s.invoice != self.invoice) {
            let left = tables.invoice_total(stored.invoice, Some(self.id));
            tables.ensure_settlement_within(stored.invoice, left)?;
        }
        Ok(())
    }

    fn check_remove(&self, tables: &Tables) -> Result<(), StoreError> {
        let left = tables.invoice_total(self.invoice, Some(self.id));
        tables.ensure_settlement_within(self.invoice, left)
    }

    fn after_write(tables: &mut Tables, row: &Self, previous: Option<&Self>) {
        if let Some(previous) = previous.filter(|p| p.invoice != row.invoice) {
            tables.refresh_invoice_status(previous.invoice);
        }
        tables.refresh_invoice_status(row.invoice);
    }

    fn after_remove(tables: &mut Tables, row: &Self) {
        tables.refresh_invoice_status(row.invoice);
    }
}

impl Stored for Payment {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        self.validate()?;
        let allocated: u64 = tables
            .rows::<PaymentAllocation>()
            .filter(|a| a.payment == self.id)
            .map(|a| a.amount)
            .sum();
        if allocated > self.amount {
            return Err(StoreError::integrity(format!(
                "payment amount {} is below the {allocated} already allocated",
                self.amount
            )));
        }
        Ok(())
    }
}

impl Stored for PaymentAllocation {
    fn check(&self, tables: &Tables) -> Result<(), StoreError> {
        ensure_unique(tables, self, "invoice", |a| (a.payment, a.invoice))?;
        let payment = tables
            .get::<Payment>(&self.payment)
            .ok_or_else(|| StoreError::integrity(format!("payment {} not found", self.payment)))?;
        let invoice = tables
            .get::<Invoice>(&self.invoice)
            .ok_or_else(|| StoreError::integrity(format!("invoice {} not found", self.invoice)))?;
        let invoice_total = invoice.total(tables.rows::<InvoiceItem>());
        let allocated_from_payment: u64 = tables
            .rows::<PaymentAllocation>()
            .filter(|a| a.payment == self.payment && a.id != self.id)
            .map(|a| a.amount)
            .sum();
        let settled_on_invoice = tables.settled_on(self.invoice, Some(self));
        self.validate_against(
            payment,
            invoice,
            invoice_total,
            allocated_from_payment,
            settled_on_invoice,
        )?;
        Ok(())
    }

    fn after_write(tables: &mut Tables, row: &Self, previous: Option<&Self>) {
        if let Some(previous) = previous.filter(|p| p.invoice != row.invoice) {
            tables.refresh_invoice_status(previous.invoice);
        }
        tables.refresh_invoice_status(row.invoice);
    }

    fn after_remove(tables: &mut Tables, row: &Self) {
        tables.refresh_invoice_status(row.invoice);
    }
}
