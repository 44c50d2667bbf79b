//! In-memory school record store.
//!
//! All tables live behind one `RwLock`: a write, its constraint checks, its
//! audit stamp and its derived updates (invoice status, indexes) happen in a
//! single critical section. Reads never observe a half-applied write.

pub mod tables;

use std::sync::RwLock;

use thiserror::Error;

use schoolerp_academics::{Assessment, AttendanceSession, TeacherAssignment};
use schoolerp_auth::AuthzStore;
use schoolerp_core::{
    AssessmentId, AttendanceSessionId, DomainError, EntityRef, LinkResolver, RecordLinks,
    SectionId, StudentId, TeacherId, TermId, UserId,
};

pub use tables::{Stored, Table, Tables};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Uniqueness, foreign key, range or balance rule rejected the write.
    #[error("integrity constraint violation: {0}")]
    IntegrityConstraintViolation(String),

    #[error("not found")]
    NotFound,

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityConstraintViolation(msg.into())
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => StoreError::NotFound,
            other => StoreError::IntegrityConstraintViolation(other.to_string()),
        }
    }
}

/// Thread-safe in-memory store for every school record.
#[derive(Debug, Default)]
pub struct SchoolStore {
    tables: RwLock<Tables>,
}

impl SchoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Stored>(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        self.read(|tables| tables.get::<T>(id).cloned())
    }

    pub fn all<T: Stored>(&self) -> Result<Vec<T>, StoreError> {
        self.read(|tables| tables.rows::<T>().cloned().collect())
    }

    /// Insert without stamping (seeding, migrations).
    pub fn insert<T: Stored>(&self, row: T) -> Result<(), StoreError> {
        self.transaction(|tables| tables.insert(row))
    }

    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&tables))
    }

    /// Run `f` with exclusive access to every table.
    ///
    /// `f` must validate before it mutates: there is no rollback.
    pub fn transaction<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        f(&mut tables)
    }
}

impl LinkResolver for SchoolStore {
    fn links(&self, target: EntityRef) -> Option<RecordLinks> {
        self.tables.read().ok()?.links(target)
    }
}

impl AuthzStore for SchoolStore {
    fn student_owned_by(&self, user: UserId) -> Option<StudentId> {
        self.tables.read().ok()?.student_owned_by(user)
    }

    fn teacher_owned_by(&self, user: UserId) -> Option<TeacherId> {
        self.tables.read().ok()?.teacher_owned_by(user)
    }

    fn attendance_session(&self, id: AttendanceSessionId) -> Option<AttendanceSession> {
        self.tables.read().ok()?.get::<AttendanceSession>(&id).cloned()
    }

    fn assessment(&self, id: AssessmentId) -> Option<Assessment> {
        self.tables.read().ok()?.get::<Assessment>(&id).cloned()
    }

    fn assignments_for(
        &self,
        teacher: TeacherId,
        term: TermId,
        section: SectionId,
    ) -> Vec<TeacherAssignment> {
        match self.tables.read() {
            Ok(tables) => tables.assignments_for(teacher, term, section),
            Err(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use schoolerp_academics::{
        AcademicYear, AttendanceRecord, AttendanceStatus, Enrollment, Grade, School, Section,
        Student, Subject, Teacher, Term,
    };
    use schoolerp_auth::{Role, UserAccount};
    use schoolerp_billing::{
        FeeHead, Invoice, InvoiceItem, InvoiceStatus, Payment, PaymentAllocation, PaymentMethod,
    };
    use schoolerp_core::{GradeId, SchoolId, SchoolLink};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> (SchoolStore, School, Grade, Section) {
        let store = SchoolStore::new();
        let school = School::new("Hillside");
        let grade = Grade::new(school.id, "Grade 4");
        let section = Section::new(grade.id, "4A");
        store.insert(school.clone()).unwrap();
        store.insert(grade.clone()).unwrap();
        store.insert(section.clone()).unwrap();
        (store, school, grade, section)
    }

    fn assert_integrity<T: core::fmt::Debug>(result: Result<T, StoreError>) {
        assert!(
            matches!(result, Err(StoreError::IntegrityConstraintViolation(_))),
            "expected integrity violation, got {result:?}"
        );
    }

    #[test]
    fn section_resolves_school_through_grade() {
        let (store, school, _, section) = seeded();
        let link = SchoolLink::Via(EntityRef::Section(section.id));
        assert_eq!(store.school_of(link), Some(school.id));
    }

    #[test]
    fn duplicate_grade_name_is_rejected() {
        let (store, school, _, _) = seeded();
        assert_integrity(store.insert(Grade::new(school.id, "Grade 4")));
        assert!(store.insert(Grade::new(school.id, "Grade 5")).is_ok());
    }

    #[test]
    fn missing_parent_is_rejected() {
        let (store, _, _, _) = seeded();
        assert_integrity(store.insert(Section::new(GradeId::new(), "4B")));
        assert_integrity(store.insert(Grade::new(SchoolId::new(), "Grade 9")));
    }

    #[test]
    fn referenced_rows_cannot_be_deleted() {
        let (store, _, grade, section) = seeded();
        assert_integrity(store.transaction(|t| t.remove::<Grade>(&grade.id)));
        store.transaction(|t| t.remove::<Section>(&section.id)).unwrap();
        store.transaction(|t| t.remove::<Grade>(&grade.id)).unwrap();
        assert_eq!(store.get::<Grade>(&grade.id).unwrap(), None);
    }

    #[test]
    fn inverted_academic_year_is_rejected() {
        let (store, school, _, _) = seeded();
        let year = AcademicYear::new(school.id, "2025/2026", date(2026, 6, 30), date(2025, 9, 1));
        assert_integrity(store.insert(year));
    }

    #[test]
    fn student_profile_index_follows_user_link() {
        let (store, school, _, _) = seeded();
        let account = UserAccount::new(Some(school.id), "alice@hillside.test", Role::Student);
        store.insert(account.clone()).unwrap();
        let alice = Student::new(school.id, "H-001", "Alice", "Ames").linked_to(account.id);
        store.insert(alice.clone()).unwrap();
        assert_eq!(store.student_owned_by(account.id), Some(alice.id));

        let twin = Student::new(school.id, "H-002", "Alicia", "Ames").linked_to(account.id);
        assert_integrity(store.insert(twin));

        let mut unlinked = alice.clone();
        unlinked.user = None;
        store.transaction(|t| t.update(unlinked)).unwrap();
        assert_eq!(store.student_owned_by(account.id), None);
    }

    #[test]
    fn attendance_record_unique_per_session_and_student() {
        let (store, school, _, section) = seeded();
        let year = AcademicYear::new(school.id, "2025/2026", date(2025, 9, 1), date(2026, 6, 30));
        let term = Term::new(year.id, "Term 1", date(2025, 9, 1), date(2025, 12, 15));
        let student = Student::new(school.id, "H-001", "Alice", "Ames");
        let session = AttendanceSession::new(term.id, section.id, date(2025, 10, 6));
        store.insert(year).unwrap();
        store.insert(term).unwrap();
        store.insert(student.clone()).unwrap();
        store.insert(session.clone()).unwrap();

        store
            .insert(AttendanceRecord::new(session.id, student.id, AttendanceStatus::Present))
            .unwrap();
        assert_integrity(store.insert(AttendanceRecord::new(
            session.id,
            student.id,
            AttendanceStatus::Absent,
        )));
    }

    #[test]
    fn allocations_drive_invoice_status() {
        let (store, school, _, _) = seeded();
        let year = AcademicYear::new(school.id, "2025/2026", date(2025, 9, 1), date(2026, 6, 30));
        let student = Student::new(school.id, "H-001", "Alice", "Ames");
        let tuition = FeeHead::new(school.id, "Tuition");
        let invoice = Invoice::new(student.id, year.id);
        let payment = Payment::new(student.id, PaymentMethod::Cash, 10_000);
        store.insert(year).unwrap();
        store.insert(student).unwrap();
        store.insert(tuition.clone()).unwrap();
        store.insert(invoice.clone()).unwrap();
        store.insert(InvoiceItem::new(invoice.id, tuition.id, 8_000)).unwrap();
        store.insert(payment.clone()).unwrap();

        let status = |store: &SchoolStore| store.get::<Invoice>(&invoice.id).unwrap().unwrap().status;
        assert_eq!(status(&store), InvoiceStatus::Unpaid);

        let first = PaymentAllocation::new(payment.id, invoice.id, 3_000);
        store.insert(first.clone()).unwrap();
        assert_eq!(status(&store), InvoiceStatus::Partial);

        let mut full = first.clone();
        full.amount = 8_000;
        store.transaction(|t| t.update(full)).unwrap();
        assert_eq!(status(&store), InvoiceStatus::Paid);

        let mut over = first.clone();
        over.amount = 9_000;
        assert_integrity(store.transaction(|t| t.update(over)));

        store.transaction(|t| t.remove::<PaymentAllocation>(&first.id)).unwrap();
        assert_eq!(status(&store), InvoiceStatus::Unpaid);
    }

    /// Hillside (seeded) plus Riverside with its own year, term, grade, section.
    fn two_schools() -> (SchoolStore, School, Section, AcademicYear, Term, Section) {
        let (store, hillside, _, hillside_4a) = seeded();
        let riverside = School::new("Riverside");
        let year = AcademicYear::new(riverside.id, "2025/2026", date(2025, 9, 1), date(2026, 6, 30));
        let term = Term::new(year.id, "Term 1", date(2025, 9, 1), date(2025, 12, 15));
        let grade = Grade::new(riverside.id, "Grade 4");
        let section = Section::new(grade.id, "4R");
        store.insert(riverside).unwrap();
        store.insert(year.clone()).unwrap();
        store.insert(term.clone()).unwrap();
        store.insert(grade).unwrap();
        store.insert(section.clone()).unwrap();
        (store, hillside, hillside_4a, year, term, section)
    }

    #[test]
    fn rows_cannot_span_two_schools() {
        let (store, hillside, hillside_4a, river_year, river_term, river_section) = two_schools();
        let alice = Student::new(hillside.id, "H-001", "Alice", "Ames");
        let teacher = Teacher::new(hillside.id, "Tariq", "Khan");
        let math = Subject::new(hillside.id, "Math");
        store.insert(alice.clone()).unwrap();
        store.insert(teacher.clone()).unwrap();
        store.insert(math.clone()).unwrap();

        assert_integrity(store.insert(Enrollment::new(alice.id, river_year.id, river_section.id)));
        assert_integrity(store.insert(TeacherAssignment::new(
            teacher.id,
            river_term.id,
            river_section.id,
            math.id,
        )));
        assert_integrity(store.insert(Assessment::new(
            river_term.id,
            river_section.id,
            math.id,
            "Quiz 1",
            1_000,
        )));
        assert_integrity(store.insert(Assessment::new(
            river_term.id,
            hillside_4a.id,
            math.id,
            "Quiz 1",
            1_000,
        )));
        assert!(store.all::<Enrollment>().unwrap().is_empty());
        assert!(store.all::<TeacherAssignment>().unwrap().is_empty());
        assert!(store.all::<Assessment>().unwrap().is_empty());
    }

    #[test]
    fn update_cannot_move_a_row_into_another_school() {
        let (store, hillside, hillside_4a, river_year, _, river_section) = two_schools();
        let year = AcademicYear::new(hillside.id, "2025/2026", date(2025, 9, 1), date(2026, 6, 30));
        let alice = Student::new(hillside.id, "H-001", "Alice", "Ames");
        let enrollment = Enrollment::new(alice.id, year.id, hillside_4a.id);
        store.insert(year).unwrap();
        store.insert(alice).unwrap();
        store.insert(enrollment.clone()).unwrap();

        let mut moved = enrollment.clone();
        moved.section = river_section.id;
        assert_integrity(store.transaction(|t| t.update(moved)));

        let mut moved = enrollment.clone();
        moved.academic_year = river_year.id;
        assert_integrity(store.transaction(|t| t.update(moved)));

        assert_eq!(store.get::<Enrollment>(&enrollment.id).unwrap(), Some(enrollment));
    }

    #[test]
    fn invoice_items_cannot_drop_below_settlement() {
        let (store, school, _, _) = seeded();
        let year = AcademicYear::new(school.id, "2025/2026", date(2025, 9, 1), date(2026, 6, 30));
        let student = Student::new(school.id, "H-001", "Alice", "Ames");
        let tuition = FeeHead::new(school.id, "Tuition");
        let invoice = Invoice::new(student.id, year.id);
        let spare = Invoice::new(student.id, year.id);
        let item = InvoiceItem::new(invoice.id, tuition.id, 8_000);
        let payment = Payment::new(student.id, PaymentMethod::Cash, 8_000);
        store.insert(year).unwrap();
        store.insert(student).unwrap();
        store.insert(tuition).unwrap();
        store.insert(invoice.clone()).unwrap();
        store.insert(spare.clone()).unwrap();
        store.insert(item.clone()).unwrap();
        store.insert(payment.clone()).unwrap();
        store.insert(PaymentAllocation::new(payment.id, invoice.id, 8_000)).unwrap();

        let mut shrunk = item.clone();
        shrunk.amount = 1_000;
        assert_integrity(store.transaction(|t| t.update(shrunk)));

        let mut moved = item.clone();
        moved.invoice = spare.id;
        assert_integrity(store.transaction(|t| t.update(moved)));

        assert_integrity(store.transaction(|t| t.remove::<InvoiceItem>(&item.id)));

        let mut grown = item.clone();
        grown.amount = 9_000;
        store.transaction(|t| t.update(grown)).unwrap();
        let status = store.get::<Invoice>(&invoice.id).unwrap().unwrap().status;
        assert_eq!(status, InvoiceStatus::Partial);
    }

    proptest! {
        #[test]
        fn invoice_is_never_over_settled(amounts in prop::collection::vec(1u64..4_000, 1..8)) {
            let (store, school, _, _) = seeded();
            let year = AcademicYear::new(school.id, "2025/2026", date(2025, 9, 1), date(2026, 6, 30));
            let student = Student::new(school.id, "H-001", "Alice", "Ames");
            let tuition = FeeHead::new(school.id, "Tuition");
            let invoice = Invoice::new(student.id, year.id);
            store.insert(year).unwrap();
            store.insert(student.clone()).unwrap();
            store.insert(tuition.clone()).unwrap();
            store.insert(invoice.clone()).unwrap();
            store.insert(InvoiceItem::new(invoice.id, tuition.id, 10_000)).unwrap();

            let mut settled = 0u64;
            for amount in amounts {
                let payment = Payment::new(student.id, PaymentMethod::Cash, amount);
                store.insert(payment.clone()).unwrap();
                let accepted = store
                    .insert(PaymentAllocation::new(payment.id, invoice.id, amount))
                    .is_ok();
                prop_assert_eq!(accepted, settled + amount <= 10_000);
                if accepted {
                    settled += amount;
                }
                let status = store.get::<Invoice>(&invoice.id).unwrap().unwrap().status;
                prop_assert_eq!(status, InvoiceStatus::from_amounts(10_000, settled));
            }
        }
    }

    #[test]
    fn subject_names_are_unique_per_school() {
        let (store, school, _, _) = seeded();
        let other = School::new("Riverside");
        store.insert(other.clone()).unwrap();
        store.insert(Subject::new(school.id, "Math")).unwrap();
        store.insert(Subject::new(other.id, "Math")).unwrap();
        assert_integrity(store.insert(Subject::new(school.id, "Math")));
    }
}
