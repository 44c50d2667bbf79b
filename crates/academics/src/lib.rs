//! Academic records: schools, people, academic structure, attendance and
//! assessments.
//!
//! Plain data plus record-level invariants (no IO, no storage, no authorization).

pub mod assessment;
pub mod attendance;
pub mod people;
pub mod school;
pub mod structure;

pub use assessment::{Assessment, AssessmentScore};
pub use attendance::{AttendanceRecord, AttendanceSession, AttendanceStatus};
pub use people::{Student, Teacher};
pub use school::School;
pub use structure::{
    AcademicYear, Enrollment, EnrollmentStatus, Grade, Section, Subject, TeacherAssignment, Term,
};
