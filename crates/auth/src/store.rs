use std::sync::Arc;

use schoolerp_academics::{Assessment, AttendanceSession, TeacherAssignment};
use schoolerp_core::{
    AssessmentId, AttendanceSessionId, LinkResolver, SectionId, StudentId, TeacherId, TermId,
    UserId,
};

/// Read-only lookups the authorization core needs from the record store.
///
/// Every method is a point lookup or an indexed query; implementations must not
/// scan whole tables to answer them.
pub trait AuthzStore: LinkResolver {
    /// The Student record linked to this user account, if any.
    fn student_owned_by(&self, user: UserId) -> Option<StudentId>;

    /// The Teacher record linked to this user account, if any.
    fn teacher_owned_by(&self, user: UserId) -> Option<TeacherId>;

    fn attendance_session(&self, id: AttendanceSessionId) -> Option<AttendanceSession>;

    fn assessment(&self, id: AssessmentId) -> Option<Assessment>;

    /// Assignments of `teacher` to `section` in `term` (any subject).
    fn assignments_for(
        &self,
        teacher: TeacherId,
        term: TermId,
        section: SectionId,
    ) -> Vec<TeacherAssignment>;
}

impl<S> AuthzStore for Arc<S>
where
    S: AuthzStore + ?Sized,
{
    fn student_owned_by(&self, user: UserId) -> Option<StudentId> {
        (**self).student_owned_by(user)
    }

    fn teacher_owned_by(&self, user: UserId) -> Option<TeacherId> {
        (**self).teacher_owned_by(user)
    }

    fn attendance_session(&self, id: AttendanceSessionId) -> Option<AttendanceSession> {
        (**self).attendance_session(id)
    }

    fn assessment(&self, id: AssessmentId) -> Option<Assessment> {
        (**self).assessment(id)
    }

    fn assignments_for(
        &self,
        teacher: TeacherId,
        term: TermId,
        section: SectionId,
    ) -> Vec<TeacherAssignment> {
        (**self).assignments_for(teacher, term, section)
    }
}
