//! In-memory [`AuthzStore`] for unit tests.

use std::collections::HashMap;

use chrono::NaiveDate;

use schoolerp_academics::{Assessment, AttendanceSession, TeacherAssignment};
use schoolerp_core::{
    AssessmentId, AttendanceSessionId, Entity, EntityRef, LinkResolver, RecordLinks, SectionId,
    StudentId, TeacherId, TenantScoped, TermId, UserId,
};

use crate::AuthzStore;

#[derive(Debug, Default)]
pub struct FixtureStore {
    links: HashMap<EntityRef, RecordLinks>,
    students: HashMap<UserId, StudentId>,
    teachers: HashMap<UserId, TeacherId>,
    sessions: HashMap<AttendanceSessionId, AttendanceSession>,
    assessments: HashMap<AssessmentId, Assessment>,
    assignments: Vec<TeacherAssignment>,
}

impl FixtureStore {
    /// Register a row so others can resolve their links through it.
    pub fn put<T: Entity + TenantScoped>(&mut self, row: &T) {
        if let Some(target) = row.entity_ref() {
            self.links.insert(target, row.links());
        }
    }

    pub fn add_session(&mut self, session: AttendanceSession) {
        self.put(&session);
        self.sessions.insert(session.id, session);
    }

    pub fn add_assessment(&mut self, assessment: Assessment) {
        self.put(&assessment);
        self.assessments.insert(assessment.id, assessment);
    }

    pub fn add_assignment(&mut self, assignment: TeacherAssignment) {
        self.assignments.push(assignment);
    }

    pub fn link_student(&mut self, user: UserId, student: StudentId) {
        self.students.insert(user, student);
    }

    pub fn link_teacher(&mut self, user: UserId, teacher: TeacherId) {
        self.teachers.insert(user, teacher);
    }
}

impl LinkResolver for FixtureStore {
    fn links(&self, target: EntityRef) -> Option<RecordLinks> {
        self.links.get(&target).copied()
    }
}

impl AuthzStore for FixtureStore {
    fn student_owned_by(&self, user: UserId) -> Option<StudentId> {
        self.students.get(&user).copied()
    }

    fn teacher_owned_by(&self, user: UserId) -> Option<TeacherId> {
        self.teachers.get(&user).copied()
    }

    fn attendance_session(&self, id: AttendanceSessionId) -> Option<AttendanceSession> {
        self.sessions.get(&id).cloned()
    }

    fn assessment(&self, id: AssessmentId) -> Option<Assessment> {
        self.assessments.get(&id).cloned()
    }

    fn assignments_for(
        &self,
        teacher: TeacherId,
        term: TermId,
        section: SectionId,
    ) -> Vec<TeacherAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.teacher == teacher && a.term == term && a.section == section)
            .cloned()
            .collect()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
