//! Assignment-based write authorization for teachers.
//!
//! A teacher may write attendance and assessment records only for the
//! (term, section[, subject]) combinations they are assigned to teach.

use serde::Serialize;

use schoolerp_academics::{Assessment, AssessmentScore, AttendanceRecord, AttendanceSession};
use schoolerp_core::{EntityRef, SectionId, SubjectId, TeacherId, TermId};

use crate::{AuthzError, AuthzStore, ResourceRef};

/// The teaching context a gated record belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationKey {
    pub term: TermId,
    pub section: SectionId,
    /// `None` for attendance, which is not subject-specific.
    pub subject: Option<SubjectId>,
}

/// Records whose writes are gated by teacher assignments.
pub trait AuthorizationKeyed {
    fn authorization_key<S>(&self, store: &S) -> Result<AuthorizationKey, AuthzError>
    where
        S: AuthzStore + ?Sized;
}

impl AuthorizationKeyed for AttendanceSession {
    fn authorization_key<S>(&self, _store: &S) -> Result<AuthorizationKey, AuthzError>
    where
        S: AuthzStore + ?Sized,
    {
        Ok(AuthorizationKey {
            term: self.term,
            section: self.section,
            subject: None,
        })
    }
}

impl AuthorizationKeyed for Assessment {
    fn authorization_key<S>(&self, _store: &S) -> Result<AuthorizationKey, AuthzError>
    where
        S: AuthzStore + ?Sized,
    {
        Ok(AuthorizationKey {
            term: self.term,
            section: self.section,
            subject: Some(self.subject),
        })
    }
}

impl AuthorizationKeyed for AttendanceRecord {
    fn authorization_key<S>(&self, store: &S) -> Result<AuthorizationKey, AuthzError>
    where
        S: AuthzStore + ?Sized,
    {
        let session = store
            .attendance_session(self.session)
            .ok_or(AuthzError::DanglingReference(EntityRef::AttendanceSession(self.session)))?;
        session.authorization_key(store)
    }
}

impl AuthorizationKeyed for AssessmentScore {
    fn authorization_key<S>(&self, store: &S) -> Result<AuthorizationKey, AuthzError>
    where
        S: AuthzStore + ?Sized,
    {
        let assessment = store
            .assessment(self.assessment)
            .ok_or(AuthzError::DanglingReference(EntityRef::Assessment(self.assessment)))?;
        assessment.authorization_key(store)
    }
}

impl ResourceRef<'_> {
    /// Authorization key of an assignment-gated record.
    ///
    /// Fails with [`AuthzError::InvalidResourceKind`] for every other kind.
    pub fn authorization_key<S>(&self, store: &S) -> Result<AuthorizationKey, AuthzError>
    where
        S: AuthzStore + ?Sized,
    {
        match self {
            ResourceRef::AttendanceSession(session) => session.authorization_key(store),
            ResourceRef::AttendanceRecord(record) => record.authorization_key(store),
            ResourceRef::Assessment(assessment) => assessment.authorization_key(store),
            ResourceRef::AssessmentScore(score) => score.authorization_key(store),
            other => Err(AuthzError::InvalidResourceKind {
                expected: "an assignment-gated kind".to_string(),
                found: other.kind(),
            }),
        }
    }
}

/// Whether `teacher` holds an assignment covering `resource`.
pub fn teacher_may_modify<S>(
    store: &S,
    teacher: TeacherId,
    resource: ResourceRef<'_>,
) -> Result<bool, AuthzError>
where
    S: AuthzStore + ?Sized,
{
    let key = resource.authorization_key(store)?;
    let assignments = store.assignments_for(teacher, key.term, key.section);
    Ok(assignments
        .iter()
        .any(|assignment| key.subject.is_none_or(|subject| assignment.subject == subject)))
}
