use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    AttendanceRecordId, AttendanceSessionId, Entity, EntityRef, OwnerLink, ResourceKind,
    SchoolLink, SectionId, StudentId, TenantScoped, TermId, UserId,
};

/// One roll call for a section on a given day.
///
/// Unique per (term, section, session_date). `created_by` is stamped by the
/// write path with the acting principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: AttendanceSessionId,
    pub term: TermId,
    pub section: SectionId,
    pub session_date: NaiveDate,
    pub created_by: Option<UserId>,
}

impl AttendanceSession {
    pub fn new(term: TermId, section: SectionId, session_date: NaiveDate) -> Self {
        Self {
            id: AttendanceSessionId::new(),
            term,
            section,
            session_date,
            created_by: None,
        }
    }
}

impl Entity for AttendanceSession {
    type Id = AttendanceSessionId;
    const KIND: ResourceKind = ResourceKind::AttendanceSession;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::AttendanceSession(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::Term(self.term), EntityRef::Section(self.section)]
    }
}

impl TenantScoped for AttendanceSession {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Section(self.section))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

/// A student's mark within a session. Unique per (session, student).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceRecordId,
    pub session: AttendanceSessionId,
    pub student: StudentId,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

impl AttendanceRecord {
    pub fn new(session: AttendanceSessionId, student: StudentId, status: AttendanceStatus) -> Self {
        Self {
            id: AttendanceRecordId::new(),
            session,
            student,
            status,
            note: None,
        }
    }
}

impl Entity for AttendanceRecord {
    type Id = AttendanceRecordId;
    const KIND: ResourceKind = ResourceKind::AttendanceRecord;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::AttendanceSession(self.session),
            EntityRef::Student(self.student),
        ]
    }
}

impl TenantScoped for AttendanceRecord {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Student(self.student))
    }

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Student(self.student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_upper_case_wire_names() {
        let json = serde_json::to_string(&AttendanceStatus::Late).unwrap();
        assert_eq!(json, "\"LATE\"");
        let parsed: AttendanceStatus = serde_json::from_str("\"ABSENT\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::Absent);
    }

    #[test]
    fn record_is_owned_by_its_student() {
        let student = StudentId::new();
        let record = AttendanceRecord::new(AttendanceSessionId::new(), student, AttendanceStatus::Present);
        assert_eq!(record.owner_link(), OwnerLink::Student(student));
        assert_eq!(record.school_link(), SchoolLink::Via(EntityRef::Student(student)));
        assert_eq!(record.entity_ref(), None);
    }
}
