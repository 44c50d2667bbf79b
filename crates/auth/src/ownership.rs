//! Principal → profile resolution.
//!
//! Absence is not an error: a STUDENT account without a Student record simply
//! owns nothing.

use schoolerp_core::{StudentId, TeacherId};

use crate::{AuthzStore, Principal, Role};

/// The Student record owned by a STUDENT principal.
pub fn resolve_owned_student<S>(store: &S, principal: &Principal) -> Option<StudentId>
where
    S: AuthzStore + ?Sized,
{
    if principal.role() != Role::Student {
        return None;
    }
    store.student_owned_by(principal.id())
}

/// The Teacher record owned by a TEACHER principal.
pub fn resolve_owned_teacher<S>(store: &S, principal: &Principal) -> Option<TeacherId>
where
    S: AuthzStore + ?Sized,
{
    if principal.role() != Role::Teacher {
        return None;
    }
    store.teacher_owned_by(principal.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureStore;
    use schoolerp_core::{SchoolId, UserId};

    #[test]
    fn student_profile_requires_student_role() {
        let school = SchoolId::new();
        let user = UserId::new();
        let student = StudentId::new();
        let mut store = FixtureStore::default();
        store.link_student(user, student);

        let as_student = Principal::member(user, school, Role::Student);
        assert_eq!(resolve_owned_student(&store, &as_student), Some(student));

        let as_registrar = Principal::member(user, school, Role::Registrar);
        assert_eq!(resolve_owned_student(&store, &as_registrar), None);
    }

    #[test]
    fn missing_profile_is_none() {
        let store = FixtureStore::default();
        let teacher = Principal::member(UserId::new(), SchoolId::new(), Role::Teacher);
        assert_eq!(resolve_owned_teacher(&store, &teacher), None);
    }
}
