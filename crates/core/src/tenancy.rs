//! Tenancy and ownership links.
//!
//! Rows do not all carry a school column: a `Section` only knows its `Grade`, an
//! `AttendanceRecord` only its session and student. [`TenantScoped`] lets each
//! row say how it reaches its school (and, for student-owned rows, its owner),
//! and [`LinkResolver`] walks those chains through whatever store holds the
//! parents.

use serde::{Deserialize, Serialize};

use crate::entity::EntityRef;
use crate::id::{SchoolId, StudentId, TeacherId};

/// Upper bound on reference hops when resolving a chain.
///
/// The longest chain in the model (score → assessment → term → year → school)
/// needs four hops; anything deeper is treated as unresolvable.
pub const MAX_LINK_DEPTH: usize = 8;

/// How a row reaches its school of record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolLink {
    /// The row carries the school column itself.
    Direct(SchoolId),
    /// The school is the school of the referenced row.
    Via(EntityRef),
    /// The row belongs to no tenant (e.g. a superuser account).
    Unaffiliated,
}

/// Which student a row belongs to, if any.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerLink {
    Student(StudentId),
    /// The owner is the owner of the referenced row.
    Via(EntityRef),
    Unowned,
}

/// Links of one stored row, as reported by a [`LinkResolver`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordLinks {
    pub school: SchoolLink,
    pub owner: OwnerLink,
}

/// Helper trait for tenant-scoped records.
pub trait TenantScoped {
    fn school_link(&self) -> SchoolLink;

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Unowned
    }

    /// The teacher profile this row *is*, for `Teacher` rows.
    fn teacher_profile(&self) -> Option<TeacherId> {
        None
    }

    fn links(&self) -> RecordLinks {
        RecordLinks {
            school: self.school_link(),
            owner: self.owner_link(),
        }
    }
}

/// Lookup of parent rows by reference.
///
/// Implemented by the collaborating store. Resolution is read-only; `None`
/// means the referenced row does not exist.
pub trait LinkResolver: Send + Sync {
    fn links(&self, target: EntityRef) -> Option<RecordLinks>;

    /// Follow a school link to the school of record.
    ///
    /// `Ok(None)` for unaffiliated rows. A dangling reference, or a chain
    /// deeper than [`MAX_LINK_DEPTH`], fails with the last reference followed.
    fn try_school_of(&self, link: SchoolLink) -> Result<Option<SchoolId>, EntityRef> {
        let mut link = link;
        let mut last = None;
        for _ in 0..MAX_LINK_DEPTH {
            match link {
                SchoolLink::Direct(school) => return Ok(Some(school)),
                SchoolLink::Unaffiliated => return Ok(None),
                SchoolLink::Via(parent) => {
                    last = Some(parent);
                    link = self.links(parent).ok_or(parent)?.school;
                }
            }
        }
        match last {
            Some(parent) => Err(parent),
            None => Ok(None),
        }
    }

    /// Like [`LinkResolver::try_school_of`], with unresolvable chains read as
    /// having no school.
    fn school_of(&self, link: SchoolLink) -> Option<SchoolId> {
        self.try_school_of(link).ok().flatten()
    }

    /// Follow an owner link to the owning student.
    fn owner_of(&self, link: OwnerLink) -> Option<StudentId> {
        let mut link = link;
        for _ in 0..MAX_LINK_DEPTH {
            match link {
                OwnerLink::Student(student) => return Some(student),
                OwnerLink::Unowned => return None,
                OwnerLink::Via(parent) => link = self.links(parent)?.owner,
            }
        }
        None
    }
}

impl<R> LinkResolver for std::sync::Arc<R>
where
    R: LinkResolver + ?Sized,
{
    fn links(&self, target: EntityRef) -> Option<RecordLinks> {
        (**self).links(target)
    }
}
