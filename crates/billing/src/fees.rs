use serde::{Deserialize, Serialize};

use schoolerp_core::{
    AcademicYearId, DomainError, DomainResult, Entity, EntityRef, FeeHeadId, FeeStructureId,
    FeeStructureItemId, GradeId, ResourceKind, SchoolId, SchoolLink, TenantScoped, require_text,
};

/// A named fee category, e.g. "Tuition". Unique per school by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeHead {
    pub id: FeeHeadId,
    pub school: SchoolId,
    pub name: String,
}

impl FeeHead {
    pub fn new(school: SchoolId, name: impl Into<String>) -> Self {
        Self {
            id: FeeHeadId::new(),
            school,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("fee head name", &self.name)
    }
}

impl Entity for FeeHead {
    type Id = FeeHeadId;
    const KIND: ResourceKind = ResourceKind::FeeHead;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::FeeHead(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![EntityRef::School(self.school)]
    }
}

impl TenantScoped for FeeHead {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Direct(self.school)
    }
}

/// The fees charged to a grade for one academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeStructure {
    pub id: FeeStructureId,
    pub academic_year: AcademicYearId,
    pub grade: GradeId,
    pub name: String,
}

impl FeeStructure {
    pub fn new(academic_year: AcademicYearId, grade: GradeId, name: impl Into<String>) -> Self {
        Self {
            id: FeeStructureId::new(),
            academic_year,
            grade,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("fee structure name", &self.name)
    }
}

impl Entity for FeeStructure {
    type Id = FeeStructureId;
    const KIND: ResourceKind = ResourceKind::FeeStructure;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::FeeStructure(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::AcademicYear(self.academic_year),
            EntityRef::Grade(self.grade),
        ]
    }
}

impl TenantScoped for FeeStructure {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Grade(self.grade))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeStructureItem {
    pub id: FeeStructureItemId,
    pub fee_structure: FeeStructureId,
    pub fee_head: FeeHeadId,
    pub amount: u64,
}

impl FeeStructureItem {
    pub fn new(fee_structure: FeeStructureId, fee_head: FeeHeadId, amount: u64) -> Self {
        Self {
            id: FeeStructureItemId::new(),
            fee_structure,
            fee_head,
            amount,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.amount == 0 {
            return Err(DomainError::validation("fee amount must be positive"));
        }
        Ok(())
    }
}

impl Entity for FeeStructureItem {
    type Id = FeeStructureItemId;
    const KIND: ResourceKind = ResourceKind::FeeStructureItem;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::FeeStructure(self.fee_structure),
            EntityRef::FeeHead(self.fee_head),
        ]
    }
}

impl TenantScoped for FeeStructureItem {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::FeeStructure(self.fee_structure))
    }
}
