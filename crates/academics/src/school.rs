use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    DomainResult, Entity, EntityRef, ResourceKind, SchoolId, SchoolLink, TenantScoped,
    require_text,
};

/// A school: the tenant boundary every other record hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    /// Optional short code, unique across schools when set.
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl School {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SchoolId::new(),
            name: name.into(),
            code: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("school name", &self.name)?;
        if let Some(code) = &self.code {
            require_text("school code", code)?;
        }
        Ok(())
    }
}

impl Entity for School {
    type Id = SchoolId;
    const KIND: ResourceKind = ResourceKind::School;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::School(self.id))
    }
}

impl TenantScoped for School {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Direct(self.id)
    }
}
