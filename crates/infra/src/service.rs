//! Guarded record service: every read and write over the school store goes
//! through an authorization decision first.
//!
//! ```text
//! request
//!   ↓
//! 1. decide (kind-level for reads, object-level for writes)
//!   ↓
//! 2. writes: stamp audit attributes + check constraints + write   (one lock)
//!    reads:  load rows + scope to what the principal may see
//! ```
//!
//! Rows outside the principal's scope read as not found. A denied write never
//! reaches the store.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use schoolerp_auth::{AccessDecisionEngine, Action, AuthzError, Principal};
use schoolerp_core::ResourceKind;

use crate::store::{SchoolStore, StoreError, Stored, Tables};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Store(StoreError::NotFound))
    }
}

pub struct RecordService {
    store: Arc<SchoolStore>,
    engine: AccessDecisionEngine<Arc<SchoolStore>>,
}

impl RecordService {
    pub fn new(engine: AccessDecisionEngine<Arc<SchoolStore>>) -> Self {
        Self {
            store: engine.store().clone(),
            engine,
        }
    }

    pub fn engine(&self) -> &AccessDecisionEngine<Arc<SchoolStore>> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<SchoolStore> {
        &self.store
    }

    pub fn list<T: Stored>(&self, principal: Option<&Principal>) -> Result<Vec<T>, ServiceError> {
        let principal = self.authorize(principal, Action::List, None::<&T>)?;
        let rows = self.store.all::<T>()?;
        Ok(self.engine.scope(principal, rows))
    }

    pub fn retrieve<T: Stored>(
        &self,
        principal: Option<&Principal>,
        id: T::Id,
    ) -> Result<T, ServiceError> {
        let principal = self.authorize(principal, Action::Retrieve, None::<&T>)?;
        self.visible::<T>(principal, &id)
    }

    pub fn create<T: Stored>(&self, principal: Option<&Principal>, row: T) -> Result<T, ServiceError> {
        let actor = self.authorize(principal, Action::Create, Some(&row))?.id();
        let mut row = row;
        self.write(T::KIND, Action::Create, |tables| {
            row.stamp_created(actor, Utc::now());
            tables.insert(row.clone())?;
            Ok(row)
        })
    }

    /// Replace a stored row. Both the stored and the incoming version must be
    /// writable by the principal.
    pub fn update<T: Stored>(&self, principal: Option<&Principal>, row: T) -> Result<T, ServiceError> {
        let current = self.authenticated(principal)?;
        let stored = self.visible::<T>(current, row.id())?;
        self.authorize(principal, Action::Update, Some(&stored))?;
        let actor = self.authorize(principal, Action::Update, Some(&row))?.id();
        let mut row = row;
        self.write(T::KIND, Action::Update, |tables| {
            let stored = tables.get::<T>(row.id()).ok_or(StoreError::NotFound)?;
            row.carry_over(stored);
            row.stamp_updated(actor, Utc::now());
            tables.update(row.clone())?;
            Ok(row)
        })
    }

    pub fn delete<T: Stored>(&self, principal: Option<&Principal>, id: T::Id) -> Result<T, ServiceError> {
        let current = self.authenticated(principal)?;
        let stored = self.visible::<T>(current, &id)?;
        self.authorize(principal, Action::Delete, Some(&stored))?;
        self.write(T::KIND, Action::Delete, |tables| tables.remove::<T>(&id))
    }

    fn authenticated<'p>(&self, principal: Option<&'p Principal>) -> Result<&'p Principal, ServiceError> {
        match principal {
            Some(p) if p.is_active() => Ok(p),
            _ => Err(AuthzError::AuthenticationRequired.into()),
        }
    }

    fn authorize<'p, T: Stored>(
        &self,
        principal: Option<&'p Principal>,
        action: Action,
        object: Option<&T>,
    ) -> Result<&'p Principal, ServiceError> {
        self.engine
            .authorize(principal, action, T::KIND, object.map(|o| o.as_resource()))?;
        self.authenticated(principal)
    }

    fn visible<T: Stored>(&self, principal: &Principal, id: &T::Id) -> Result<T, ServiceError> {
        match self.store.get::<T>(id)? {
            Some(row) if self.engine.is_visible(principal, &row) => Ok(row),
            _ => Err(StoreError::NotFound.into()),
        }
    }

    fn write<R>(
        &self,
        kind: ResourceKind,
        action: Action,
        f: impl FnOnce(&mut Tables) -> Result<R, StoreError>,
    ) -> Result<R, ServiceError> {
        self.store.transaction(f).map_err(|err| {
            if let StoreError::IntegrityConstraintViolation(reason) = &err {
                tracing::warn!(kind = %kind, action = %action, "write rejected: {reason}");
            }
            err.into()
        })
    }
}
