use std::collections::HashSet;

use thiserror::Error;

use crate::api::{ApiError, Client};
use crate::store::RecordStore;

#[derive(Debug, Error)]
pub enum MutationError {
    /// A guard, not a fault: the id is already mid-deletion and the new
    /// request is rejected without reaching the backend.
    #[error("delete already in progress for user {id}")]
    Conflict { id: i64 },

    #[error("could not delete user: {source}")]
    Failed {
        #[source]
        source: ApiError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Orchestrates deletion: at most one in-flight request per id, local
/// removal only after the backend confirms. Each id is independent; a
/// failure for one never rolls back another.
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    in_flight: HashSet<i64>,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, id: i64) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn begin(&mut self, id: i64) -> Result<(), MutationError> {
        if !self.in_flight.insert(id) {
            return Err(MutationError::Conflict { id });
        }
        Ok(())
    }

    pub fn finish(&mut self, id: i64) {
        self.in_flight.remove(&id);
    }

    /// Deletes one record. `confirm` runs before the network call; the
    /// destructive action needs an explicit yes. On backend failure the
    /// store is left untouched and the caller gets the error to surface.
    pub async fn delete_record<F>(
        &mut self,
        client: &Client,
        store: &mut RecordStore,
        id: i64,
        confirm: F,
    ) -> Result<DeleteOutcome, MutationError>
    where
        F: FnOnce(i64) -> bool,
    {
        self.begin(id)?;

        if !confirm(id) {
            self.finish(id);
            return Ok(DeleteOutcome::Cancelled);
        }

        let result = client.delete_user(id).await;
        self.finish(id);

        match result {
            Ok(()) => {
                store.remove(id);
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => Err(MutationError::Failed { source: e }),
        }
    }
}
