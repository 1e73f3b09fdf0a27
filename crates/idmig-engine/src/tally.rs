//! Counters shared by the role and tenant binders.

use idmig_core::RemoteError;
use serde::{Deserialize, Serialize};

/// Outcome of find-or-create over a set of named entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationTally {
    pub created: Vec<String>,
    /// Rejected by the target as already existing.
    pub existing: Vec<String>,
    pub failed: Vec<(String, String)>,
    /// Entities listed but not written (dry run).
    pub planned: usize,
}

impl CreationTally {
    /// Record the result of creating `name`. Returns whether the entity is
    /// now present in the target.
    pub fn record<T>(&mut self, name: &str, result: &Result<T, RemoteError>) -> bool {
        match result {
            Ok(_) => {
                self.created.push(name.to_string());
                true
            }
            Err(err) if err.is_already_exists() => {
                tracing::debug!(name, "already exists in target");
                self.existing.push(name.to_string());
                true
            }
            Err(err) => {
                tracing::warn!(name, %err, "create failed");
                self.failed.push((name.to_string(), err.to_string()));
                false
            }
        }
    }

    pub(crate) fn sort(&mut self) {
        self.created.sort();
        self.existing.sort();
        self.failed.sort();
    }
}

/// Outcome of binding members to entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingTally {
    /// `(member, entity)` pairs that were bound.
    pub bound: Vec<(String, String)>,
    /// `(member, entity, reason)` triples that could not be bound.
    pub failed: Vec<(String, String, String)>,
    /// Bindings listed but not written (dry run).
    pub planned: usize,
}

impl BindingTally {
    pub fn bound(&mut self, member: &str, entity: &str) {
        self.bound.push((member.to_string(), entity.to_string()));
    }

    pub fn failed(&mut self, member: &str, entity: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(member, entity, %reason, "binding failed");
        self.failed
            .push((member.to_string(), entity.to_string(), reason));
    }

    pub(crate) fn sort(&mut self) {
        self.bound.sort();
        self.failed.sort();
    }
}
