// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for mutations of singly-owned resources.
//!
//! Every mutating handler loads the resource fresh and runs it through
//! [`OwnershipCheck::verify_owner`] before touching the store. Decisions are
//! never cached between requests.

use crate::auth::CallerIdentity;

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_id(&self) -> u64;

    /// Human readable resource kind used in error messages.
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        "resource"
    }
}

/// Ownership failures. Rendered as 404 and 403 at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    #[error("{} not found", capitalize(.kind))]
    NotFound { kind: &'static str },

    #[error("You are not authorized to {action} this {kind}")]
    Forbidden {
        kind: &'static str,
        action: &'static str,
        user_id: u64,
    },
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Extension trait for optional ownership verification.
pub trait OwnershipCheck<T> {
    /// Verify `caller` owns the resource and return it.
    ///
    /// `action` names the attempted operation, e.g. `"update"`.
    fn verify_owner(self, caller: &CallerIdentity, action: &'static str)
        -> Result<T, OwnershipError>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn verify_owner(
        self,
        caller: &CallerIdentity,
        action: &'static str,
    ) -> Result<T, OwnershipError> {
        let kind = T::kind();
        match self {
            None => Err(OwnershipError::NotFound { kind }),
            Some(resource) if resource.owner_id() == caller.id => Ok(resource),
            Some(_) => {
                tracing::info!(
                    user_id = caller.id,
                    action,
                    kind,
                    "Ownership check rejected request"
                );
                Err(OwnershipError::Forbidden {
                    kind,
                    action,
                    user_id: caller.id,
                })
            }
        }
    }
}
