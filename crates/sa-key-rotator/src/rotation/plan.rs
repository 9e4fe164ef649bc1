//! The rotation decision.
//!
//! Given the user-managed keys of a service account, their recovered labels
//! and the current day, decide whether a new key must be uploaded and which
//! existing keys must go. Pure: no I/O, no clock.
//!
//! Rules, per key:
//! - a key is deleted when it expired (`now > valid_before`, any owner) or
//!   when deletion is forced and the key is ours;
//! - a key of ours still outside its renewal window
//!   (`now < valid_before - window`) makes a new key unnecessary.
//!
//! Keys with another label never suppress creation and are never
//! force-deleted.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::identity::Key;
use crate::rotation::RotationConfig;
use crate::time::sub_days;

/// Why a new key is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateReason {
    /// The service account has no user-managed keys at all.
    NoKeys,
    /// Every owned key is inside its renewal window, or there is none.
    Renewal,
    /// Requested regardless of the existing keys.
    Forced,
}

/// Why an existing key is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    Expired,
    Forced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub key_name: String,
    pub reason: DeleteReason,
}

/// Outcome of [`plan`]: create first, then delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    pub create: Option<CreateReason>,
    pub delete: Vec<Deletion>,
}

impl RotationPlan {
    pub fn is_noop(&self) -> bool {
        self.create.is_none() && self.delete.is_empty()
    }
}

/// Decide what to create and delete for one service account.
pub fn plan(
    keys: &[Key],
    labels: &HashMap<String, String>,
    now: DateTime<FixedOffset>,
    cfg: &RotationConfig,
) -> Result<RotationPlan> {
    if keys.is_empty() {
        return Ok(RotationPlan {
            create: Some(CreateReason::NoKeys),
            delete: Vec::new(),
        });
    }

    let mut create_new = true;
    let mut delete = Vec::new();

    for key in keys {
        let key_id = key.key_name()?.key_id;
        let valid_before = key.valid_before()?;
        let owned = labels.get(&key_id).map(String::as_str) == Some(cfg.label.as_str());

        if now > valid_before {
            delete.push(Deletion {
                key_name: key.name.clone(),
                reason: DeleteReason::Expired,
            });
        } else if cfg.force_delete && owned {
            delete.push(Deletion {
                key_name: key.name.clone(),
                reason: DeleteReason::Forced,
            });
        }

        if !owned {
            continue;
        }

        let pivot = sub_days(valid_before, cfg.window())?;
        if now < pivot {
            create_new = false;
        }
    }

    let create = if cfg.force_create {
        Some(CreateReason::Forced)
    } else if create_new {
        Some(CreateReason::Renewal)
    } else {
        None
    };

    Ok(RotationPlan { create, delete })
}
