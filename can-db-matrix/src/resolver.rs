//! Signal worklist resolution
//!
//! The worklist collaborator supplies a priority-ranked list of signal names,
//! each tagged as categorical (enumerated) or continuous. This module splits
//! that list into the two sequences the downstream decoding collaborator
//! extracts per channel, and picks the identity/time-key signal used to align
//! original and replay runs. No decoding happens here; this is pure name
//! classification against already-resolved database metadata.

use crate::matrix::ChannelMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One externally supplied worklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WantedSignal {
    /// Signal name as it appears in the database files
    pub name: String,
    /// True if the collaborator tagged the signal as enumerated
    pub categorical: bool,
}

/// The classified worklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalPlan {
    /// The identity/time-key signal name
    pub identity_key: String,
    /// Enumerated signal names, identity key included, worklist order kept
    pub categorical: Vec<String>,
    /// Plain signal names, worklist order kept
    pub continuous: Vec<String>,
}

/// Pick the identity key: the first worklist name containing both `camera`
/// and `id` case-insensitively, the caller-supplied fallback otherwise.
pub fn identity_key(worklist: &[WantedSignal], fallback: &str) -> String {
    worklist
        .iter()
        .map(|wanted| wanted.name.as_str())
        .find(|name| {
            let lower = name.to_lowercase();
            lower.contains("camera") && lower.contains("id")
        })
        .unwrap_or(fallback)
        .to_string()
}

/// Split the worklist into categorical and continuous sequences.
///
/// The identity key always lands in the categorical sequence regardless of
/// its external tag; when the fallback key appears in no worklist entry it is
/// prepended so downstream alignment can still find it.
pub fn classify(worklist: &[WantedSignal], fallback: &str) -> SignalPlan {
    let identity_key = identity_key(worklist, fallback);
    let mut categorical = Vec::new();
    let mut continuous = Vec::new();
    let mut key_seen = false;

    for wanted in worklist {
        if wanted.name == identity_key {
            key_seen = true;
            categorical.push(wanted.name.clone());
        } else if wanted.categorical {
            categorical.push(wanted.name.clone());
        } else {
            continuous.push(wanted.name.clone());
        }
    }
    if !key_seen {
        categorical.insert(0, identity_key.clone());
    }

    SignalPlan {
        identity_key,
        categorical,
        continuous,
    }
}

/// Map each wanted signal to the channels that define it.
///
/// Names no channel defines, and entries whose external tag disagrees with
/// the presence of a value table in the database, are logged; neither is an
/// error, the entry simply resolves to fewer (or zero) channels.
pub fn locate(worklist: &[WantedSignal], matrix: &ChannelMatrix) -> BTreeMap<String, Vec<String>> {
    let mut locations = BTreeMap::new();
    for wanted in worklist {
        let owners = matrix.owners(&wanted.name);
        if owners.is_empty() {
            log::warn!("signal `{}` not defined on any channel", wanted.name);
        } else {
            let channel = owners[0];
            let enumerated = matrix
                .channel(channel)
                .and_then(|index| index.signal(&wanted.name))
                .map(|signal| signal.is_enumerated())
                .unwrap_or(false);
            if enumerated != wanted.categorical {
                log::warn!(
                    "signal `{}` tagged {} but database says {}",
                    wanted.name,
                    if wanted.categorical { "categorical" } else { "continuous" },
                    if enumerated { "enumerated" } else { "plain" }
                );
            }
        }
        locations.insert(
            wanted.name.clone(),
            owners.into_iter().map(String::from).collect(),
        );
    }
    locations
}
