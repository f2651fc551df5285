use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::gateway::{EvidenceFile, StorageGateway};

/// Evidence categories collected during intake.
///
/// `Damage` accepts any number of photos; `Police` and `Estimate` each hold
/// exactly one document, last write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceCategory {
    Damage,
    Police,
    Estimate,
}

impl EvidenceCategory {
    /// Folder label passed to the storage gateway.
    pub fn folder(self) -> &'static str {
        match self {
            EvidenceCategory::Damage => "damage",
            EvidenceCategory::Police => "police",
            EvidenceCategory::Estimate => "estimate",
        }
    }
}

/// Upload a batch of files concurrently and aggregate their references in
/// submission order.
///
/// The batch resolves as a single unit: every upload runs to completion
/// (wait-for-all), and if any of them failed the whole call fails and no
/// references are returned. Objects stored by the successful uploads of a
/// failed batch are never referenced afterwards; they stay orphaned in the
/// remote store and no cleanup is attempted.
pub async fn submit_batch(
    storage: &dyn StorageGateway,
    files: &[EvidenceFile],
    category: EvidenceCategory,
) -> Result<Vec<String>> {
    let folder = category.folder();
    info!(category = folder, count = files.len(), "Submitting upload batch");

    let settled = join_all(files.iter().map(|file| storage.upload(file, folder))).await;

    let mut uris = Vec::with_capacity(settled.len());
    for outcome in settled {
        match outcome {
            Ok(uri) => uris.push(uri),
            Err(e) => {
                warn!(category = folder, error = %e, "Upload batch failed, discarding results");
                return Err(e);
            }
        }
    }

    info!(category = folder, count = uris.len(), "Upload batch complete");
    Ok(uris)
}

/// Published evidence references for one session.
///
/// Only references from fully successful batches ever land here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceState {
    pub damage_uris: Vec<String>,
    pub police_uri: Option<String>,
    pub estimate_uri: Option<String>,
}

impl EvidenceState {
    /// Record a successful batch. Damage photos accumulate; the police and
    /// estimate slots take the first file of the batch, replacing any
    /// earlier upload.
    pub fn publish(&mut self, category: EvidenceCategory, uris: Vec<String>) {
        match category {
            EvidenceCategory::Damage => self.damage_uris.extend(uris),
            EvidenceCategory::Police => {
                if let Some(first) = uris.into_iter().next() {
                    self.police_uri = Some(first);
                }
            }
            EvidenceCategory::Estimate => {
                if let Some(first) = uris.into_iter().next() {
                    self.estimate_uri = Some(first);
                }
            }
        }
    }

    /// Drop collected document references so a new document batch can begin
    /// cleanly. Damage photos are unaffected.
    pub fn reset_documents(&mut self) {
        self.police_uri = None;
        self.estimate_uri = None;
    }

    /// The damage "done" action unlocks once at least one photo batch has
    /// published references.
    pub fn damage_done_enabled(&self) -> bool {
        !self.damage_uris.is_empty()
    }

    /// The documents "done" action unlocks only when both slots hold a
    /// reference.
    pub fn documents_done_enabled(&self) -> bool {
        self.police_uri.is_some() && self.estimate_uri.is_some()
    }
}
