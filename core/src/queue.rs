//! Pending-upload queue — admin-reviewable CSV batches.
//!
//! A batch is applied to the account store at most once: approve and
//! reject are guarded transitions out of Pending, enforced here by the
//! store's conditional UPDATE. Rejected batches keep their data for
//! audit.

use crate::{
    config::DeskConfig,
    error::{FraudDbError, FraudDbResult},
    normalize::NormalizedRow,
    resolver::{AssociationResolver, ImportSummary},
    rng::ImportRng,
    store::Store,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Approved,
    Rejected,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted CSV batch awaiting review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUpload {
    pub upload_id: String,
    pub upload_date: String,
    pub company_name: String,
    pub file_name: String,
    pub record_count: i64,
    pub status: UploadStatus,
    pub data: Vec<NormalizedRow>,
}

/// Queue a batch for review. No dedup across batches.
pub fn submit(
    store: &Store,
    company_name: &str,
    file_name: &str,
    rows: Vec<NormalizedRow>,
) -> FraudDbResult<PendingUpload> {
    if rows.is_empty() {
        return Err(FraudDbError::EmptyBatch);
    }
    let upload = PendingUpload {
        upload_id: Uuid::new_v4().to_string(),
        upload_date: Utc::now().to_rfc3339(),
        company_name: company_name.to_string(),
        file_name: file_name.to_string(),
        record_count: rows.len() as i64,
        status: UploadStatus::Pending,
        data: rows,
    };
    store.insert_pending_upload(&upload)?;
    log::info!(
        "Upload {} queued: {} row(s) from '{}'",
        upload.upload_id,
        upload.record_count,
        company_name
    );
    Ok(upload)
}

/// Approve a pending batch: transition it, then run the resolver over
/// its rows. The transition happens first so a retried approval can
/// never apply the batch twice.
pub fn approve(
    store: &Store,
    config: &DeskConfig,
    rng: &mut ImportRng,
    resolver: &AssociationResolver,
    upload_id: &str,
    approved_by: &str,
) -> FraudDbResult<ImportSummary> {
    let upload = store
        .get_pending_upload(upload_id)?
        .ok_or_else(|| FraudDbError::UploadNotFound {
            id: upload_id.to_string(),
        })?;
    if !store.transition_upload(upload_id, UploadStatus::Approved)? {
        return Err(FraudDbError::InvalidUploadState {
            id: upload_id.to_string(),
            status: upload.status.to_string(),
        });
    }
    resolver.apply_batch(
        store,
        config,
        rng,
        &upload.company_name,
        approved_by,
        &upload.data,
    )
}

/// Reject a pending batch. The account store is untouched; the batch
/// data is retained for audit.
pub fn reject(store: &Store, upload_id: &str) -> FraudDbResult<()> {
    let upload = store
        .get_pending_upload(upload_id)?
        .ok_or_else(|| FraudDbError::UploadNotFound {
            id: upload_id.to_string(),
        })?;
    if !store.transition_upload(upload_id, UploadStatus::Rejected)? {
        return Err(FraudDbError::InvalidUploadState {
            id: upload_id.to_string(),
            status: upload.status.to_string(),
        });
    }
    log::info!("Upload {upload_id} rejected; data retained for audit");
    Ok(())
}
