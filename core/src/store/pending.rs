//! Pending-upload persistence.

use super::Store;
use crate::{
    error::FraudDbResult,
    queue::{PendingUpload, UploadStatus},
};
use rusqlite::{params, OptionalExtension};

type UploadColumns = (String, String, String, String, i64, String, String);

impl Store {
    pub fn insert_pending_upload(&self, upload: &PendingUpload) -> FraudDbResult<()> {
        self.conn.execute(
            "INSERT INTO pending_upload (upload_id, upload_date, company_name,
                                         file_name, record_count, status, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                upload.upload_id,
                upload.upload_date,
                upload.company_name,
                upload.file_name,
                upload.record_count,
                upload.status.as_str(),
                serde_json::to_string(&upload.data)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_pending_upload(&self, upload_id: &str) -> FraudDbResult<Option<PendingUpload>> {
        let columns = self
            .conn
            .query_row(
                "SELECT upload_id, upload_date, company_name, file_name,
                        record_count, status, data
                 FROM pending_upload WHERE upload_id = ?1",
                params![upload_id],
                upload_columns,
            )
            .optional()?;
        columns.map(assemble_upload).transpose()
    }

    /// All uploads in submission order, regardless of status.
    pub fn list_uploads(&self) -> FraudDbResult<Vec<PendingUpload>> {
        let mut stmt = self.conn.prepare(
            "SELECT upload_id, upload_date, company_name, file_name,
                    record_count, status, data
             FROM pending_upload ORDER BY rowid ASC",
        )?;
        let raw = stmt
            .query_map([], upload_columns)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut uploads = Vec::with_capacity(raw.len());
        for columns in raw {
            uploads.push(assemble_upload(columns)?);
        }
        Ok(uploads)
    }

    /// Conditional transition out of Pending. Returns false when the
    /// upload was not pending, leaving it untouched; this is what
    /// makes approval at-most-once.
    pub fn transition_upload(&self, upload_id: &str, to: UploadStatus) -> FraudDbResult<bool> {
        let changed = self.conn.execute(
            "UPDATE pending_upload SET status = ?1
             WHERE upload_id = ?2 AND status = 'pending'",
            params![to.as_str(), upload_id],
        )?;
        Ok(changed > 0)
    }
}

fn upload_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<UploadColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn assemble_upload(columns: UploadColumns) -> FraudDbResult<PendingUpload> {
    let (upload_id, upload_date, company_name, file_name, record_count, status, data) = columns;
    let status = UploadStatus::parse(&status)
        .ok_or_else(|| anyhow::anyhow!("Unknown upload status '{status}' for {upload_id}"))?;
    Ok(PendingUpload {
        upload_id,
        upload_date,
        company_name,
        file_name,
        record_count,
        status,
        data: serde_json::from_str(&data)?,
    })
}
