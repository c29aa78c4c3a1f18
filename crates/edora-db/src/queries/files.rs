use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::{MediaFileRow, NewMediaFile};
use crate::queries::placeholders;

impl Database {
    /// Records a batch of stored files in one transaction.
    pub fn insert_media_files(
        &self,
        files: &[NewMediaFile],
        post_id: Option<i64>,
        uploader_id: i64,
    ) -> Result<Vec<MediaFileRow>> {
        if files.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut ids = Vec::with_capacity(files.len());
            for file in files {
                tx.execute(
                    "INSERT INTO media_files (filename, mime_type, size, sha256, post_id, uploader_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        file.filename,
                        file.mime_type,
                        file.size,
                        file.sha256,
                        post_id,
                        uploader_id
                    ],
                )?;
                ids.push(tx.last_insert_rowid());
            }
            tx.commit()?;

            let sql = format!(
                "SELECT {} FROM media_files WHERE id IN ({}) ORDER BY id ASC",
                MediaFileRow::COLUMNS,
                placeholders(ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), MediaFileRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_media_file(&self, id: i64) -> Result<Option<MediaFileRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM media_files WHERE id = ?1", MediaFileRow::COLUMNS);
            Ok(conn.query_row(&sql, [id], MediaFileRow::from_row).optional()?)
        })
    }

    /// Batch-fetch media files for a set of posts.
    pub fn get_files_for_posts(&self, post_ids: &[i64]) -> Result<Vec<MediaFileRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM media_files WHERE post_id IN ({}) ORDER BY id ASC",
                MediaFileRow::COLUMNS,
                placeholders(post_ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(post_ids.iter()), MediaFileRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
