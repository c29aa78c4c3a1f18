use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::{CommentRow, CommentWithAuthorRow};

impl Database {
    pub fn create_comment(
        &self,
        content: &str,
        post_id: i64,
        author_id: i64,
        parent_id: Option<i64>,
    ) -> Result<CommentRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (content, post_id, author_id, parent_id) VALUES (?1, ?2, ?3, ?4)",
                (content, post_id, author_id, parent_id),
            )?;
            let id = conn.last_insert_rowid();
            query_comment(conn, id)?.ok_or_else(|| anyhow!("Comment {} vanished after insert", id))
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    /// Comments on a post with their author's email and username, oldest first.
    pub fn list_comments_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthorRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch author details in a single query
            let sql = format!(
                "SELECT {}, u.email, u.username
                 FROM comments c
                 JOIN users u ON c.author_id = u.id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.id ASC",
                CommentRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentWithAuthorRow {
                        comment: CommentRow::from_row(row)?,
                        author_email: row.get(7)?,
                        author_username: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_comment(&self, id: i64, content: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE comments SET content = ?2, updated_at = datetime('now') WHERE id = ?1",
                (id, content),
            )?;
            query_comment(conn, id)
        })
    }

    /// Deletes a comment and every reply beneath it. Returns the number of
    /// rows removed.
    pub fn delete_comment_tree(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM comments WHERE id IN (
                     WITH RECURSIVE subtree(id) AS (
                         SELECT ?1
                         UNION ALL
                         SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
                     )
                     SELECT id FROM subtree
                 )",
                [id],
            )?;
            Ok(removed)
        })
    }
}

fn query_comment(conn: &Connection, id: i64) -> Result<Option<CommentRow>> {
    let sql = format!("SELECT {} FROM comments c WHERE c.id = ?1", CommentRow::COLUMNS);
    Ok(conn.query_row(&sql, [id], CommentRow::from_row).optional()?)
}
