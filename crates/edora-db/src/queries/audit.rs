use anyhow::Result;

use crate::Database;
use crate::models::AuditLogRow;

impl Database {
    pub fn insert_audit_log(
        &self,
        actor_id: Option<i64>,
        action: &str,
        object_type: &str,
        object_id: Option<i64>,
        data: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO audit_logs (actor_id, action, object_type, object_id, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (actor_id, action, object_type, object_id, data),
            )?;
            Ok(())
        })
    }

    pub fn list_audit_logs(&self, limit: u32) -> Result<Vec<AuditLogRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, actor_id, action, object_type, object_id, data, created_at
                 FROM audit_logs
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(AuditLogRow {
                        id: row.get(0)?,
                        actor_id: row.get(1)?,
                        action: row.get(2)?,
                        object_type: row.get(3)?,
                        object_id: row.get(4)?,
                        data: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn newest_entries_first() {
        let db = Database::open_in_memory().unwrap();
        let admin = db.create_user("root@example.com", None, "h", "admin").unwrap().unwrap();

        db.insert_audit_log(Some(admin.id), "flagged_word.add", "flagged_word", Some(1), Some(r#"{"word":"spam"}"#))
            .unwrap();
        db.insert_audit_log(None, "post.approve", "post", Some(7), None).unwrap();

        let logs = db.list_audit_logs(10).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action, "post.approve");
        assert_eq!(logs[1].data.as_deref(), Some(r#"{"word":"spam"}"#));
        assert_eq!(db.list_audit_logs(1).unwrap().len(), 1);
    }
}
