use anyhow::Result;

use crate::Database;
use crate::models::FlaggedWordRow;

impl Database {
    pub fn list_flagged_words(&self) -> Result<Vec<FlaggedWordRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, word, created_at FROM flagged_words ORDER BY id ASC")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(FlaggedWordRow {
                        id: row.get(0)?,
                        word: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns `None` when the word is already on the list.
    pub fn add_flagged_word(&self, word: &str) -> Result<Option<FlaggedWordRow>> {
        self.with_conn(|conn| {
            let inserted =
                conn.execute("INSERT OR IGNORE INTO flagged_words (word) VALUES (?1)", [word])?;
            if inserted == 0 {
                return Ok(None);
            }
            let row = conn.query_row(
                "SELECT id, word, created_at FROM flagged_words WHERE id = ?1",
                [conn.last_insert_rowid()],
                |row| {
                    Ok(FlaggedWordRow {
                        id: row.get(0)?,
                        word: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )?;
            Ok(Some(row))
        })
    }

    /// Returns false when the word was not on the list.
    pub fn delete_flagged_word(&self, word: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM flagged_words WHERE word = ?1", [word])?;
            Ok(removed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn words_are_unique() {
        let db = Database::open_in_memory().unwrap();
        let row = db.add_flagged_word("spam").unwrap().unwrap();
        assert_eq!(row.word, "spam");
        assert!(db.add_flagged_word("spam").unwrap().is_none());
        db.add_flagged_word("scam").unwrap().unwrap();

        let words: Vec<_> = db.list_flagged_words().unwrap().into_iter().map(|w| w.word).collect();
        assert_eq!(words, vec!["spam", "scam"]);

        assert!(db.delete_flagged_word("spam").unwrap());
        assert!(!db.delete_flagged_word("spam").unwrap());
    }
}
