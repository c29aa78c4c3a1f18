use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::{LeaderboardRow, PointTransactionRow, UserRow};

impl Database {
    /// Adds `points` (which may be negative) to a user's total and records the
    /// transaction, atomically. Returns false for unknown users. On error the
    /// transaction is dropped uncommitted, which rolls both writes back.
    pub fn award_points(
        &self,
        user_id: i64,
        points: i64,
        action_type: &str,
        description: &str,
        related_entity_id: Option<i64>,
        related_entity_type: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let updated = tx.execute(
                "UPDATE users SET points = points + ?2 WHERE id = ?1",
                (user_id, points),
            )?;
            if updated == 0 {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO point_transactions
                     (user_id, points, action_type, description, related_entity_id, related_entity_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user_id,
                    points,
                    action_type,
                    description,
                    related_entity_id,
                    related_entity_type
                ],
            )?;

            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_user_points(&self, user_id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let points = conn
                .query_row("SELECT points FROM users WHERE id = ?1", [user_id], |row| row.get(0))
                .optional()?;
            Ok(points)
        })
    }

    /// Most recent transactions first.
    pub fn get_user_transactions(&self, user_id: i64, limit: u32) -> Result<Vec<PointTransactionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, points, action_type, description,
                        related_entity_id, related_entity_type, created_at
                 FROM point_transactions
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map((user_id, limit), |row| {
                    Ok(PointTransactionRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        points: row.get(2)?,
                        action_type: row.get(3)?,
                        description: row.get(4)?,
                        related_entity_id: row.get(5)?,
                        related_entity_type: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users with a positive score, ranked by a window function.
    pub fn get_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, username, points,
                        ROW_NUMBER() OVER (ORDER BY points DESC, id ASC) AS rank
                 FROM users
                 WHERE points > 0
                 ORDER BY points DESC, id ASC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(LeaderboardRow {
                        user_id: row.get(0)?,
                        email: row.get(1)?,
                        username: row.get(2)?,
                        points: row.get(3)?,
                        rank: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every user ordered by score, zero-point accounts included.
    pub fn get_top_users(&self, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users ORDER BY points DESC, id ASC LIMIT ?1",
                UserRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], UserRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// 1 + the number of users holding strictly more points.
    pub fn rank_for_points(&self, points: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let rank = conn.query_row(
                "SELECT COUNT(*) + 1 FROM users WHERE points > ?1",
                [points],
                |row| row.get(0),
            )?;
            Ok(rank)
        })
    }
}
