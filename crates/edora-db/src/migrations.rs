use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                email           TEXT NOT NULL UNIQUE,
                username        TEXT UNIQUE,
                hashed_password TEXT NOT NULL,
                role            TEXT NOT NULL DEFAULT 'user',
                points          INTEGER NOT NULL DEFAULT 0,
                is_active       INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_users_points ON users(points DESC);

            CREATE TABLE channels (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL UNIQUE,
                bio             TEXT,
                logo_filename   TEXT,
                owner_id        INTEGER NOT NULL REFERENCES users(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE channel_members (
                channel_id      INTEGER NOT NULL REFERENCES channels(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                joined_at       TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (channel_id, user_id)
            );

            CREATE TABLE posts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                content         TEXT NOT NULL,
                channel_id      INTEGER NOT NULL REFERENCES channels(id),
                author_id       INTEGER NOT NULL REFERENCES users(id),
                is_flagged      INTEGER NOT NULL DEFAULT 0,
                flag_reason     TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(channel_id, title)
            );

            CREATE INDEX idx_posts_channel ON posts(channel_id, created_at);

            CREATE TABLE media_files (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                filename        TEXT NOT NULL,
                mime_type       TEXT NOT NULL,
                size            INTEGER NOT NULL,
                sha256          TEXT NOT NULL,
                post_id         INTEGER REFERENCES posts(id),
                uploader_id     INTEGER REFERENCES users(id),
                uploaded_at     TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_media_files_post ON media_files(post_id);

            CREATE TABLE comments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                content         TEXT NOT NULL,
                post_id         INTEGER NOT NULL REFERENCES posts(id),
                author_id       INTEGER NOT NULL REFERENCES users(id),
                parent_id       INTEGER REFERENCES comments(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_comments_post ON comments(post_id, created_at);

            CREATE TABLE post_reactions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                reaction_type   TEXT NOT NULL CHECK (reaction_type IN ('like', 'dislike')),
                post_id         INTEGER NOT NULL REFERENCES posts(id),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(post_id, user_id)
            );

            CREATE TABLE saved_posts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                post_id         INTEGER NOT NULL REFERENCES posts(id),
                saved_at        TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, post_id)
            );

            CREATE TABLE flagged_words (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                word            TEXT NOT NULL UNIQUE,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE refresh_tokens (
                id              TEXT PRIMARY KEY,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                expires_at      TEXT NOT NULL,
                revoked         INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_refresh_tokens_user ON refresh_tokens(user_id);

            CREATE TABLE point_transactions (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id             INTEGER NOT NULL REFERENCES users(id),
                points              INTEGER NOT NULL,
                action_type         TEXT NOT NULL,
                description         TEXT NOT NULL,
                related_entity_id   INTEGER,
                related_entity_type TEXT,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_point_transactions_user ON point_transactions(user_id, created_at);

            CREATE TABLE audit_logs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                actor_id        INTEGER REFERENCES users(id),
                action          TEXT NOT NULL,
                object_type     TEXT NOT NULL,
                object_id       INTEGER,
                data            TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
