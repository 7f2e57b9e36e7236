//! SQL schema for the Weld SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `AUTOINCREMENT` keeps ids monotonic and never reused, even across
/// deletes. The identity index is partial: uniqueness is enforced over live
/// rows only, so a soft-deleted pair can be re-inserted. SQLite treats NULLs
/// as distinct inside unique indexes, which lets several primaries share a
/// phone transiently until a merge collapses them.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS contacts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT,
    phone       TEXT,
    linked_id   INTEGER REFERENCES contacts(id),
    precedence  TEXT NOT NULL,   -- 'primary' | 'secondary'
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT,            -- set by operator tooling, never by the engine
    CHECK (email IS NOT NULL OR phone IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS contacts_email_idx  ON contacts(email);
CREATE INDEX IF NOT EXISTS contacts_phone_idx  ON contacts(phone);
CREATE INDEX IF NOT EXISTS contacts_linked_idx ON contacts(linked_id);

CREATE UNIQUE INDEX IF NOT EXISTS contacts_identity_idx
    ON contacts(email, phone, linked_id) WHERE deleted_at IS NULL;

PRAGMA user_version = 1;
";
