//! SQL schema for the slotbook SQLite store.
//!
//! Executed once at connection startup and stamped with `PRAGMA
//! user_version`. Future migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS slots (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    date          TEXT    NOT NULL,            -- YYYY-MM-DD
    start_time    TEXT    NOT NULL,            -- HH:MM:SS, no time zone
    is_available  INTEGER NOT NULL DEFAULT 1 CHECK (is_available IN (0, 1)),
    UNIQUE (date, start_time)
);

-- Identity is the exact email string (BINARY collation, case-sensitive).
CREATE TABLE IF NOT EXISTS participants (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name   TEXT    NOT NULL,
    email  TEXT    NOT NULL UNIQUE
);

-- Rows are never deleted; status only moves active -> cancelled.
CREATE TABLE IF NOT EXISTS reservations (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    slot_id         INTEGER NOT NULL REFERENCES slots(id),
    participant_id  INTEGER NOT NULL REFERENCES participants(id),
    status          TEXT    NOT NULL DEFAULT 'active'
                            CHECK (status IN ('active', 'cancelled')),
    reserved_at     TEXT    NOT NULL           -- RFC 3339 UTC; server-assigned
);

-- At most one active reservation per (slot, participant).
CREATE UNIQUE INDEX IF NOT EXISTS reservations_one_active_idx
    ON reservations(slot_id, participant_id)
    WHERE status = 'active';

CREATE INDEX IF NOT EXISTS reservations_slot_idx        ON reservations(slot_id);
CREATE INDEX IF NOT EXISTS reservations_participant_idx ON reservations(participant_id);

PRAGMA user_version = 1;
";
