//! SQL schema for the Roster SQLite store.
//!
//! Executed once when a pool opens. The constraints here are the final word
//! on uniqueness and references; the store's pre-checks only produce nicer
//! errors on the common path.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS departments (
    department_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1))
);

CREATE TABLE IF NOT EXISTS ranks (
    rank_id   TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1))
);

CREATE TABLE IF NOT EXISTS persons (
    person_id     TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,      -- argon2 PHC string
    system_permis TEXT NOT NULL DEFAULT 'U' CHECK (system_permis IN ('A', 'U')),
    rank_id       TEXT REFERENCES ranks(rank_id) ON DELETE RESTRICT,
    department_id TEXT REFERENCES departments(department_id) ON DELETE RESTRICT,
    is_active     INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1))
);

CREATE INDEX IF NOT EXISTS persons_department_idx ON persons(department_id);
CREATE INDEX IF NOT EXISTS persons_rank_idx       ON persons(rank_id);

PRAGMA user_version = 1;
";
