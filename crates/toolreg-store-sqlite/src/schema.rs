//! SQL schema for the tool registry SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tools (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT    NOT NULL UNIQUE,
    display_name       TEXT    NOT NULL,
    description        TEXT    NOT NULL,
    version            TEXT    NOT NULL DEFAULT '1.0.0',
    input_schema       TEXT    NOT NULL,   -- JSON document
    output_schema      TEXT,               -- JSON document or NULL
    function_signature TEXT    NOT NULL,
    category           TEXT,
    tags               TEXT,               -- JSON array or NULL
    documentation_url  TEXT,
    status             TEXT    NOT NULL DEFAULT 'active',  -- 'active' | 'deprecated' | 'archived'
    is_public          INTEGER NOT NULL DEFAULT 1,
    requires_auth      INTEGER NOT NULL DEFAULT 0,
    usage_count        INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT    NOT NULL,   -- RFC 3339 UTC; server-assigned
    updated_at         TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS bundles (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT    NOT NULL UNIQUE,
    display_name      TEXT    NOT NULL,
    description       TEXT    NOT NULL,
    version           TEXT    NOT NULL DEFAULT '1.0.0',
    author            TEXT,
    category          TEXT,
    tags              TEXT,
    icon_url          TEXT,
    documentation_url TEXT,
    repository_url    TEXT,
    is_public         INTEGER NOT NULL DEFAULT 1,
    is_published      INTEGER NOT NULL DEFAULT 0,
    download_count    INTEGER NOT NULL DEFAULT 0,
    star_count        INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT    NOT NULL,
    updated_at        TEXT    NOT NULL,
    published_at      TEXT
);

-- A policy optionally belongs to one bundle and goes away with it.
CREATE TABLE IF NOT EXISTS policies (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL UNIQUE,
    display_name    TEXT    NOT NULL,
    description     TEXT    NOT NULL,
    policy_type     TEXT    NOT NULL,
    scope           TEXT    NOT NULL,
    rules           TEXT    NOT NULL,   -- opaque JSON document
    bundle_id       INTEGER REFERENCES bundles(id) ON DELETE CASCADE,
    is_active       INTEGER NOT NULL DEFAULT 1,
    priority        INTEGER NOT NULL DEFAULT 0,
    tags            TEXT,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL,
    effective_from  TEXT,
    effective_until TEXT
);

CREATE INDEX IF NOT EXISTS tools_category_idx       ON tools(category);
CREATE INDEX IF NOT EXISTS bundles_category_idx     ON bundles(category);
CREATE INDEX IF NOT EXISTS policies_type_idx        ON policies(policy_type);
CREATE INDEX IF NOT EXISTS policies_scope_idx       ON policies(scope);
CREATE INDEX IF NOT EXISTS policies_bundle_idx      ON policies(bundle_id);

PRAGMA user_version = 1;
";
