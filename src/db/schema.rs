//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `countries` table (one row per country name, overwritten on every refresh)
/// - `meta` table (single row holding the dataset-wide refresh timestamp)
///
/// `name` is unique byte-for-byte. `name_key` holds the Unicode-lowercased name
/// and serves case-insensitive lookups.
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Countries (natural key: name)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS countries (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
    name_key TEXT NOT NULL,
    capital TEXT NULL,
    region TEXT NULL,
    population INTEGER NOT NULL DEFAULT 0 CHECK (population >= 0),
    currency_code TEXT NULL,
    exchange_rate REAL NULL,
    estimated_gdp REAL NOT NULL DEFAULT 0,
    flag_url TEXT NULL,
    last_refreshed_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_countries_name_key ON countries(name_key);
CREATE INDEX IF NOT EXISTS idx_countries_region ON countries(region);
CREATE INDEX IF NOT EXISTS idx_countries_currency ON countries(currency_code);

-- ---------------------------------------------------------------------------
-- Refresh metadata (replaced wholesale on every refresh)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS meta (
    id INTEGER PRIMARY KEY NOT NULL,
    last_refreshed_at TEXT NOT NULL -- RFC3339
);
"#;
