//! Per-dialect DDL and insert statements for the export schema. The two
//! variants are semantically identical; they differ in the large-text
//! column type, index-creation syntax, identifier quoting for the
//! reserved `from`/`to` column names, and parameter placeholders.

pub const POSTGRES_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS block_data (
        number BIGINT NOT NULL,
        hash VARCHAR(66) PRIMARY KEY,
        block_data TEXT NOT NULL,
        trace_data TEXT NULL
    )",
    "CREATE INDEX IF NOT EXISTS block_data_number_idx ON block_data (number ASC)",
    "CREATE TABLE IF NOT EXISTS internal_transactions (
        tx_hash VARCHAR(66) NOT NULL,
        block_hash VARCHAR(66) NOT NULL,
        block_number BIGINT NOT NULL,
        tx_index INT NOT NULL,
        call_index INT NOT NULL,
        \"from\" VARCHAR(42) NOT NULL,
        \"to\" VARCHAR(42) NOT NULL,
        value VARCHAR(66) NOT NULL,
        PRIMARY KEY (tx_hash, call_index)
    )",
];

// MySQL has no IF NOT EXISTS for CREATE INDEX, so the number index is
// declared inline with the table.
pub const MYSQL_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS block_data (
        number BIGINT NOT NULL,
        hash VARCHAR(66) PRIMARY KEY,
        block_data MEDIUMTEXT NOT NULL,
        trace_data MEDIUMTEXT NULL,
        INDEX block_data_number_idx (number ASC)
    )",
    "CREATE TABLE IF NOT EXISTS internal_transactions (
        tx_hash VARCHAR(66) NOT NULL,
        block_hash VARCHAR(66) NOT NULL,
        block_number BIGINT NOT NULL,
        tx_index INT NOT NULL,
        call_index INT NOT NULL,
        `from` VARCHAR(42) NOT NULL,
        `to` VARCHAR(42) NOT NULL,
        value VARCHAR(66) NOT NULL,
        PRIMARY KEY (tx_hash, call_index)
    )",
];

pub const POSTGRES_INSERT_BLOCK: &str =
    "INSERT INTO block_data (number, hash, block_data, trace_data) VALUES ($1, $2, $3, $4)";

pub const MYSQL_INSERT_BLOCK: &str =
    "INSERT INTO block_data (number, hash, block_data, trace_data) VALUES (?, ?, ?, ?)";

pub const POSTGRES_INSERT_INTERNAL_TX: &str = "INSERT INTO internal_transactions \
    (tx_hash, block_hash, block_number, tx_index, call_index, \"from\", \"to\", value) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

pub const MYSQL_INSERT_INTERNAL_TX: &str = "INSERT INTO internal_transactions \
    (tx_hash, block_hash, block_number, tx_index, call_index, `from`, `to`, value) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
