//! Table definitions mirrored by `db/migrations`.

use super::{FieldDef, FieldKind, TableSchema};

pub static TEAMS: TableSchema = TableSchema {
    table: "teams",
    primary_key: "id",
    fields: &[
        FieldDef::generated("id", "team_id", FieldKind::Integer),
        FieldDef::writable("name", "name", FieldKind::Text),
        FieldDef::generated("created_at", "created_at", FieldKind::Timestamp),
        FieldDef::generated("updated_at", "updated_at", FieldKind::Timestamp),
    ],
    updated_at_column: Some("updated_at"),
};

pub static MEMBERS: TableSchema = TableSchema {
    table: "members",
    primary_key: "id",
    fields: &[
        FieldDef::generated("id", "member_id", FieldKind::Integer),
        FieldDef::writable("username", "username", FieldKind::Text),
        FieldDef::writable("age", "age", FieldKind::Integer),
        FieldDef::writable(
            "team_id",
            "team_id",
            FieldKind::Reference { table: "teams" },
        ),
        FieldDef::generated("created_at", "created_at", FieldKind::Timestamp),
        FieldDef::generated("updated_at", "updated_at", FieldKind::Timestamp),
    ],
    updated_at_column: Some("updated_at"),
};

/// Every schema the SQLite store verifies on construction.
pub static ALL_TABLES: &[&TableSchema] = &[&TEAMS, &MEMBERS];
