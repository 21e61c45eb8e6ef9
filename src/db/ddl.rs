//! Table registry for the star schema: two staging tables, one fact table and
//! four dimensions. Every DROP/CREATE/COUNT statement is rendered from here.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// SQL flavour the DDL is rendered for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Amazon Redshift: `IDENTITY(1, 1)`, informational primary keys, S3 `COPY`.
    #[default]
    Redshift,
    /// Plain PostgreSQL. Primary keys are enforced there, so natural keys are
    /// declared `NOT NULL` only and dimension dedup stays with `SELECT DISTINCT`.
    Postgres,
}

impl Dialect {
    pub fn supports_bulk_load(self) -> bool {
        matches!(self, Dialect::Redshift)
    }

    fn declares_natural_keys(self) -> bool {
        matches!(self, Dialect::Redshift)
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redshift" => Ok(Dialect::Redshift),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(format!("unknown SQL dialect {:?} (expected redshift or postgres)", other)),
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => f.write_str("redshift"),
            Dialect::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Varchar(u16),
    Integer,
    BigInt,
    Float,
    Timestamp,
    /// Auto-incrementing surrogate key
    Identity,
}

impl ColumnType {
    fn render(self, dialect: Dialect) -> String {
        match (self, dialect) {
            (ColumnType::Varchar(n), _) => format!("VARCHAR({})", n),
            (ColumnType::Integer, _) => "INTEGER".to_string(),
            (ColumnType::BigInt, _) => "BIGINT".to_string(),
            (ColumnType::Float, _) => "FLOAT".to_string(),
            (ColumnType::Timestamp, _) => "TIMESTAMP".to_string(),
            (ColumnType::Identity, Dialect::Redshift) => "INTEGER IDENTITY(1, 1)".to_string(),
            (ColumnType::Identity, Dialect::Postgres) => "INTEGER GENERATED BY DEFAULT AS IDENTITY".to_string(),
        }
    }

    /// `information_schema.columns.data_type` reported for this column type.
    pub fn catalog_name(self) -> &'static str {
        match self {
            ColumnType::Varchar(_) => "character varying",
            ColumnType::Integer | ColumnType::Identity => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Float => "double precision",
            ColumnType::Timestamp => "timestamp without time zone",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub not_null: bool,
    /// Natural or surrogate key of the table
    pub key: bool,
}

impl Column {
    const fn nullable(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            not_null: false,
            key: false,
        }
    }

    const fn required(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            not_null: true,
            key: false,
        }
    }

    const fn key(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            not_null: true,
            key: true,
        }
    }

    fn render(&self, dialect: Dialect) -> String {
        let primary_key = self.key && (dialect.declares_natural_keys() || self.ty == ColumnType::Identity);
        let mut line = format!("{:<18} {}", self.name, self.ty.render(dialect));
        if self.not_null {
            line.push_str(" NOT NULL");
        }
        if primary_key {
            line.push_str(" PRIMARY KEY");
        }
        line
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableKind {
    Staging,
    Fact,
    Dimension,
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub kind: TableKind,
    pub columns: &'static [Column],
}

impl TableDef {
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", self.name)
    }

    pub fn create_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render(dialect)))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE IF NOT EXISTS {}\n(\n{}\n);", self.name, columns)
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) AS count FROM {};", self.name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub static STAGING_EVENTS: TableDef = TableDef {
    name: "staging_events",
    kind: TableKind::Staging,
    columns: &[
        Column::nullable("artist", ColumnType::Varchar(250)),
        Column::nullable("auth", ColumnType::Varchar(12)),
        Column::nullable("first_name", ColumnType::Varchar(50)),
        Column::nullable("gender", ColumnType::Varchar(1)),
        Column::nullable("item_in_session", ColumnType::Integer),
        Column::nullable("last_name", ColumnType::Varchar(50)),
        Column::nullable("length", ColumnType::Float),
        Column::nullable("level", ColumnType::Varchar(4)),
        Column::nullable("location", ColumnType::Varchar(250)),
        Column::nullable("method", ColumnType::Varchar(5)),
        Column::nullable("page", ColumnType::Varchar(10)),
        Column::nullable("registration", ColumnType::BigInt),
        Column::nullable("session_id", ColumnType::Integer),
        Column::nullable("song", ColumnType::Varchar(250)),
        Column::nullable("status", ColumnType::Integer),
        Column::nullable("ts", ColumnType::Timestamp),
        Column::nullable("user_agent", ColumnType::Varchar(500)),
        Column::nullable("user_id", ColumnType::Integer),
    ],
};

pub static STAGING_SONGS: TableDef = TableDef {
    name: "staging_songs",
    kind: TableKind::Staging,
    columns: &[
        Column::nullable("num_songs", ColumnType::Integer),
        Column::nullable("artist_id", ColumnType::Varchar(20)),
        Column::nullable("artist_latitude", ColumnType::Float),
        Column::nullable("artist_longitude", ColumnType::Float),
        Column::nullable("artist_location", ColumnType::Varchar(250)),
        Column::nullable("artist_name", ColumnType::Varchar(250)),
        Column::nullable("song_id", ColumnType::Varchar(20)),
        Column::nullable("title", ColumnType::Varchar(250)),
        Column::nullable("duration", ColumnType::Float),
        Column::nullable("year", ColumnType::Integer),
    ],
};

// Only the identity is required. A play with no timestamp or no catalog match
// still gets its row.
pub static FACT_SONGPLAYS: TableDef = TableDef {
    name: "fact_songplays",
    kind: TableKind::Fact,
    columns: &[
        Column::key("songplay_id", ColumnType::Identity),
        Column::nullable("start_time", ColumnType::Timestamp),
        Column::nullable("user_id", ColumnType::Integer),
        Column::nullable("level", ColumnType::Varchar(4)),
        Column::nullable("song_id", ColumnType::Varchar(20)),
        Column::nullable("artist_id", ColumnType::Varchar(20)),
        Column::nullable("session_id", ColumnType::Integer),
        Column::nullable("location", ColumnType::Varchar(250)),
        Column::nullable("user_agent", ColumnType::Varchar(500)),
    ],
};

pub static DIM_USERS: TableDef = TableDef {
    name: "dim_users",
    kind: TableKind::Dimension,
    columns: &[
        Column::key("user_id", ColumnType::Integer),
        Column::nullable("first_name", ColumnType::Varchar(50)),
        Column::nullable("last_name", ColumnType::Varchar(50)),
        Column::nullable("gender", ColumnType::Varchar(1)),
        Column::nullable("level", ColumnType::Varchar(4)),
    ],
};

pub static DIM_SONGS: TableDef = TableDef {
    name: "dim_songs",
    kind: TableKind::Dimension,
    columns: &[
        Column::key("song_id", ColumnType::Varchar(20)),
        Column::nullable("title", ColumnType::Varchar(250)),
        Column::nullable("artist_id", ColumnType::Varchar(20)),
        Column::nullable("year", ColumnType::Integer),
        Column::nullable("duration", ColumnType::Float),
    ],
};

pub static DIM_ARTISTS: TableDef = TableDef {
    name: "dim_artists",
    kind: TableKind::Dimension,
    columns: &[
        Column::key("artist_id", ColumnType::Varchar(20)),
        Column::nullable("name", ColumnType::Varchar(250)),
        Column::nullable("location", ColumnType::Varchar(250)),
        Column::nullable("latitude", ColumnType::Float),
        Column::nullable("longitude", ColumnType::Float),
    ],
};

pub static DIM_TIME: TableDef = TableDef {
    name: "dim_time",
    kind: TableKind::Dimension,
    columns: &[
        Column::key("start_time", ColumnType::Timestamp),
        Column::required("hour", ColumnType::Integer),
        Column::required("day", ColumnType::Integer),
        Column::required("week", ColumnType::Integer),
        Column::required("month", ColumnType::Integer),
        Column::required("year", ColumnType::Integer),
        Column::required("weekday", ColumnType::Integer),
    ],
};

/// All tables in catalog order: staging first, then fact, then dimensions.
pub static TABLES: [&TableDef; 7] = [
    &STAGING_EVENTS,
    &STAGING_SONGS,
    &FACT_SONGPLAYS,
    &DIM_USERS,
    &DIM_SONGS,
    &DIM_ARTISTS,
    &DIM_TIME,
];
