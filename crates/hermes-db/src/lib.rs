// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use hermes_app::{Application, ApplicationId, ApplicationState, PageRequest};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::macros::{datetime, format_description};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const APP_NAME: &str = "hermes";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
/// SQLite takes the busy timeout as an `i32` of milliseconds.
pub const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "applications",
    &[
        "id",
        "created_by",
        "created_date",
        "last_modified_by",
        "last_modified_date",
        "details",
        "appointment_date",
        "state",
    ],
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_applications_created_date",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_applications_created_date ON applications (created_date, id);",
    },
    RequiredIndex {
        name: "idx_applications_state",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_applications_state ON applications (state);",
    },
];

const APPLICATION_COLUMNS: &str = "
  id, created_by, created_date, last_modified_by, last_modified_date,
  details, appointment_date, state
";

const DEMO_RECORDS: usize = 42;
const DEMO_CITIZENS: [&str; 9] = [
    "Eleni Papadaki",
    "Nikos Georgiou",
    "Maria Ioannou",
    "Kostas Dimitriou",
    "Sofia Nikolaou",
    "Yannis Vlachos",
    "Anna Karra",
    "Petros Alexiou",
    "Dora Stavrou",
];
const DEMO_CLERKS: [&str; 3] = ["registry-desk", "front-office", "records"];
const DEMO_DETAILS: [&str; 7] = [
    "Passport renewal, biometric photo attached",
    "Identity card replacement after loss",
    "Residence permit extension for employment",
    "Birth certificate copy for school enrolment",
    "Marriage certificate issued abroad, needs registration",
    "Change of address on civil registry",
    "Business license for a street kiosk",
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Longest time a statement waits on a locked database before failing.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            bail!("busy timeout must be positive");
        }
        if timeout > MAX_BUSY_TIMEOUT {
            bail!(
                "busy timeout of {}ms is too long; SQLite accepts at most {}ms",
                timeout.as_millis(),
                MAX_BUSY_TIMEOUT.as_millis()
            );
        }
        self.conn
            .busy_timeout(timeout)
            .with_context(|| format!("set busy timeout to {}ms", timeout.as_millis()))
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn list_applications(&self, page: PageRequest) -> Result<Vec<Application>> {
        let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(&format!(
                "
                SELECT {APPLICATION_COLUMNS}
                FROM applications
                ORDER BY created_date ASC, id ASC
                LIMIT ? OFFSET ?
                "
            ))
            .context("prepare application list query")?;
        let rows = stmt
            .query_map(params![limit, offset], application_from_row)
            .context("query applications")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().with_context(|| {
            format!(
                "load applications {}..{}",
                page.offset(),
                page.end()
            )
        })
    }

    pub fn get_application(&self, id: &ApplicationId) -> Result<Option<Application>> {
        self.conn
            .query_row(
                &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?"),
                params![id.as_str()],
                application_from_row,
            )
            .optional()
            .with_context(|| format!("load application {id}"))
    }

    pub fn count_applications(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM applications", [], |row| row.get(0))
            .context("count applications")?;
        usize::try_from(count).context("application count out of range")
    }

    /// Inserts a new record. Returns `false` when the identifier is taken.
    pub fn insert_application(&self, application: &Application) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute(
                "
                INSERT OR IGNORE INTO applications (
                  id, created_by, created_date, last_modified_by, last_modified_date,
                  details, appointment_date, state
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    application.id.as_str(),
                    application.created_by,
                    format_datetime(application.created_date)?,
                    application.last_modified_by,
                    format_datetime(application.last_modified_date)?,
                    application.details,
                    format_opt_datetime(application.appointment_date)?,
                    application.state.as_str(),
                ],
            )
            .with_context(|| format!("insert application {}", application.id))?;
        Ok(rows_affected == 1)
    }

    /// Writes the editable fields and stamps `actor` as last modifier.
    /// Returns `false` when no record has the identifier.
    pub fn update_application(&self, application: &Application, actor: &str) -> Result<bool> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE applications
                SET details = ?, appointment_date = ?, state = ?,
                    last_modified_by = ?, last_modified_date = ?
                WHERE id = ?
                ",
                params![
                    application.details,
                    format_opt_datetime(application.appointment_date)?,
                    application.state.as_str(),
                    actor,
                    now,
                    application.id.as_str(),
                ],
            )
            .with_context(|| format!("update application {}", application.id))?;
        Ok(rows_affected == 1)
    }

    /// Fills an empty store with a fixed set of records. Returns how many
    /// were inserted; a store that already holds data is left alone.
    pub fn seed_demo_data(&self) -> Result<usize> {
        if self.count_applications()? > 0 {
            debug!("store already holds applications; skipping demo data");
            return Ok(0);
        }

        let start = datetime!(2026-01-05 08:00 UTC);
        let mut inserted = 0usize;
        for index in 0..DEMO_RECORDS {
            let application = demo_application(index, start)?;
            if self.insert_application(&application)? {
                inserted += 1;
            }
        }
        info!("seeded {inserted} demo applications");
        Ok(inserted)
    }
}

fn demo_application(index: usize, start: OffsetDateTime) -> Result<Application> {
    let id = ApplicationId::parse(&format!("APP-{:04}", index + 1))
        .ok_or_else(|| anyhow!("demo identifier {index} is not a valid application id"))?;
    let step = i64::try_from(index).context("demo index out of range")?;
    let created_date = start + time::Duration::hours(step * 7 + step % 3);
    let last_modified_date = created_date + time::Duration::minutes(45 + (step % 5) * 90);
    let state = ApplicationState::ALL[index % ApplicationState::COUNT];
    let appointment_date =
        (index % 4 != 0).then(|| last_modified_date + time::Duration::days(3 + step % 11));

    Ok(Application {
        id,
        created_by: DEMO_CITIZENS[index % DEMO_CITIZENS.len()].to_owned(),
        created_date,
        last_modified_by: DEMO_CLERKS[index % DEMO_CLERKS.len()].to_owned(),
        last_modified_date,
        details: DEMO_DETAILS[index % DEMO_DETAILS.len()].to_owned(),
        appointment_date,
        state,
    })
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    let id_raw: String = row.get(0)?;
    let id = ApplicationId::parse(&id_raw)
        .ok_or_else(|| to_sql_error(anyhow!("invalid application id {id_raw:?}")))?;
    let created_date_raw: String = row.get(2)?;
    let last_modified_raw: String = row.get(4)?;
    let appointment_raw: Option<String> = row.get(6)?;
    let state_raw: String = row.get(7)?;
    let state = ApplicationState::parse_stored(&state_raw).map_err(|corrupt| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(corrupt))
    })?;

    Ok(Application {
        id,
        created_by: row.get(1)?,
        created_date: parse_datetime(&created_date_raw).map_err(to_sql_error)?,
        last_modified_by: row.get(3)?,
        last_modified_date: parse_datetime(&last_modified_raw).map_err(to_sql_error)?,
        details: row.get(5)?,
        appointment_date: parse_opt_datetime(appointment_raw).map_err(to_sql_error)?,
        state,
    })
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("HERMES_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set HERMES_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("hermes.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a hermes-compatible database or migrate first"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )
    .context("configure sqlite pragmas")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
        .context("configure sqlite busy timeout")
}

fn now_rfc3339() -> Result<String> {
    format_datetime(OffsetDateTime::now_utc())
}

// Fixed-width UTC with nanoseconds, so text order matches time order.
fn format_datetime(value: OffsetDateTime) -> Result<String> {
    value
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
        ))
        .context("format timestamp")
}

fn format_opt_datetime(value: Option<OffsetDateTime>) -> Result<Option<String>> {
    value.map(format_datetime).transpose()
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = OffsetDateTime::parse(
        raw,
        &format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        ),
    ) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn parse_opt_datetime(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.as_deref().map(parse_datetime).transpose()
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
