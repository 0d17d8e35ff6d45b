pub mod assert;

use crate::{booking::ReservationError, DbPool};
use actix_web::{error::BlockingError, web};
use anyhow::{anyhow, Context};
use diesel::{
    connection::SimpleConnection,
    r2d2::{ConnectionManager, CustomizeConnection},
    SqliteConnection,
};
use r2d2::PooledConnection;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    institution_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS rooms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_number TEXT NOT NULL UNIQUE,
    floor TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS timeslots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    UNIQUE (start_time, end_time)
);

CREATE TABLE IF NOT EXISTS reservations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students (id) ON DELETE CASCADE,
    room_id INTEGER NOT NULL REFERENCES rooms (id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS reservations_room_date ON reservations (room_id, date);
CREATE INDEX IF NOT EXISTS reservations_student_date ON reservations (student_id, date);

CREATE TABLE IF NOT EXISTS reservation_slots (
    reservation_id INTEGER NOT NULL REFERENCES reservations (id) ON DELETE CASCADE,
    slot_id INTEGER NOT NULL REFERENCES timeslots (id),
    room_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    released BOOLEAN NOT NULL DEFAULT 0,
    PRIMARY KEY (reservation_id, slot_id)
);

CREATE UNIQUE INDEX IF NOT EXISTS reservation_slots_live_claim
    ON reservation_slots (room_id, date, slot_id) WHERE released = 0;
"#;

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
        )
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn build_pool(database_url: &str, max_size: u32) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .context("Failed to create pool")
}

/// Creates missing tables and indexes. Safe to run on every start.
pub fn init_schema(conn: &SqliteConnection) -> anyhow::Result<()> {
    conn.batch_execute(SCHEMA).context("Failed to initialise schema")
}

/// A pool that cannot hand out a connection is our failure, not the caller's.
pub fn get_db_conn(
    pool: &web::Data<DbPool>,
) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, ReservationError> {
    pool.get()
        .map_err(|err| ReservationError::Internal(anyhow::Error::new(err).context("DB connection")))
}

/// Unwraps the result of `web::block` without going through `BlockingError`'s `Debug`
/// based `Display`, which would put backtraces into the response.
pub fn unblock<T, E>(res: Result<T, BlockingError<E>>) -> Result<T, E>
where
    E: std::fmt::Debug + From<ReservationError>,
{
    res.map_err(|err| match err {
        BlockingError::Error(err) => err,
        BlockingError::Canceled => {
            ReservationError::Internal(anyhow!("blocking task was cancelled")).into()
        }
    })
}
