use anyhow::Context;
use diesel::prelude::*;
use log::{info, warn};

use crate::{
    booking::SlotGrid,
    models::{rooms::NewRoom, students::NewStudent, timeslots::NewTimeslot},
    utils::format_clock,
};

pub const DEFAULT_ROOMS: &[&str] = &["1.203", "1.205", "2.203", "2.205", "3.205"];

pub const DEFAULT_STUDENTS: &[(&str, &str, &str)] = &[
    ("20448443", "Alex Rivera", "alex.rivera01@example.edu"),
    ("20312345", "Jordan Lee", "jordan.lee02@example.edu"),
    ("12345678", "Sam Patel", "sam.patel01@example.edu"),
    ("23112402", "Casey Morgan", "casey.morgan01@example.edu"),
];

/// Inserts the grid when no slot exists yet. Returns how many slots were created.
pub fn seed_timeslots(conn: &SqliteConnection, grid: &SlotGrid) -> anyhow::Result<usize> {
    use crate::schema::timeslots;

    conn.immediate_transaction::<_, anyhow::Error, _>(|| {
        let existing = timeslots::table
            .count()
            .get_result::<i64>(conn)
            .context("DB error")?;
        if existing > 0 {
            warn!(
                "Time slots already seeded ({} found), skipping seeding from {} to {}",
                existing,
                format_clock(&grid.opening()),
                format_clock(&grid.closing())
            );
            return Ok(0);
        }

        let slots = grid.slots();
        for &(start_time, end_time) in &slots {
            diesel::insert_into(timeslots::table)
                .values(NewTimeslot {
                    start_time,
                    end_time,
                })
                .execute(conn)
                .context("DB error")?;
        }

        info!(
            "Created {} time slots of {} minutes from {} to {}",
            slots.len(),
            grid.interval_minutes(),
            format_clock(&grid.opening()),
            format_clock(&grid.closing())
        );
        Ok(slots.len())
    })
}

pub fn seed_rooms(conn: &SqliteConnection, room_numbers: &[&str]) -> anyhow::Result<usize> {
    use crate::schema::rooms;

    conn.immediate_transaction::<_, anyhow::Error, _>(|| {
        let existing = rooms::table
            .count()
            .get_result::<i64>(conn)
            .context("DB error")?;
        if existing > 0 {
            warn!("Study rooms already exist, skipping seeding");
            return Ok(0);
        }

        for number in room_numbers {
            diesel::insert_into(rooms::table)
                .values(NewRoom::new(*number))
                .execute(conn)
                .context("DB error")?;
        }

        info!("Created {} study rooms", room_numbers.len());
        Ok(room_numbers.len())
    })
}

pub fn seed_students(
    conn: &SqliteConnection,
    roster: &[(&str, &str, &str)],
) -> anyhow::Result<usize> {
    use crate::schema::students;

    conn.immediate_transaction::<_, anyhow::Error, _>(|| {
        let existing = students::table
            .count()
            .get_result::<i64>(conn)
            .context("DB error")?;
        if existing > 0 {
            warn!("Students already exist, skipping seeding");
            return Ok(0);
        }

        for &(institution_id, name, email) in roster {
            diesel::insert_into(students::table)
                .values(NewStudent {
                    institution_id: institution_id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                })
                .execute(conn)
                .context("DB error")?;
        }

        info!("Created {} students", roster.len());
        Ok(roster.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{database::testing::memory_conn, models::rooms::RoomData, models::timeslots::Timeslot};
    use chrono::NaiveTime;

    fn grid() -> SlotGrid {
        SlotGrid::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            30,
        )
        .unwrap()
    }

    #[test]
    fn grid_is_seeded_once() {
        use crate::schema::timeslots;

        let conn = memory_conn();
        assert_eq!(seed_timeslots(&conn, &grid()).unwrap(), 16);
        assert_eq!(seed_timeslots(&conn, &grid()).unwrap(), 0);

        let slots = timeslots::table
            .order(timeslots::start_time.asc())
            .load::<Timeslot>(&conn)
            .unwrap();
        assert_eq!(slots.len(), 16);
        for pair in slots.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
    }

    #[test]
    fn rooms_get_floor_labels() {
        use crate::schema::rooms;

        let conn = memory_conn();
        assert_eq!(seed_rooms(&conn, DEFAULT_ROOMS).unwrap(), 5);
        assert_eq!(seed_rooms(&conn, DEFAULT_ROOMS).unwrap(), 0);

        let floors: Vec<(String, String)> = rooms::table
            .order(rooms::room_number.asc())
            .load::<RoomData>(&conn)
            .unwrap()
            .into_iter()
            .map(|room| (room.room_number, room.floor))
            .collect();
        assert_eq!(floors[0], ("1.203".to_string(), "1st".to_string()));
        assert_eq!(floors[3], ("2.205".to_string(), "2nd".to_string()));
        assert_eq!(floors[4], ("3.205".to_string(), "3rd".to_string()));
    }

    #[test]
    fn students_are_seeded_once() {
        let conn = memory_conn();
        assert_eq!(seed_students(&conn, DEFAULT_STUDENTS).unwrap(), 4);
        assert_eq!(seed_students(&conn, DEFAULT_STUDENTS).unwrap(), 0);
    }
}
