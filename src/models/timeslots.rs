use crate::schema::timeslots;
use chrono::NaiveTime;

/// One reusable half-hour (by default) interval of the daily grid.
#[derive(Queryable, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Timeslot {
    pub id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Insertable)]
#[table_name = "timeslots"]
pub struct NewTimeslot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
