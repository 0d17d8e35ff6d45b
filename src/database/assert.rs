use actix_web::web;
use anyhow::bail;
use diesel::prelude::*;

use crate::{
    booking::ReservationError,
    database::{get_db_conn, unblock},
    DbPool,
};

pub async fn assert_room(pool: &web::Data<DbPool>, room_id: i64) -> anyhow::Result<()> {
    use crate::schema::rooms;

    let conn = get_db_conn(pool)?;
    let res = unblock(
        web::block(move || {
            rooms::table
                .filter(rooms::id.eq(room_id))
                .count()
                .get_result::<i64>(&conn)
                .map_err(ReservationError::from)
        })
        .await,
    )?;

    if res == 0 {
        bail!("No such room");
    }

    Ok(())
}

pub async fn assert_student(pool: &web::Data<DbPool>, student_id: i64) -> anyhow::Result<()> {
    use crate::schema::students;

    let conn = get_db_conn(pool)?;
    let res = unblock(
        web::block(move || {
            students::table
                .filter(students::id.eq(student_id))
                .count()
                .get_result::<i64>(&conn)
                .map_err(ReservationError::from)
        })
        .await,
    )?;

    if res == 0 {
        bail!("No such student");
    }

    Ok(())
}
