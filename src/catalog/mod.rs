//! Read-mostly endpoints around the engine: the slot grid, rooms and students.

mod requests;
mod responses;

use crate::{
    booking::{availability, ReservationError, ReservationManager},
    database::{assert, get_db_conn, unblock},
    models::{
        rooms::RoomData,
        students::{NewStudent, StudentData},
        timeslots::Timeslot,
    },
    utils::{format_date_str, parse_date_str},
    DbPool,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use anyhow::bail;
use diesel::prelude::*;
use log::info;

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(list_timeslots)
        .service(available_timeslots)
        .service(list_rooms)
        .service(list_students)
        .service(create_student);
}

crate::api_funcs! {
    (get, list_timeslots, "/timeslots",
        (pool: web::Data<DbPool>, manager: web::Data<ReservationManager>), TimeslotsResponse, Ok),
    (get, available_timeslots, "/timeslots/available",
        (pool: web::Data<DbPool>, query: web::Query<AvailableQuery>), AvailableResponse, Ok),
    (get, list_rooms, "/rooms", (pool: web::Data<DbPool>), RoomsResponse, Ok),
    (get, list_students, "/students", (pool: web::Data<DbPool>), StudentsResponse, Ok),
    (post, create_student, "/students",
        (pool: web::Data<DbPool>, info: web::Json<CreateStudentRequest>), StudentResponse, Created),
}

async fn list_timeslots_impl(
    pool: web::Data<DbPool>,
    manager: web::Data<ReservationManager>,
) -> anyhow::Result<TimeslotsResponse> {
    use crate::schema::timeslots;

    let conn = get_db_conn(&pool)?;
    let slots = unblock(
        web::block(move || {
            timeslots::table
                .order(timeslots::start_time.asc())
                .load::<Timeslot>(&conn)
                .map_err(ReservationError::from)
        })
        .await,
    )?;

    Ok(TimeslotsResponse {
        success: true,
        max_slots: manager.rules().max_slots,
        timeslots: slots.iter().map(TimeslotItem::from).collect(),
        ..Default::default()
    })
}

async fn available_timeslots_impl(
    pool: web::Data<DbPool>,
    query: web::Query<AvailableQuery>,
) -> anyhow::Result<AvailableResponse> {
    let query = query.into_inner();
    let date = parse_date_str(&query.date)?;
    let room_id = query.room_id;
    assert::assert_room(&pool, room_id).await?;

    let conn = get_db_conn(&pool)?;
    let slots = unblock(
        web::block(move || {
            availability::available_slots(&conn, room_id, date).map_err(ReservationError::from)
        })
        .await,
    )?;

    Ok(AvailableResponse {
        success: true,
        room_id,
        date: format_date_str(&date),
        timeslots: slots.iter().map(TimeslotItem::from).collect(),
        ..Default::default()
    })
}

async fn list_rooms_impl(pool: web::Data<DbPool>) -> anyhow::Result<RoomsResponse> {
    use crate::schema::rooms;

    let conn = get_db_conn(&pool)?;
    let rooms = unblock(
        web::block(move || {
            rooms::table
                .order(rooms::room_number.asc())
                .load::<RoomData>(&conn)
                .map_err(ReservationError::from)
        })
        .await,
    )?;

    Ok(RoomsResponse {
        success: true,
        rooms: rooms.into_iter().map(RoomItem::from).collect(),
        ..Default::default()
    })
}

async fn list_students_impl(pool: web::Data<DbPool>) -> anyhow::Result<StudentsResponse> {
    use crate::schema::students;

    let conn = get_db_conn(&pool)?;
    let students = unblock(
        web::block(move || {
            students::table
                .order(students::name.asc())
                .load::<StudentData>(&conn)
                .map_err(ReservationError::from)
        })
        .await,
    )?;

    Ok(StudentsResponse {
        success: true,
        students: students.into_iter().map(StudentItem::from).collect(),
        ..Default::default()
    })
}

async fn create_student_impl(
    pool: web::Data<DbPool>,
    info: web::Json<CreateStudentRequest>,
) -> anyhow::Result<StudentResponse> {
    use crate::schema::students;

    let info = info.into_inner();
    let institution_id = info.institution_id.trim().to_string();
    let name = info.name.trim().to_string();
    let email = info.email.trim().to_string();
    if institution_id.is_empty() || name.is_empty() {
        bail!("Student id and name are required");
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        bail!("Invalid email address");
    }

    let conn = get_db_conn(&pool)?;
    // duplicates come back as Ok(Err(..)) so only storage failures travel as ReservationError
    let student = unblock(
        web::block(move || {
            conn.immediate_transaction::<_, ReservationError, _>(|| {
                let res = students::table
                    .filter(students::institution_id.eq(&institution_id))
                    .count()
                    .get_result::<i64>(&conn)?;
                if res > 0 {
                    return Ok(Err("Duplicated student id"));
                }

                let res = students::table
                    .filter(students::email.eq(&email))
                    .count()
                    .get_result::<i64>(&conn)?;
                if res > 0 {
                    return Ok(Err("Duplicated email"));
                }

                diesel::insert_into(students::table)
                    .values(NewStudent {
                        institution_id: institution_id.clone(),
                        name,
                        email,
                    })
                    .execute(&conn)?;

                Ok(Ok(students::table
                    .filter(students::institution_id.eq(&institution_id))
                    .first::<StudentData>(&conn)?))
            })
        })
        .await,
    )?
    .map_err(anyhow::Error::msg)?;

    info!("student {} registered", student.institution_id);
    Ok(StudentResponse {
        success: true,
        student: Some(student.into()),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        booking::testing::{default_rules, manager, seed_fixture},
        database::testing::memory_pool,
    };
    use actix_web::{http::StatusCode, test, App};
    use diesel::connection::SimpleConnection;
    use serde_json::{json, Value};

    macro_rules! app {
        ($pool:expr) => {{
            let (manager, _) = manager(default_rules());
            test::init_service(
                App::new()
                    .data($pool.clone())
                    .app_data(web::Data::new(manager))
                    .configure(config),
            )
            .await
        }};
    }

    #[actix_rt::test]
    async fn timeslots_are_listed_in_twelve_hour_format() {
        let pool = memory_pool();
        seed_fixture(&pool.get().unwrap());
        let mut app = app!(pool);

        let req = test::TestRequest::get().uri("/timeslots").to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["max_slots"], 4);
        assert_eq!(body["timeslots"].as_array().unwrap().len(), 16);
        assert_eq!(body["timeslots"][0]["start_time"], "09:00 AM");
        assert_eq!(body["timeslots"][15]["label"], "04:30 PM - 05:00 PM");
    }

    #[actix_rt::test]
    async fn available_slots_for_unknown_room_is_an_error() {
        let pool = memory_pool();
        seed_fixture(&pool.get().unwrap());
        let mut app = app!(pool);

        let req = test::TestRequest::get()
            .uri("/timeslots/available?room_id=99&date=2025-03-03")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["err"], "No such room");
    }

    #[actix_rt::test]
    async fn free_day_offers_the_whole_grid() {
        let pool = memory_pool();
        seed_fixture(&pool.get().unwrap());
        let mut app = app!(pool);

        let req = test::TestRequest::get()
            .uri("/timeslots/available?room_id=1&date=2025-03-03")
            .to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(body["date"], "2025-03-03");
        assert_eq!(body["timeslots"].as_array().unwrap().len(), 16);
    }

    #[actix_rt::test]
    async fn rooms_carry_floor_labels() {
        let pool = memory_pool();
        seed_fixture(&pool.get().unwrap());
        let mut app = app!(pool);

        let req = test::TestRequest::get().uri("/rooms").to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(body["rooms"][0]["room_number"], "1.203");
        assert_eq!(body["rooms"][0]["floor"], "1st");
        assert_eq!(body["rooms"][1]["floor"], "2nd");
    }

    #[actix_rt::test]
    async fn storage_failures_are_server_errors() {
        let pool = memory_pool();
        seed_fixture(&pool.get().unwrap());
        pool.get()
            .unwrap()
            .batch_execute("DROP TABLE rooms;")
            .unwrap();
        let mut app = app!(pool);

        let req = test::TestRequest::get().uri("/rooms").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "internal");

        // the existence check fails on storage, not on a missing room
        let req = test::TestRequest::get()
            .uri("/timeslots/available?room_id=1&date=2025-03-03")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "internal");
        assert_ne!(body["err"], "No such room");
    }

    #[actix_rt::test]
    async fn student_registration_checks_uniqueness() {
        let pool = memory_pool();
        seed_fixture(&pool.get().unwrap());
        let mut app = app!(pool);

        let req = test::TestRequest::post()
            .uri("/students")
            .set_json(&json!({
                "institution_id": "20000003",
                "name": "Chen",
                "email": "chen@example.edu",
            }))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["student"]["id"], 3);

        let req = test::TestRequest::post()
            .uri("/students")
            .set_json(&json!({
                "institution_id": "20000004",
                "name": "Chen Again",
                "email": "chen@example.edu",
            }))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["err"], "Duplicated email");
        assert_eq!(body["code"], "bad_request");

        let req = test::TestRequest::post()
            .uri("/students")
            .set_json(&json!({
                "institution_id": "20000003",
                "name": "Chen Twice",
                "email": "chen2@example.edu",
            }))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["err"], "Duplicated student id");

        let req = test::TestRequest::post()
            .uri("/students")
            .set_json(&json!({
                "institution_id": "20000005",
                "name": "Dana",
                "email": "not-an-address",
            }))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/students").to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(body["students"].as_array().unwrap().len(), 3);
    }
}
