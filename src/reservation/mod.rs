mod requests;
mod responses;

use crate::{
    booking::{
        store::{self, ReservationFilter},
        NewBooking, RejectReason, Rejection, ReservationError, ReservationManager,
        ReservationStatus,
    },
    database::{assert, get_db_conn, unblock},
    utils::{parse_date_str, parse_date_str_opt},
    DbPool,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use anyhow::anyhow;

use self::{requests::*, responses::*};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(create_reservation)
        .service(search_reservation)
        .service(confirm_reservation)
        .service(cancel_reservation)
        .service(view_reservation);
}

crate::api_funcs! {
    (post, create_reservation, "",
        (pool: web::Data<DbPool>, manager: web::Data<ReservationManager>, info: web::Json<CreateReservationRequest>),
        ReservationResponse, Created),
    (get, search_reservation, "",
        (pool: web::Data<DbPool>, query: web::Query<SearchReservationQuery>),
        SearchReservationResponse, Ok),
    (get, view_reservation, "/{id}",
        (pool: web::Data<DbPool>, path: web::Path<i64>), ReservationResponse, Ok),
    (get, confirm_reservation, "/confirm/{id}",
        (pool: web::Data<DbPool>, manager: web::Data<ReservationManager>, path: web::Path<i64>),
        ReservationResponse, Ok),
    (get, cancel_reservation, "/cancel/{id}",
        (pool: web::Data<DbPool>, manager: web::Data<ReservationManager>, path: web::Path<i64>),
        ReservationResponse, Ok),
}

async fn create_reservation_impl(
    pool: web::Data<DbPool>,
    manager: web::Data<ReservationManager>,
    info: web::Json<CreateReservationRequest>,
) -> Result<ReservationResponse, ReservationError> {
    let info = info.into_inner();
    let date = parse_date_str(&info.date)
        .map_err(|err| Rejection::new(RejectReason::InvalidDate, err.to_string()))?;
    let booking = NewBooking {
        student_id: info.student_id,
        room_id: info.room_id,
        date,
        slot_ids: info.timeslots,
    };

    let conn = get_db_conn(&pool)?;
    let reservation = unblock(web::block(move || manager.create(&conn, booking)).await)?;

    Ok(ReservationResponse {
        success: true,
        reservation: Some(reservation.into()),
        ..Default::default()
    })
}

async fn search_reservation_impl(
    pool: web::Data<DbPool>,
    query: web::Query<SearchReservationQuery>,
) -> anyhow::Result<SearchReservationResponse> {
    let query = query.into_inner();
    if let Some(student_id) = query.student_id {
        assert::assert_student(&pool, student_id).await?;
    }
    if let Some(room_id) = query.room_id {
        assert::assert_room(&pool, room_id).await?;
    }

    let filter = ReservationFilter {
        student_id: query.student_id,
        room_id: query.room_id,
        status: query
            .status
            .as_deref()
            .map(str::parse::<ReservationStatus>)
            .transpose()?,
        start_date: parse_date_str_opt(query.start_date)?,
        end_date: parse_date_str_opt(query.end_date)?,
        first_index: query.first_index.unwrap_or(0).max(0),
        limit: query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .max(0)
            .min(MAX_PAGE_SIZE),
    };

    let conn = get_db_conn(&pool)?;
    let reservations =
        unblock(web::block(move || store::search_reservations(&conn, &filter)).await)?;

    Ok(SearchReservationResponse {
        success: true,
        reservations: reservations.into_iter().map(ReservationItem::from).collect(),
        ..Default::default()
    })
}

async fn view_reservation_impl(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> anyhow::Result<ReservationResponse> {
    let id = path.into_inner();
    let conn = get_db_conn(&pool)?;
    let reservation = unblock(web::block(move || store::load_reservation(&conn, id)).await)?
        .ok_or_else(|| anyhow!("No such reservation"))?;

    Ok(ReservationResponse {
        success: true,
        reservation: Some(reservation.into()),
        ..Default::default()
    })
}

async fn confirm_reservation_impl(
    pool: web::Data<DbPool>,
    manager: web::Data<ReservationManager>,
    path: web::Path<i64>,
) -> Result<ReservationResponse, ReservationError> {
    let id = path.into_inner();
    let conn = get_db_conn(&pool)?;
    let reservation = unblock(web::block(move || manager.confirm(&conn, id)).await)?;

    Ok(ReservationResponse {
        success: true,
        message: format!("Reservation {} successfully confirmed!", id),
        reservation: Some(reservation.into()),
        ..Default::default()
    })
}

async fn cancel_reservation_impl(
    pool: web::Data<DbPool>,
    manager: web::Data<ReservationManager>,
    path: web::Path<i64>,
) -> Result<ReservationResponse, ReservationError> {
    let id = path.into_inner();
    let conn = get_db_conn(&pool)?;
    let reservation = unblock(web::block(move || manager.cancel(&conn, id)).await)?;

    Ok(ReservationResponse {
        success: true,
        message: format!("Reservation {} successfully cancelled.", id),
        reservation: Some(reservation.into()),
        ..Default::default()
    })
}
