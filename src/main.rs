#[macro_use]
extern crate diesel;

mod booking;
mod catalog;
mod config;
mod database;
mod models;
mod notify;
mod protocol;
mod reservation;
mod scheduler;
mod schema;
mod seed;
mod utils;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chrono::Local;
use diesel::{r2d2::ConnectionManager, SqliteConnection};
use log::info;

use crate::{
    booking::ReservationManager,
    config::Config,
    notify::{Outbox, Templates},
    scheduler::{Job, Scheduler, Trigger},
};

type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const POOL_SIZE: u32 = 8;

fn schedule_jobs(
    scheduler: &mut Scheduler,
    config: &Config,
    pool: &DbPool,
    manager: &web::Data<ReservationManager>,
) {
    let (p, grid) = (pool.clone(), config.grid.clone());
    scheduler.add(Job::new("seed_timeslots", Trigger::AtStartup, move || {
        seed::seed_timeslots(&*p.get()?, &grid).map(drop)
    }));

    let p = pool.clone();
    scheduler.add(Job::new("seed_rooms", Trigger::AtStartup, move || {
        seed::seed_rooms(&*p.get()?, seed::DEFAULT_ROOMS).map(drop)
    }));

    let p = pool.clone();
    scheduler.add(Job::new("seed_students", Trigger::AtStartup, move || {
        seed::seed_students(&*p.get()?, seed::DEFAULT_STUDENTS).map(drop)
    }));

    let (p, manager) = (pool.clone(), manager.clone());
    scheduler.add(Job::new(
        "daily_reset",
        Trigger::DailyAt(config.daily_reset_at),
        move || {
            let today = Local::now().naive_local().date();
            manager.daily_reset(&*p.get()?, today)?;
            Ok(())
        },
    ));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let pool = database::build_pool(&config.database_url, POOL_SIZE)?;
    database::init_schema(&*pool.get().context("DB connection")?)?;

    let outbox = Arc::new(Outbox::start(config.build_mailer()).context("Failed to start outbox")?);
    let manager = web::Data::new(ReservationManager::new(
        config.rules(),
        Templates::new(config.public_base_url.clone(), config.building_name.clone()),
        outbox.clone(),
    ));

    let mut scheduler = Scheduler::new();
    schedule_jobs(&mut scheduler, &config, &pool, &manager);
    scheduler.start().context("Failed to start scheduler")?;

    info!("Listening on {}", config.bind_addr);
    let server_pool = pool.clone();
    let server_manager = manager.clone();
    HttpServer::new(move || {
        App::new()
            .data(server_pool.clone())
            .app_data(server_manager.clone())
            // timeslots, rooms and students
            .configure(catalog::config)
            // reservations
            .service(web::scope("/reservations").configure(reservation::config))
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    info!("Shutting down");
    scheduler.shutdown();
    outbox.shutdown();
    Ok(())
}
