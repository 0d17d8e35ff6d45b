use std::{
    io::Write,
    process::{Command, Stdio},
    sync::{mpsc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use log::{info, warn};
use thiserror::Error;

use crate::{
    booking::Reservation,
    utils::{format_clock_span, format_long_date},
};

#[derive(Clone, Debug, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("notification delivery to {to} failed: {reason}")]
pub struct DeliveryFailed {
    pub to: String,
    pub reason: String,
}

pub trait Mailer: Send {
    fn send(&self, email: &Email) -> Result<(), DeliveryFailed>;
}

/// Writes every email to the log instead of sending it.
pub struct LogMailer {
    pub from: String,
}

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), DeliveryFailed> {
        info!(
            "mail from={} to={} subject={:?}\n{}",
            self.from, email.to, email.subject, email.body
        );
        Ok(())
    }
}

/// Hands the message to the local `sendmail -t`.
pub struct SendmailMailer {
    pub from: String,
    pub program: String,
}

impl Mailer for SendmailMailer {
    fn send(&self, email: &Email) -> Result<(), DeliveryFailed> {
        let failed = |reason: String| DeliveryFailed {
            to: email.to.clone(),
            reason,
        };

        let mut child = Command::new(&self.program)
            .arg("-t")
            .arg("-f")
            .arg(&self.from)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| failed(format!("cannot start {}: {}", self.program, e)))?;

        let message = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.from, email.to, email.subject, email.body
        );
        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(message.as_bytes())
                .map_err(|e| failed(e.to_string()))?;
        }
        // close stdin so sendmail sees end of message
        drop(child.stdin.take());

        let status = child.wait().map_err(|e| failed(e.to_string()))?;
        if !status.success() {
            return Err(failed(format!("{} exited with {}", self.program, status)));
        }
        Ok(())
    }
}

/// Receives the emails produced by reservation transitions.
pub trait Notifier: Send + Sync {
    fn notify(&self, email: Email);
}

/// Fire-and-forget delivery on a dedicated worker thread. Nothing is retried and no
/// failure reaches the code that queued the email.
pub struct Outbox {
    sender: Mutex<Option<mpsc::Sender<Email>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Outbox {
    pub fn start(mailer: Box<dyn Mailer>) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Email>();
        let worker = thread::Builder::new()
            .name("outbox".to_string())
            .spawn(move || {
                for email in receiver {
                    if let Err(err) = mailer.send(&email) {
                        warn!("{}", err);
                    }
                }
            })?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stops accepting email, delivers what is queued and waits for the worker.
    pub fn shutdown(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!("outbox worker panicked");
            }
        }
    }
}

impl Notifier for Outbox {
    fn notify(&self, email: Email) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => {
                if let Err(mpsc::SendError(email)) = sender.send(email) {
                    warn!("outbox is gone, dropping email to {}", email.to);
                }
            }
            None => warn!("outbox is shut down, dropping email to {}", email.to),
        }
    }
}

/// Builds the three emails a reservation can trigger.
#[derive(Clone, Debug)]
pub struct Templates {
    public_base_url: String,
    building: String,
}

impl Templates {
    pub fn new<S1: Into<String>, S2: Into<String>>(public_base_url: S1, building: S2) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            public_base_url,
            building: building.into(),
        }
    }

    pub fn confirm_url(&self, reservation_id: i64) -> String {
        format!(
            "{}/reservations/confirm/{}",
            self.public_base_url, reservation_id
        )
    }

    pub fn cancel_url(&self, reservation_id: i64) -> String {
        format!(
            "{}/reservations/cancel/{}",
            self.public_base_url, reservation_id
        )
    }

    fn when(reservation: &Reservation) -> (String, String) {
        (
            format_long_date(&reservation.data.date),
            format_clock_span(&reservation.data.start_time, &reservation.data.end_time),
        )
    }

    fn details(&self, reservation: &Reservation) -> String {
        let (date, time) = Self::when(reservation);
        format!(
            "Reservation Information:\n\
             Location: {building} {floor} Floor\n\
             Space: {building} {room}\n\
             Date: {date}\n\
             Time: {time}\n",
            building = self.building,
            floor = reservation.room.floor,
            room = reservation.room.room_number,
            date = date,
            time = time,
        )
    }

    pub fn confirmation_request(&self, reservation: &Reservation) -> Email {
        let (date, time) = Self::when(reservation);
        let body = format!(
            "Dear {name},\n\n\
             Please confirm your booking within 1 hour by visiting:\n{confirm}\n\n\
             Your reservation for {building} Study Room {room} on {date} from {time} is submitted.\n\n\
             To cancel this booking visit:\n{cancel}\n\n\
             Thank you for reserving with our system!",
            name = reservation.student.name,
            confirm = self.confirm_url(reservation.data.id),
            building = self.building,
            room = reservation.room.room_number,
            date = date,
            time = time,
            cancel = self.cancel_url(reservation.data.id),
        );
        Email {
            to: reservation.student.email.clone(),
            subject: "Your Study Room Reservation Confirmation".to_string(),
            body,
        }
    }

    pub fn confirmed(&self, reservation: &Reservation) -> Email {
        let body = format!(
            "Hi {name},\n\n\
             The following bookings have been confirmed:\n\n\
             {details}\n\
             Thank you for reserving with our system!",
            name = reservation.student.name,
            details = self.details(reservation),
        );
        Email {
            to: reservation.student.email.clone(),
            subject: format!(
                "{} Study Rooms {} Floor Booking Confirmation",
                self.building, reservation.room.floor
            ),
            body,
        }
    }

    pub fn cancelled(&self, reservation: &Reservation) -> Email {
        let body = format!(
            "Hi {name},\n\n\
             The following bookings have been cancelled:\n\n\
             {details}\n\
             We are sorry for the inconvenience.\n\
             Thank you for reserving with our system!",
            name = reservation.student.name,
            details = self.details(reservation),
        );
        Email {
            to: reservation.student.email.clone(),
            subject: "Booking Cancellation".to_string(),
            body,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        booking::ReservationStatus,
        models::{
            reservations::ReservationData, rooms::RoomData, students::StudentData,
            timeslots::Timeslot,
        },
    };
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::Arc;

    fn reservation() -> Reservation {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        Reservation {
            data: ReservationData {
                id: 7,
                student_id: 1,
                room_id: 1,
                date,
                start_time: start,
                end_time: end,
                status: "pending".to_string(),
                created_at: date.and_hms_opt(8, 0, 0).unwrap(),
            },
            status: ReservationStatus::Pending,
            student: StudentData {
                id: 1,
                institution_id: "20000001".to_string(),
                name: "Ada Lovelace".to_string(),
                email: "ada@example.edu".to_string(),
            },
            room: RoomData {
                id: 1,
                room_number: "2.205".to_string(),
                floor: "2nd".to_string(),
            },
            slots: vec![Timeslot {
                id: 1,
                start_time: start,
                end_time: end,
            }],
        }
    }

    #[test]
    fn request_email_carries_both_links() {
        let templates = Templates::new("http://rooms.example.edu/", "EIEAB");
        let email = templates.confirmation_request(&reservation());
        assert_eq!(email.to, "ada@example.edu");
        assert!(email
            .body
            .contains("http://rooms.example.edu/reservations/confirm/7"));
        assert!(email
            .body
            .contains("http://rooms.example.edu/reservations/cancel/7"));
        assert!(email.body.contains("Monday, March 03, 2025"));
        assert!(email.body.contains("09:00 AM - 10:00 AM"));
    }

    #[test]
    fn confirmed_subject_names_floor() {
        let templates = Templates::new("http://localhost", "EIEAB");
        let email = templates.confirmed(&reservation());
        assert_eq!(email.subject, "EIEAB Study Rooms 2nd Floor Booking Confirmation");
        assert!(email.body.contains("Space: EIEAB 2.205"));
    }

    #[test]
    fn cancelled_email() {
        let templates = Templates::new("http://localhost", "EIEAB");
        let email = templates.cancelled(&reservation());
        assert_eq!(email.subject, "Booking Cancellation");
        assert!(email.body.contains("have been cancelled"));
    }

    struct ChannelMailer {
        delivered: mpsc::Sender<String>,
        fail_for: String,
    }

    impl Mailer for ChannelMailer {
        fn send(&self, email: &Email) -> Result<(), DeliveryFailed> {
            if email.to == self.fail_for {
                return Err(DeliveryFailed {
                    to: email.to.clone(),
                    reason: "mailbox full".to_string(),
                });
            }
            self.delivered.send(email.to.clone()).unwrap();
            Ok(())
        }
    }

    #[test]
    fn outbox_delivers_in_order_and_swallows_failures() {
        let (tx, rx) = mpsc::channel();
        let outbox = Arc::new(
            Outbox::start(Box::new(ChannelMailer {
                delivered: tx,
                fail_for: "bounce@example.edu".to_string(),
            }))
            .unwrap(),
        );

        for to in &["a@example.edu", "bounce@example.edu", "b@example.edu"] {
            outbox.notify(Email {
                to: to.to_string(),
                subject: "s".to_string(),
                body: "b".to_string(),
            });
        }
        outbox.shutdown();

        let delivered: Vec<String> = rx.try_iter().collect();
        assert_eq!(delivered, vec!["a@example.edu", "b@example.edu"]);

        // after shutdown emails are dropped, not panicked on
        outbox.notify(Email {
            to: "late@example.edu".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        });
    }
}
