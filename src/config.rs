use anyhow::{bail, Context};
use chrono::NaiveTime;

use crate::{
    booking::{Rules, SlotGrid},
    notify::{LogMailer, Mailer, SendmailMailer},
    utils::parse_clock_str,
};

#[derive(Clone, Debug, PartialEq)]
pub enum MailerKind {
    Log,
    Sendmail(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub public_base_url: String,
    pub building_name: String,
    pub mailer: MailerKind,
    pub mail_from: String,
    pub grid: SlotGrid,
    pub max_slots: usize,
    pub forbid_student_overlap: bool,
    pub daily_reset_at: NaiveTime,
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{}: expected a boolean, got '{}'", key, other),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads every setting through `lookup`, falling back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let clock = |key: &str, default: &str| {
            parse_clock_str(get(key, default)).with_context(|| format!("Wrong format on '{}'", key))
        };
        let minutes = |key: &str, default: &str| {
            get(key, default)
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Wrong format on '{}'", key))
        };

        let opening = clock("OPENING_TIME", "09:00")?;
        let closing = clock("CLOSING_TIME", "17:00")?;
        let slot_minutes = minutes("SLOT_MINUTES", "30")?;
        let grid = SlotGrid::new(opening, closing, slot_minutes).context("Invalid slot grid")?;

        let max_minutes = minutes("MAX_RESERVATION_MINUTES", "120")?;
        if max_minutes == 0 || max_minutes % slot_minutes != 0 {
            bail!(
                "MAX_RESERVATION_MINUTES ({}) must be a positive multiple of SLOT_MINUTES ({})",
                max_minutes,
                slot_minutes
            );
        }

        let mailer = match get("MAILER", "log").trim() {
            "log" => MailerKind::Log,
            "sendmail" => MailerKind::Sendmail(get("SENDMAIL_PATH", "sendmail")),
            other => bail!("MAILER: unknown mailer '{}'", other),
        };

        Ok(Self {
            database_url: get("DATABASE_URL", "study_rooms.db"),
            bind_addr: get("BIND_ADDR", "127.0.0.1:8080"),
            public_base_url: get("PUBLIC_BASE_URL", "http://127.0.0.1:8080"),
            building_name: get("BUILDING_NAME", "EIEAB"),
            mailer,
            mail_from: get("MAIL_FROM", "reservations@yourstudyrooms.com"),
            grid,
            max_slots: (max_minutes / slot_minutes) as usize,
            forbid_student_overlap: parse_bool(
                "FORBID_STUDENT_OVERLAP",
                &get("FORBID_STUDENT_OVERLAP", "false"),
            )?,
            daily_reset_at: clock("DAILY_RESET_AT", "21:00")?,
        })
    }

    pub fn rules(&self) -> Rules {
        Rules {
            max_slots: self.max_slots,
            opening: self.grid.opening(),
            closing: self.grid.closing(),
            forbid_student_overlap: self.forbid_student_overlap,
        }
    }

    pub fn build_mailer(&self) -> Box<dyn Mailer> {
        match &self.mailer {
            MailerKind::Log => Box::new(LogMailer {
                from: self.mail_from.clone(),
            }),
            MailerKind::Sendmail(program) => Box::new(SendmailMailer {
                from: self.mail_from.clone(),
                program: program.clone(),
            }),
        }
    }
}
