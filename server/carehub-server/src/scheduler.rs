//! Daily appointment reminders
//!
//! [`run_reminder_sweep`] is a plain async function so it can be driven
//! directly from tests with a [`FixedClock`]. [`spawn_reminder_scheduler`]
//! wraps it in a tokio task that wakes once a day at the configured UTC time
//! and exits when the shutdown channel flips.

use chrono::{DateTime, Days, NaiveTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::notifications;
use crate::server::CareHubServer;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub examined: usize,
    pub sent: usize,
    pub failed: usize,
    /// Email is disabled; the appointment stays eligible for the next sweep
    pub skipped: usize,
}

/// Remind every open appointment dated tomorrow
///
/// An appointment is marked reminded only after its email went out.
/// Individual failures are counted and logged, never propagated.
pub async fn run_reminder_sweep(server: &CareHubServer) -> ApiResult<SweepSummary> {
    let now = server.clock.now();
    let Some(tomorrow) = now.date_naive().checked_add_days(Days::new(1)) else {
        return Ok(SweepSummary::default());
    };

    let due = server.appointments.due_for_reminder(tomorrow).await?;
    let mut summary = SweepSummary {
        examined: due.len(),
        ..SweepSummary::default()
    };

    for appointment in due {
        let outcome = notifications::appointment_reminder(server, &appointment).await;
        if !outcome.success {
            summary.failed += 1;
            continue;
        }
        if outcome.email_sent != Some(true) {
            summary.skipped += 1;
            continue;
        }
        match server
            .appointments
            .mark_reminder_sent(appointment.id, server.clock.now())
            .await
        {
            Ok(()) => summary.sent += 1,
            Err(e) => {
                warn!(
                    appointment_id = %appointment.appointment_id,
                    error = %e,
                    "Reminder sent but could not be recorded"
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        date = %tomorrow,
        examined = summary.examined,
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "Reminder sweep finished"
    );
    Ok(summary)
}

/// Next occurrence of `hour:minute` UTC strictly after `now`
pub fn next_run_after(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today.checked_add_days(Days::new(1)).unwrap_or(today)
    }
}

pub fn spawn_reminder_scheduler(
    server: CareHubServer,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let hour = server.config.reminders.hour;
        let minute = server.config.reminders.minute;
        info!(hour, minute, "Reminder scheduler started");

        loop {
            let now = server.clock.now();
            let next = next_run_after(now, hour, minute);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = run_reminder_sweep(&server).await {
                        warn!(error = %e, "Reminder sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Reminder scheduler stopped");
    })
}
