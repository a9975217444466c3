//! Visibility filter - Cosa vede un utente di un insieme di promemoria
//!
//! I promemoria in ingresso sono già limitati a quelli che l'utente ha diritto di vedere.

use crate::dtos::{ReminderDTO, ReminderStatus};
use crate::entities::Reminder;
use chrono::{DateTime, Utc};

/// Done for the viewer: the viewer is in the done ledger.
pub fn is_done_for(reminder: &Reminder, viewer_id: &i32) -> bool {
    reminder.is_marked_done_by(viewer_id)
}

/// Active for the viewer: neither done nor snoozed into the future by them.
pub fn is_active_for(reminder: &Reminder, viewer_id: &i32, now: DateTime<Utc>) -> bool {
    !is_done_for(reminder, viewer_id) && !reminder.is_snoozed_for(viewer_id, now)
}

/// Keeps the viewer's partition, preserving input order.
pub fn filter_for_viewer(
    reminders: Vec<Reminder>,
    viewer_id: &i32,
    status: ReminderStatus,
    now: DateTime<Utc>,
) -> Vec<Reminder> {
    reminders
        .into_iter()
        .filter(|r| match status {
            ReminderStatus::Done => is_done_for(r, viewer_id),
            ReminderStatus::Active => is_active_for(r, viewer_id, now),
        })
        .collect()
}

/// Sidebar grouping on the projected global flag: not done first, then done,
/// each newest creation first.
pub fn sidebar_order(reminders: Vec<ReminderDTO>) -> Vec<ReminderDTO> {
    let (mut open, mut closed): (Vec<_>, Vec<_>) = reminders.into_iter().partition(|r| !r.is_done);
    open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    closed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    open.extend(closed);
    open
}
