//! Pure snapshot assembly over an in-memory ticket set.
//!
//! Everything here is a function of `(queue, tickets, now)` so the ordering
//! and statistics rules are testable without a database.

use super::model::{QueueSnapshot, QueueStatistics};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use turnera_commons::{Queue, Ticket, TicketStatus};

/// How many waiting tickets a snapshot exposes.
pub const NEXT_TICKETS_LIMIT: usize = 5;

/// How many recently called tickets a snapshot exposes.
pub const LAST_CALLED_LIMIT: usize = 5;

/// How many recently completed tickets a snapshot exposes.
pub const COMPLETED_LIMIT: usize = 10;

/// Recent window used to estimate the per-ticket service time.
const SERVICE_ESTIMATE_WINDOW_HOURS: i64 = 3;

/// Assemble a snapshot from the queue record and its full ticket set.
pub fn assemble(queue: &Queue, tickets: &[Ticket], now: DateTime<Utc>) -> QueueSnapshot {
    let mut waiting: Vec<&Ticket> = Vec::new();
    let mut called: Vec<&Ticket> = Vec::new();
    let mut completed: Vec<&Ticket> = Vec::new();
    let mut no_show: Vec<&Ticket> = Vec::new();

    for ticket in tickets {
        match ticket.status {
            TicketStatus::Waiting => waiting.push(ticket),
            TicketStatus::Called => called.push(ticket),
            TicketStatus::Completed => completed.push(ticket),
            TicketStatus::NoShow => no_show.push(ticket),
            TicketStatus::Cancelled => {}
        }
    }

    // Priority is the primary ordering key; recency never overrides it.
    waiting.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
    });

    // Most recently called first. Tickets without a call timestamp sort last.
    called.sort_by(|a, b| b.called_at.cmp(&a.called_at));
    completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    let mut last_called: Vec<&Ticket> = tickets.iter().filter(|t| t.called_at.is_some()).collect();
    last_called.sort_by(|a, b| b.called_at.cmp(&a.called_at));

    let statistics = compute_statistics(queue, tickets, &waiting, &called, &completed, &no_show, now);

    QueueSnapshot {
        queue_id: queue.id.clone(),
        queue_name: queue.name.clone(),
        current_ticket: called.first().map(|t| (*t).clone()),
        previous_ticket: called.get(1).map(|t| (*t).clone()),
        next_ticket: waiting.first().map(|t| (*t).clone()),
        next_tickets: clone_first(&waiting, NEXT_TICKETS_LIMIT),
        last_called_tickets: clone_first(&last_called, LAST_CALLED_LIMIT),
        completed_tickets: clone_first(&completed, COMPLETED_LIMIT),
        statistics,
    }
}

fn clone_first(tickets: &[&Ticket], limit: usize) -> Vec<Ticket> {
    tickets.iter().take(limit).map(|t| (*t).clone()).collect()
}

#[allow(clippy::too_many_arguments)]
fn compute_statistics(
    queue: &Queue,
    tickets: &[Ticket],
    waiting: &[&Ticket],
    called: &[&Ticket],
    completed: &[&Ticket],
    no_show: &[&Ticket],
    now: DateTime<Utc>,
) -> QueueStatistics {
    let today = now.date_naive();

    let completed_today: Vec<&Ticket> = completed
        .iter()
        .copied()
        .filter(|t| matches!(t.completed_at, Some(at) if at.date_naive() == today))
        .collect();

    let no_show_today = no_show
        .iter()
        .filter(|t| t.called_at.unwrap_or(t.created_at).date_naive() == today)
        .count();

    let avg_wait_seconds = mean_service_seconds(completed_today.iter().copied());

    let next_estimated_seconds = waiting.len() as f64 * service_estimate_seconds(queue, tickets, now);

    let created_today = tickets
        .iter()
        .filter(|t| t.created_at.date_naive() == today)
        .count();
    let completed_of_today = tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Completed && t.created_at.date_naive() == today)
        .count();
    let no_show_of_today = tickets
        .iter()
        .filter(|t| t.status == TicketStatus::NoShow && t.created_at.date_naive() == today)
        .count();

    QueueStatistics {
        total_waiting: waiting.len(),
        total_called: called.len(),
        total_completed: completed.len(),
        completed_today: completed_today.len(),
        no_show_today,
        avg_wait_seconds,
        next_estimated_seconds,
        completion_rate: percentage(completed_of_today, created_today),
        abandonment_rate: percentage(no_show_of_today, created_today),
    }
}

/// Mean `(completed_at − called_at)` in seconds over the given tickets.
/// Tickets missing either timestamp are skipped; an empty input yields 0.
fn mean_service_seconds<'a>(tickets: impl Iterator<Item = &'a Ticket>) -> f64 {
    let durations: Vec<i64> = tickets
        .filter_map(|t| match (t.called_at, t.completed_at) {
            (Some(called), Some(completed)) => Some((completed - called).num_seconds().max(0)),
            _ => None,
        })
        .collect();

    if durations.is_empty() {
        return 0.0;
    }
    durations.iter().sum::<i64>() as f64 / durations.len() as f64
}

/// Per-ticket service time estimate: mean over tickets called within the
/// recent window, falling back to the queue's configured average when the
/// window has no data.
fn service_estimate_seconds(queue: &Queue, tickets: &[Ticket], now: DateTime<Utc>) -> f64 {
    let window_start = now - ChronoDuration::hours(SERVICE_ESTIMATE_WINDOW_HOURS);

    let recent = mean_service_seconds(
        tickets
            .iter()
            .filter(|t| matches!(t.called_at, Some(at) if at >= window_start)),
    );

    if recent > 0.0 {
        recent
    } else {
        queue.avg_service_seconds as f64
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use turnera_commons::{QueueId, TenantId, TicketId};

    fn queue() -> Queue {
        Queue {
            id: QueueId::new("q-1"),
            tenant_id: TenantId::new("tn-1"),
            name: "Front desk".to_string(),
            avg_service_seconds: 120,
            is_active: true,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn ticket(id: &str, status: TicketStatus, priority: i32) -> Ticket {
        Ticket {
            id: TicketId::new(id),
            queue_id: QueueId::new("q-1"),
            display_number: format!("A-{}", id),
            status,
            priority,
            created_at: now(),
            called_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_empty_ticket_set_yields_zeroed_statistics() {
        let snapshot = assemble(&queue(), &[], now());

        assert!(snapshot.current_ticket.is_none());
        assert!(snapshot.previous_ticket.is_none());
        assert!(snapshot.next_ticket.is_none());
        assert!(snapshot.next_tickets.is_empty());
        assert!(snapshot.last_called_tickets.is_empty());
        assert!(snapshot.completed_tickets.is_empty());
        assert_eq!(snapshot.statistics, QueueStatistics::zero());
    }

    #[test]
    fn test_next_tickets_priority_beats_recency() {
        // [priority=3, created=t1], [priority=1, created=t0], [priority=3, created=t2]
        let base = now();
        let mut t0 = ticket("t0", TicketStatus::Waiting, 1);
        t0.created_at = base;
        let mut t1 = ticket("t1", TicketStatus::Waiting, 3);
        t1.created_at = base + ChronoDuration::minutes(1);
        let mut t2 = ticket("t2", TicketStatus::Waiting, 3);
        t2.created_at = base + ChronoDuration::minutes(2);

        let snapshot = assemble(&queue(), &[t1, t0, t2], now());

        let order: Vec<&str> = snapshot
            .next_tickets
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(order, vec!["t1", "t2", "t0"]);
        assert_eq!(snapshot.next_ticket.unwrap().id.as_str(), "t1");
    }

    #[test]
    fn test_next_tickets_truncates_to_limit() {
        let tickets: Vec<Ticket> = (0..8)
            .map(|i| {
                let mut t = ticket(&format!("t{}", i), TicketStatus::Waiting, 0);
                t.created_at = now() + ChronoDuration::seconds(i);
                t
            })
            .collect();

        let snapshot = assemble(&queue(), &tickets, now());
        assert_eq!(snapshot.next_tickets.len(), NEXT_TICKETS_LIMIT);
        assert_eq!(snapshot.statistics.total_waiting, 8);
    }

    #[test]
    fn test_current_and_previous_are_most_recently_called() {
        let mut older = ticket("older", TicketStatus::Called, 0);
        older.called_at = Some(now() - ChronoDuration::minutes(10));
        let mut newer = ticket("newer", TicketStatus::Called, 0);
        newer.called_at = Some(now() - ChronoDuration::minutes(2));

        let snapshot = assemble(&queue(), &[older, newer], now());

        assert_eq!(snapshot.current_ticket.unwrap().id.as_str(), "newer");
        assert_eq!(snapshot.previous_ticket.unwrap().id.as_str(), "older");
    }

    #[test]
    fn test_avg_wait_covers_only_todays_completions() {
        let mut today = ticket("a", TicketStatus::Completed, 0);
        today.called_at = Some(now() - ChronoDuration::minutes(10));
        today.completed_at = Some(now() - ChronoDuration::minutes(7)); // 180s

        let mut yesterday = ticket("b", TicketStatus::Completed, 0);
        yesterday.created_at = now() - ChronoDuration::days(1);
        yesterday.called_at = Some(now() - ChronoDuration::days(1));
        yesterday.completed_at = Some(now() - ChronoDuration::days(1) + ChronoDuration::hours(2));

        let snapshot = assemble(&queue(), &[today, yesterday], now());

        assert_eq!(snapshot.statistics.completed_today, 1);
        assert!((snapshot.statistics.avg_wait_seconds - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_estimate_falls_back_to_configured_service_time() {
        let waiting: Vec<Ticket> = (0..3)
            .map(|i| ticket(&format!("w{}", i), TicketStatus::Waiting, 0))
            .collect();

        let snapshot = assemble(&queue(), &waiting, now());

        // No recent service history: 3 waiting × 120s configured average.
        assert!((snapshot.statistics.next_estimated_seconds - 360.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_estimate_uses_recent_service_window() {
        let mut recent = ticket("r", TicketStatus::Completed, 0);
        recent.called_at = Some(now() - ChronoDuration::hours(1));
        recent.completed_at = Some(now() - ChronoDuration::hours(1) + ChronoDuration::seconds(60));

        // Called long before the window; must not contribute.
        let mut stale = ticket("s", TicketStatus::Completed, 0);
        stale.created_at = now() - ChronoDuration::hours(7);
        stale.called_at = Some(now() - ChronoDuration::hours(6));
        stale.completed_at = Some(now() - ChronoDuration::hours(5));

        let waiting = ticket("w", TicketStatus::Waiting, 0);

        let snapshot = assemble(&queue(), &[recent, stale, waiting], now());

        assert!((snapshot.statistics.next_estimated_seconds - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_completion_and_abandonment_rates() {
        let mut done = ticket("done", TicketStatus::Completed, 0);
        done.called_at = Some(now());
        done.completed_at = Some(now());
        let mut gone = ticket("gone", TicketStatus::NoShow, 0);
        gone.called_at = Some(now());
        let open = ticket("open", TicketStatus::Waiting, 0);
        let cancelled = ticket("x", TicketStatus::Cancelled, 0);

        let snapshot = assemble(&queue(), &[done, gone, open, cancelled], now());

        assert!((snapshot.statistics.completion_rate - 25.0).abs() < f64::EPSILON);
        assert!((snapshot.statistics.abandonment_rate - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_completed_list_ordered_and_capped() {
        let tickets: Vec<Ticket> = (0..12)
            .map(|i| {
                let mut t = ticket(&format!("c{}", i), TicketStatus::Completed, 0);
                t.called_at = Some(now() - ChronoDuration::minutes(30));
                t.completed_at = Some(now() - ChronoDuration::minutes(12 - i));
                t
            })
            .collect();

        let snapshot = assemble(&queue(), &tickets, now());

        assert_eq!(snapshot.completed_tickets.len(), COMPLETED_LIMIT);
        // Most recent completion first.
        assert_eq!(snapshot.completed_tickets[0].id.as_str(), "c11");
        assert_eq!(snapshot.statistics.total_completed, 12);
    }
}
