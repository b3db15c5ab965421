use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::Serialize;

use crate::api::UserRecord;

pub const TRAILING_WINDOW_DAYS: i64 = 7;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub label: String,
    pub new_records: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EndpointActivity {
    pub endpoint: &'static str,
    pub requests: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_count: usize,
    pub recent_count: usize,
    pub growth_rate: f64,
    pub daily_histogram: Vec<DayBucket>,
    pub endpoint_activity: Vec<EndpointActivity>,
}

/// Derives the dashboard figures from a snapshot of the directory. `now` is
/// always injected so reporting windows can be pinned in tests; day buckets
/// follow the local calendar since the numbers are human-facing.
pub fn derive(records: &[UserRecord], now: DateTime<Local>) -> MetricsSnapshot {
    let total_count = records.len();

    let week_ago = now - Duration::days(TRAILING_WINDOW_DAYS);
    let recent_count = records
        .iter()
        .filter(|r| r.created_at.with_timezone(&Local) > week_ago)
        .count();

    let growth_rate = if total_count == 0 {
        0.0
    } else {
        round_one_decimal(recent_count as f64 / total_count as f64 * 100.0)
    };

    MetricsSnapshot {
        total_count,
        recent_count,
        growth_rate,
        daily_histogram: daily_histogram(records, now),
        endpoint_activity: endpoint_activity(total_count),
    }
}

/// One bucket per local calendar day, oldest to newest, today last. Each
/// day's bounds are built from scratch; a record counts for the day whose
/// `[00:00:00.000, 23:59:59.999]` window contains it.
fn daily_histogram(records: &[UserRecord], now: DateTime<Local>) -> Vec<DayBucket> {
    let today = now.date_naive();
    let mut buckets = Vec::with_capacity(TRAILING_WINDOW_DAYS as usize);

    for offset in (0..TRAILING_WINDOW_DAYS).rev() {
        let day = today - Duration::days(offset);
        let day_start = day.and_hms_opt(0, 0, 0).expect("midnight is valid");
        let day_end = day
            .and_hms_milli_opt(23, 59, 59, 999)
            .expect("end of day is valid");

        let new_records = records
            .iter()
            .filter(|r| {
                let local = r.created_at.with_timezone(&Local).naive_local();
                local >= day_start && local <= day_end
            })
            .count();

        buckets.push(DayBucket {
            day,
            label: day.format("%d %b").to_string(),
            new_records,
        });
    }

    buckets
}

/// Per-endpoint request volumes estimated from the directory size with fixed
/// multipliers. Illustrative placeholders for the dashboard chart, not
/// measured telemetry.
pub fn endpoint_activity(total_count: usize) -> Vec<EndpointActivity> {
    let t = total_count as u64;
    vec![
        EndpointActivity {
            endpoint: "/users",
            requests: t * 15,
        },
        EndpointActivity {
            endpoint: "/users/login",
            requests: t * 12,
        },
        EndpointActivity {
            endpoint: "/users/me",
            requests: t * 8,
        },
        EndpointActivity {
            endpoint: "POST /users",
            requests: t,
        },
        EndpointActivity {
            endpoint: "PUT /users",
            requests: (total_count as f64 * 0.5).floor() as u64,
        },
        EndpointActivity {
            endpoint: "DELETE /users",
            requests: (total_count as f64 * 0.1).floor() as u64,
        },
    ]
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
