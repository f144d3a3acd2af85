use chrono::DateTime;

use crate::ledger::derive_matrix;
use crate::models::Client;
use crate::month::Month;

const RECENT_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Per-client year totals
// ---------------------------------------------------------------------------

pub struct ClientYear {
    pub client_id: String,
    pub name: String,
    pub fixed_amount: f64,
    pub paid_months: usize,
    pub collected: f64,
    pub expected: f64,
    pub outstanding: f64,
}

pub fn client_year(client: &Client, year: i32) -> ClientYear {
    let matrix = derive_matrix(client, year);
    let collected: f64 = matrix.iter().map(|e| e.amount).sum();
    let expected = client.fixed_amount * 12.0;
    ClientYear {
        client_id: client.id.clone(),
        name: client.name.clone(),
        fixed_amount: client.fixed_amount,
        paid_months: matrix.iter().filter(|e| e.amount > 0.0).count(),
        collected,
        expected,
        outstanding: expected - collected,
    }
}

// ---------------------------------------------------------------------------
// Dashboard summary
// ---------------------------------------------------------------------------

pub struct RecentPayment {
    pub client_name: String,
    pub year: i32,
    pub month: Month,
    pub amount: f64,
    pub date: String,
}

pub struct DashboardSummary {
    pub year: i32,
    pub total_clients: usize,
    pub paid_months: usize,
    pub expected: f64,
    pub collected: f64,
    pub outstanding: f64,
    pub clients: Vec<ClientYear>,
    pub recent: Vec<RecentPayment>,
}

pub fn get_summary(clients: &[Client], year: i32) -> DashboardSummary {
    let mut rows: Vec<ClientYear> = clients.iter().map(|c| client_year(c, year)).collect();
    rows.sort_by(|a, b| b.outstanding.total_cmp(&a.outstanding).then_with(|| a.name.cmp(&b.name)));

    DashboardSummary {
        year,
        total_clients: clients.len(),
        paid_months: rows.iter().map(|r| r.paid_months).sum(),
        expected: rows.iter().map(|r| r.expected).sum(),
        collected: rows.iter().map(|r| r.collected).sum(),
        outstanding: rows.iter().map(|r| r.outstanding).sum(),
        clients: rows,
        recent: recent_payments(clients, RECENT_LIMIT),
    }
}

/// Most recent paid months across every client and year, newest first.
pub fn recent_payments(clients: &[Client], limit: usize) -> Vec<RecentPayment> {
    let mut recent: Vec<RecentPayment> = Vec::new();
    for client in clients {
        for year in client.years() {
            for entry in derive_matrix(client, year) {
                let Some(date) = entry.date.filter(|_| entry.amount > 0.0) else {
                    continue;
                };
                recent.push(RecentPayment {
                    client_name: client.name.clone(),
                    year,
                    month: entry.month,
                    amount: entry.amount,
                    date,
                });
            }
        }
    }
    recent.sort_by(|a, b| sort_key(&b.date).cmp(&sort_key(&a.date)));
    recent.truncate(limit);
    recent
}

/// Timestamps compare by instant; anything unparseable sorts oldest.
fn sort_key(date: &str) -> (bool, i64, String) {
    match DateTime::parse_from_rfc3339(date) {
        Ok(dt) => (true, dt.timestamp_millis(), String::new()),
        Err(_) => (false, 0, date.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testutil::client_with_payments;

    fn sample() -> Vec<Client> {
        vec![
            client_with_payments(
                "a",
                100.0,
                json!({"2025": {
                    "January": {"enteredAmount": 100, "date": "2025-01-03T00:00:00.000Z"},
                    "February": {"enteredAmount": 60, "date": "2025-02-04T00:00:00.000Z"}
                }}),
            ),
            client_with_payments(
                "b",
                200.0,
                json!({
                    "2024": {"December": {"enteredAmount": 200, "date": "2024-12-20T00:00:00.000Z"}},
                    "2025": {"March": {"enteredAmount": 200, "date": "2025-03-01T00:00:00.000Z"},
                             "April": {"enteredAmount": 0, "date": "2025-04-01T00:00:00.000Z"}}
                }),
            ),
        ]
    }

    #[test]
    fn test_client_year_totals() {
        let clients = sample();
        let row = client_year(&clients[0], 2025);
        assert_eq!(row.paid_months, 2);
        assert_eq!(row.collected, 160.0);
        assert_eq!(row.expected, 1200.0);
        assert_eq!(row.outstanding, 1040.0);
    }

    #[test]
    fn test_summary_totals() {
        let summary = get_summary(&sample(), 2025);
        assert_eq!(summary.total_clients, 2);
        assert_eq!(summary.paid_months, 3);
        assert_eq!(summary.expected, 3600.0);
        assert_eq!(summary.collected, 360.0);
        assert_eq!(summary.outstanding, 3240.0);
        assert_eq!(summary.clients[0].client_id, "b");
    }

    #[test]
    fn test_recent_payments_newest_first_and_paid_only() {
        let recent = recent_payments(&sample(), 5);
        let months: Vec<Month> = recent.iter().map(|r| r.month).collect();
        assert_eq!(
            months,
            vec![Month::March, Month::February, Month::January, Month::December]
        );
        assert_eq!(recent[3].year, 2024);
    }

    #[test]
    fn test_recent_payments_limit() {
        assert_eq!(recent_payments(&sample(), 2).len(), 2);
        assert!(recent_payments(&[], 5).is_empty());
    }
}
