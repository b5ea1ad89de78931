// Order timestamp normalisation and row enrichment.
//
// The order-date column of the source dataset carries only a time of day
// (`HH:MM:SS.ffffff`). To get a usable timestamp each value is joined onto
// a fixed reference date. The calendar fields derived from it (year, month,
// ISO week) therefore describe that reference date, not when the order was
// placed; they are kept because the temporal summaries are defined over
// them.

use crate::types::{EnrichedOrder, EnrichedTable, OrderPeriod, OrderStatus, OrderTable};
use chrono::{Datelike, NaiveDateTime};
use tracing::{info, warn};

/// Date substituted for the missing calendar part of every order time.
pub const REFERENCE_DATE: &str = "2025-03-11";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse a time-of-day value onto `REFERENCE_DATE`.
///
/// The fractional seconds part is mandatory, as in `14:23:05.123456`.
/// Anything else yields `None` rather than an error.
pub fn normalize_order_time(time: &str) -> Option<NaiveDateTime> {
    let (_, fraction) = time.rsplit_once('.')?;
    if fraction.is_empty() || fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let joined = format!("{} {}", REFERENCE_DATE, time);
    NaiveDateTime::parse_from_str(&joined, TIMESTAMP_FORMAT).ok()
}

pub fn order_period(ts: &NaiveDateTime) -> OrderPeriod {
    OrderPeriod {
        year: ts.year(),
        month: ts.month(),
        week: ts.iso_week().week(),
    }
}

/// Attach timestamp, calendar fields and status to every loaded row.
pub fn enrich(table: OrderTable) -> EnrichedTable {
    let mut invalid_dates = 0usize;
    let rows: Vec<EnrichedOrder> = table
        .records
        .into_iter()
        .map(|record| {
            let order_date = normalize_order_time(&record.order_time);
            if order_date.is_none() {
                invalid_dates += 1;
            }
            let status = OrderStatus::from_flags(record.delivery_delay, record.refund_requested);
            EnrichedOrder {
                period: order_date.as_ref().map(order_period),
                order_date,
                status,
                record,
            }
        })
        .collect();

    if invalid_dates > 0 {
        warn!(
            "{} of {} order times did not parse; their Year/Month/Week are undefined",
            invalid_dates,
            rows.len()
        );
    }
    info!("Enriched {} rows with reference date {}", rows.len(), REFERENCE_DATE);

    EnrichedTable {
        headers: table.headers,
        date_column: table.date_column,
        rows,
        invalid_dates,
    }
}
