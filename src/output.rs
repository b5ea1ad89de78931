use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::{
    AnalysisSummary, CategoryRating, EnrichedOrder, EnrichedTable, PlatformDiagnostics,
    Summaries,
};
use crate::util::{format_int, format_number, parse_f64_safe};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const RAW_DATA_SHEET: &str = "Raw Data";
pub const FREQUENT_CUSTOMERS_SHEET: &str = "Frequent Customers";
pub const PLATFORM_PERFORMANCE_SHEET: &str = "Platform Performance";
pub const TOP_RATED_SHEET: &str = "Top Rated Products";
pub const LOWEST_RATED_SHEET: &str = "Lowest Rated Products";
pub const PROFIT_SHEET: &str = "Profit Analysis";
pub const ORDER_STATUS_SHEET: &str = "Order Status";

const DERIVED_COLUMNS: [&str; 4] = ["Year", "Month", "Week", "Status"];

/// Add a named sheet with a bold header row; data starts on row 1.
fn add_sheet<'a>(
    workbook: &'a mut Workbook,
    name: &str,
    headers: &[&str],
) -> Result<&'a mut Worksheet> {
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, h) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *h, &bold)?;
    }
    Ok(sheet)
}

fn write_ratings(workbook: &mut Workbook, name: &str, ratings: &[CategoryRating]) -> Result<()> {
    let sheet = add_sheet(workbook, name, &["Product Category", "Service Rating"])?;
    for (i, r) in ratings.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &r.category)?;
        sheet.write_number(row, 1, r.avg_rating)?;
    }
    Ok(())
}

/// Every input column in its original order, then the derived columns.
/// The order-date column holds the normalised timestamp.
fn write_raw_data(workbook: &mut Workbook, table: &EnrichedTable) -> Result<()> {
    let headers: Vec<&str> = table
        .headers
        .iter()
        .map(String::as_str)
        .chain(DERIVED_COLUMNS)
        .collect();
    let timestamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss.000");
    let sheet = add_sheet(workbook, RAW_DATA_SHEET, &headers)?;
    let derived_at = table.headers.len() as u16;

    for (i, order) in table.rows.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in order.record.cells.iter().enumerate() {
            let col16 = col as u16;
            if col == table.date_column {
                if let Some(ts) = &order.order_date {
                    sheet.write_datetime_with_format(row, col16, ts, &timestamp)?;
                }
            } else if let Some(v) = parse_f64_safe(cell) {
                sheet.write_number(row, col16, v)?;
            } else if !cell.is_empty() {
                sheet.write_string(row, col16, cell)?;
            }
        }
        write_derived(sheet, row, derived_at, order)?;
    }
    Ok(())
}

fn write_derived(sheet: &mut Worksheet, row: u32, col: u16, order: &EnrichedOrder) -> Result<()> {
    if let Some(p) = order.period {
        sheet.write_number(row, col, p.year)?;
        sheet.write_number(row, col + 1, p.month)?;
        sheet.write_number(row, col + 2, p.week)?;
    }
    sheet.write_string(row, col + 3, order.status.as_str())?;
    Ok(())
}

/// Write the multi-sheet workbook. An existing file is replaced.
pub fn write_workbook(path: &Path, table: &EnrichedTable, s: &Summaries) -> Result<()> {
    let mut workbook = Workbook::new();

    write_raw_data(&mut workbook, table)?;

    let sheet = add_sheet(&mut workbook, FREQUENT_CUSTOMERS_SHEET, &["Customer ID", "Orders"])?;
    for (i, c) in s.frequent_customers.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &c.customer_id)?;
        sheet.write_number(row, 1, c.orders as f64)?;
    }

    let sheet = add_sheet(
        &mut workbook,
        PLATFORM_PERFORMANCE_SHEET,
        &["Platform", "Service Rating", "Order Value (INR)", "Unique Orders"],
    )?;
    for (i, p) in s.platform_performance.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &p.platform)?;
        if let Some(avg) = p.avg_rating {
            sheet.write_number(row, 1, avg)?;
        }
        sheet.write_number(row, 2, p.total_value)?;
        sheet.write_number(row, 3, p.unique_orders as f64)?;
    }

    write_ratings(&mut workbook, TOP_RATED_SHEET, &s.top_rated)?;
    write_ratings(&mut workbook, LOWEST_RATED_SHEET, &s.lowest_rated)?;

    let sheet = add_sheet(&mut workbook, PROFIT_SHEET, &["Platform", "Order Value (INR)"])?;
    for (i, p) in s.profit.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &p.platform)?;
        sheet.write_number(row, 1, p.total_value)?;
    }

    let sheet = add_sheet(&mut workbook, ORDER_STATUS_SHEET, &["Status", "Percentage"])?;
    for (i, share) in s.status_distribution.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, share.status.as_str())?;
        sheet.write_number(row, 1, share.percent)?;
    }

    workbook.save(path)?;
    info!("Workbook saved to {}", path.display());
    Ok(())
}

pub fn build_summary<'a>(table: &EnrichedTable, s: &'a Summaries) -> AnalysisSummary<'a> {
    AnalysisSummary {
        total_rows: s.total_rows,
        unique_orders: s.unique_orders,
        invalid_timestamps: table.invalid_dates,
        frequent_customers: s.frequent_customers.len(),
        best_platform: s.extremes.as_ref().map(|e| e.best.as_str()),
        worst_platform: s.extremes.as_ref().map(|e| e.worst.as_str()),
        diagnostics: &s.diagnostics,
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!("Summary saved to {}", path.display());
    Ok(())
}

pub fn preview_table<T: Tabled + Clone>(title: &str, rows: &[T]) {
    println!("{}", title);
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

fn print_diagnostics(d: &PlatformDiagnostics) {
    println!("\n{}:", d.platform);
    match d.avg_rating {
        Some(avg) => println!(" - Average Rating: {}", format_number(avg, 2)),
        None => println!(" - Average Rating: n/a"),
    }
    println!(" - Delay Rate: {}%", format_number(d.delay_rate, 2));
    println!(" - Refund Rate: {}%", format_number(d.refund_rate, 2));
    println!(" - Common Complaints:");
    if d.common_complaints.is_empty() {
        println!("   (none)");
    }
    for c in &d.common_complaints {
        println!("   {} ({})", c.feedback, format_int(c.count));
    }
    println!(" - Suggestion: {}", d.suggestion);
}

fn frequent_customers_title(cfg: &AnalysisConfig) -> String {
    format!("Customers with >{} Orders:", cfg.frequent_customer_above)
}

fn top_rated_title(cfg: &AnalysisConfig) -> String {
    format!("Top {} Highest Rated Product Categories:", cfg.top_rated_count)
}

fn lowest_rated_title(cfg: &AnalysisConfig) -> String {
    format!("Top {} Lowest Rated Product Categories:", cfg.lowest_rated_count)
}

/// Console report, printed in the order the summaries are computed. Table
/// titles quote the thresholds in `cfg`, not the number of rows found.
pub fn print_summaries(s: &Summaries, cfg: &AnalysisConfig) {
    println!("Total Unique Orders: {}\n", format_int(s.unique_orders));
    preview_table(&frequent_customers_title(cfg), &s.frequent_customers);
    preview_table("Yearly Orders:", &s.yearly_orders);
    preview_table("Monthly Orders:", &s.monthly_orders);
    preview_table("Weekly Orders:", &s.weekly_orders);
    preview_table("Platform Performance:", &s.platform_performance);

    match &s.extremes {
        Some(e) => {
            println!("Best Performing Platform: {}", e.best);
            println!("Least Performing Platform: {}\n", e.worst);
        }
        None => println!("Best/Least Performing Platform: n/a (no ratings)\n"),
    }

    preview_table(&top_rated_title(cfg), &s.top_rated);
    preview_table(&lowest_rated_title(cfg), &s.lowest_rated);
    preview_table("Profit Analysis (Total Order Value in INR):", &s.profit);
    preview_table("Order Status (%):", &s.status_distribution);

    println!("Improvement Suggestions:");
    for d in &s.diagnostics {
        print_diagnostics(d);
    }
    println!();
}
