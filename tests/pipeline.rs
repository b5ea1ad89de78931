// End-to-end checks of the load -> enrich -> aggregate -> report stages on a
// small fixture dataset.

use calamine::{open_workbook_auto, Data, Reader};
use ecommerce_analysis::config::{
    CATEGORY_SALES_CHART, MONTHLY_ORDERS_CHART, ORDER_STATUS_CHART, PROFIT_CHART,
};
use ecommerce_analysis::types::{OrderStatus, PeriodCount};
use ecommerce_analysis::{aggregate, charts, dates, loader, output, AnalysisConfig, AnalysisError};
use std::io::Write;
use std::path::PathBuf;
use tempfile::{tempdir, NamedTempFile};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/orders_sample.csv")
}

fn run() -> (ecommerce_analysis::types::EnrichedTable, ecommerce_analysis::types::Summaries) {
    let table = loader::load_orders(fixture()).expect("fixture should load");
    let enriched = dates::enrich(table);
    let summaries = aggregate::summarize(&enriched, &AnalysisConfig::default());
    (enriched, summaries)
}

#[test]
fn test_headers_are_trimmed_and_date_column_found() {
    let table = loader::load_orders(fixture()).unwrap();
    assert_eq!(table.headers[0], "Order ID");
    assert_eq!(table.date_column_name(), "Order Date");
    assert_eq!(table.records.len(), 25);
}

#[test]
fn test_invalid_time_does_not_abort() {
    let (table, _) = run();
    assert_eq!(table.invalid_dates, 1);
    let bad = table
        .rows
        .iter()
        .find(|r| r.record.order_time == "not-a-time")
        .unwrap();
    assert!(bad.order_date.is_none());
    assert!(bad.period.is_none());
}

#[test]
fn test_order_counts() {
    let (table, s) = run();
    assert_eq!(s.total_rows, 25);
    assert_eq!(s.unique_orders, 24);
    assert!(s.unique_orders <= table.rows.len());

    assert_eq!(s.frequent_customers.len(), 1);
    assert_eq!(s.frequent_customers[0].customer_id, "CUST100");
    assert_eq!(s.frequent_customers[0].orders, 13);
}

#[test]
fn test_temporal_counts_exclude_unparsed_rows() {
    let (_, s) = run();
    assert_eq!(s.yearly_orders, vec![PeriodCount { period: 2025, orders: 23 }]);
    assert_eq!(s.monthly_orders, vec![PeriodCount { period: 3, orders: 23 }]);
    assert_eq!(s.weekly_orders, vec![PeriodCount { period: 11, orders: 23 }]);
}

#[test]
fn test_category_sales_matrix_is_dense() {
    let (_, s) = run();
    let sales = &s.category_sales;
    assert_eq!(sales.platforms, vec!["Blinkit", "JioMart", "Swiggy Instamart"]);
    assert_eq!(sales.categories.len(), 4);
    for row in &sales.counts {
        assert_eq!(row.len(), sales.categories.len());
    }
    // ORD001 appears twice under JioMart/Snacks but counts once.
    assert_eq!(sales.get("JioMart", "Snacks"), 3);
}

#[test]
fn test_profit_sums_to_total_order_value() {
    let (table, s) = run();
    let per_platform: f64 = s.profit.iter().map(|p| p.total_value).sum();
    let overall: f64 = table.rows.iter().filter_map(|r| r.record.order_value).sum();
    assert!((per_platform - overall).abs() < 1e-6);
    assert!((overall - 30_050.0).abs() < 1e-6);
}

#[test]
fn test_status_distribution() {
    let (table, s) = run();
    let both = table
        .rows
        .iter()
        .find(|r| r.record.order_id.as_deref() == Some("ORD012"))
        .unwrap();
    assert!(both.record.delivery_delay && both.record.refund_requested);
    assert_eq!(both.status, OrderStatus::Cancelled);

    assert_eq!(s.status_distribution[0].status, OrderStatus::Delivered);
    assert!((s.status_distribution[0].percent - 68.0).abs() < 1e-9);
    let sum: f64 = s.status_distribution.iter().map(|x| x.percent).sum();
    assert!((sum - 100.0).abs() < 1e-9);
}

#[test]
fn test_diagnostics_cover_every_platform() {
    let (_, s) = run();
    let names: Vec<&str> = s.diagnostics.iter().map(|d| d.platform.as_str()).collect();
    // First appearance order in the file.
    assert_eq!(names, vec!["Swiggy Instamart", "JioMart", "Blinkit"]);
    for d in &s.diagnostics {
        assert!(d.common_complaints.len() <= 3);
        assert!((0.0..=100.0).contains(&d.delay_rate));
    }
    let ex = s.extremes.as_ref().unwrap();
    assert_ne!(ex.best, ex.worst);
}

#[test]
fn test_reports_written_to_output_dir() {
    let (table, s) = run();
    let dir = tempdir().unwrap();
    let cfg = AnalysisConfig::default().with_output_dir(dir.path());

    output::write_workbook(&cfg.workbook_path(), &table, &s).unwrap();
    output::write_json(&cfg.summary_path(), &output::build_summary(&table, &s)).unwrap();

    assert!(cfg.workbook_path().exists());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(cfg.summary_path()).unwrap()).unwrap();
    assert_eq!(json["unique_orders"], 24);
    assert_eq!(json["invalid_timestamps"], 1);
    assert_eq!(json["diagnostics"].as_array().unwrap().len(), 3);
}

#[test]
fn test_charts_rendered_to_output_dir() {
    let (_, s) = run();
    let dir = tempdir().unwrap();
    let cfg = AnalysisConfig::default().with_output_dir(dir.path());

    let written = charts::render_all(&s, &cfg).unwrap();
    let expected: Vec<PathBuf> = [
        CATEGORY_SALES_CHART,
        MONTHLY_ORDERS_CHART,
        PROFIT_CHART,
        ORDER_STATUS_CHART,
    ]
    .iter()
    .map(|name| dir.path().join(name))
    .collect();
    assert_eq!(written, expected);
    for path in &expected {
        let meta = std::fs::metadata(path).unwrap();
        assert!(meta.len() > 0, "{} is empty", path.display());
    }
}

#[test]
fn test_workbook_sheets_and_raw_data_layout() {
    let (table, s) = run();
    let dir = tempdir().unwrap();
    let cfg = AnalysisConfig::default().with_output_dir(dir.path());
    output::write_workbook(&cfg.workbook_path(), &table, &s).unwrap();

    let mut wb = open_workbook_auto(cfg.workbook_path()).unwrap();
    assert_eq!(
        wb.sheet_names(),
        vec![
            "Raw Data",
            "Frequent Customers",
            "Platform Performance",
            "Top Rated Products",
            "Lowest Rated Products",
            "Profit Analysis",
            "Order Status",
        ]
    );

    let raw = wb.worksheet_range("Raw Data").unwrap();
    let header: Vec<String> = raw.rows().next().unwrap().iter().map(Data::to_string).collect();
    let mut expected = table.headers.clone();
    expected.extend(["Year", "Month", "Week", "Status"].map(String::from));
    assert_eq!(header, expected);
    assert_eq!(raw.height(), table.rows.len() + 1);

    let status_col = header.len() - 1;
    let statuses: Vec<String> = raw.rows().skip(1).map(|r| r[status_col].to_string()).collect();
    assert!(statuses.iter().all(|st| ["Delivered", "Delayed", "Cancelled"].contains(&st.as_str())));

    let frequent = wb.worksheet_range("Frequent Customers").unwrap();
    assert_eq!(frequent.height(), s.frequent_customers.len() + 1);
}

#[test]
fn test_missing_column_is_configuration_error() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "Order ID,Customer ID,Platform,Order Date,Product Category").unwrap();
    writeln!(f, "ORD1,CUST1,Blinkit,10:00:00.0,Dairy").unwrap();

    let err = loader::load_orders(f.path()).unwrap_err();
    assert!(matches!(err, AnalysisError::ColumnNotFound(_)));
    assert!(err.is_configuration());
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");

    let io = loader::load_orders("does/not/exist.csv").unwrap_err();
    assert!(!io.is_configuration());
}
