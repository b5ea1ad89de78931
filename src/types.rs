use crate::util::format_number;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// One input row as loaded, before any derived columns are attached.
///
/// Empty cells in key columns are `None` and drop out of every grouping,
/// the way missing values do in a dataframe groupby.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub platform: Option<String>,
    pub category: Option<String>,
    /// Raw contents of the order-date column.
    pub order_time: String,
    pub service_rating: Option<f64>,
    pub order_value: Option<f64>,
    pub delivery_delay: bool,
    pub refund_requested: bool,
    pub feedback: Option<String>,
    /// Every cell of the row in header order, unused columns included.
    pub cells: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OrderTable {
    pub headers: Vec<String>,
    /// Index of the resolved order-date column within `headers`.
    pub date_column: usize,
    pub records: Vec<OrderRecord>,
}

impl OrderTable {
    pub fn date_column_name(&self) -> &str {
        &self.headers[self.date_column]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OrderStatus {
    Delivered,
    Delayed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [Self::Delivered, Self::Delayed, Self::Cancelled];

    /// A refund marks the order cancelled even when it was also delayed.
    pub fn from_flags(delivery_delay: bool, refund_requested: bool) -> Self {
        if refund_requested {
            Self::Cancelled
        } else if delivery_delay {
            Self::Delayed
        } else {
            Self::Delivered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "Delivered",
            Self::Delayed => "Delayed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar fields derived from a successfully parsed order timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPeriod {
    pub year: i32,
    pub month: u32,
    /// ISO 8601 week number.
    pub week: u32,
}

#[derive(Debug, Clone)]
pub struct EnrichedOrder {
    pub record: OrderRecord,
    pub order_date: Option<NaiveDateTime>,
    pub period: Option<OrderPeriod>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct EnrichedTable {
    pub headers: Vec<String>,
    pub date_column: usize,
    pub rows: Vec<EnrichedOrder>,
    /// Rows whose order-date value did not parse.
    pub invalid_dates: usize,
}

impl EnrichedTable {
    pub fn date_column_name(&self) -> &str {
        &self.headers[self.date_column]
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CustomerOrderCount {
    #[serde(rename = "Customer ID")]
    #[tabled(rename = "Customer ID")]
    pub customer_id: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: usize,
}

/// Distinct orders per (platform, category), platforms as rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySales {
    pub platforms: Vec<String>,
    pub categories: Vec<String>,
    /// `counts[p][c]` for `platforms[p]` and `categories[c]`.
    pub counts: Vec<Vec<usize>>,
}

impl CategorySales {
    /// Count for a pair, 0 when the pair never occurs.
    pub fn get(&self, platform: &str, category: &str) -> usize {
        let p = self.platforms.iter().position(|x| x == platform);
        let c = self.categories.iter().position(|x| x == category);
        match (p, c) {
            (Some(p), Some(c)) => self.counts[p][c],
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodField {
    Year,
    Month,
    Week,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct PeriodCount {
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: i64,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct PlatformPerformance {
    #[serde(rename = "Platform")]
    #[tabled(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Service Rating")]
    #[tabled(rename = "Service Rating", display_with = "display_opt")]
    pub avg_rating: Option<f64>,
    #[serde(rename = "Order Value (INR)")]
    #[tabled(rename = "Order Value (INR)", display_with = "display_2dp")]
    pub total_value: f64,
    #[serde(rename = "Unique Orders")]
    #[tabled(rename = "Unique Orders")]
    pub unique_orders: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlatformExtremes {
    pub best: String,
    pub worst: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategoryRating {
    #[serde(rename = "Product Category")]
    #[tabled(rename = "Product Category")]
    pub category: String,
    #[serde(rename = "Service Rating")]
    #[tabled(rename = "Service Rating", display_with = "display_2dp")]
    pub avg_rating: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct PlatformProfit {
    #[serde(rename = "Platform")]
    #[tabled(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Order Value (INR)")]
    #[tabled(rename = "Order Value (INR)", display_with = "display_2dp")]
    pub total_value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct StatusShare {
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: OrderStatus,
    #[serde(rename = "Percentage")]
    #[tabled(rename = "Percentage", display_with = "display_2dp")]
    pub percent: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ComplaintCount {
    pub feedback: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlatformDiagnostics {
    pub platform: String,
    pub avg_rating: Option<f64>,
    pub delay_rate: f64,
    pub refund_rate: f64,
    pub common_complaints: Vec<ComplaintCount>,
    pub suggestion: String,
}

/// Every summary table, computed once and handed to the reporters.
#[derive(Debug, Clone)]
pub struct Summaries {
    pub total_rows: usize,
    pub unique_orders: usize,
    pub frequent_customers: Vec<CustomerOrderCount>,
    pub category_sales: CategorySales,
    pub yearly_orders: Vec<PeriodCount>,
    pub monthly_orders: Vec<PeriodCount>,
    pub weekly_orders: Vec<PeriodCount>,
    pub platform_performance: Vec<PlatformPerformance>,
    pub extremes: Option<PlatformExtremes>,
    pub top_rated: Vec<CategoryRating>,
    pub lowest_rated: Vec<CategoryRating>,
    pub profit: Vec<PlatformProfit>,
    pub status_distribution: Vec<StatusShare>,
    pub diagnostics: Vec<PlatformDiagnostics>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisSummary<'a> {
    pub total_rows: usize,
    pub unique_orders: usize,
    pub invalid_timestamps: usize,
    pub frequent_customers: usize,
    pub best_platform: Option<&'a str>,
    pub worst_platform: Option<&'a str>,
    pub diagnostics: &'a [PlatformDiagnostics],
}

fn display_2dp(v: &f64) -> String {
    format_number(*v, 2)
}

fn display_opt(v: &Option<f64>) -> String {
    v.map(|x| format_number(x, 2)).unwrap_or_else(|| "NaN".to_string())
}
