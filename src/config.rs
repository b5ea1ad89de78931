// Fixed run configuration.
//
// The program takes no flags or environment variables; every path and
// threshold lives here so the stages can be pointed at a temp directory in
// tests while `main` always runs with `AnalysisConfig::default()`.
use std::path::{Path, PathBuf};

pub const INPUT_FILE: &str = "Ecommerce_Delivery_Analytics_New.csv";
pub const WORKBOOK_FILE: &str = "ecommerce_analysis.xlsx";
pub const SUMMARY_FILE: &str = "analysis_summary.json";

pub const CATEGORY_SALES_CHART: &str = "category_sales_by_platform.png";
pub const MONTHLY_ORDERS_CHART: &str = "monthly_orders.png";
pub const PROFIT_CHART: &str = "profit_analysis.png";
pub const ORDER_STATUS_CHART: &str = "order_status.png";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Customers need strictly more orders than this to be "frequent".
    pub frequent_customer_above: usize,
    /// Ratings strictly below this count as complaints.
    pub complaint_rating_below: f64,
    pub top_rated_count: usize,
    pub lowest_rated_count: usize,
    pub complaints_per_platform: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(INPUT_FILE),
            output_dir: PathBuf::from("."),
            frequent_customer_above: 10,
            complaint_rating_below: 3.0,
            top_rated_count: 10,
            lowest_rated_count: 5,
            complaints_per_platform: 3,
        }
    }
}

impl AnalysisConfig {
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.output_path(WORKBOOK_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_path(SUMMARY_FILE)
    }

    /// Same configuration with every artifact redirected into `dir`.
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
}
