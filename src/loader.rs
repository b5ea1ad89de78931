use crate::error::{AnalysisError, Result};
use crate::types::{OrderRecord, OrderTable};
use crate::util::{non_empty, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;
use tracing::{debug, info};

pub const ORDER_ID: &str = "Order ID";
pub const CUSTOMER_ID: &str = "Customer ID";
pub const PLATFORM: &str = "Platform";
pub const PRODUCT_CATEGORY: &str = "Product Category";
pub const SERVICE_RATING: &str = "Service Rating";
pub const ORDER_VALUE: &str = "Order Value (INR)";
pub const DELIVERY_DELAY: &str = "Delivery Delay";
pub const REFUND_REQUESTED: &str = "Refund Requested";
pub const CUSTOMER_FEEDBACK: &str = "Customer Feedback";

/// Accepted spellings of the order-date column, checked in this order.
pub const DATE_COLUMN_CANDIDATES: [&str; 5] = [
    "Order Date",
    "OrderDate",
    "order_date",
    "Order date",
    "order Date",
];

/// Value a flag cell must hold to count as set.
const FLAG_SET: &str = "Yes";

/// Header positions of every column the analysis reads.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    order_id: usize,
    customer_id: usize,
    platform: usize,
    category: usize,
    order_date: usize,
    service_rating: usize,
    order_value: usize,
    delivery_delay: usize,
    refund_requested: usize,
    feedback: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self> {
        Ok(Self {
            order_id: require(headers, ORDER_ID)?,
            customer_id: require(headers, CUSTOMER_ID)?,
            platform: require(headers, PLATFORM)?,
            category: require(headers, PRODUCT_CATEGORY)?,
            order_date: resolve_date_column(headers)?,
            service_rating: require(headers, SERVICE_RATING)?,
            order_value: require(headers, ORDER_VALUE)?,
            delivery_delay: require(headers, DELIVERY_DELAY)?,
            refund_requested: require(headers, REFUND_REQUESTED)?,
            feedback: require(headers, CUSTOMER_FEEDBACK)?,
        })
    }
}

fn require(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| AnalysisError::ColumnNotFound(name.to_string()))
}

/// Index of the order-date column: the first candidate spelling present in
/// `headers`, or `DateColumnNotFound` naming every spelling tried.
pub fn resolve_date_column(headers: &[String]) -> Result<usize> {
    for candidate in DATE_COLUMN_CANDIDATES {
        if let Some(idx) = headers.iter().position(|h| h == candidate) {
            if candidate != DATE_COLUMN_CANDIDATES[0] {
                info!("Found date column: {}", candidate);
            }
            return Ok(idx);
        }
    }
    Err(AnalysisError::DateColumnNotFound {
        tried: DATE_COLUMN_CANDIDATES.iter().map(|s| s.to_string()).collect(),
    })
}

/// Read the order CSV at `path` into an `OrderTable`.
///
/// Header names are whitespace-trimmed before lookup. Beyond checking that
/// the required columns exist, rows are not validated: short rows read the
/// missing cells as empty, and unparsable numbers become `None`.
pub fn load_orders<P: AsRef<Path>>(path: P) -> Result<OrderTable> {
    let path = path.as_ref();
    info!("Loading orders from {}", path.display());
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let idx = ColumnIndex::resolve(&headers)?;
    debug!(?idx, "resolved column positions");

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(parse_record(&row, &idx, headers.len()));
    }
    info!("Loaded {} rows", records.len());

    Ok(OrderTable {
        headers,
        date_column: idx.order_date,
        records,
    })
}

fn parse_record(row: &StringRecord, idx: &ColumnIndex, width: usize) -> OrderRecord {
    let cell = |i: usize| row.get(i).unwrap_or("");
    let mut cells: Vec<String> = row.iter().take(width).map(|c| c.to_string()).collect();
    cells.resize(width, String::new());

    OrderRecord {
        order_id: non_empty(cell(idx.order_id)),
        customer_id: non_empty(cell(idx.customer_id)),
        platform: non_empty(cell(idx.platform)),
        category: non_empty(cell(idx.category)),
        order_time: cell(idx.order_date).to_string(),
        service_rating: parse_f64_safe(cell(idx.service_rating)),
        order_value: parse_f64_safe(cell(idx.order_value)),
        delivery_delay: cell(idx.delivery_delay) == FLAG_SET,
        refund_requested: cell(idx.refund_requested) == FLAG_SET,
        feedback: non_empty(cell(idx.feedback)),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Order ID, Customer ID ,Platform,Order Date,Delivery Time (Minutes),Product Category,Order Value (INR),Customer Feedback,Service Rating,Delivery Delay,Refund Requested";

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for l in lines {
            writeln!(f, "{}", l).unwrap();
        }
        f
    }

    #[test]
    fn loads_rows_with_trimmed_headers() {
        let f = csv_file(&[
            HEADER,
            "ORD1,CUST1,Blinkit,19:29:54.000000,30,Dairy,957,Fast delivery,5,No,No",
            "ORD2,CUST2,Zepto,10:15:00.500000,45,Snacks,120,Late again,2,Yes,Yes",
        ]);
        let table = load_orders(f.path()).unwrap();
        assert_eq!(table.headers[1], "Customer ID");
        assert_eq!(table.date_column_name(), "Order Date");
        assert_eq!(table.records.len(), 2);

        let r = &table.records[1];
        assert_eq!(r.order_id.as_deref(), Some("ORD2"));
        assert_eq!(r.platform.as_deref(), Some("Zepto"));
        assert_eq!(r.order_time, "10:15:00.500000");
        assert_eq!(r.service_rating, Some(2.0));
        assert_eq!(r.order_value, Some(120.0));
        assert!(r.delivery_delay);
        assert!(r.refund_requested);
        assert_eq!(r.cells.len(), 11);
        assert_eq!(r.cells[4], "45");
    }

    #[test]
    fn falls_back_to_alternate_date_spelling() {
        let headers: Vec<String> = ["Order ID", "order_date", "OrderDate"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        // "OrderDate" precedes "order_date" in the candidate list.
        assert_eq!(resolve_date_column(&headers).unwrap(), 2);
    }

    #[test]
    fn missing_date_column_is_configuration_error() {
        let f = csv_file(&[
            "Order ID,Customer ID,Platform,Product Category,Service Rating,Order Value (INR),Delivery Delay,Refund Requested,Customer Feedback,When",
            "ORD1,CUST1,Blinkit,Dairy,5,957,No,No,ok,10:00:00.0",
        ]);
        let err = load_orders(f.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::DateColumnNotFound { ref tried } if tried.len() == 5));
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_required_column_names_it() {
        let f = csv_file(&[
            "Order ID,Customer ID,Platform,Order Date,Product Category,Order Value (INR),Delivery Delay,Refund Requested,Customer Feedback",
            "ORD1,CUST1,Blinkit,10:00:00.0,Dairy,957,No,No,ok",
        ]);
        match load_orders(f.path()) {
            Err(AnalysisError::ColumnNotFound(name)) => assert_eq!(name, "Service Rating"),
            other => panic!("expected ColumnNotFound, got {:?}", other),
        }
    }

    #[test]
    fn malformed_cells_pass_through_as_missing() {
        let f = csv_file(&[
            HEADER,
            ",CUST1,,garbage,30,Dairy,lots,,n/a,yes,",
            "ORD3,CUST3,Blinkit",
        ]);
        let table = load_orders(f.path()).unwrap();
        assert_eq!(table.records.len(), 2);

        let r = &table.records[0];
        assert_eq!(r.order_id, None);
        assert_eq!(r.platform, None);
        assert_eq!(r.service_rating, None);
        assert_eq!(r.order_value, None);
        assert_eq!(r.feedback, None);
        // Flags compare case-sensitively against "Yes".
        assert!(!r.delivery_delay);

        let short = &table.records[1];
        assert_eq!(short.category, None);
        assert_eq!(short.order_time, "");
        assert_eq!(short.cells.len(), 11);
    }
}
