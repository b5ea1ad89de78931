use crate::config::AnalysisConfig;
use crate::types::{
    CategoryRating, CategorySales, ComplaintCount, CustomerOrderCount, EnrichedOrder,
    EnrichedTable, OrderStatus, PeriodCount, PeriodField, PlatformDiagnostics, PlatformExtremes,
    PlatformPerformance, PlatformProfit, StatusShare, Summaries,
};
use crate::util::{mean, percent};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::info;

pub const IMPROVEMENT_SUGGESTION: &str = "Improve delivery speed and address frequent issues like missing items or rude delivery personnel.";

/// Run every aggregation over the enriched rows.
pub fn summarize(table: &EnrichedTable, cfg: &AnalysisConfig) -> Summaries {
    let rows = &table.rows;
    let platform_performance = platform_performance(rows);
    let ratings = category_ratings(rows);
    let summaries = Summaries {
        total_rows: rows.len(),
        unique_orders: unique_order_count(rows),
        frequent_customers: frequent_customers(rows, cfg.frequent_customer_above),
        category_sales: category_sales_by_platform(rows),
        yearly_orders: orders_by_period(rows, PeriodField::Year),
        monthly_orders: orders_by_period(rows, PeriodField::Month),
        weekly_orders: orders_by_period(rows, PeriodField::Week),
        extremes: best_and_worst_platform(&platform_performance),
        platform_performance,
        top_rated: top_rated(&ratings, cfg.top_rated_count),
        lowest_rated: lowest_rated(&ratings, cfg.lowest_rated_count),
        profit: profit_by_platform(rows),
        status_distribution: status_distribution(rows),
        diagnostics: platform_diagnostics(
            rows,
            cfg.complaint_rating_below,
            cfg.complaints_per_platform,
        ),
    };
    info!(
        "Computed summaries: {} unique orders, {} platforms",
        summaries.unique_orders,
        summaries.platform_performance.len()
    );
    summaries
}

pub fn unique_order_count(rows: &[EnrichedOrder]) -> usize {
    rows.iter()
        .filter_map(|r| r.record.order_id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

/// Customers with strictly more than `above` rows, most orders first.
pub fn frequent_customers(rows: &[EnrichedOrder], above: usize) -> Vec<CustomerOrderCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in rows {
        if let Some(id) = r.record.customer_id.as_deref() {
            *counts.entry(id).or_default() += 1;
        }
    }
    let mut out: Vec<CustomerOrderCount> = counts
        .into_iter()
        .filter(|(_, n)| *n > above)
        .map(|(id, n)| CustomerOrderCount {
            customer_id: id.to_string(),
            orders: n,
        })
        .collect();
    out.sort_by(|a, b| {
        b.orders
            .cmp(&a.orders)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    out
}

/// Distinct order ids per (platform, category) as a dense matrix. Pairs that
/// never occur read 0.
pub fn category_sales_by_platform(rows: &[EnrichedOrder]) -> CategorySales {
    let mut groups: BTreeMap<(&str, &str), HashSet<&str>> = BTreeMap::new();
    let mut categories: BTreeSet<&str> = BTreeSet::new();
    for r in rows {
        let rec = &r.record;
        if let (Some(p), Some(c)) = (rec.platform.as_deref(), rec.category.as_deref()) {
            categories.insert(c);
            let orders = groups.entry((p, c)).or_default();
            if let Some(id) = rec.order_id.as_deref() {
                orders.insert(id);
            }
        }
    }

    let platforms: BTreeSet<&str> = groups.keys().map(|(p, _)| *p).collect();
    let counts = platforms
        .iter()
        .map(|p| {
            categories
                .iter()
                .map(|c| groups.get(&(*p, *c)).map_or(0, HashSet::len))
                .collect()
        })
        .collect();

    CategorySales {
        platforms: platforms.into_iter().map(str::to_string).collect(),
        categories: categories.into_iter().map(str::to_string).collect(),
        counts,
    }
}

/// Distinct order ids per year, month or ISO week. Rows whose timestamp did
/// not parse are left out.
pub fn orders_by_period(rows: &[EnrichedOrder], field: PeriodField) -> Vec<PeriodCount> {
    let mut groups: BTreeMap<i64, HashSet<&str>> = BTreeMap::new();
    for r in rows {
        let Some(period) = r.period else { continue };
        let key = match field {
            PeriodField::Year => period.year as i64,
            PeriodField::Month => period.month as i64,
            PeriodField::Week => period.week as i64,
        };
        let orders = groups.entry(key).or_default();
        if let Some(id) = r.record.order_id.as_deref() {
            orders.insert(id);
        }
    }
    groups
        .into_iter()
        .map(|(period, ids)| PeriodCount {
            period,
            orders: ids.len(),
        })
        .collect()
}

pub fn platform_performance(rows: &[EnrichedOrder]) -> Vec<PlatformPerformance> {
    #[derive(Default)]
    struct Acc<'a> {
        ratings: Vec<f64>,
        total_value: f64,
        orders: HashSet<&'a str>,
    }
    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in rows {
        let rec = &r.record;
        let Some(platform) = rec.platform.as_deref() else { continue };
        let e = map.entry(platform).or_default();
        e.ratings.extend(rec.service_rating);
        e.total_value += rec.order_value.unwrap_or(0.0);
        if let Some(id) = rec.order_id.as_deref() {
            e.orders.insert(id);
        }
    }
    map.into_iter()
        .map(|(platform, acc)| PlatformPerformance {
            platform: platform.to_string(),
            avg_rating: mean(acc.ratings),
            total_value: acc.total_value,
            unique_orders: acc.orders.len(),
        })
        .collect()
}

/// Highest and lowest mean rating. Equal means resolve to the platform that
/// sorts first alphabetically; platforms without any rating are ignored.
pub fn best_and_worst_platform(performance: &[PlatformPerformance]) -> Option<PlatformExtremes> {
    let mut sorted: Vec<(&str, f64)> = performance
        .iter()
        .filter_map(|p| p.avg_rating.map(|r| (p.platform.as_str(), r)))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut iter = sorted.into_iter();
    let first = iter.next()?;
    let (mut best, mut worst) = (first, first);
    for cur in iter {
        if cur.1 > best.1 {
            best = cur;
        }
        if cur.1 < worst.1 {
            worst = cur;
        }
    }
    Some(PlatformExtremes {
        best: best.0.to_string(),
        worst: worst.0.to_string(),
    })
}

/// Mean service rating per category, alphabetical, skipping categories with
/// no rating at all.
pub fn category_ratings(rows: &[EnrichedOrder]) -> Vec<CategoryRating> {
    let mut map: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in rows {
        if let Some(c) = r.record.category.as_deref() {
            map.entry(c).or_default().extend(r.record.service_rating);
        }
    }
    map.into_iter()
        .filter_map(|(category, ratings)| {
            mean(ratings).map(|avg_rating| CategoryRating {
                category: category.to_string(),
                avg_rating,
            })
        })
        .collect()
}

pub fn top_rated(ratings: &[CategoryRating], n: usize) -> Vec<CategoryRating> {
    let mut v = ratings.to_vec();
    // Stable sort keeps alphabetical order among equal means.
    v.sort_by(|a, b| b.avg_rating.partial_cmp(&a.avg_rating).unwrap_or(Ordering::Equal));
    v.truncate(n);
    v
}

pub fn lowest_rated(ratings: &[CategoryRating], n: usize) -> Vec<CategoryRating> {
    let mut v = ratings.to_vec();
    v.sort_by(|a, b| a.avg_rating.partial_cmp(&b.avg_rating).unwrap_or(Ordering::Equal));
    v.truncate(n);
    v
}

pub fn profit_by_platform(rows: &[EnrichedOrder]) -> Vec<PlatformProfit> {
    let mut map: BTreeMap<&str, f64> = BTreeMap::new();
    for r in rows {
        if let Some(p) = r.record.platform.as_deref() {
            *map.entry(p).or_default() += r.record.order_value.unwrap_or(0.0);
        }
    }
    map.into_iter()
        .map(|(platform, total_value)| PlatformProfit {
            platform: platform.to_string(),
            total_value,
        })
        .collect()
}

/// Share of rows per status label, largest first. Only labels that occur
/// are listed.
pub fn status_distribution(rows: &[EnrichedOrder]) -> Vec<StatusShare> {
    let mut counts: HashMap<OrderStatus, usize> = HashMap::new();
    for r in rows {
        *counts.entry(r.status).or_default() += 1;
    }
    let mut present: Vec<(OrderStatus, usize)> = OrderStatus::ALL
        .iter()
        .filter_map(|s| counts.get(s).map(|n| (*s, *n)))
        .collect();
    present.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    present
        .into_iter()
        .map(|(status, n)| StatusShare {
            status,
            percent: percent(n, rows.len()),
        })
        .collect()
}

/// Rating, delay and refund rates plus the most common low-rating feedback,
/// one entry per platform in order of first appearance.
pub fn platform_diagnostics(
    rows: &[EnrichedOrder],
    complaint_below: f64,
    max_complaints: usize,
) -> Vec<PlatformDiagnostics> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_platform: HashMap<&str, Vec<&EnrichedOrder>> = HashMap::new();
    for r in rows {
        let Some(p) = r.record.platform.as_deref() else { continue };
        by_platform
            .entry(p)
            .or_insert_with(|| {
                order.push(p);
                Vec::new()
            })
            .push(r);
    }

    order
        .into_iter()
        .map(|platform| {
            let group = &by_platform[platform];
            let delayed = group.iter().filter(|r| r.record.delivery_delay).count();
            let refunded = group.iter().filter(|r| r.record.refund_requested).count();
            PlatformDiagnostics {
                platform: platform.to_string(),
                avg_rating: mean(group.iter().filter_map(|r| r.record.service_rating)),
                delay_rate: percent(delayed, group.len()),
                refund_rate: percent(refunded, group.len()),
                common_complaints: common_complaints(group, complaint_below, max_complaints),
                suggestion: IMPROVEMENT_SUGGESTION.to_string(),
            }
        })
        .collect()
}

fn common_complaints(
    group: &[&EnrichedOrder],
    complaint_below: f64,
    max_complaints: usize,
) -> Vec<ComplaintCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in group {
        let low = r.record.service_rating.is_some_and(|v| v < complaint_below);
        if let (true, Some(fb)) = (low, r.record.feedback.as_deref()) {
            *counts.entry(fb).or_default() += 1;
        }
    }
    let mut v: Vec<ComplaintCount> = counts
        .into_iter()
        .map(|(feedback, count)| ComplaintCount {
            feedback: feedback.to_string(),
            count,
        })
        .collect();
    v.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.feedback.cmp(&b.feedback)));
    v.truncate(max_complaints);
    v
}
