// Chart rendering for the summary tables.
//
// Each chart is a PNG written with the plotters bitmap backend and
// overwritten on every run. Drawing errors are generic over the backend, so
// they are flattened into `AnalysisError::Chart` with the target path.
// Text is drawn with an embedded DejaVu Sans face, so rendering does not
// depend on the fonts installed on the host.
use crate::config::{
    AnalysisConfig, CATEGORY_SALES_CHART, MONTHLY_ORDERS_CHART, ORDER_STATUS_CHART, PROFIT_CHART,
};
use crate::error::{AnalysisError, Result};
use crate::types::{CategorySales, PeriodCount, PlatformProfit, StatusShare, Summaries};
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::path::{Path, PathBuf};
use tracing::info;

const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);

const STATUS_COLORS: [RGBColor; 3] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
];

fn chart_err<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> AnalysisError + '_ {
    move |e| AnalysisError::chart(&path.display().to_string(), e)
}

fn register_fonts(output_dir: &Path) -> Result<()> {
    register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
        .and_then(|_| register_font(FONT_FAMILY, FontStyle::Bold, FONT_BYTES))
        .map_err(|_| AnalysisError::chart(&output_dir.display().to_string(), "invalid embedded font"))
}

/// Render all four charts into `cfg.output_dir`, returning the written paths.
pub fn render_all(summaries: &Summaries, cfg: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    register_fonts(&cfg.output_dir)?;

    let category = cfg.output_path(CATEGORY_SALES_CHART);
    draw_category_sales(&category, &summaries.category_sales)?;

    let monthly = cfg.output_path(MONTHLY_ORDERS_CHART);
    draw_bar_chart(
        &monthly,
        "Monthly Order Analysis",
        "Month",
        "Number of Orders",
        &period_bars(&summaries.monthly_orders),
    )?;

    let profit = cfg.output_path(PROFIT_CHART);
    draw_bar_chart(
        &profit,
        "Total Order Value by Platform",
        "Platform",
        "Total Order Value (INR)",
        &profit_bars(&summaries.profit),
    )?;

    let status = cfg.output_path(ORDER_STATUS_CHART);
    draw_status_pie(&status, &summaries.status_distribution)?;

    let written = vec![category, monthly, profit, status];
    for p in &written {
        info!("Chart saved to {}", p.display());
    }
    Ok(written)
}

/// `(bottom, top)` of every category's segment within each platform's bar,
/// stacked in category order.
pub fn stack_segments(sales: &CategorySales) -> Vec<Vec<(f64, f64)>> {
    sales
        .counts
        .iter()
        .map(|row| {
            let mut base = 0.0;
            row.iter()
                .map(|n| {
                    let seg = (base, base + *n as f64);
                    base = seg.1;
                    seg
                })
                .collect()
        })
        .collect()
}

/// Upper bound of the value axis with 10% headroom; never below 1.
pub fn axis_max<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let max = values.into_iter().fold(0.0_f64, f64::max);
    (max * 1.1).max(1.0)
}

pub fn period_bars(counts: &[PeriodCount]) -> Vec<(String, f64)> {
    counts
        .iter()
        .map(|c| (c.period.to_string(), c.orders as f64))
        .collect()
}

pub fn profit_bars(profit: &[PlatformProfit]) -> Vec<(String, f64)> {
    profit
        .iter()
        .map(|p| (p.platform.clone(), p.total_value))
        .collect()
}

fn segment_label(v: &SegmentValue<i32>, names: &[String]) -> String {
    match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| names.get(i).cloned())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

fn draw_category_sales(path: &Path, sales: &CategorySales) -> Result<()> {
    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err(path))?;

    let segments = stack_segments(sales);
    let y_max = axis_max(segments.iter().filter_map(|s| s.last().map(|(_, top)| *top)));
    let n = sales.platforms.len().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Unique Sales by Product Category Across Platforms",
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n as i32).into_segmented(), 0f64..y_max)
        .map_err(chart_err(path))?;

    let platforms = &sales.platforms;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_desc("Platform")
        .y_desc("Number of Unique Orders")
        .x_label_formatter(&|v| segment_label(v, platforms))
        .draw()
        .map_err(chart_err(path))?;

    for (c, category) in sales.categories.iter().enumerate() {
        let color = Palette99::pick(c).to_rgba();
        chart
            .draw_series(segments.iter().enumerate().map(|(p, stack)| {
                let (bottom, top) = stack[c];
                let x = p as i32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(x), bottom), (SegmentValue::Exact(x + 1), top)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 8, 8);
                bar
            }))
            .map_err(chart_err(path))?
            .label(category.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err(path))?;

    root.present().map_err(chart_err(path))?;
    Ok(())
}

fn draw_bar_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    bars: &[(String, f64)],
) -> Result<()> {
    let root = BitMapBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err(path))?;

    let n = bars.len().max(1);
    let y_max = axis_max(bars.iter().map(|(_, v)| *v));
    let names: Vec<String> = bars.iter().map(|(name, _)| name.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0..n as i32).into_segmented(), 0f64..y_max)
        .map_err(chart_err(path))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_formatter(&|v| segment_label(v, &names))
        .draw()
        .map_err(chart_err(path))?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
            let x = i as i32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(x), 0.0), (SegmentValue::Exact(x + 1), *value)],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 10, 10);
            bar
        }))
        .map_err(chart_err(path))?;

    root.present().map_err(chart_err(path))?;
    Ok(())
}

fn draw_status_pie(path: &Path, shares: &[StatusShare]) -> Result<()> {
    let root = BitMapBackend::new(path, (600, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err(path))?;
    let area = root
        .titled("Order Status Distribution", ("sans-serif", 24))
        .map_err(chart_err(path))?;

    if !shares.is_empty() {
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.35;
        let sizes: Vec<f64> = shares.iter().map(|s| s.percent).collect();
        let colors: Vec<RGBColor> = shares
            .iter()
            .map(|s| STATUS_COLORS[s.status as usize % STATUS_COLORS.len()])
            .collect();
        let labels: Vec<&str> = shares.iter().map(|s| s.status.as_str()).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(90.0);
        pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
        area.draw(&pie).map_err(chart_err(path))?;
    }

    root.present().map_err(chart_err(path))?;
    Ok(())
}
