// Entry point: runs the analysis pipeline once over the fixed input file.
//
// load -> enrich -> aggregate -> charts -> workbook + JSON summary.
// Any configuration or IO error aborts the run; unparsable values do not.
use anyhow::{Context, Result};
use ecommerce_analysis::types::{EnrichedTable, Summaries};
use ecommerce_analysis::{aggregate, charts, dates, loader, output, AnalysisConfig, AnalysisError};
use tracing::{error, info};

fn report_load_error(e: &AnalysisError) {
    if e.is_configuration() {
        error!(code = e.error_code(), "Configuration error: {}", e);
    } else {
        error!(code = e.error_code(), "Error loading data: {}", e);
    }
}

fn load_and_enrich(cfg: &AnalysisConfig) -> Result<EnrichedTable> {
    let table = loader::load_orders(&cfg.input_path)
        .inspect_err(report_load_error)
        .with_context(|| format!("Failed to load {}", cfg.input_path.display()))?;
    println!("Column Names in the Dataset (after stripping whitespace):");
    println!("{:?}\n", table.headers);
    Ok(dates::enrich(table))
}

fn write_reports(cfg: &AnalysisConfig, table: &EnrichedTable, summaries: &Summaries) -> Result<()> {
    charts::render_all(summaries, cfg).context("Failed to render charts")?;

    let workbook = cfg.workbook_path();
    output::write_workbook(&workbook, table, summaries)
        .with_context(|| format!("Failed to write {}", workbook.display()))?;

    let summary = output::build_summary(table, summaries);
    output::write_json(&cfg.summary_path(), &summary).context("Failed to write summary")?;

    println!("Analysis saved to '{}'", workbook.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cfg = AnalysisConfig::default();
    info!("Starting e-commerce delivery analysis");

    let table = load_and_enrich(&cfg)?;
    let summaries = aggregate::summarize(&table, &cfg);
    output::print_summaries(&summaries, &cfg);
    write_reports(&cfg, &table, &summaries)?;

    info!("Analysis complete");
    Ok(())
}
