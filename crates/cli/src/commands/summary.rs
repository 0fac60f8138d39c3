//! Summary metrics command

use anyhow::Result;
use colored::Colorize;
use dashboard_lib::{
    models::{FilterSpec, SummaryMetrics},
    reports::{self, KeyInsights},
    schema::Domain,
};
use serde::Serialize;

use super::Context;
use crate::output::{
    self, color_savings_pct, format_currency, format_percent, format_quantity, format_rate,
    OutputFormat,
};

#[derive(Serialize)]
struct SummaryOutput<'a> {
    domain: Domain,
    filters: &'a FilterSpec,
    summary: &'a SummaryMetrics,
    insights: &'a KeyInsights,
}

/// Show headline metrics and key insights of a filtered domain
pub fn show_summary(ctx: &Context, domain: Domain, filters: &FilterSpec) -> Result<()> {
    let records = ctx.dataset(domain)?;
    let view = reports::dashboard_view(&records, filters);
    let summary = &view.summary;

    match ctx.format {
        OutputFormat::Json => output::print_json(&SummaryOutput {
            domain,
            filters,
            summary,
            insights: &view.insights,
        })?,
        OutputFormat::Table => {
            output::print_heading(&view.title);
            for (column, value) in filters.active() {
                output::print_field(column, value.cyan());
            }
            output::print_field("Records", summary.row_count);
            for (column, count) in &summary.distinct_counts {
                output::print_field(&format!("Distinct {}", column), count);
            }
            if let Some(nodes) = summary.total_nodes {
                output::print_field("Total nodes", format_quantity(nodes));
            }
            println!();

            output::print_subheading("Monthly Costs");
            output::print_field("Current", format_currency(summary.total_current_cost));
            output::print_field(
                "Target",
                format_currency(summary.total_target_cost).green(),
            );
            output::print_field("Cost reduction", format_percent(summary.cost_reduction_pct));
            println!(
                "{:<24}{} ({})",
                "Potential Savings:".bold(),
                format_currency(summary.total_savings).green().bold(),
                color_savings_pct(summary.savings_pct)
            );
            output::print_field("Annual savings", format_currency(summary.annual_savings));
            println!();

            output::print_subheading("Per Record");
            output::print_field("Mean savings", format_currency(summary.mean_savings));
            output::print_field("Mean savings %", format_percent(summary.mean_savings_pct));
            output::print_field("Max savings", format_currency(summary.max_savings));
            output::print_field("Max savings %", format_percent(summary.max_savings_pct));

            if let Some(rates) = &summary.hourly_rates {
                println!();
                output::print_subheading("Hourly Rates");
                output::print_field("Avg current rate", format_rate(rates.avg_current_rate));
                output::print_field("Avg target rate", format_rate(rates.avg_target_rate));
                output::print_field("Rate reduction", format_percent(rates.rate_reduction_pct));
            }

            print_insights(summary, &view.insights);
        }
    }

    Ok(())
}

fn print_insights(summary: &SummaryMetrics, insights: &KeyInsights) {
    println!();
    output::print_subheading("Key Insights");

    if let Some(region) = &summary.top_region {
        output::print_field(
            "Top region",
            format!(
                "{} ({} savings, {})",
                region.key.cyan(),
                format_currency(region.amount),
                format_percent(region.savings_pct)
            ),
        );
    }
    if let Some(machine) = &summary.top_current_machine {
        output::print_field(
            "Costliest machine",
            format!("{} ({})", machine.key.cyan(), format_currency(machine.amount)),
        );
    }
    if let Some(top) = &insights.top_opportunity {
        output::print_field(
            "Top opportunity",
            format!(
                "{} ({} savings, {}) in {}",
                top.key.cyan(),
                format_currency(top.savings),
                format_percent(top.savings_pct),
                top.report
            ),
        );
    }
    output::print_field(
        &format!("Avg savings per {}", insights.entity_label),
        format_currency(insights.average_savings_per_entity),
    );
    output::print_field(
        "Target vs current",
        format!("{} of current spend", format_percent(insights.target_share_pct)),
    );

    if summary.row_count == 0 {
        output::print_info("No records match the current filters");
    }
}
