//! Standard per-domain dashboard reports
//!
//! Each domain shows a fixed set of breakdowns. They are all expressed as
//! `BreakdownSpec`s over the domain's schema and evaluated by the generic
//! pipeline.

use serde::{Deserialize, Serialize};

use crate::models::{BreakdownTable, FilterSpec, RecordSet, SummaryMetrics};
use crate::pipeline::{self, percentage, BreakdownSpec, PercentBasis};
use crate::schema::{
    Domain, SchemaDescriptor, CURRENT_MACHINE_TYPE, PROJECT_ID, REGION, SERVICE,
    TARGET_MACHINE_TYPE,
};

/// A named breakdown a domain offers
#[derive(Debug, Clone)]
pub struct ReportDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub spec: BreakdownSpec,
}

/// Evaluated breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedBreakdown {
    pub id: String,
    pub title: String,
    pub table: BreakdownTable,
}

/// Best group of the domain's headline breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopOpportunity {
    pub report: String,
    pub key: String,
    pub savings: f64,
    pub savings_pct: f64,
}

/// Narrative numbers shown under a domain view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInsights {
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub cost_reduction_pct: f64,
    /// Target cost as a share of current cost
    pub target_share_pct: f64,
    pub average_savings_per_entity: f64,
    pub entity_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_opportunity: Option<TopOpportunity>,
}

/// Everything a presentation layer needs for one filtered domain view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub domain: Domain,
    pub title: String,
    pub filters: FilterSpec,
    pub summary: SummaryMetrics,
    pub breakdowns: Vec<NamedBreakdown>,
    pub insights: KeyInsights,
}

/// Sums of the three cost roles under display names
fn with_costs(spec: BreakdownSpec, schema: &SchemaDescriptor) -> BreakdownSpec {
    spec.sum("Current Cost", schema.current_cost)
        .sum("Target Cost", schema.target_cost)
        .sum("Savings", schema.savings)
}

/// Target/current/savings sums in the overview naming
fn estimated_actual(spec: BreakdownSpec, schema: &SchemaDescriptor) -> BreakdownSpec {
    spec.sum("Estimated", schema.target_cost)
        .sum("Actual", schema.current_cost)
        .sum("Savings", schema.savings)
}

/// Standard breakdowns of a domain, in display order
pub fn standard_reports(domain: Domain) -> Vec<ReportDefinition> {
    let schema = domain.schema();
    match domain {
        Domain::Dataflow => dataflow_reports(schema),
        Domain::CloudSql | Domain::Kubernetes => cluster_reports(schema),
        Domain::Overview => overview_reports(schema),
    }
}

/// Look up one standard breakdown by id
pub fn find_report(domain: Domain, id: &str) -> Option<ReportDefinition> {
    standard_reports(domain).into_iter().find(|r| r.id == id)
}

fn dataflow_reports(schema: &SchemaDescriptor) -> Vec<ReportDefinition> {
    let (current_rate, target_rate) = schema
        .hourly_rate_columns
        .unwrap_or(("current_machine_hourly_rate", "target_machine_hourly_rate"));

    vec![
        ReportDefinition {
            id: "region",
            title: "By Region",
            spec: with_costs(
                BreakdownSpec::new(&[REGION])
                    .count_distinct("Projects", PROJECT_ID)
                    .count("Jobs"),
                schema,
            )
            .mean("Avg Current Rate/hr", current_rate)
            .mean("Avg Target Rate/hr", target_rate)
            .sort_by("Savings"),
        },
        ReportDefinition {
            id: "current-machine",
            title: "By Current Machine",
            spec: with_costs(
                BreakdownSpec::new(&[CURRENT_MACHINE_TYPE])
                    .count_distinct("Projects", PROJECT_ID)
                    .count("Jobs"),
                schema,
            )
            .sort_by("Savings"),
        },
        ReportDefinition {
            id: "target-machine",
            title: "By Target Machine",
            spec: with_costs(
                BreakdownSpec::new(&[TARGET_MACHINE_TYPE])
                    .count_distinct("Projects", PROJECT_ID)
                    .count("Jobs"),
                schema,
            )
            .sort_by("Savings"),
        },
        ReportDefinition {
            id: "project",
            title: "By Project",
            spec: with_costs(BreakdownSpec::new(&[PROJECT_ID]).count("Jobs"), schema)
                .first("Region", REGION)
                .sort_by("Savings"),
        },
        ReportDefinition {
            id: "migration",
            title: "Machine Type Migration Patterns",
            spec: with_costs(
                BreakdownSpec::new(&[CURRENT_MACHINE_TYPE, TARGET_MACHINE_TYPE]).count("Count"),
                schema,
            )
            .sort_by("Savings"),
        },
        ReportDefinition {
            id: "top-projects",
            title: "Top Projects by Savings",
            spec: BreakdownSpec::new(&[PROJECT_ID])
                .sum("Savings", schema.savings)
                .sum("Current Cost", schema.current_cost)
                .count("Jobs")
                .sort_by("Savings")
                .top(15),
        },
        ReportDefinition {
            id: "top-jobs",
            title: "Top Jobs by Savings",
            spec: BreakdownSpec::new(&[schema.entity])
                .sum("Savings", schema.savings)
                .sum("Current Cost", schema.current_cost)
                .sum("Target Cost", schema.target_cost)
                .first("Project", PROJECT_ID)
                .sort_by("Savings")
                .top(20)
                .per_row(),
        },
    ]
}

fn cluster_reports(schema: &SchemaDescriptor) -> Vec<ReportDefinition> {
    let entity = schema.entity;
    let nodes = schema.node_count_column;

    let with_nodes = |spec: BreakdownSpec, output: &str| match nodes {
        Some(column) => spec.sum(output, column),
        None => spec,
    };

    let mut reports = vec![
        ReportDefinition {
            id: "top-clusters",
            title: "Top 10 Savings by Cluster",
            spec: with_nodes(
                estimated_actual(BreakdownSpec::new(&[entity]), schema),
                "Nodes",
            )
            .sort_by("Savings")
            .top(10),
        },
        ReportDefinition {
            id: "top-projects",
            title: "Top Savings by Project",
            spec: with_nodes(
                estimated_actual(BreakdownSpec::new(&[PROJECT_ID]), schema).count("Clusters"),
                "Nodes",
            )
            .sort_by("Savings")
            .top(3),
        },
        ReportDefinition {
            id: "region",
            title: "By Region",
            spec: with_nodes(
                with_costs(
                    BreakdownSpec::new(&[REGION])
                        .count_distinct("Projects", PROJECT_ID)
                        .count_distinct("Clusters", entity),
                    schema,
                ),
                "Total Nodes",
            )
            .sort_by("Savings"),
        },
        ReportDefinition {
            id: "machine",
            title: "By Machine Type",
            spec: with_nodes(
                with_costs(
                    BreakdownSpec::new(&[CURRENT_MACHINE_TYPE, TARGET_MACHINE_TYPE])
                        .count("Clusters"),
                    schema,
                ),
                "Total Nodes",
            )
            .sort_by("Savings"),
        },
        ReportDefinition {
            id: "cluster",
            title: "By Cluster",
            spec: {
                let spec = with_costs(BreakdownSpec::new(&[entity, PROJECT_ID]), schema)
                    .first("Current Machine", CURRENT_MACHINE_TYPE)
                    .first("Target Machine", TARGET_MACHINE_TYPE);
                match nodes {
                    Some(column) => spec.first("Nodes", column),
                    None => spec,
                }
                .sort_by("Savings")
            },
        },
        ReportDefinition {
            id: "current-machine",
            title: "Current Machine Types - Cost Distribution",
            spec: with_nodes(
                BreakdownSpec::new(&[CURRENT_MACHINE_TYPE])
                    .sum("Current Cost", schema.current_cost)
                    .sum("Savings", schema.savings),
                "Nodes",
            )
            .sort_by("Current Cost")
            .top(10),
        },
        ReportDefinition {
            id: "target-machine",
            title: "Target Machine Types - Cost Distribution",
            spec: with_nodes(
                BreakdownSpec::new(&[TARGET_MACHINE_TYPE])
                    .sum("Target Cost", schema.target_cost)
                    .sum("Savings", schema.savings),
                "Nodes",
            )
            .sort_by("Target Cost")
            .top(10)
            .percent_basis(PercentBasis::TargetPlusSavings),
        },
    ];

    if let Some(column) = nodes {
        reports.push(ReportDefinition {
            id: "nodes",
            title: "Top 15 Clusters by Node Count",
            spec: BreakdownSpec::new(&[entity])
                .first("Nodes", column)
                .sum("Savings", schema.savings)
                .sort_by("Nodes")
                .top(15),
        });
        reports.push(ReportDefinition {
            id: "project-nodes",
            title: "Average Nodes per Cluster by Project",
            spec: BreakdownSpec::new(&[PROJECT_ID])
                .mean("Avg Nodes", column)
                .count("Clusters")
                .sum("Savings", schema.savings)
                .sort_by("Avg Nodes"),
        });
    }

    reports
}

fn overview_reports(schema: &SchemaDescriptor) -> Vec<ReportDefinition> {
    vec![
        ReportDefinition {
            id: "service",
            title: "By Service",
            spec: estimated_actual(BreakdownSpec::new(&[SERVICE]), schema)
                .count_distinct("Projects", PROJECT_ID)
                .sort_by("Actual"),
        },
        ReportDefinition {
            id: "project",
            title: "By Project",
            spec: estimated_actual(BreakdownSpec::new(&[PROJECT_ID]), schema)
                .join_distinct("Services", SERVICE)
                .sort_by("Actual"),
        },
        ReportDefinition {
            id: "top-projects",
            title: "Top 15 Projects by Savings",
            spec: estimated_actual(BreakdownSpec::new(&[PROJECT_ID]), schema)
                .join_distinct("Services", SERVICE)
                .sort_by("Savings")
                .top(15),
        },
    ]
}

/// Breakdown whose first row is reported as the top opportunity
fn headline_report(domain: Domain) -> &'static str {
    match domain {
        Domain::Dataflow => "top-projects",
        Domain::CloudSql | Domain::Kubernetes => "top-clusters",
        Domain::Overview => "top-projects",
    }
}

/// Filter a domain dataset and compute its full view
pub fn dashboard_view(records: &RecordSet, filters: &FilterSpec) -> DashboardView {
    let schema = records.schema();
    let filtered = pipeline::apply_filter(records, filters);
    let summary = pipeline::summarize(&filtered);

    let breakdowns: Vec<NamedBreakdown> = standard_reports(schema.domain)
        .into_iter()
        .map(|report| NamedBreakdown {
            id: report.id.to_string(),
            title: report.title.to_string(),
            table: pipeline::breakdown(&filtered, &report.spec),
        })
        .collect();

    let insights = key_insights(schema, &summary, &breakdowns);

    DashboardView {
        domain: schema.domain,
        title: schema.title.to_string(),
        filters: filters.clone(),
        summary,
        breakdowns,
        insights,
    }
}

fn key_insights(
    schema: &SchemaDescriptor,
    summary: &SummaryMetrics,
    breakdowns: &[NamedBreakdown],
) -> KeyInsights {
    let entities = summary
        .distinct_counts
        .get(schema.entity)
        .copied()
        .unwrap_or(summary.row_count);
    let average_savings_per_entity = if entities > 0 {
        summary.total_savings / entities as f64
    } else {
        0.0
    };

    let headline = headline_report(schema.domain);
    let top_opportunity = breakdowns
        .iter()
        .find(|b| b.id == headline)
        .and_then(|b| {
            let row = b.table.rows.first()?;
            Some(TopOpportunity {
                report: b.title.clone(),
                key: row.keys.join(" / "),
                savings: b.table.value(row, "Savings").unwrap_or(0.0),
                savings_pct: row.savings_pct,
            })
        });

    KeyInsights {
        monthly_savings: summary.total_savings,
        annual_savings: summary.annual_savings,
        cost_reduction_pct: summary.cost_reduction_pct,
        target_share_pct: percentage(summary.total_target_cost, summary.total_current_cost),
        average_savings_per_entity,
        entity_label: schema.entity_label.to_string(),
        top_opportunity,
    }
}
