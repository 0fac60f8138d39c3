//! Schema descriptors for the four recommendation domains
//!
//! Every domain shares the same pipeline; only the column roles differ.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recommendation domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Overview,
    CloudSql,
    Dataflow,
    Kubernetes,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Overview,
        Domain::CloudSql,
        Domain::Dataflow,
        Domain::Kubernetes,
    ];

    /// Lowercase identifier used in URLs, file names and CLI arguments
    pub fn slug(&self) -> &'static str {
        match self {
            Domain::Overview => "overview",
            Domain::CloudSql => "cloudsql",
            Domain::Dataflow => "dataflow",
            Domain::Kubernetes => "kubernetes",
        }
    }

    pub fn schema(&self) -> &'static SchemaDescriptor {
        match self {
            Domain::Overview => &OVERVIEW,
            Domain::CloudSql => &CLOUDSQL,
            Domain::Dataflow => &DATAFLOW,
            Domain::Kubernetes => &KUBERNETES,
        }
    }

    /// File name of the filtered-data export
    pub fn export_file_name(&self) -> String {
        format!("{}_filtered_data.csv", self.slug())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overview" => Ok(Domain::Overview),
            "cloudsql" | "cloud-sql" => Ok(Domain::CloudSql),
            "dataflow" => Ok(Domain::Dataflow),
            "kubernetes" | "k8s" | "gke" => Ok(Domain::Kubernetes),
            other => Err(format!("unknown domain '{}'", other)),
        }
    }
}

/// Column-role mapping for one domain
#[derive(Debug)]
pub struct SchemaDescriptor {
    pub domain: Domain,
    /// Human-readable title
    pub title: &'static str,
    /// Source file name inside the data directory
    pub file_name: &'static str,
    pub current_cost: &'static str,
    pub target_cost: &'static str,
    pub savings: &'static str,
    /// Column naming the optimized entity (job, cluster, instance, service)
    pub entity: &'static str,
    /// Singular label for the entity, e.g. "job"
    pub entity_label: &'static str,
    pub filter_columns: &'static [&'static str],
    pub search_columns: &'static [&'static str],
    /// Key columns counted with nunique in the summary
    pub distinct_columns: &'static [&'static str],
    /// Columns shown by default in the record view
    pub default_columns: &'static [&'static str],
    pub timestamp_column: Option<&'static str>,
    /// (current, target) machine hourly rate columns
    pub hourly_rate_columns: Option<(&'static str, &'static str)>,
    pub node_count_column: Option<&'static str>,
}

impl SchemaDescriptor {
    /// Columns that must exist for the dataset to be usable
    pub fn required_columns(&self) -> [&'static str; 3] {
        [self.current_cost, self.target_cost, self.savings]
    }

    /// Columns whose non-empty cells must parse as numbers
    pub fn is_numeric(&self, column: &str) -> bool {
        self.required_columns().contains(&column)
            || self.node_count_column == Some(column)
            || self
                .hourly_rate_columns
                .map(|(current, target)| column == current || column == target)
                .unwrap_or(false)
    }

    pub fn is_cost_column(&self, column: &str) -> bool {
        self.required_columns().contains(&column)
    }

    pub fn is_rate_column(&self, column: &str) -> bool {
        self.hourly_rate_columns
            .map(|(current, target)| column == current || column == target)
            .unwrap_or(false)
    }
}

pub const REGION: &str = "region";
pub const PROJECT_ID: &str = "project_id";
pub const CURRENT_MACHINE_TYPE: &str = "current_machine_type";
pub const TARGET_MACHINE_TYPE: &str = "target_machine_type";
pub const SERVICE: &str = "service";

const MACHINE_FILTERS: &[&str] = &[REGION, PROJECT_ID, CURRENT_MACHINE_TYPE, TARGET_MACHINE_TYPE];

pub static OVERVIEW: SchemaDescriptor = SchemaDescriptor {
    domain: Domain::Overview,
    title: "Overview Analysis",
    file_name: "overview.csv",
    current_cost: "Actual",
    target_cost: "Estimated",
    savings: "Savings",
    entity: SERVICE,
    entity_label: "service",
    filter_columns: &[SERVICE, PROJECT_ID],
    search_columns: &[SERVICE, PROJECT_ID],
    distinct_columns: &[SERVICE, PROJECT_ID],
    default_columns: &[SERVICE, PROJECT_ID, "Actual", "Estimated", "Savings"],
    timestamp_column: None,
    hourly_rate_columns: None,
    node_count_column: None,
};

pub static CLOUDSQL: SchemaDescriptor = SchemaDescriptor {
    domain: Domain::CloudSql,
    title: "CloudSQL Cost Optimization",
    file_name: "rightsizing_results_cloudsql.csv",
    current_cost: "current_cost",
    target_cost: "target_cost",
    savings: "savings",
    entity: "resource_name",
    entity_label: "cluster",
    filter_columns: MACHINE_FILTERS,
    search_columns: &["resource_name", PROJECT_ID, CURRENT_MACHINE_TYPE, TARGET_MACHINE_TYPE],
    distinct_columns: &["resource_name", PROJECT_ID],
    default_columns: &[
        PROJECT_ID,
        "resource_name",
        CURRENT_MACHINE_TYPE,
        TARGET_MACHINE_TYPE,
        REGION,
        "current_cost",
        "target_cost",
        "savings",
    ],
    timestamp_column: Some("created_at"),
    hourly_rate_columns: None,
    node_count_column: None,
};

pub static DATAFLOW: SchemaDescriptor = SchemaDescriptor {
    domain: Domain::Dataflow,
    title: "DataFlow Cost Optimization",
    file_name: "rightsizing_results_dataflow.csv",
    current_cost: "current_cost",
    target_cost: "target_cost",
    savings: "savings",
    entity: "job_name",
    entity_label: "job",
    filter_columns: MACHINE_FILTERS,
    search_columns: &["job_name", PROJECT_ID, CURRENT_MACHINE_TYPE, TARGET_MACHINE_TYPE],
    distinct_columns: &[PROJECT_ID],
    default_columns: &[
        PROJECT_ID,
        "job_name",
        CURRENT_MACHINE_TYPE,
        TARGET_MACHINE_TYPE,
        REGION,
        "current_cost",
        "target_cost",
        "savings",
    ],
    timestamp_column: Some("created_at"),
    hourly_rate_columns: Some(("current_machine_hourly_rate", "target_machine_hourly_rate")),
    node_count_column: None,
};

pub static KUBERNETES: SchemaDescriptor = SchemaDescriptor {
    domain: Domain::Kubernetes,
    title: "Kubernetes Cost Optimization",
    file_name: "rightsizing_results.csv",
    current_cost: "current_cost",
    target_cost: "target_cost",
    savings: "savings",
    entity: "cluster_name",
    entity_label: "cluster",
    filter_columns: MACHINE_FILTERS,
    search_columns: &["cluster_name", PROJECT_ID, CURRENT_MACHINE_TYPE, TARGET_MACHINE_TYPE],
    distinct_columns: &["cluster_name", PROJECT_ID],
    default_columns: &[
        PROJECT_ID,
        "cluster_name",
        CURRENT_MACHINE_TYPE,
        TARGET_MACHINE_TYPE,
        REGION,
        "node_count",
        "current_cost",
        "target_cost",
        "savings",
    ],
    timestamp_column: Some("created_at"),
    hourly_rate_columns: None,
    node_count_column: Some("node_count"),
};
