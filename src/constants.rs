//! Canonical field and metric names plus the numeric limits of the pipeline.
//! These are the only spellings written to scores, explanations and the ledger.

// Canonical raw field names (internal vocabulary)
pub const FIELD_REGION: &str = "region";
pub const FIELD_TOTAL_BEDS: &str = "total_beds";
pub const FIELD_OCCUPIED_BEDS: &str = "occupied_beds";
pub const FIELD_AVAILABLE_BEDS: &str = "available_beds";
pub const FIELD_STAFF_COUNT: &str = "staff_count";
pub const FIELD_EQUIPMENT_SCORE: &str = "equipment_score";
pub const FIELD_POPULATION: &str = "population";
pub const FIELD_BUDGET_ALLOCATION: &str = "budget_allocation";

// Canonical derived metric names
pub const METRIC_UTILIZATION_RATE: &str = "utilizationRate";
pub const METRIC_BEDS_PER_CAPITA: &str = "bedsPerCapita";
pub const METRIC_STAFFING_RATIO: &str = "staffingRatio";
pub const METRIC_EQUIPMENT_INDEX: &str = "equipmentIndex";
pub const METRIC_AVAILABILITY_INDEX: &str = "availabilityIndex";
pub const METRIC_BUDGET_PER_CAPITA: &str = "budgetPerCapita";

/// Every row carries exactly this many fields
pub const FIELD_COUNT: usize = 8;

/// Upper bound on rows per dataset
pub const MAX_ROWS: usize = 1000;

/// Equipment scores are reported on a 0..=10 scale
pub const EQUIPMENT_SCALE: f64 = 10.0;

/// Composite score bounds
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Rescaled value used when a metric has no spread across the dataset
pub const NEUTRAL_MIDPOINT: f64 = 0.5;

/// Number of factors reported per region
pub const TOP_FACTOR_COUNT: usize = 3;

/// Tolerance for the contribution-sum invariant
pub const CONTRIBUTION_TOLERANCE: f64 = 1e-9;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "READINESS_CONFIG";
