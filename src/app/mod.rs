pub mod ports;
pub mod load_use_case;
pub mod scoring_use_case;
pub mod explain_use_case;
pub mod service;

pub use explain_use_case::RegionExplanation;
pub use service::ReadinessService;
