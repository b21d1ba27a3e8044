pub mod ndjson_ledger_sink;
pub mod toml_weight_source;

pub use ndjson_ledger_sink::NdjsonLedgerSink;
pub use toml_weight_source::TomlWeightSource;
