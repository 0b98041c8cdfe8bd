pub mod attribution_tracker;
pub mod chain_attribution;
pub mod line_alignment;
pub mod line_set;
pub mod working_log;
