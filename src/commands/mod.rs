pub mod attribute;
pub mod blamebot_handlers;
pub mod checkpoint;
