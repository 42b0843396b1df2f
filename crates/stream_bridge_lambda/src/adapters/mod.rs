pub mod event_sink;
pub mod eventbridge;
