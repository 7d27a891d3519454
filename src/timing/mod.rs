pub mod clock;
pub mod clock_time;
pub mod daily;
pub mod evaluator;
pub mod refresh;
pub mod schedule;
