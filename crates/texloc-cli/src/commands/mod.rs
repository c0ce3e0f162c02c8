pub mod colorize;
pub mod decode;
pub mod diff;
pub mod evaluate;
pub mod plan;
pub mod scan;
