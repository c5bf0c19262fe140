mod context;
mod report;
mod ticket;

pub use context::*;
pub use report::*;
pub use ticket::*;
