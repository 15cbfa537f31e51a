mod affinity;
mod dispatcher;

pub use affinity::*;
pub use dispatcher::*;
