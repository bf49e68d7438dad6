pub mod anomaly;
pub mod formatter;

pub use anomaly::*;
pub use formatter::*;
