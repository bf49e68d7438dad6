pub mod expression;
pub mod resolver;

pub use expression::*;
pub use resolver::*;
