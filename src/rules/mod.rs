pub mod definition;
pub mod index;
pub mod jsonc;

pub use index::*;
pub use jsonc::strip_comments;
