pub mod generic;
pub mod names;

pub use generic::*;
pub use names::*;
