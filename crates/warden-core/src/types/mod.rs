pub mod intent;
pub mod tool;
pub mod trace;

pub use intent::*;
pub use tool::*;
pub use trace::*;
