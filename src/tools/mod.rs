pub mod info;
pub mod lookup;
pub mod search;

pub use info::*;
pub use lookup::*;
pub use search::*;
