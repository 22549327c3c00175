mod basestock;
mod dist;
mod mdp;

pub use basestock::*;
pub use dist::*;
pub use mdp::*;
