pub mod block;
pub mod error;
pub mod types;
pub mod value;
pub mod world;

pub use block::*;
pub use error::SpellBlocksError;
pub use types::*;
pub use value::*;
pub use world::*;
