pub mod engine;
pub mod extract;
pub mod io;
pub mod record;
pub mod stanza;
pub mod stats;

pub mod prelude {
    pub use crate::engine::Engine;
    pub use crate::extract::extract;
    pub use crate::record::{HashRecord, Md5Mode};
}
