pub mod backend;

pub use backend::{HttpOrderBackend, OrderBackend};
