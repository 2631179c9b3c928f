//! Records exchanged with the planning backend

mod node;
mod scenario;
mod service;
mod user;

pub use node::*;
pub use scenario::*;
pub use service::*;
pub use user::*;
