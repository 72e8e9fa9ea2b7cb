// Domain module: problem model, option registry, session state and the backend contract

pub mod models;
pub mod options;
pub mod session;
pub mod solver_service;
pub mod value_objects;

pub use models::*;
pub use options::*;
pub use session::*;
pub use solver_service::*;
pub use value_objects::*;
