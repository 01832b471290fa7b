pub mod document;
pub mod registry;
pub mod session;
pub mod requests;
pub mod health;
pub mod error;

pub use document::*;
pub use registry::*;
pub use session::*;
pub use requests::*;
pub use health::*;
pub use error::*;
