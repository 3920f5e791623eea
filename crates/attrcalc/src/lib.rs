//! Attribute computation core
//!
//! Decodes a batch of raw records into documents, runs an injected
//! calculator over each one, validates every value against the declared
//! data type and hands the complete id -> value map to a reporter.

pub mod error;
pub mod value;
pub mod data_type;
pub mod record;
pub mod loader;
pub mod calculator;
pub mod progress;
pub mod driver;
pub mod reporter;
pub mod pipeline;

pub use error::*;
pub use value::*;
pub use data_type::*;
pub use record::*;
pub use loader::*;
pub use calculator::*;
pub use progress::*;
pub use driver::*;
pub use reporter::*;
pub use pipeline::*;
