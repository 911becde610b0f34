//! Change-event dispatch for streamdex.
//!
//! Takes parsed change events, works out which index and document they
//! touch, and applies them to every configured search backend:
//!
//! - [`extract_source`]: table name from the event's source locator
//! - [`build_identity`]: document identifier from the decoded key attributes
//! - [`Dispatcher`]: per-event planning and backend fan-out with failure isolation
//! - [`generate_mapping`]: offline schema-mapping generation from table descriptions

mod dispatcher;
mod error;
mod identity;
pub mod mapping_gen;
mod source;

pub use dispatcher::{BatchReport, Dispatcher, EventFailure, EventOutcome, Operation};
pub use error::{DispatchError, DispatchResult};
pub use identity::{KEY_SEPARATOR, build_identity, render_key_value};
pub use mapping_gen::{TableDescription, generate_mapping};
pub use source::extract_source;
