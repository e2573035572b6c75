//! Schema model types.
//!
//! This module contains the types that represent a loaded schema document.

mod lenient;
mod property;
mod reference;
mod schema;

pub use property::*;
pub use reference::*;
pub use schema::*;
