//! Card presentation of lookup results.

pub mod model;

pub use model::{CardHeader, CardWidget, OrderCard};
