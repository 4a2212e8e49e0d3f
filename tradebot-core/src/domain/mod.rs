//! Domain types shared by the core and its hosts.

pub mod bar;
pub mod order;

pub use bar::Bar;
pub use order::{CancelReason, Execution, ExecutionOrigin, OrderAction, OrderHandle, OrderIntent};
