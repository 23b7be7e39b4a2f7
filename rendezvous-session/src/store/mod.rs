mod memory_store;
mod signaling_store;
mod store_event;

pub use memory_store::*;
pub use signaling_store::*;
pub use store_event::*;
