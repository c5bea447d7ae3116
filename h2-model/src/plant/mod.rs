pub mod equipment;
pub mod parameters;
pub mod record;
pub mod state;
