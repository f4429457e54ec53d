pub mod admission;
pub mod cancellation;
pub mod dispatcher;
pub mod processors;
pub mod queue;
pub mod registry;
pub mod retry;
pub mod search_index;
pub mod signature;
pub mod stripe;
pub mod usage;
