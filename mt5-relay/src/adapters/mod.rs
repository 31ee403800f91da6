pub mod inbound;
pub mod infrastructure;
pub mod outbound;
