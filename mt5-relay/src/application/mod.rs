pub mod args;
pub mod dispatcher;
pub mod errors;
pub mod records;
pub mod session;

pub use dispatcher::{Dispatcher, Operation, Reply};
pub use errors::{DispatchError, ErrorClass};
pub use session::Session;

#[cfg(test)]
mod tests;
