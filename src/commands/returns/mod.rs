pub mod create_return_command;

pub use create_return_command::{CreateReturnCommand, ReturnReceipt};
