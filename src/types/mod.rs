mod amount;
mod errors;

pub use amount::parse_amount;
pub use errors::AmountError;

pub type MessageId = String;
pub type UserId = String;
