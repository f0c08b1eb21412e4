mod callback;
mod message;
mod order_type;
mod time_advance;

pub use callback::Callback;
pub use message::{Message, MessagePayload, SentOrder};
pub use order_type::OrderType;
pub use time_advance::TimeAdvanceType;
