mod common;
mod order_items;
mod orders;
mod reviews;
pub mod schema;

pub use order_items::OrderItemsParser;
pub use orders::OrdersParser;
pub use reviews::ReviewsParser;

#[cfg(test)]
pub(crate) use common::{parse_optional_i64, parse_timestamp, TimestampCell};
