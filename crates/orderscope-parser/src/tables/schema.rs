pub const ORDER_ID: &str = "order_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const ORDER_STATUS: &str = "order_status";
pub const PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const DELIVERED_TIMESTAMP: &str = "order_delivered_customer_date";
pub const REVIEW_SCORE: &str = "review_score";
pub const PRICE: &str = "price";
pub const FREIGHT_VALUE: &str = "freight_value";

pub const ORDER_COLUMNS: [&str; 5] = [
    ORDER_ID,
    CUSTOMER_ID,
    ORDER_STATUS,
    PURCHASE_TIMESTAMP,
    DELIVERED_TIMESTAMP,
];

pub const REVIEW_COLUMNS: [&str; 2] = [ORDER_ID, REVIEW_SCORE];

pub const ORDER_ITEM_COLUMNS: [&str; 3] = [ORDER_ID, PRICE, FREIGHT_VALUE];
