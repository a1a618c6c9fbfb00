use crate::errors::LoadError;
use crate::model::{LoadedTable, TableKind};
use crate::registry::TableParser;

use super::common::{
    base_report, build_dataframe, datetime_series, field, optional_string_series,
    parse_optional_str, parse_required_str, read_table, string_series, TimestampColumn,
};
use super::schema::{
    CUSTOMER_ID, DELIVERED_TIMESTAMP, ORDER_COLUMNS, ORDER_ID, ORDER_STATUS, PURCHASE_TIMESTAMP,
};

/// Parses the orders table. Timestamps that match no known format become nulls.
pub struct OrdersParser;

impl OrdersParser {
    const KIND: TableKind = TableKind::Orders;
}

#[derive(Default)]
struct OrderColumns {
    order_id: Vec<String>,
    customer_id: Vec<Option<String>>,
    order_status: Vec<Option<String>>,
    purchased: TimestampColumn,
    delivered: TimestampColumn,
}

impl TableParser for OrdersParser {
    fn kind(&self) -> TableKind {
        Self::KIND
    }

    fn parse(&self, content: &[u8]) -> Result<LoadedTable, LoadError> {
        let table = Self::KIND;
        let mut columns = OrderColumns::default();
        let mut positions: Option<[usize; 5]> = None;

        let header = read_table(table, content, |index, record, line_index| {
            let [id_pos, customer_pos, status_pos, purchase_pos, delivered_pos] = match positions {
                Some(found) => found,
                None => {
                    let found = [
                        index.require(ORDER_ID)?,
                        index.require(CUSTOMER_ID)?,
                        index.require(ORDER_STATUS)?,
                        index.require(PURCHASE_TIMESTAMP)?,
                        index.require(DELIVERED_TIMESTAMP)?,
                    ];
                    positions = Some(found);
                    found
                }
            };

            columns.order_id.push(parse_required_str(
                table,
                field(record, id_pos),
                line_index,
                ORDER_ID,
            )?);
            columns
                .customer_id
                .push(parse_optional_str(field(record, customer_pos)));
            columns
                .order_status
                .push(parse_optional_str(field(record, status_pos)));
            columns.purchased.push(field(record, purchase_pos));
            columns.delivered.push(field(record, delivered_pos));
            Ok(())
        })?;

        // A header-only file never reaches the record callback.
        for column in ORDER_COLUMNS {
            header.require(column)?;
        }

        let rows = columns.order_id.len();
        let mut report = base_report(rows, &header, &ORDER_COLUMNS);
        report.unparsed_timestamps = vec![
            (PURCHASE_TIMESTAMP.to_string(), columns.purchased.unparsed),
            (DELIVERED_TIMESTAMP.to_string(), columns.delivered.unparsed),
        ];

        let df = build_dataframe(
            table,
            vec![
                string_series(ORDER_ID, &columns.order_id).into(),
                optional_string_series(CUSTOMER_ID, &columns.customer_id).into(),
                optional_string_series(ORDER_STATUS, &columns.order_status).into(),
                datetime_series(table, PURCHASE_TIMESTAMP, columns.purchased.values)?.into(),
                datetime_series(table, DELIVERED_TIMESTAMP, columns.delivered.values)?.into(),
            ],
        )?;

        Ok(LoadedTable {
            kind: table,
            df,
            report,
        })
    }
}
