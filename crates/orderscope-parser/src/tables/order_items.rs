use polars::prelude::*;

use crate::errors::LoadError;
use crate::model::{LoadedTable, TableKind};
use crate::registry::TableParser;

use super::common::{
    base_report, build_dataframe, field, parse_optional_f64, parse_required_str, read_table,
    string_series,
};
use super::schema::{FREIGHT_VALUE, ORDER_ID, ORDER_ITEM_COLUMNS, PRICE};

pub struct OrderItemsParser;

impl OrderItemsParser {
    const KIND: TableKind = TableKind::OrderItems;
}

impl TableParser for OrderItemsParser {
    fn kind(&self) -> TableKind {
        Self::KIND
    }

    fn parse(&self, content: &[u8]) -> Result<LoadedTable, LoadError> {
        let table = Self::KIND;
        let mut order_ids: Vec<String> = Vec::new();
        let mut prices: Vec<Option<f64>> = Vec::new();
        let mut freight: Vec<Option<f64>> = Vec::new();
        let mut positions: Option<[usize; 3]> = None;

        let header = read_table(table, content, |index, record, line_index| {
            let [id_pos, price_pos, freight_pos] = match positions {
                Some(found) => found,
                None => {
                    let found = [
                        index.require(ORDER_ID)?,
                        index.require(PRICE)?,
                        index.require(FREIGHT_VALUE)?,
                    ];
                    positions = Some(found);
                    found
                }
            };

            order_ids.push(parse_required_str(
                table,
                field(record, id_pos),
                line_index,
                ORDER_ID,
            )?);
            let price = parse_optional_f64(table, field(record, price_pos), line_index, PRICE)?;
            let freight_value =
                parse_optional_f64(table, field(record, freight_pos), line_index, FREIGHT_VALUE)?;

            for (column, value) in [(PRICE, price), (FREIGHT_VALUE, freight_value)] {
                if value.is_some_and(|v| v < 0.0) {
                    return Err(LoadError::DataRow {
                        table,
                        line_index,
                        message: format!("column '{column}' must not be negative"),
                    });
                }
            }

            prices.push(price);
            freight.push(freight_value);
            Ok(())
        })?;

        for column in ORDER_ITEM_COLUMNS {
            header.require(column)?;
        }

        let report = base_report(order_ids.len(), &header, &ORDER_ITEM_COLUMNS);
        let df = build_dataframe(
            table,
            vec![
                string_series(ORDER_ID, &order_ids).into(),
                Series::new(PRICE.into(), prices).into(),
                Series::new(FREIGHT_VALUE.into(), freight).into(),
            ],
        )?;

        Ok(LoadedTable {
            kind: table,
            df,
            report,
        })
    }
}
