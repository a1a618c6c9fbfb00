use polars::prelude::*;

use crate::errors::LoadError;
use crate::model::{LoadedTable, TableKind};
use crate::registry::TableParser;

use super::common::{
    base_report, build_dataframe, field, parse_optional_i64, parse_required_str, read_table,
    string_series,
};
use super::schema::{ORDER_ID, REVIEW_COLUMNS, REVIEW_SCORE};

const SCORE_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

pub struct ReviewsParser;

impl ReviewsParser {
    const KIND: TableKind = TableKind::Reviews;
}

impl TableParser for ReviewsParser {
    fn kind(&self) -> TableKind {
        Self::KIND
    }

    fn parse(&self, content: &[u8]) -> Result<LoadedTable, LoadError> {
        let table = Self::KIND;
        let mut order_ids: Vec<String> = Vec::new();
        let mut scores: Vec<Option<i64>> = Vec::new();
        let mut positions: Option<(usize, usize)> = None;

        let header = read_table(table, content, |index, record, line_index| {
            let (id_pos, score_pos) = match positions {
                Some(found) => found,
                None => {
                    let found = (index.require(ORDER_ID)?, index.require(REVIEW_SCORE)?);
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
            let score = parse_optional_i64(
                table,
                field(record, score_pos),
                line_index,
                REVIEW_SCORE,
            )?;
            if let Some(value) = score.filter(|v| !SCORE_RANGE.contains(v)) {
                return Err(LoadError::DataRow {
                    table,
                    line_index,
                    message: format!(
                        "column '{REVIEW_SCORE}' must be between {} and {}, got {value}",
                        SCORE_RANGE.start(),
                        SCORE_RANGE.end()
                    ),
                });
            }
            scores.push(score);
            Ok(())
        })?;

        for column in REVIEW_COLUMNS {
            header.require(column)?;
        }

        let report = base_report(order_ids.len(), &header, &REVIEW_COLUMNS);
        let df = build_dataframe(
            table,
            vec![
                string_series(ORDER_ID, &order_ids).into(),
                Series::new(REVIEW_SCORE.into(), scores).into(),
            ],
        )?;

        Ok(LoadedTable {
            kind: table,
            df,
            report,
        })
    }
}
