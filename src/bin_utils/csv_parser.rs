use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::patron::PatronId;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// New listing: `symbol`, `amount` as price, `quantity` as available shares.
    List,
    /// External price change: `symbol`, `amount`.
    Price,
    /// External share supply: `symbol`, `quantity`.
    Supply,
    Patron,
    OpenSavings,
    OpenBrokerage,
    Deposit,
    Withdraw,
    Buy,
    Sell,
}

#[derive(Debug, Deserialize)]
pub struct Row {
    pub op: Operation,
    pub patron: Option<PatronId>,
    pub symbol: Option<String>,
    pub amount: Option<Decimal>,
    pub quantity: Option<u32>,
}

/// Parses scenario rows in CSV format, yielding each row with its line number.
pub struct CsvScenarioParser<R> {
    iter: DeserializeRecordsIntoIter<R, Row>,
}

impl<R> CsvScenarioParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvScenarioParser<R>
where
    R: Read,
{
    type Item = (u64, csv::Result<Row>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}
