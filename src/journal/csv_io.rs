//! CSV export and import of journal trades.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use rust_decimal::Decimal;

use crate::models::{Direction, NewTrade, QuantityType, Trade};
use super::service::JournalError;

pub const CSV_HEADER: &str =
    "Date,Pair,Type,Entry Price,Exit Price,Quantity,Leverage,Exchange,Status,Outcome,P&L,P&L %,Notes";

const COLUMNS: usize = 13;

/// Render trades in the journal's CSV layout.
///
/// Any field holding a comma, quote or line break is quoted with inner quotes
/// doubled. A quote-denominated quantity carries its currency (`1500 USDT`).
/// Rows are separated by `\n` with no trailing newline.
pub fn export_trades(trades: &[Trade]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER.split(','))
        .context("Failed to write CSV header")?;

    for trade in trades {
        let exit_price = trade
            .exit_price
            .map(|p| p.normalize().to_string())
            .unwrap_or_default();

        writer
            .write_record([
                trade.entry_date.to_rfc3339_opts(SecondsFormat::Millis, true),
                trade.pair.clone(),
                trade.direction.as_str().to_string(),
                trade.entry_price.normalize().to_string(),
                exit_price,
                format_quantity(trade),
                trade.leverage.to_string(),
                trade.exchange.clone(),
                trade.status.as_str().to_string(),
                trade.outcome.as_str().to_string(),
                format!("{:.2}", trade.profit_loss.round_dp(2)),
                format!("{:.2}", trade.profit_loss_percent.round_dp(2)),
                trade.notes.clone(),
            ])
            .with_context(|| format!("Failed to write trade {}", trade.id))?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV")?;
    let mut text = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

fn format_quantity(trade: &Trade) -> String {
    let quantity = trade.quantity.normalize();
    match trade.quantity_type {
        QuantityType::Base => quantity.to_string(),
        QuantityType::Quote => format!("{} {}", quantity, trade.quote_currency()),
    }
}

/// Plain number for base units, `<amount> <QUOTE>` for a quote-currency amount.
fn parse_quantity(raw: &str, pair: &str) -> Result<(Decimal, QuantityType), String> {
    let Some((amount, unit)) = raw.split_once(char::is_whitespace) else {
        return Ok((parse_decimal(raw, "quantity")?, QuantityType::Base));
    };

    let expected = pair.split_once('/').map(|(_, quote)| quote.trim()).unwrap_or(pair);
    if !unit.trim().eq_ignore_ascii_case(expected) {
        return Err(format!("quantity unit '{}' does not match pair {pair}", unit.trim()));
    }
    Ok((parse_decimal(amount, "quantity")?, QuantityType::Quote))
}

/// Parse an exported CSV back into new-trade inputs.
///
/// Status, outcome and P&L columns are ignored; they are recomputed from the
/// prices when the trades are added.
pub fn parse_trades(text: &str) -> Result<Vec<NewTrade>, JournalError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let mut trades = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| JournalError::Csv {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        trades.push(parse_row(&record).map_err(|message| JournalError::Csv { line, message })?);
    }

    Ok(trades)
}

fn parse_row(record: &StringRecord) -> Result<NewTrade, String> {
    if record.len() != COLUMNS {
        return Err(format!("expected {COLUMNS} columns, found {}", record.len()));
    }
    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let entry_date = DateTime::parse_from_rfc3339(field(0))
        .map_err(|e| format!("bad date '{}': {e}", field(0)))?
        .with_timezone(&Utc);
    let direction = Direction::from_str(field(2))?;
    let entry_price = parse_decimal(field(3), "entry price")?;
    let exit_price = match field(4) {
        "" => None,
        raw => Some(parse_decimal(raw, "exit price")?),
    };
    let (quantity, quantity_type) = parse_quantity(field(5), field(1))?;
    let leverage = field(6)
        .parse::<u32>()
        .map_err(|_| format!("bad leverage '{}'", field(6)))?;

    Ok(NewTrade {
        pair: field(1).to_string(),
        direction,
        entry_price,
        exit_price,
        quantity,
        quantity_type,
        entry_date,
        exit_date: None,
        stop_loss: None,
        take_profit: None,
        leverage,
        exchange: field(7).to_string(),
        fees: Decimal::ZERO,
        // Notes keep their inner whitespace
        notes: record.get(12).unwrap_or("").to_string(),
        tags: Vec::new(),
        screenshots: Vec::new(),
    })
}

fn parse_decimal(raw: &str, name: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| format!("bad {name} '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TradeOutcome, TradeStatus};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn trade(notes: &str, exit: Option<Decimal>) -> Trade {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let mut t = Trade {
            id: "t1".to_string(),
            user_id: "alice@example.com".to_string(),
            pair: "ETH/USDT".to_string(),
            direction: Direction::Long,
            entry_price: dec!(3000.00),
            exit_price: None,
            quantity: dec!(1.5),
            quantity_type: QuantityType::Base,
            entry_date: date,
            exit_date: None,
            stop_loss: None,
            take_profit: None,
            leverage: 3,
            exchange: "okx".to_string(),
            status: TradeStatus::Open,
            outcome: TradeOutcome::Pending,
            profit_loss: Decimal::ZERO,
            profit_loss_percent: Decimal::ZERO,
            fees: Decimal::ZERO,
            notes: notes.to_string(),
            tags: vec![],
            screenshots: vec![],
            created_at: date,
            updated_at: date,
        };
        if let Some(exit) = exit {
            t.settle(exit, date).unwrap();
        }
        t
    }

    #[test]
    fn test_export_layout() {
        let csv = export_trades(&[
            trade("said \"go\", then left", Some(dec!(3100))),
            trade("", None),
        ])
        .unwrap();
        let lines: Vec<&str> = csv.split('\n').collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "2024-05-01T12:30:00.000Z,ETH/USDT,long,3000,3100,1.5,3,okx,closed,win,150.00,10.00,\"said \"\"go\"\", then left\""
        );
        assert_eq!(
            lines[2],
            "2024-05-01T12:30:00.000Z,ETH/USDT,long,3000,,1.5,3,okx,open,pending,0.00,0.00,"
        );
    }

    #[test]
    fn test_export_quotes_any_field_that_needs_it() {
        let mut t = trade("plain", None);
        t.pair = "BTC,X/USDT".to_string();
        t.exchange = "say \"hi\"".to_string();
        let csv = export_trades(&[t]).unwrap();

        assert!(csv.ends_with(",\"BTC,X/USDT\",long,3000,,1.5,3,\"say \"\"hi\"\"\",open,pending,0.00,0.00,plain"));
        let rows = parse_trades(&csv).unwrap();
        assert_eq!(rows[0].pair, "BTC,X/USDT");
        assert_eq!(rows[0].exchange, "say \"hi\"");
        assert_eq!(rows[0].notes, "plain");
    }

    #[test]
    fn test_quote_quantity_keeps_its_unit() {
        let mut t = trade("", Some(dec!(3300)));
        t.quantity = dec!(1500);
        t.quantity_type = QuantityType::Quote;
        t.settle(dec!(3300), t.entry_date).unwrap();

        let csv = export_trades(&[t.clone()]).unwrap();
        assert!(csv.contains(",1500 USDT,"));

        let row = &parse_trades(&csv).unwrap()[0];
        assert_eq!(row.quantity, dec!(1500));
        assert_eq!(row.quantity_type, QuantityType::Quote);

        let wrong_unit = csv.replace("1500 USDT", "1500 BTC");
        assert!(matches!(parse_trades(&wrong_unit), Err(JournalError::Csv { line: 2, .. })));
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(export_trades(&[]).unwrap(), CSV_HEADER);
    }

    #[test]
    fn test_parse_export() {
        let csv = export_trades(&[trade("a, \"b\"", Some(dec!(2900)))]).unwrap();
        let rows = parse_trades(&csv).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.pair, "ETH/USDT");
        assert_eq!(row.entry_price, dec!(3000));
        assert_eq!(row.exit_price, Some(dec!(2900)));
        assert_eq!(row.quantity, dec!(1.5));
        assert_eq!(row.leverage, 3);
        assert_eq!(row.exchange, "okx");
        assert_eq!(row.notes, "a, \"b\"");
    }

    #[test]
    fn test_parse_reports_line() {
        let csv = format!("{CSV_HEADER}\n2024-05-01T12:30:00.000Z,ETH/USDT,sideways,3000,,1,1,okx,open,pending,0.00,0.00,\"\"");
        match parse_trades(&csv) {
            Err(JournalError::Csv { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("sideways"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
