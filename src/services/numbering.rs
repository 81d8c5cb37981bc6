//! Document number generation.
//!
//! DC numbers are scoped to their PO and derived from the highest suffix on
//! file, so deleted DCs leave gaps but never cause reuse. Invoice numbers come
//! from a per financial year counter row in `document_sequences`, bumped inside
//! the caller's write transaction.

use crate::{
    entities::{
        delivery_challan::{self, Entity as DeliveryChallan},
        document_sequence::{self, Entity as DocumentSequence},
    },
    errors::ServiceError,
    services::validation::invoice_number_taken,
};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::prelude::*, ConnectionTrait, QuerySelect, Set};

static DC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-DC-(\d+)$").expect("DC suffix pattern is valid"));

/// Guards against a runaway loop if every candidate were somehow taken.
const MAX_NUMBER_ATTEMPTS: u32 = 1000;

pub fn format_dc_number(po_number: i64, sequence: u32) -> String {
    format!("{}-DC-{:02}", po_number, sequence)
}

/// Numeric suffix of a DC number such as `4500123-DC-07`.
pub fn parse_dc_sequence(dc_number: &str) -> Option<u32> {
    DC_SUFFIX
        .captures(dc_number.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Next free DC number for a PO.
pub async fn next_dc_number<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
) -> Result<String, ServiceError> {
    let existing: Vec<String> = DeliveryChallan::find()
        .select_only()
        .column(delivery_challan::Column::DcNumber)
        .filter(delivery_challan::Column::PoNumber.eq(po_number))
        .into_tuple()
        .all(conn)
        .await?;

    let mut sequence = existing
        .iter()
        .filter_map(|n| parse_dc_sequence(n))
        .max()
        .unwrap_or(0);

    // Numbers are global, so a caller-supplied number on another PO may
    // already occupy the candidate.
    for _ in 0..MAX_NUMBER_ATTEMPTS {
        sequence += 1;
        let candidate = format_dc_number(po_number, sequence);
        let taken = DeliveryChallan::find_by_id(candidate.clone())
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
    }

    Err(ServiceError::InternalError(format!(
        "could not allocate a DC number for PO {}",
        po_number
    )))
}

/// Indian financial year label (April to March) for a date, e.g. `2026-27`.
pub fn financial_year(date: NaiveDate) -> String {
    let start = if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{:02}", start, (start + 1).rem_euclid(100))
}

pub fn format_invoice_number(financial_year: &str, sequence: i64) -> String {
    format!("INV/{}/{:03}", financial_year, sequence)
}

fn invoice_sequence_key(financial_year: &str) -> String {
    format!("invoice:{}", financial_year)
}

/// Allocates the next invoice number for the financial year containing
/// `today`. Numbers already used by caller-supplied invoices are skipped.
pub async fn next_invoice_number<C: ConnectionTrait>(
    conn: &C,
    today: NaiveDate,
) -> Result<String, ServiceError> {
    let fy = financial_year(today);
    let key = invoice_sequence_key(&fy);

    let current = DocumentSequence::find_by_id(key.clone()).one(conn).await?;
    let mut value = current.as_ref().map_or(0, |row| row.last_value);

    for _ in 0..MAX_NUMBER_ATTEMPTS {
        value += 1;
        let candidate = format_invoice_number(&fy, value);
        if invoice_number_taken(conn, &candidate).await? {
            continue;
        }

        let row = document_sequence::ActiveModel {
            sequence_key: Set(key.clone()),
            last_value: Set(value),
        };
        if current.is_some() {
            row.update(conn).await?;
        } else {
            row.insert(conn).await?;
        }
        return Ok(candidate);
    }

    Err(ServiceError::InternalError(format!(
        "could not allocate an invoice number for {}",
        fy
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("4500123-DC-01", Some(1))]
    #[case("4500123-DC-17", Some(17))]
    #[case("PO100-DC-03", Some(3))]
    #[case("4500123-dc-02", None)]
    #[case("DC-ABC", None)]
    fn parses_dc_suffix(#[case] number: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_dc_sequence(number), expected);
    }

    #[test]
    fn dc_numbers_are_zero_padded() {
        assert_eq!(format_dc_number(4500123, 2), "4500123-DC-02");
        assert_eq!(format_dc_number(4500123, 123), "4500123-DC-123");
    }

    #[rstest]
    #[case(2026, 4, 1, "2026-27")]
    #[case(2027, 3, 31, "2026-27")]
    #[case(2026, 3, 31, "2025-26")]
    #[case(2099, 12, 1, "2099-00")]
    fn financial_year_starts_in_april(
        #[case] y: i32,
        #[case] m: u32,
        #[case] d: u32,
        #[case] expected: &str,
    ) {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(financial_year(date), expected);
    }

    #[test]
    fn invoice_numbers_are_zero_padded() {
        assert_eq!(format_invoice_number("2026-27", 7), "INV/2026-27/007");
    }
}
