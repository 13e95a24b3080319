// ABOUTME: MySQL wire values to engine-neutral SqlValue conversion
// ABOUTME: Also parses INFORMATION_SCHEMA column rows into ColumnDescriptor

use crate::schema::ColumnDescriptor;
use crate::source::{Row, SqlValue};
use anyhow::Result;
use mysql_async::Value;

/// Convert a MySQL Value to a SqlValue
///
/// The conversion is shape-preserving: numbers stay numbers, bytes stay
/// bytes, and date/time parts are copied field by field.
///
/// ```
/// # use mysql_async::Value;
/// # use mysql_pg_migrator::mysql::converter::mysql_value_to_sql;
/// # use mysql_pg_migrator::source::SqlValue;
/// assert_eq!(mysql_value_to_sql(Value::Int(42)), SqlValue::Int(42));
/// ```
pub fn mysql_value_to_sql(value: Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(i) => SqlValue::Int(i),
        Value::UInt(u) => SqlValue::UInt(u),
        Value::Float(f) => SqlValue::Float(f),
        Value::Double(d) => SqlValue::Double(d),
        Value::Bytes(b) => SqlValue::Bytes(b),
        Value::Date(year, month, day, hour, minute, second, micros) => SqlValue::Date {
            year,
            month,
            day,
            hour,
            minute,
            second,
            micros,
        },
        Value::Time(negative, days, hours, minutes, seconds, micros) => SqlValue::Time {
            negative,
            days,
            hours,
            minutes,
            seconds,
            micros,
        },
    }
}

/// Convert a MySQL Row into values in column order
///
/// `expected_columns` guards against the driver returning a different shape
/// than the describe step reported.
pub fn mysql_row_to_values(row: &mysql_async::Row, expected_columns: usize) -> Result<Row> {
    if row.len() != expected_columns {
        anyhow::bail!(
            "Row has {} value(s) but table has {} column(s)",
            row.len(),
            expected_columns
        );
    }

    (0..row.len())
        .map(|idx| {
            let value: Value = row
                .get(idx)
                .ok_or_else(|| anyhow::anyhow!("Failed to get value at index {}", idx))?;
            Ok(mysql_value_to_sql(value))
        })
        .collect()
}

/// Build a ColumnDescriptor from INFORMATION_SCHEMA.COLUMNS fields
///
/// `is_nullable` is `YES`/`NO`; `column_key` is `PRI` for primary-key parts.
pub fn column_from_information_schema(
    name: String,
    column_type: String,
    is_nullable: &str,
    column_key: &str,
) -> ColumnDescriptor {
    ColumnDescriptor {
        name,
        source_type: column_type,
        nullable: !is_nullable.eq_ignore_ascii_case("NO"),
        primary_key: column_key.eq_ignore_ascii_case("PRI"),
    }
}
