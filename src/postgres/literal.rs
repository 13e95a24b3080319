// ABOUTME: Renders SqlValue cells as PostgreSQL SQL literals
// ABOUTME: Lets PostgreSQL coerce each literal into the destination column type

use crate::schema::ColumnDescriptor;
use crate::source::SqlValue;
use std::fmt::Write;

/// Render one value as a literal suitable for `INSERT ... VALUES`
///
/// - NULL → `NULL`
/// - Integers → bare numbers
/// - Finite floats → bare numbers; NaN/±Infinity → quoted special values
/// - UTF-8 bytes (strings, DECIMAL text) → single-quoted with `'` doubled
/// - Non-UTF-8 bytes, or bytes holding NUL → quoted `\x`-prefixed hex text
/// - Dates → `'YYYY-MM-DD HH:MM:SS[.ffffff]'`, fraction only when non-zero
/// - Times → `'[-]H:MM:SS[.ffffff]'` with days folded into hours
///
/// ```
/// # use mysql_pg_migrator::postgres::literal::to_pg_literal;
/// # use mysql_pg_migrator::source::SqlValue;
/// assert_eq!(to_pg_literal(&SqlValue::Int(5)), "5");
/// assert_eq!(to_pg_literal(&SqlValue::text("O'Brien")), "'O''Brien'");
/// ```
pub fn to_pg_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::UInt(u) => u.to_string(),
        SqlValue::Float(f) if f.is_finite() => format!("{:?}", f),
        SqlValue::Float(f) => float_literal(f64::from(*f)),
        SqlValue::Double(d) => float_literal(*d),
        SqlValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) if !s.contains('\0') => quote_string(s),
            _ => {
                let mut hex = String::with_capacity(bytes.len() * 2 + 2);
                hex.push_str("\\x");
                for b in bytes {
                    // Writing to a String cannot fail
                    let _ = write!(hex, "{:02x}", b);
                }
                quote_string(&hex)
            }
        },
        SqlValue::Date {
            year,
            month,
            day,
            hour,
            minute,
            second,
            micros,
        } => format!(
            "'{:04}-{:02}-{:02} {:02}:{:02}:{:02}{}'",
            year,
            month,
            day,
            hour,
            minute,
            second,
            fraction(*micros)
        ),
        SqlValue::Time {
            negative,
            days,
            hours,
            minutes,
            seconds,
            micros,
        } => {
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            format!(
                "'{}{}:{:02}:{:02}{}'",
                if *negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds,
                fraction(*micros)
            )
        }
    }
}

/// Render `value` as read from `column`
///
/// MySQL `DATE` columns arrive as midnight datetimes and are written back as
/// a bare `'YYYY-MM-DD'`; everything else goes through [`to_pg_literal`].
pub fn column_literal(column: &ColumnDescriptor, value: &SqlValue) -> String {
    match value {
        SqlValue::Date {
            year, month, day, ..
        } if is_date_only(column) => format!("'{:04}-{:02}-{:02}'", year, month, day),
        _ => to_pg_literal(value),
    }
}

/// Render a whole row as `(v1, v2, ...)`, pairing values with `columns` by position
pub fn row_literal(columns: &[ColumnDescriptor], row: &[SqlValue]) -> String {
    let values: Vec<String> = columns
        .iter()
        .zip(row)
        .map(|(column, value)| column_literal(column, value))
        .collect();
    format!("({})", values.join(", "))
}

fn is_date_only(column: &ColumnDescriptor) -> bool {
    column.source_type.trim().eq_ignore_ascii_case("date")
}

/// `.ffffff` when there are sub-second digits, nothing otherwise
fn fraction(micros: u32) -> String {
    if micros == 0 {
        String::new()
    } else {
        format!(".{:06}", micros)
    }
}

fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "'NaN'".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "'Infinity'".to_string()
        } else {
            "'-Infinity'".to_string()
        }
    } else {
        // `{:?}` keeps a decimal point or exponent so the literal stays numeric
        format!("{:?}", value)
    }
}

/// Single-quote a string, doubling embedded quotes
fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
