use super::StorageError;
use arrow::array::{
    Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray, Time64MicrosecondArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::sync::Arc;
use transit_star_types::{ColumnType, Table, Value};

const MICROS_PER_SECOND: i64 = 1_000_000;

pub fn data_type_for(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Text => DataType::Utf8,
        ColumnType::Int => DataType::Int64,
        ColumnType::Float => DataType::Float64,
        ColumnType::Date => DataType::Date32,
        ColumnType::Time => DataType::Time64(TimeUnit::Microsecond),
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
    }
}

fn epoch() -> NaiveDate {
    DateTime::UNIX_EPOCH.date_naive()
}

fn date_to_days(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(Duration::days(days as i64))
}

fn time_to_micros(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * MICROS_PER_SECOND + (time.nanosecond() / 1_000) as i64
}

fn micros_to_time(micros: i64) -> Option<NaiveTime> {
    let secs = micros.div_euclid(MICROS_PER_SECOND);
    let nanos = micros.rem_euclid(MICROS_PER_SECOND) * 1_000;
    NaiveTime::from_num_seconds_from_midnight_opt(secs as u32, nanos as u32)
}

fn timestamp_to_micros(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

fn micros_to_timestamp(micros: i64) -> Option<NaiveDateTime> {
    let secs = micros.div_euclid(MICROS_PER_SECOND);
    let nanos = micros.rem_euclid(MICROS_PER_SECOND) * 1_000;
    DateTime::from_timestamp(secs, nanos as u32).map(|dt| dt.naive_utc())
}

fn column_array(table: &Table, idx: usize, column_type: ColumnType) -> ArrayRef {
    let cells = table.rows().iter().map(|row| &row[idx]);
    match column_type {
        ColumnType::Text => Arc::new(StringArray::from(
            cells
                .map(|cell| match cell {
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>(),
        )),
        ColumnType::Int => Arc::new(Int64Array::from(
            cells.map(Value::as_int).collect::<Vec<_>>(),
        )),
        ColumnType::Float => Arc::new(Float64Array::from(
            cells.map(Value::as_float).collect::<Vec<_>>(),
        )),
        ColumnType::Date => Arc::new(Date32Array::from(
            cells
                .map(|cell| match cell {
                    Value::Date(d) => Some(date_to_days(*d)),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnType::Time => Arc::new(Time64MicrosecondArray::from(
            cells
                .map(|cell| match cell {
                    Value::Time(t) => Some(time_to_micros(*t)),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnType::Timestamp => Arc::new(TimestampMicrosecondArray::from(
            cells
                .map(|cell| match cell {
                    Value::Timestamp(ts) => Some(timestamp_to_micros(*ts)),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
    }
}

/// Convert a table into one record batch, inferring each column's physical type
pub fn table_to_batch(table: &Table) -> Result<RecordBatch, StorageError> {
    if table.width() == 0 {
        return Err(StorageError::EmptySchema);
    }

    let mut fields = Vec::with_capacity(table.width());
    let mut arrays = Vec::with_capacity(table.width());
    for (idx, name) in table.columns().iter().enumerate() {
        let column_type = table.column_type(idx);
        fields.push(Field::new(name, data_type_for(column_type), true));
        arrays.push(column_array(table, idx, column_type));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a T, StorageError> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| unsupported(name, array.data_type()))
}

fn unsupported(name: &str, data_type: &DataType) -> StorageError {
    StorageError::UnsupportedType {
        column: name.to_string(),
        data_type: data_type.to_string(),
    }
}

fn column_values(array: &ArrayRef, name: &str) -> Result<Vec<Value>, StorageError> {
    let len = array.len();
    let values = match array.data_type() {
        DataType::Utf8 => {
            let a = downcast::<StringArray>(array, name)?;
            (0..len)
                .map(|i| (!a.is_null(i)).then(|| Value::text(a.value(i))).unwrap_or_default())
                .collect()
        }
        DataType::Int64 => {
            let a = downcast::<Int64Array>(array, name)?;
            (0..len)
                .map(|i| (!a.is_null(i)).then(|| Value::Int(a.value(i))).unwrap_or_default())
                .collect()
        }
        DataType::Float64 => {
            let a = downcast::<Float64Array>(array, name)?;
            (0..len)
                .map(|i| (!a.is_null(i)).then(|| Value::Float(a.value(i))).unwrap_or_default())
                .collect()
        }
        DataType::Date32 => {
            let a = downcast::<Date32Array>(array, name)?;
            (0..len)
                .map(|i| {
                    (!a.is_null(i))
                        .then(|| days_to_date(a.value(i)))
                        .flatten()
                        .map(Value::Date)
                        .unwrap_or_default()
                })
                .collect()
        }
        DataType::Time64(TimeUnit::Microsecond) => {
            let a = downcast::<Time64MicrosecondArray>(array, name)?;
            (0..len)
                .map(|i| {
                    (!a.is_null(i))
                        .then(|| micros_to_time(a.value(i)))
                        .flatten()
                        .map(Value::Time)
                        .unwrap_or_default()
                })
                .collect()
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let a = downcast::<TimestampMicrosecondArray>(array, name)?;
            (0..len)
                .map(|i| {
                    (!a.is_null(i))
                        .then(|| micros_to_timestamp(a.value(i)))
                        .flatten()
                        .map(Value::Timestamp)
                        .unwrap_or_default()
                })
                .collect()
        }
        other => return Err(unsupported(name, other)),
    };
    Ok(values)
}

/// Rebuild a table from the record batches of one file
pub fn table_from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Table, StorageError> {
    let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let mut table = Table::new(names.clone());

    for batch in batches {
        let mut columns = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            columns.push(column_values(batch.column(idx), name)?);
        }
        for row_idx in 0..batch.num_rows() {
            table.push_row(
                columns
                    .iter_mut()
                    .map(|column| std::mem::take(&mut column[row_idx]))
                    .collect(),
            );
        }
    }

    Ok(table)
}
