//! Arrow export of synchronized rows

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Decimal128Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use gs_core::Row;
use rust_decimal::Decimal;

use crate::DataError;

/// Precision of exported decimal columns
pub const EXPORT_PRECISION: u8 = 38;

/// Collect rows into a record batch.
///
/// The batch has a non-null `Int64` time column followed by one nullable
/// `Decimal128(38, scale)` column per entry of `columns`. Values are rounded
/// to `scale` decimal places.
pub fn rows_to_record_batch(
    rows: &[Row],
    time_column: &str,
    columns: &[String],
    scale: u32,
) -> Result<RecordBatch, DataError> {
    if scale > Decimal::MAX_SCALE {
        return Err(DataError::Export(format!(
            "scale {} exceeds the maximum of {}",
            scale,
            Decimal::MAX_SCALE
        )));
    }
    
    let times = rows
        .iter()
        .map(|row| {
            row.time(time_column)
                .ok_or_else(|| DataError::MissingColumn(time_column.to_string()))
        })
        .collect::<Result<Vec<i64>, _>>()?;
    
    let mut fields = vec![Field::new(time_column, DataType::Int64, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(Int64Array::from(times))];
    
    for column in columns {
        let values = rows
            .iter()
            .map(|row| row.get(column).map(|value| to_scaled_mantissa(value, scale)).transpose())
            .collect::<Result<Vec<Option<i128>>, _>>()?;
        let array = Decimal128Array::from(values).with_precision_and_scale(EXPORT_PRECISION, scale as i8)?;
        
        fields.push(Field::new(column, array.data_type().clone(), true));
        arrays.push(Arc::new(array));
    }
    
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Unscaled integer representation of `value` at exactly `scale` decimal places.
///
/// `rescale` settles for a smaller scale when the 96-bit mantissa cannot hold
/// the requested one; that is reported instead of exporting a wrong value.
fn to_scaled_mantissa(value: Decimal, scale: u32) -> Result<i128, DataError> {
    let mut rounded = value.round_dp(scale);
    rounded.rescale(scale);
    if rounded.scale() != scale {
        return Err(DataError::Export(format!(
            "{} cannot be represented with {} decimal places",
            value, scale
        )));
    }
    Ok(rounded.mantissa())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    
    #[test]
    fn test_batch_layout() {
        let rows = vec![
            Row::with_time("time", 0).with("a", Some(dec!(1.23456))).with("b", None),
            Row::with_time("time", 10).with("a", Some(dec!(-2))).with("b", Some(dec!(0.5))),
        ];
        let columns = vec!["a".to_string(), "b".to_string()];
        let batch = rows_to_record_batch(&rows, "time", &columns, 3).unwrap();
        
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 3);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Decimal128(38, 3));
        
        let times = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(times.value(1), 10);
        
        let a = batch.column(1).as_any().downcast_ref::<Decimal128Array>().unwrap();
        assert_eq!(a.value(0), 1_235);
        assert_eq!(a.value(1), -2_000);
        
        let b = batch.column(2).as_any().downcast_ref::<Decimal128Array>().unwrap();
        assert!(b.is_null(0));
        assert_eq!(b.value(1), 500);
    }
    
    #[test]
    fn test_rows_without_time_are_rejected() {
        let rows = vec![Row::new().with("a", Some(dec!(1)))];
        let result = rows_to_record_batch(&rows, "time", &["a".to_string()], 2);
        assert!(matches!(result, Err(DataError::MissingColumn(_))));
    }
    
    #[test]
    fn test_scale_limit() {
        assert!(rows_to_record_batch(&[], "time", &[], 29).is_err());
        assert!(rows_to_record_batch(&[], "time", &[], 28).is_ok());
    }
    
    #[test]
    fn test_values_too_large_for_scale_are_rejected() {
        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000_000, 0);
        let rows = vec![Row::with_time("time", 0).with("a", Some(huge))];
        let columns = vec!["a".to_string()];
        
        let result = rows_to_record_batch(&rows, "time", &columns, 6);
        assert!(matches!(result, Err(DataError::Export(_))));
        
        // Fewer decimal places leave room in the mantissa
        let batch = rows_to_record_batch(&rows, "time", &columns, 2).unwrap();
        let a = batch.column(1).as_any().downcast_ref::<Decimal128Array>().unwrap();
        assert_eq!(a.value(0), 10_000_000_000_000_000_000_000_000);
    }
}
