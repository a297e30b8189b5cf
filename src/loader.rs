//! CSV loader for the cleaned delivery dataset.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::models::{CsvRecord, DeliveryTable, REQUIRED_COLUMNS};

/// Rows logged individually before switching to a summary count.
const MAX_LOGGED_ROW_ERRORS: usize = 5;

/// Load every delivery in `path` into an immutable table.
///
/// Fails only when the file cannot be opened or its header lacks a required
/// column. Individual bad rows are skipped; bad dates and numbers become
/// `None` on the record.
pub fn load_deliveries(path: impl AsRef<Path>) -> Result<DeliveryTable> {
    let path = path.as_ref();
    info!("Reading deliveries from {:?}", path);

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_reader(file)
}

/// Same as [`load_deliveries`] over any reader.
pub fn load_from_reader<R: Read>(input: R) -> Result<DeliveryTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader.headers().map_err(LoadError::from)?.clone();
    check_columns(&headers)?;

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut error_count = 0;
    let mut duplicate_count = 0;
    let mut undated_count = 0;

    for (i, row) in reader.deserialize::<CsvRecord>().enumerate() {
        // Header is line 1
        let line = i + 2;
        match row {
            Ok(raw) => {
                if !seen_ids.insert(raw.order_id.clone()) {
                    if duplicate_count < MAX_LOGGED_ROW_ERRORS {
                        warn!("Duplicate Order_ID {} on line {}, keeping first", raw.order_id, line);
                    }
                    duplicate_count += 1;
                    continue;
                }
                let record = raw.to_delivery();
                if record.order_time.is_none() {
                    undated_count += 1;
                }
                records.push(record);
            }
            Err(e) => {
                if error_count < MAX_LOGGED_ROW_ERRORS {
                    warn!("Failed to parse line {}: {}", line, e);
                }
                error_count += 1;
            }
        }
    }

    if undated_count > 0 {
        debug!("{} records have an unparsable Order_Date", undated_count);
    }
    info!(
        "Loaded {} deliveries ({} malformed rows skipped, {} duplicates dropped)",
        records.len(),
        error_count,
        duplicate_count
    );

    Ok(DeliveryTable::new(records))
}

fn check_columns(headers: &StringRecord) -> std::result::Result<(), LoadError> {
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(*col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;

    const HEADER: &str = "Order_ID,Agent_Age,Agent_Rating,Store_Latitude,Store_Longitude,Drop_Latitude,Drop_Longitude,Order_Date,Order_Time,Weather,Traffic,Vehicle,Area,Category,order_to_pickup_mins,pickup_to_delivery_mins";

    fn csv_with(rows: &[&str]) -> String {
        let mut body = String::from(HEADER);
        for row in rows {
            body.push('\n');
            body.push_str(row);
        }
        body
    }

    #[test]
    fn test_loads_rows_in_order() {
        let data = csv_with(&[
            "ialx566343618,37,4.9,22.745049,75.892471,22.765049,75.912471,2022-03-19,11:30:00,Sunny,High ,motorcycle,Urban ,Clothing,15,120",
            "akqg208421122,34,4.5,12.913041,77.683237,13.043041,77.813237,2022-03-25,19:45:00,Stormy,Jam ,scooter,Metropolitian ,Electronics,5,165",
        ]);
        let table = load_from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.records()[0];
        assert_eq!(first.order_id, "ialx566343618");
        assert_eq!(first.traffic, "High");
        assert_eq!(first.area, "Urban");
        assert_eq!(first.pickup_to_delivery_mins, Some(120.0));
        assert_eq!(table.records()[1].area, "Metropolitian");
    }

    #[test]
    fn test_bad_date_yields_none_not_failure() {
        let data = csv_with(&[
            "a1,30,4.0,12.9,77.6,13.0,77.7,garbage,10:00:00,Sunny,Low,scooter,Urban,Toys,10,90",
        ]);
        let table = load_from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.records()[0].order_time.is_none());
    }

    #[test]
    fn test_non_numeric_fields_become_none() {
        let data = csv_with(&[
            "a1,NaN,abc,12.9,77.6,13.0,77.7,2022-03-01,10:00:00,Sunny,Low,scooter,Urban,Toys,,x",
        ]);
        let table = load_from_reader(data.as_bytes()).unwrap();
        let record = &table.records()[0];
        assert_eq!(record.agent_age, None);
        assert_eq!(record.agent_rating, None);
        assert_eq!(record.order_to_pickup_mins, None);
        assert_eq!(record.pickup_to_delivery_mins, None);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let data = csv_with(&[
            "dup,30,4.0,12.9,77.6,13.0,77.7,2022-03-01,10:00:00,Sunny,Low,scooter,Urban,Toys,10,90",
            "dup,31,4.1,12.9,77.6,13.0,77.7,2022-03-02,10:00:00,Sunny,Low,scooter,Urban,Toys,10,200",
        ]);
        let table = load_from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].pickup_to_delivery_mins, Some(90.0));
    }

    #[test]
    fn test_short_row_is_skipped() {
        let data = csv_with(&[
            "a1,30,4.0,12.9,77.6,13.0,77.7,2022-03-01,10:00:00,Sunny,Low,scooter,Urban,Toys,10,90",
            "a2,30,4.0",
        ]);
        let table = load_from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_column_is_load_error() {
        let data = "Order_ID,Order_Date,Area\nx,2022-03-01,Urban\n";
        let err = load_from_reader(data.as_bytes()).unwrap_err();
        match err {
            DashboardError::Load(LoadError::MissingColumns(cols)) => {
                assert!(cols.contains(&"Traffic".to_string()));
                assert!(!cols.contains(&"Area".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_is_load_error() {
        let err = load_from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::Load(LoadError::MissingColumns(_))));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = load_deliveries("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, DashboardError::Load(LoadError::Io { .. })));
    }
}
