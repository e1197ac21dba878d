use std::io::Read;
use std::path::Path;

use super::domain::{IntakeField, RawIntake};

#[derive(Debug)]
pub enum BatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for BatchImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchImportError::Io(err) => write!(f, "failed to read intake batch: {}", err),
            BatchImportError::Csv(err) => write!(f, "invalid intake CSV data: {}", err),
        }
    }
}

impl std::error::Error for BatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchImportError::Io(err) => Some(err),
            BatchImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BatchImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BatchImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads raw intakes from a CSV file whose header row names the intake fields.
pub struct IntakeBatch;

impl IntakeBatch {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawIntake>, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Extra columns are ignored and short rows keep only the cells they have,
    /// so a malformed row is rejected on its own. Choice columns coded as
    /// `0`/`1`, as in the synthetic training data, are translated to their
    /// form values.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RawIntake>, BatchImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut intakes = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            let mut raw: RawIntake = headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            decode_choice(&mut raw, IntakeField::Sex, "male", "female");
            decode_choice(&mut raw, IntakeField::ActiveSmoking, "yes", "no");
            decode_choice(&mut raw, IntakeField::PassiveSmoking, "yes", "no");
            intakes.push(raw);
        }

        Ok(intakes)
    }
}

fn decode_choice(raw: &mut RawIntake, field: IntakeField, one: &str, zero: &str) {
    if let Some(value) = raw.get_mut(field.name()) {
        match value.as_str() {
            "1" => *value = one.to_string(),
            "0" => *value = zero.to_string(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::intake::{IntakeErrorKind, IntakeValidator};
    use std::io::Cursor;

    #[test]
    fn reads_named_columns() {
        let csv = "age,sex,waist_hip_ratio,active_smoking,passive_smoking,alcohol,physical_activity,diet_quality,mental_health\n\
45,male,0.95,no,no,2,7,8,5\n";
        let rows = IntakeBatch::from_reader(Cursor::new(csv)).expect("batch parses");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("sex").map(String::as_str), Some("male"));
        assert_eq!(rows[0].get("waist_hip_ratio").map(String::as_str), Some("0.95"));
    }

    #[test]
    fn translates_coded_choices_and_keeps_extra_columns() {
        let csv = "age,sex,waist_hip_ratio,active_smoking,passive_smoking,alcohol,physical_activity,diet_quality,mental_health,ahi,sleep_apnea\n\
52,0,0.84,1,0,3,4,6,9.7,12.1,0\n";
        let rows = IntakeBatch::from_reader(Cursor::new(csv)).expect("batch parses");
        let row = &rows[0];
        assert_eq!(row.get("sex").map(String::as_str), Some("female"));
        assert_eq!(row.get("active_smoking").map(String::as_str), Some("yes"));
        assert_eq!(row.get("passive_smoking").map(String::as_str), Some("no"));
        assert_eq!(row.get("sleep_apnea").map(String::as_str), Some("0"));
    }

    #[test]
    fn short_row_is_kept_and_rejected_on_its_own() {
        let csv = "age,sex,waist_hip_ratio,active_smoking,passive_smoking,alcohol,physical_activity,diet_quality,mental_health\n\
45,male,0.95,no,no,2,7,8,5\n\
50,male,0.9\n\
61,female,0.88,yes,no,4,3,5,11\n";
        let rows = IntakeBatch::from_reader(Cursor::new(csv)).expect("batch parses");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].len(), 3);

        let validator = IntakeValidator::new();
        assert!(validator.validate(&rows[0]).is_ok());
        let error = validator.validate(&rows[1]).expect_err("short row rejected");
        assert_eq!(error.kind, IntakeErrorKind::MissingField);
        assert_eq!(error.field, IntakeField::ActiveSmoking);
        assert!(validator.validate(&rows[2]).is_ok());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = IntakeBatch::from_path("./does-not-exist.csv").expect_err("expected io error");
        match error {
            BatchImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
