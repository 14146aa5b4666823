use quarry::error::{
    models_by_id, replace_column_names, Error, ErrorKind, ExecutionError, ROW_TOO_LARGE_MESSAGE,
};
use quarry::index::DriverError;
use quarry::model::{ColumnModel, ColumnType};
use quarry::query::TranslationError;
use quarry::schema::SchemaError;

fn schema() -> Vec<ColumnModel> {
    vec![
        ColumnModel::new(1, "score", ColumnType::Double),
        ColumnModel::new(12, "title", ColumnType::String).with_max_size(10),
    ]
}

#[test]
fn test_physical_names_become_display_names() {
    let models = models_by_id(&schema());
    assert_eq!(
        replace_column_names("Out of range value for column '_DBL_C1_' and '_C12_'", &models),
        "Out of range value for column 'score' and 'title'"
    );
    // Only whole ids match: _C1_ is not a prefix of _C12_.
    assert_eq!(replace_column_names("_C12_ vs _C1_", &models), "title vs score");
    assert_eq!(replace_column_names("_C99_ is unknown", &models), "_C99_ is unknown");
    assert_eq!(replace_column_names("no columns here", &models), "no columns here");
}

#[test]
fn test_row_size_failures_get_a_fixed_message() {
    let by_code = ExecutionError::from_driver(DriverError::new(Some(1118), "Row size too large (> 8126)"));
    assert_eq!(by_code, ExecutionError::RowTooLarge);
    assert_eq!(by_code.to_string(), ROW_TOO_LARGE_MESSAGE);

    let by_text = ExecutionError::from_driver(DriverError::new(None, "ROW SIZE TOO LARGE for _C1_"));
    assert_eq!(by_text, ExecutionError::RowTooLarge);
}

#[test]
fn test_unknown_column_is_schema_lag() {
    let err = ExecutionError::from_driver(DriverError::new(Some(1054), "Unknown column '_C12_' in 'where clause'"))
        .scrub(&models_by_id(&schema()));
    assert!(err.is_schema_lag());
    assert_eq!(
        err,
        ExecutionError::SchemaLag("Unknown column 'title' in 'where clause'".into())
    );
}

#[test]
fn test_other_driver_failures_keep_their_code() {
    let err = ExecutionError::from_driver(DriverError::new(Some(1406), "Data too long for column '_C12_'"))
        .scrub(&models_by_id(&schema()));
    assert!(!err.is_schema_lag());
    assert_eq!(
        err,
        ExecutionError::Driver {
            code: Some(1406),
            message: "Data too long for column 'title'".into(),
        }
    );
    assert_eq!(err.to_string(), "Data too long for column 'title'");
}

#[test]
fn test_error_kinds() {
    let execution: Error = DriverError::new(Some(2006), "server has gone away").into();
    assert_eq!(execution.kind(), ErrorKind::Execution);
    assert_eq!(execution.to_string(), "server has gone away");

    let translation: Error = TranslationError::UnknownColumn("nickname".into()).into();
    assert_eq!(translation.kind(), ErrorKind::Translation);

    let schema: Error = SchemaError::EmptyChange.into();
    assert_eq!(schema.kind(), ErrorKind::Schema);
}
