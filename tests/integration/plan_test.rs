use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use shardmerge::common::types::{DataValue, ScalarKind};
use shardmerge::merger::{MergerError, QueryContext};
use shardmerge::plan::{load_plan, run_plan};

// Write a plan to a temporary file
fn plan_file(json: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(file)
}

const GROUPED_PLAN: &str = r#"{
    "group_by": [{"index": 0, "name": "region"}],
    "aggregates": [
        {"func": "SUM", "index": 1, "name": "amount", "alias": "total"},
        {"func": "AVG", "index": 2, "name": "score"}
    ],
    "shards": [
        {
            "name": "eu",
            "columns": [
                {"name": "region", "database_type": "VARCHAR", "scan_kind": "Text"},
                {"name": "SUM(amount)", "database_type": "BIGINT", "scan_kind": "Int64", "nullable": true},
                {"name": "AVG(score)", "database_type": "DOUBLE", "scan_kind": "Float64"},
                {"name": "SUM(score)", "database_type": "DOUBLE", "scan_kind": "Float64"},
                {"name": "COUNT(score)", "database_type": "BIGINT", "scan_kind": "Int64"}
            ],
            "rows": [["east", 5, 2.0, 4.0, 2], ["west", null, null, null, 0]]
        },
        {
            "name": "us",
            "columns": [
                {"name": "region", "database_type": "VARCHAR", "scan_kind": "Text"},
                {"name": "SUM(amount)", "database_type": "BIGINT", "scan_kind": "Int64", "nullable": true},
                {"name": "AVG(score)", "database_type": "DOUBLE", "scan_kind": "Float64"},
                {"name": "SUM(score)", "database_type": "DOUBLE", "scan_kind": "Float64"},
                {"name": "COUNT(score)", "database_type": "BIGINT", "scan_kind": "Int64"}
            ],
            "rows": [["west", 7, 3.0, 6.0, 2], ["east", 1, 8.0, 8.0, 1]]
        }
    ]
}"#;

#[test]
fn test_grouped_plan_from_file() -> Result<()> {
    let file = plan_file(GROUPED_PLAN)?;
    let plan = load_plan(file.path())?;
    let result = run_plan(plan, &QueryContext::new())?;

    assert_eq!(result.columns(), &["region".to_string(), "total".to_string(), "AVG(score)".to_string()]);
    assert_eq!(
        result.rows(),
        &[
            vec![DataValue::from("east"), DataValue::from(6i64), DataValue::from(4.0f64)],
            vec![DataValue::from("west"), DataValue::from(7i64), DataValue::from(3.0f64)],
        ]
    );

    let json = serde_json::to_string(&result.to_json())?;
    assert_eq!(
        json,
        r#"[{"region":"east","total":6,"AVG(score)":4.0},{"region":"west","total":7,"AVG(score)":3.0}]"#
    );
    Ok(())
}

#[test]
fn test_plain_plan_with_all_null_partials() -> Result<()> {
    let file = plan_file(
        r#"{
            "aggregates": [{"func": "MAX", "index": 0, "name": "price"}],
            "shards": [
                {"columns": [{"name": "MAX(price)", "database_type": "INT", "scan_kind": "Int32"}], "rows": [[null]]},
                {"columns": [{"name": "MAX(price)", "database_type": "INT", "scan_kind": "Int32"}], "rows": [[null]]}
            ]
        }"#,
    )?;
    let result = run_plan(load_plan(file.path())?, &QueryContext::new())?;
    assert_eq!(result.rows(), &[vec![DataValue::null(ScalarKind::Int32)]]);
    assert!(result.to_string_table().contains("| NULL | "));
    Ok(())
}

#[test]
fn test_plan_errors() -> Result<()> {
    let missing = load_plan("/nonexistent/plan.json");
    assert!(missing.is_err());

    let malformed = plan_file("{\"aggregates\": 3}")?;
    assert!(load_plan(malformed.path()).is_err());

    let empty = plan_file(r#"{"aggregates": [{"func": "COUNT", "index": 0, "name": "id"}], "shards": []}"#)?;
    let err = run_plan(load_plan(empty.path())?, &QueryContext::new())
        .err()
        .and_then(|e| e.downcast::<MergerError>().ok());
    assert_eq!(err, Some(MergerError::EmptyRows));

    let ragged = plan_file(
        r#"{
            "aggregates": [{"func": "COUNT", "index": 0, "name": "id"}],
            "shards": [{"columns": [{"name": "COUNT(id)", "database_type": "BIGINT"}], "rows": [[1, 2]]}]
        }"#,
    )?;
    assert!(run_plan(load_plan(ragged.path())?, &QueryContext::new()).is_err());
    Ok(())
}
