//! End-to-end scenarios from the specification's testable-properties
//! section, driven through the public entry points against real
//! temporary files.

use std::io::Write;

use readdlm::{csv_defaults, read_csv, read_dlm, DataType, DlmReadOptions};
use tempfile::NamedTempFile;

fn temp_csv(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

fn string_col(table: &readdlm::Table, name: &str) -> Vec<Option<String>> {
    match table.column(name).unwrap() {
        readdlm::Column::String(v) => v.iter().map(|o| o.as_ref().map(|s| s.to_string())).collect(),
        other => panic!("expected String column, got {:?}", other.data_type()),
    }
}

#[test]
fn scenario_1_mixed_types_with_missing() {
    let f = temp_csv("a,b,c\n1,2.0,hi\n3,,there\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table.names(), &["a", "b", "c"]);
    assert_eq!(table.dtypes(), vec![DataType::Int64, DataType::Float64, DataType::String]);
    match table.column("a").unwrap() {
        readdlm::Column::Int64(v) => assert_eq!(v, &[Some(1), Some(3)]),
        _ => panic!(),
    }
    match table.column("b").unwrap() {
        readdlm::Column::Float64(v) => assert_eq!(v, &[Some(2.0), None]),
        _ => panic!(),
    }
    assert_eq!(string_col(&table, "c"), vec![Some("hi".into()), Some("there".into())]);
}

#[test]
fn scenario_2_quoted_comma_and_doubled_quote() {
    let f = temp_csv("x,y\n\"hi, there\",\"a\"\"b\"\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(string_col(&table, "x"), vec![Some("hi, there".into())]);
    assert_eq!(string_col(&table, "y"), vec![Some("a\"b".into())]);
}

#[test]
fn scenario_3_blank_header_field_becomes_unnamed() {
    let f = temp_csv("col1,,col3\n1,foo,2\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table.names(), &["col1", "UNNAMED_2", "col3"]);
    match table.column("col1").unwrap() {
        readdlm::Column::Int64(v) => assert_eq!(v, &[Some(1)]),
        _ => panic!(),
    }
    assert_eq!(string_col(&table, "UNNAMED_2"), vec![Some("foo".into())]);
}

#[test]
fn scenario_4_r_style_row_names() {
    let f = temp_csv("a,b,c\nr1,1,2,3\nr2,4,5,6\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table.names(), &["UNNAMED_0", "a", "b", "c"]);
    assert_eq!(table.nrows(), 2);
    assert_eq!(string_col(&table, "UNNAMED_0"), vec![Some("r1".into()), Some("r2".into())]);
}

#[test]
fn scenario_5_multiline_quoted_field() {
    let f = temp_csv("x,y\n\"oh,\nthere\",\"ok\"\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(string_col(&table, "x"), vec![Some("oh,\nthere".into())]);
    assert_eq!(string_col(&table, "y"), vec![Some("ok".into())]);
}

#[test]
fn scenario_6_comments_and_blank_lines() {
    let contents = "# lead comment\ncol1,col2\n\n1,2\n# mid\n3,4\n";
    let f = temp_csv(contents);
    let opts = csv_defaults().with_comment_prefix(Some("#")).with_skipblank(true);
    let table = read_csv(f.path().to_path_buf(), opts).unwrap();
    assert_eq!(table.names(), &["col1", "col2"]);
    match table.column("col1").unwrap() {
        readdlm::Column::Int64(v) => assert_eq!(v, &[Some(1), Some(3)]),
        _ => panic!(),
    }
    match table.column("col2").unwrap() {
        readdlm::Column::Int64(v) => assert_eq!(v, &[Some(2), Some(4)]),
        _ => panic!(),
    }
}

#[test]
fn zero_data_rows_under_header_gives_empty_typed_columns() {
    let f = temp_csv("a,b,c\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table.ncols(), 3);
    assert_eq!(table.nrows(), 0);
}

#[test]
fn integer_boundary_values_parse() {
    let f = temp_csv("a\n9223372036854775807\n-9223372036854775808\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    match table.column("a").unwrap() {
        readdlm::Column::Int64(v) => assert_eq!(v, &[Some(i64::MAX), Some(i64::MIN)]),
        _ => panic!(),
    }
}

#[test]
fn integer_overflow_past_i64_is_an_error() {
    // Still digit-shaped, so the column is inferred Int64; materializing
    // 2^63 into an i64 then overflows.
    let f = temp_csv("a\n9223372036854775808\n");
    let err = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap_err();
    assert!(matches!(err, readdlm::ReadError::OverflowError { .. }));
}

#[test]
fn special_float_literals_parse() {
    let f = temp_csv("a\ninf\n-inf\nInfinity\nNaN\n1.5\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    match table.column("a").unwrap() {
        readdlm::Column::Float64(v) => {
            assert_eq!(v[0], Some(f64::INFINITY));
            assert_eq!(v[1], Some(f64::NEG_INFINITY));
            assert_eq!(v[2], Some(f64::INFINITY));
            assert!(v[3].unwrap().is_nan());
            assert_eq!(v[4], Some(1.5));
        },
        _ => panic!(),
    }
}

#[test]
fn leading_zero_is_string_under_default_lzstring() {
    let f = temp_csv("a\n0007\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table.dtypes(), vec![DataType::String]);
}

#[test]
fn leading_zero_is_integer_when_lzstring_disabled() {
    let f = temp_csv("a\n0007\n");
    let opts = csv_defaults().with_lzstring(false);
    let table = read_csv(f.path().to_path_buf(), opts).unwrap();
    match table.column("a").unwrap() {
        readdlm::Column::Int64(v) => assert_eq!(v, &[Some(7)]),
        _ => panic!(),
    }
}

#[test]
fn date_upgrade_fires_on_iso_dates_but_not_on_ambiguous_form() {
    let f = temp_csv("a\n2019-01-02\n2020-12-31\n");
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table.dtypes(), vec![DataType::Date]);

    let f2 = temp_csv("a\n2019-1-2\n");
    let table2 = read_csv(f2.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table2.dtypes(), vec![DataType::String]);
}

#[test]
fn line_ending_equivalence_crlf_matches_lf() {
    let lf = temp_csv("a,b\n1,2\n3,4\n");
    let crlf = temp_csv("a,b\r\n1,2\r\n3,4\r\n");
    let t1 = read_csv(lf.path().to_path_buf(), csv_defaults()).unwrap();
    let t2 = read_csv(crlf.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(t1.names(), t2.names());
    assert_eq!(t1.dtypes(), t2.dtypes());
    assert_eq!(t1.nrows(), t2.nrows());
}

#[test]
fn unexpected_column_count_is_an_error() {
    let f = temp_csv("a,b\n1,2,3\n");
    let err = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap_err();
    assert!(matches!(err, readdlm::ReadError::UnexpectedColumnCount { .. }));
}

#[test]
fn mixed_int_and_float_rows_widen_to_float() {
    let f = temp_csv("a\n1\n2.5\n");
    let opts = csv_defaults().with_chunkbits(14);
    let table = read_csv(f.path().to_path_buf(), opts).unwrap();
    match table.column("a").unwrap() {
        readdlm::Column::Float64(v) => assert_eq!(v, &[Some(1.0), Some(2.5)]),
        other => panic!("expected Float64, got {:?}", other.data_type()),
    }
}

#[test]
fn delimiter_is_guessed_when_left_unset() {
    let f = temp_csv("a;b;c\n1;2;3\n");
    let table = read_dlm(f.path().to_path_buf(), DlmReadOptions::default()).unwrap();
    assert_eq!(table.names(), &["a", "b", "c"]);
    assert_eq!(table.nrows(), 1);
    assert_eq!(table.dtypes(), vec![DataType::Int64, DataType::Int64, DataType::Int64]);
}

#[test]
fn field_exactly_at_the_length_limit_succeeds() {
    let value = "a".repeat((1 << 24) - 1);
    let f = temp_csv(&format!("col\n{value}\n"));
    let table = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap();
    assert_eq!(table.nrows(), 1);
}

#[test]
fn field_past_the_length_limit_is_an_error() {
    let value = "a".repeat(1 << 24);
    let f = temp_csv(&format!("col\n{value}\n"));
    let err = read_csv(f.path().to_path_buf(), csv_defaults()).unwrap_err();
    assert!(matches!(err, readdlm::ReadError::FieldTooLong));
}
