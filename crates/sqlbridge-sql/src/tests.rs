#[cfg(test)]
mod tests {
    use crate::connection::{self, DatabaseOptions};
    use crate::dispatch::{dispatch, Event};
    use crate::extract::extract;
    use crate::{run_exec, run_query};
    use rusqlite::Connection;
    use serde_json::json;
    use sqlbridge_core::error::ErrorKind;
    use sqlbridge_core::value::{DynamicValue, Number, ResultMap};
    use tempfile::TempDir;

    fn setup_conn() -> Connection {
        Connection::open_in_memory().expect("open")
    }

    fn payload(value: serde_json::Value) -> DynamicValue {
        DynamicValue::from(value)
    }

    fn send(conn: &Connection, event: &str, data: serde_json::Value) -> Option<ResultMap> {
        dispatch(conn, event, payload(data)).expect(event)
    }

    fn rows_of(result: Option<ResultMap>) -> serde_json::Value {
        let result = result.expect("result");
        serde_json::Value::from(result.get("rows").cloned().expect("rows key"))
    }

    fn int(v: i64) -> DynamicValue {
        DynamicValue::Number(Number::Int(v))
    }

    #[test]
    fn extract_defaults_missing_fields() {
        let request = extract(payload(json!({}))).expect("extract");
        assert_eq!(request.sql, "");
        assert!(request.params.is_empty());

        let request = extract(payload(json!({"sql": "SELECT 1"}))).expect("extract");
        assert_eq!(request.sql, "SELECT 1");
        assert!(request.params.is_empty());
    }

    #[test]
    fn extract_passes_params_through() {
        let request =
            extract(payload(json!({"sql": "SELECT $1", "params": [1, [2], {"a": 3}]}))).expect("extract");
        assert_eq!(request.params.len(), 3);
        assert_eq!(request.params[0], int(1));
        assert_eq!(request.params[1].type_name(), "list");
        assert_eq!(request.params[2].type_name(), "map");
    }

    #[test]
    fn extract_rejects_non_map_data() {
        for data in [json!(null), json!("SELECT 1"), json!([1, 2]), json!(7)] {
            let err = extract(payload(data)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Shape);
            assert_eq!(err.to_string(), "data not an object");
        }
    }

    #[test]
    fn extract_rejects_wrong_field_types() {
        let err = extract(payload(json!({"sql": 42}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.field(), Some("sql"));
        assert_eq!(err.to_string(), "field `sql` is not a string: 42");

        let err = extract(payload(json!({"sql": "SELECT 1", "params": {"a": 1}}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.field(), Some("params"));

        let err = extract(payload(json!({"sql": null}))).unwrap_err();
        assert_eq!(err.field(), Some("sql"));
    }

    #[test]
    fn shape_errors_for_both_events() {
        let conn = setup_conn();
        for event in ["query", "exec"] {
            let err = dispatch(&conn, event, payload(json!([1]))).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Shape, "{event}");
        }
    }

    #[test]
    fn create_then_select_empty_table() {
        let conn = setup_conn();
        let done = send(&conn, "exec", json!({"sql": "CREATE TABLE t(x)"})).expect("result");
        assert_eq!(done.get("done"), Some(&DynamicValue::Bool(true)));

        let rows = rows_of(send(&conn, "query", json!({"sql": "SELECT x FROM t"})));
        assert_eq!(rows, json!([]));
    }

    #[test]
    fn insert_with_param_then_select() {
        let conn = setup_conn();
        send(&conn, "exec", json!({"sql": "CREATE TABLE t(x)"}));
        send(
            &conn,
            "exec",
            json!({"sql": "INSERT INTO t(x) VALUES ($1)", "params": [42]}),
        );
        let result = send(&conn, "query", json!({"sql": "SELECT x FROM t"})).expect("result");
        assert_eq!(
            result.get("rows"),
            Some(&DynamicValue::List(vec![DynamicValue::List(vec![int(42)])]))
        );
    }

    #[test]
    fn rows_keep_engine_order() {
        let conn = setup_conn();
        send(&conn, "exec", json!({"sql": "CREATE TABLE t(x)"}));
        for v in [1, 2, 3] {
            send(&conn, "exec", json!({"sql": "INSERT INTO t(x) VALUES ($1)", "params": [v]}));
        }
        let rows = rows_of(send(&conn, "query", json!({"sql": "SELECT x FROM t ORDER BY rowid"})));
        assert_eq!(rows, json!([[1], [2], [3]]));

        let rows = rows_of(send(
            &conn,
            "query",
            json!({"sql": "SELECT x FROM t ORDER BY x DESC"}),
        ));
        assert_eq!(rows, json!([[3], [2], [1]]));
    }

    #[test]
    fn zero_row_query_returns_empty_list() {
        let conn = setup_conn();
        send(&conn, "exec", json!({"sql": "CREATE TABLE t(x)"}));
        send(&conn, "exec", json!({"sql": "INSERT INTO t(x) VALUES (5)"}));
        let result = send(&conn, "query", json!({"sql": "SELECT x FROM t WHERE x = -1"}))
            .expect("result");
        assert_eq!(result.get("rows"), Some(&DynamicValue::List(Vec::new())));
        let encoded = serde_json::to_string(&result).expect("encode");
        assert_eq!(encoded, r#"{"rows":[]}"#);
    }

    #[test]
    fn unknown_event_is_noop() {
        let conn = setup_conn();
        assert_eq!(Event::parse("ping"), Event::Other("ping".into()));
        let result = dispatch(&conn, "ping", payload(json!({"anything": [1, 2]}))).expect("ping");
        assert!(result.is_none());
        let result = dispatch(&conn, "ping", DynamicValue::Null).expect("ping");
        assert!(result.is_none());
    }

    #[test]
    fn syntax_error_leaves_connection_usable() {
        let conn = setup_conn();
        for event in ["query", "exec"] {
            let err = dispatch(&conn, event, payload(json!({"sql": "SELEC 1"}))).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Execution, "{event}");
            assert!(err.to_string().starts_with(&format!("cannot {event}: ")));
        }
        send(&conn, "exec", json!({"sql": "CREATE TABLE t(x)"}));
        let rows = rows_of(send(&conn, "query", json!({"sql": "SELECT 1"})));
        assert_eq!(rows, json!([[1]]));
    }

    #[test]
    fn constraint_violation_is_execution_error() {
        let conn = setup_conn();
        send(&conn, "exec", json!({"sql": "CREATE TABLE u(x UNIQUE)"}));
        send(&conn, "exec", json!({"sql": "INSERT INTO u VALUES (1)"}));
        let err = dispatch(&conn, "exec", payload(json!({"sql": "INSERT INTO u VALUES (1)"})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        let rows = rows_of(send(&conn, "query", json!({"sql": "SELECT count(*) FROM u"})));
        assert_eq!(rows, json!([[1]]));
    }

    #[test]
    fn missing_sql_fails_at_execution() {
        let conn = setup_conn();
        let err = dispatch(&conn, "query", payload(json!({"params": []}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.to_string(), "cannot query: empty SQL statement");
        let err = dispatch(&conn, "exec", payload(json!({"sql": "   "}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn second_statement_is_rejected_before_running() {
        let conn = setup_conn();
        let err = run_exec(&conn, "CREATE TABLE a(x); CREATE TABLE b(x)", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(
            err.to_string(),
            "cannot exec: only one SQL statement is allowed per message"
        );
        let tables = rows_of(send(
            &conn,
            "query",
            json!({"sql": "SELECT name FROM sqlite_master WHERE type = 'table'"}),
        ));
        assert_eq!(tables, json!([]));

        run_exec(&conn, "CREATE TABLE t(x)", &[]).expect("create");
        let err = run_query(&conn, "SELECT x FROM t; DELETE FROM t", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);

        // trailing separators and comments are not a second statement
        let rows = rows_of(send(&conn, "query", json!({"sql": "SELECT 1; -- done\n"})));
        assert_eq!(rows, json!([[1]]));
    }

    #[test]
    fn comment_only_sql_is_empty() {
        let conn = setup_conn();
        let err = run_query(&conn, "-- nothing", &[]).unwrap_err();
        assert_eq!(err.to_string(), "cannot query: empty SQL statement");
        let err = run_exec(&conn, "/* nothing */ ;", &[]).unwrap_err();
        assert_eq!(err.to_string(), "cannot exec: empty SQL statement");
    }

    #[test]
    fn mixed_placeholders_never_share_a_slot() {
        let conn = setup_conn();
        let err = run_query(
            &conn,
            "SELECT ?, $1",
            &[DynamicValue::from("a"), DynamicValue::from("b")],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(
            err.to_string(),
            "cannot query: parameter 2 targets placeholder 2, which is already bound"
        );
    }

    #[test]
    fn numbered_placeholders_bind_by_name() {
        let conn = setup_conn();
        let rows = rows_of(send(
            &conn,
            "query",
            json!({"sql": "SELECT $2, $1, $2", "params": ["a", "b"]}),
        ));
        assert_eq!(rows, json!([["b", "a", "b"]]));

        let rows = rows_of(send(
            &conn,
            "query",
            json!({"sql": "SELECT ?, ?", "params": [1, 2]}),
        ));
        assert_eq!(rows, json!([[1, 2]]));
    }

    #[test]
    fn param_count_mismatch_is_execution_error() {
        let conn = setup_conn();
        let err = run_query(&conn, "SELECT $1", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        let err = run_exec(&conn, "SELECT $1", &[int(1), int(2)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn nested_params_are_rejected_at_bind() {
        let conn = setup_conn();
        let err = run_query(
            &conn,
            "SELECT $1",
            &[DynamicValue::List(vec![int(1)])],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(
            err.to_string(),
            "cannot query: parameter 1 has unsupported type list"
        );
    }

    #[test]
    fn columns_keep_storage_class() {
        let conn = setup_conn();
        let result = run_query(
            &conn,
            "SELECT 1, 1.5, 'txt', NULL, x'010203', $1, $2",
            &[DynamicValue::Bool(true), DynamicValue::from(2.25)],
        )
        .expect("query");
        let rows = result.get("rows").expect("rows").as_list().expect("list");
        assert_eq!(
            rows[0],
            DynamicValue::List(vec![
                int(1),
                DynamicValue::Number(Number::Float(1.5)),
                DynamicValue::from("txt"),
                DynamicValue::Null,
                DynamicValue::from("AQID"),
                int(1),
                DynamicValue::Number(Number::Float(2.25)),
            ])
        );
    }

    #[test]
    fn invalid_text_is_scan_error() {
        let conn = setup_conn();
        let err = run_query(&conn, "SELECT CAST(x'ff' AS TEXT)", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Scan);
    }

    #[test]
    fn failure_mid_result_discards_rows() {
        let conn = setup_conn();
        run_exec(&conn, "CREATE TABLE t(x)", &[]).expect("create");
        run_exec(&conn, "INSERT INTO t VALUES ($1)", &[int(1)]).expect("insert");
        run_exec(&conn, "INSERT INTO t VALUES ($1)", &[int(i64::MIN)]).expect("insert");

        let err = run_query(&conn, "SELECT abs(x) FROM t ORDER BY rowid", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Scan);
        assert!(err.to_string().starts_with("error scanning row 1"));

        let err = run_query(&conn, "SELECT abs(x) FROM t ORDER BY rowid DESC", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn exec_discards_returned_rows() {
        let conn = setup_conn();
        let done = run_exec(&conn, "PRAGMA user_version", &[]).expect("pragma");
        assert_eq!(done.get("done"), Some(&DynamicValue::Bool(true)));
        let done = run_exec(&conn, "SELECT 1 UNION SELECT 2", &[]).expect("select");
        assert_eq!(done.len(), 1);
    }

    #[test]
    fn file_backed_database_persists() {
        let dir = TempDir::new().expect("tempdir");
        let options = DatabaseOptions::new(dir.path().join("app.db"));

        let conn = connection::open(&options).expect("open");
        send(&conn, "exec", json!({"sql": "CREATE TABLE t(x)"}));
        send(&conn, "exec", json!({"sql": "INSERT INTO t VALUES ($1)", "params": ["kept"]}));
        connection::close(conn).expect("close");

        let conn = connection::open(&options).expect("reopen");
        let rows = rows_of(send(&conn, "query", json!({"sql": "SELECT x FROM t"})));
        assert_eq!(rows, json!([["kept"]]));
    }

    #[test]
    fn open_respects_create_if_missing() {
        let dir = TempDir::new().expect("tempdir");
        let mut options = DatabaseOptions::new(dir.path().join("missing.db"));
        options.create_if_missing = false;
        assert!(connection::open(&options).is_err());
    }

    #[test]
    fn foreign_keys_pragma_is_applied() {
        let dir = TempDir::new().expect("tempdir");
        let mut options = DatabaseOptions::new(dir.path().join("fk.db"));
        options.foreign_keys = true;
        let conn = connection::open(&options).expect("open");
        send(&conn, "exec", json!({"sql": "CREATE TABLE p(id INTEGER PRIMARY KEY)"}));
        send(&conn, "exec", json!({"sql": "CREATE TABLE c(p INTEGER REFERENCES p(id))"}));
        let err = dispatch(&conn, "exec", payload(json!({"sql": "INSERT INTO c VALUES (9)"})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }
}
