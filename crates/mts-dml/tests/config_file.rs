//! Loading a config file from disk and rendering SQL with it.

use mts_dml::{Dialect, MtsConfig, PageSpec, SortSpec};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn write_config(body: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("mts-config-test-{nonce}-{seq}"));
    std::fs::create_dir_all(&dir).expect("mkdir");
    let path = dir.join("mts.toml");
    std::fs::write(&path, body).expect("write");
    path
}

fn cleanup(path: &PathBuf) {
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn load_and_paginate() {
    let path = write_config(
        r#"
[dml]
dialect = "oracle"
table_alias = "p"
row_limit = 200

[sort_fields]
name = "p.surname, p.given_name"

[datasources.main]
url = "postgres://mts@localhost/mts"

[migrations]
enabled = true
dir = "sql"
"#,
    );

    let config = MtsConfig::load(&path).unwrap();
    assert_eq!(config.migrations_dir().unwrap(), path.parent().unwrap().join("sql"));

    let dml = config.query_dml().unwrap();
    assert_eq!(dml.get_dialect(), Some(Dialect::Oracle));
    let sql = dml
        .paginate_sorted(
            "SELECT p.* FROM person p",
            Some(&SortSpec::asc("name")),
            PageSpec::new(100, 50),
        )
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM (SELECT row_.*, ROWNUM rnum FROM (SELECT p.* FROM person p ORDER BY p.surname ASC, p.given_name ASC, p.rowid) row_) WHERE rnum > 100 AND rnum <= 150"
    );
    assert_eq!(
        dml.cap("SELECT p.* FROM person p").unwrap(),
        "SELECT * FROM (SELECT p.* FROM person p) WHERE ROWNUM <= 200"
    );

    cleanup(&path);
}

#[test]
fn row_id_ordering_can_be_disabled() {
    let path = write_config(
        "[dml]\ndialect = \"oracle\"\ntable_alias = \"p.\"\ndont_force_row_id_order = true\n",
    );
    let dml = MtsConfig::load(&path).unwrap().query_dml().unwrap();
    let sql = dml.paginate("SELECT p.* FROM person p", "", 0, 10).unwrap();
    assert!(!sql.contains("rowid"), "{sql}");
    cleanup(&path);
}

#[test]
fn parse_errors_name_the_file() {
    let path = write_config("[dml\n");
    let err = MtsConfig::load(&path).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("mts.toml"), "{err}");
    cleanup(&path);
}

#[test]
fn missing_file_is_a_configuration_error() {
    let err = MtsConfig::load("/nonexistent/mts.toml").unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn unset_env_var_only_matters_for_connections() {
    let path = write_config(
        "[dml]\ndialect = \"postgresql\"\n\
         [datasources.main]\nurl = \"${MTS_TEST_SURELY_UNSET_DATABASE_URL}\"\n",
    );
    let config = MtsConfig::load(&path).unwrap();
    let sql = config
        .query_dml()
        .unwrap()
        .paginate("select * from t", "", 20, 10)
        .unwrap();
    assert_eq!(sql, "select * from t OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");

    #[cfg(feature = "pool")]
    {
        let err = mts_dml::DataSources::from_config(&config).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("MTS_TEST_SURELY_UNSET_DATABASE_URL"), "{err}");
    }
    cleanup(&path);
}

#[test]
fn demo_config_renders_sql() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/mts.toml");
    let dml = MtsConfig::load(path).unwrap().query_dml().unwrap();
    let sql = dml
        .paginate_sorted(
            "SELECT c.* FROM customers c",
            Some(&SortSpec::asc("name")),
            PageSpec::new(0, 20),
        )
        .unwrap();
    assert_eq!(
        sql,
        "SELECT c.* FROM customers c ORDER BY c.last_name ASC, c.first_name ASC OFFSET 0 ROWS FETCH NEXT 20 ROWS ONLY"
    );
}
