//! Cross-dialect behaviour of the public rewriting API.

use mts_dml::{Dialect, MtsError, PageSpec, QueryDml, SortFieldMap, SortSpec, limit, paginate};

const QUERY: &str = "SELECT o.id, o.total FROM orders o WHERE o.status = 'OPEN'";

fn orders_dml(dialect: Dialect) -> QueryDml {
    QueryDml::for_dialect(dialect)
        .table_alias("o")
        .row_limit(1000)
        .sort_fields(
            SortFieldMap::new()
                .with("total", "o.total")
                .unwrap()
                .with("placed", "o.placed_at DESC, o.id")
                .unwrap(),
        )
}

#[test]
fn every_dialect_keeps_the_query_text() {
    for dialect in Dialect::ALL {
        let sql = paginate(QUERY, " ORDER BY o.id", 40, 20, dialect).unwrap();
        assert!(sql.contains(QUERY), "{dialect}: {sql}");
        assert!(sql.contains("ORDER BY o.id"), "{dialect}: {sql}");
    }
}

#[test]
fn page_window_per_dialect() {
    let expected = [
        (
            Dialect::Oracle,
            "SELECT * FROM (SELECT row_.*, ROWNUM rnum FROM (SELECT o.id, o.total FROM orders o WHERE o.status = 'OPEN' ORDER BY o.id) row_) WHERE rnum > 40 AND rnum <= 60",
        ),
        (
            Dialect::Derby,
            "SELECT o.id, o.total FROM orders o WHERE o.status = 'OPEN' ORDER BY o.id OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY",
        ),
        (
            Dialect::SqlServer,
            "SELECT o.id, o.total FROM orders o WHERE o.status = 'OPEN' ORDER BY o.id OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY",
        ),
        (
            Dialect::Postgresql,
            "SELECT o.id, o.total FROM orders o WHERE o.status = 'OPEN' ORDER BY o.id OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY",
        ),
        (
            Dialect::Mysql,
            "SELECT o.id, o.total FROM orders o WHERE o.status = 'OPEN' ORDER BY o.id LIMIT 20 OFFSET 40",
        ),
    ];
    for (dialect, sql) in expected {
        assert_eq!(paginate(QUERY, " ORDER BY o.id", 40, 20, dialect).unwrap(), sql);
    }
}

#[test]
fn limit_per_dialect() {
    let q = "select * from t";
    assert_eq!(
        limit(q, 5, Dialect::Oracle).unwrap(),
        "SELECT * FROM (select * from t) WHERE ROWNUM <= 5"
    );
    assert_eq!(limit(q, 5, Dialect::Mysql).unwrap(), "select * from t LIMIT 5 OFFSET 0");
    for dialect in [Dialect::Derby, Dialect::SqlServer, Dialect::Postgresql] {
        assert_eq!(
            limit(q, 5, dialect).unwrap(),
            "select * from t OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }
}

#[test]
fn strategy_matches_dialect() {
    for dialect in Dialect::ALL {
        assert_eq!(dialect.strategy().dialect(), dialect);
    }
}

#[test]
fn oracle_pages_are_ordered_by_row_id() {
    let dml = orders_dml(Dialect::Oracle);
    let sql = dml
        .paginate_sorted(QUERY, Some(&SortSpec::desc("total")), PageSpec::new(0, 10))
        .unwrap();
    assert!(sql.contains("ORDER BY o.total DESC, o.rowid) row_"), "{sql}");

    let sql = dml.paginate(QUERY, "", 0, 10).unwrap();
    assert!(sql.contains("WHERE o.status = 'OPEN' ORDER BY o.rowid) row_"), "{sql}");
}

#[test]
fn oracle_row_id_already_in_order_is_not_repeated() {
    let dml = orders_dml(Dialect::Oracle);
    let sql = dml.paginate(QUERY, " ORDER BY o.rowid", 0, 10).unwrap();
    assert_eq!(sql.matches("rowid").count(), 1, "{sql}");
}

#[test]
fn other_dialects_never_add_row_id() {
    for dialect in [Dialect::Derby, Dialect::SqlServer, Dialect::Postgresql, Dialect::Mysql] {
        let sql = orders_dml(dialect).paginate(QUERY, "", 0, 10).unwrap();
        assert!(!sql.contains("rowid"), "{dialect}: {sql}");
    }
}

#[test]
fn explicit_direction_in_sort_fragment_is_kept() {
    let dml = orders_dml(Dialect::Postgresql);
    assert_eq!(
        dml.order_by("placed", true).unwrap(),
        " ORDER BY o.placed_at DESC, o.id ASC"
    );
}

#[test]
fn non_select_passes_through_for_every_dialect() {
    for dialect in Dialect::ALL {
        for q in ["", "UPDATE t SET a = 1", "delete from t"] {
            assert_eq!(paginate(q, " ORDER BY a", 0, 10, dialect).unwrap(), q);
            assert_eq!(limit(q, 10, dialect).unwrap(), q);
        }
    }
}

#[test]
fn missing_dialect_is_a_configuration_error() {
    let dml = QueryDml::new();
    let err = dml.paginate("select * from t", "", 0, 10).unwrap_err();
    assert!(matches!(err, MtsError::DialectNotSet));
    assert!(err.is_configuration());
    assert!(dml.limit("select * from t", 10).unwrap_err().is_configuration());
}

#[test]
fn unknown_sort_field_is_reported() {
    let err = orders_dml(Dialect::Mysql)
        .paginate_sorted(QUERY, Some(&SortSpec::asc("nope")), PageSpec::new(0, 10))
        .unwrap_err();
    assert!(err.is_unknown_sort_field());
}

#[test]
fn one_based_pages() {
    let dml = orders_dml(Dialect::Mysql);
    let sql = dml
        .paginate_page(QUERY, "", PageSpec::page(3, 25).unwrap())
        .unwrap();
    assert!(sql.ends_with("LIMIT 25 OFFSET 50"), "{sql}");
    assert!(PageSpec::page(0, 25).is_err());
}
