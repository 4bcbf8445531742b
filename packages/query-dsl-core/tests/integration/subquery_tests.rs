//! Subquery predicates, aggregates and computed projection columns.

use ntest::timeout;

use query_dsl_core::{
    field, Case, Expr, Mutation, Order, PageRequest, Predicate, Projection, QueryError, Record,
    RepositoryError, Sort, SubQuery, Update, Value,
};

use super::helpers::{repository, sample_members};

fn ages(rows: &[Record]) -> Vec<i64> {
    rows.iter().map(|r| r.require_int("age").unwrap()).collect()
}

fn by_age() -> Sort {
    Sort::by(Order::asc("age"))
}

#[timeout(1000)]
#[test]
fn test_age_equals_max_age() {
    let repo = repository(sample_members());
    let oldest = field("age").eq_subquery(SubQuery::max("age")).unwrap();

    let found = repo.find_all(oldest, &by_age()).unwrap();

    assert_eq!(ages(&found), vec![40]);
}

#[timeout(1000)]
#[test]
fn test_age_at_least_average() {
    let repo = repository(sample_members());
    let above_average = field("age").ge_subquery(SubQuery::avg("age")).unwrap();

    let found = repo.find_all(above_average.clone(), &by_age()).unwrap();
    assert_eq!(ages(&found), vec![30, 40]);
    assert_eq!(repo.count(above_average).unwrap(), 2);
}

#[timeout(1000)]
#[test]
fn test_age_in_subquery_with_its_own_filter() {
    let repo = repository(sample_members());
    let sub = SubQuery::select("age").matching(field("age").gt(10));
    let predicate = field("age").in_subquery(sub);

    assert_eq!(predicate.to_string(), "age IN (SELECT age WHERE age > 10)");
    assert_eq!(ages(&repo.find_all(predicate, &by_age()).unwrap()), vec![20, 30, 40]);
}

#[timeout(1000)]
#[test]
fn test_nested_subquery_inside_page_query() {
    let repo = repository(sample_members());
    // Youngest age above teamA's average age (15) is 20
    let team_a_avg = SubQuery::avg("age").matching(field("team").eq("teamA"));
    let youngest_above =
        SubQuery::min("age").matching(field("age").gt_subquery(team_a_avg).unwrap());
    let predicate = field("age").ge_subquery(youngest_above).unwrap();

    let page = repo
        .find_page(predicate, &PageRequest::of(0, 1).unwrap().with_sort(by_age()))
        .unwrap();

    assert_eq!(page.total_elements(), 3);
    assert_eq!(ages(page.content()), vec![20]);
    assert!(page.has_next());
}

#[timeout(1000)]
#[test]
fn test_aggregates_over_members() {
    let repo = repository(sample_members());

    assert_eq!(repo.aggregate(&SubQuery::count("age")).unwrap(), Value::Int(4));
    assert_eq!(repo.aggregate(&SubQuery::sum("age")).unwrap(), Value::Int(100));
    assert_eq!(repo.aggregate(&SubQuery::avg("age")).unwrap(), Value::Float(25.0));
    assert_eq!(repo.aggregate(&SubQuery::max("age")).unwrap(), Value::Int(40));
    assert_eq!(repo.aggregate(&SubQuery::min("age")).unwrap(), Value::Int(10));

    let none = SubQuery::max("age").matching(field("team").eq("teamC"));
    assert_eq!(repo.aggregate(&none).unwrap(), Value::Null);

    assert!(matches!(
        repo.aggregate(&SubQuery::select("age")),
        Err(RepositoryError::Query(QueryError::InvalidArgument(_)))
    ));
}

#[timeout(1000)]
#[test]
fn test_scalar_comparison_requires_aggregate() {
    let result = field("age").eq_subquery(SubQuery::select("age"));
    assert!(matches!(result, Err(QueryError::InvalidArgument(_))));
}

#[timeout(1000)]
#[test]
fn test_bulk_delete_below_average() {
    let repo = repository(sample_members());
    let below = field("age").lt_subquery(SubQuery::avg("age")).unwrap();

    let deleted = repo.execute(&Mutation::delete(below)).unwrap();

    assert_eq!(deleted, 2);
    let left = repo.find_all(Predicate::MatchAll, &by_age()).unwrap();
    assert_eq!(ages(&left), vec![30, 40]);
}

#[timeout(1000)]
#[test]
fn test_bulk_update_oldest() {
    let repo = repository(sample_members());
    let oldest = field("age").eq_subquery(SubQuery::max("age")).unwrap();

    let updated = repo
        .execute(&Update::new(oldest).set("username", "eldest").into())
        .unwrap();

    assert_eq!(updated, 1);
    assert_eq!(repo.count(field("username").eq("eldest")).unwrap(), 1);
}

#[timeout(1000)]
#[test]
fn test_computed_columns() {
    let repo = repository(sample_members());
    let projection = Projection::of(["username"])
        .constant("constant", "A")
        .computed(
            "label",
            Expr::concat([Expr::field("username"), "_".into(), Expr::field("age")]),
        )
        .computed(
            "simple",
            Case::new()
                .when(field("age").eq(10), "ten")
                .when(field("age").eq(20), "twenty")
                .otherwise("other"),
        )
        .computed(
            "range",
            Case::new()
                .when(field("age").between(0, 20), "0-20")
                .when(field("age").between(21, 30), "21-30")
                .otherwise("other"),
        )
        .computed("avg_age", SubQuery::avg("age"));

    let page = repo
        .find_projected::<Record>(
            Predicate::MatchAll,
            &projection,
            &PageRequest::of(0, 10).unwrap().with_sort(by_age()),
        )
        .unwrap();

    let column = |name: &str| -> Vec<Value> {
        page.content()
            .iter()
            .map(|r| r.get(name).cloned().unwrap_or_default())
            .collect()
    };
    assert_eq!(column("constant"), vec![Value::from("A"); 4]);
    assert_eq!(
        column("label"),
        ["member1_10", "member2_20", "member3_30", "member4_40"].map(Value::from)
    );
    assert_eq!(column("simple"), ["ten", "twenty", "other", "other"].map(Value::from));
    assert_eq!(column("range"), ["0-20", "0-20", "21-30", "other"].map(Value::from));
    assert_eq!(column("avg_age"), vec![Value::Float(25.0); 4]);
}
