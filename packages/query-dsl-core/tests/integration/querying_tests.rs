//! Dynamic predicate, sort, projection and query-string tests against a store.

use ntest::timeout;

use query_dsl_core::predicate::{field, Condition};
use query_dsl_core::projection::{FromRecord, Projection};
use query_dsl_core::{
    Order, PageRequest, Predicate, PredicateBuilder, QueryConfig, QueryError, QueryParams, Record,
    Sort, Value,
};

use super::helpers::{member, repository, sample_members, usernames};

fn search(username: Option<&str>, age: Option<i64>) -> Vec<Record> {
    let mut builder = PredicateBuilder::new();
    builder.and(field("username").eq_opt(username));
    builder.and(field("age").eq_opt(age));

    repository(sample_members())
        .find_all(builder.build(), &Sort::unsorted())
        .unwrap()
}

fn username_eq(username: Option<&str>) -> Option<Condition> {
    field("username").eq_opt(username)
}

fn age_eq(age: Option<i64>) -> Option<Condition> {
    field("age").eq_opt(age)
}

#[timeout(1000)]
#[test]
fn test_dynamic_query_with_builder() {
    assert_eq!(search(Some("member1"), Some(10)).len(), 1);
    assert_eq!(search(Some("member1"), None).len(), 1);
    assert_eq!(search(None, None).len(), 4);
    assert!(search(Some("member1"), Some(20)).is_empty());
}

#[timeout(1000)]
#[test]
fn test_dynamic_query_with_where_params() {
    let repo = repository(sample_members());

    let both = Predicate::all([username_eq(Some("member1")), age_eq(Some(10))]);
    assert_eq!(repo.count(both).unwrap(), 1);

    let only_age = Predicate::all([username_eq(None), age_eq(Some(10))]);
    assert_eq!(only_age.to_string(), "age = 10");
    assert_eq!(repo.count(only_age).unwrap(), 1);

    let neither = Predicate::all([username_eq(None), age_eq(None)]);
    assert!(neither.is_match_all());
    assert_eq!(repo.count(neither).unwrap(), 4);
}

#[timeout(1000)]
#[test]
fn test_sort_age_desc_username_asc_nulls_last() {
    let mut records = sample_members();
    records.push(Record::new().with("username", Value::Null).with("age", 100));
    records.push(member("member5", 100, "teamB"));
    records.push(member("member6", 100, "teamB"));
    let repo = repository(records);

    let sort = Sort::by(Order::desc("age")).then(Order::asc("username").nulls_last());
    let result = repo.find_all(field("age").eq(100), &sort).unwrap();

    assert_eq!(
        usernames(&result),
        vec![Some("member5".to_string()), Some("member6".to_string()), None]
    );
}

#[timeout(1000)]
#[test]
fn test_or_binds_looser_than_and() {
    let repo = repository(sample_members());

    let predicate = field("team")
        .eq("teamA")
        .and(field("age").gt(10))
        .or(field("age").eq(40));
    let found = repo.find_all(predicate, &Sort::by(Order::asc("age"))).unwrap();
    assert_eq!(
        usernames(&found),
        vec![Some("member2".to_string()), Some("member4".to_string())]
    );

    let grouped = Predicate::from(field("team").eq("teamA"))
        .and(field("age").gt(10).or(field("age").eq(40)));
    let found = repo.find_all(grouped, &Sort::unsorted()).unwrap();
    assert_eq!(usernames(&found), vec![Some("member2".to_string())]);
}

#[timeout(1000)]
#[test]
fn test_oldest_member_and_ages_above_ten() {
    let repo = repository(sample_members());

    let oldest = repo
        .find_first(Predicate::MatchAll, &Sort::by(Order::desc("age")))
        .unwrap()
        .unwrap();
    assert_eq!(oldest.require_int("age").unwrap(), 40);

    let ages: Vec<i64> = repo
        .find_all(field("age").is_in([20, 30, 40]), &Sort::by(Order::asc("age")))
        .unwrap()
        .iter()
        .map(|r| r.require_int("age").unwrap())
        .collect();
    assert_eq!(ages, vec![20, 30, 40]);
}

#[derive(Debug, PartialEq)]
struct UserDto {
    name: String,
    age: i64,
}

impl FromRecord for UserDto {
    fn from_record(record: &Record) -> Result<Self, QueryError> {
        Ok(Self {
            name: record.require_text("name")?.to_string(),
            age: record.require_int("age")?,
        })
    }
}

#[timeout(1000)]
#[test]
fn test_tuple_and_dto_projections() {
    let repo = repository(sample_members());
    let rows = repo
        .find_all(Predicate::MatchAll, &Sort::by(Order::asc("age")))
        .unwrap();

    let tuple = Projection::of(["username", "age"]);
    let first = tuple.apply_tuple(&rows[0]);
    assert_eq!(first, vec![Value::from("member1"), Value::Int(10)]);

    let as_user = Projection::default().alias("username", "name").and("age");
    let page = repo
        .find_projected::<UserDto>(
            Predicate::MatchAll,
            &as_user,
            &PageRequest::of(0, 10)
                .unwrap()
                .with_sort(Sort::by(Order::desc("age"))),
        )
        .unwrap();
    assert_eq!(
        page.content()[0],
        UserDto {
            name: "member4".to_string(),
            age: 40
        }
    );
    assert_eq!(page.total_elements(), 4);
}

#[timeout(1000)]
#[test]
fn test_query_string_drives_a_page() {
    let repo = repository(sample_members());
    let params = QueryParams::parse(
        Some("team=teamB&age.ge=30&page=0&size=1&sort=age,desc"),
        &QueryConfig::default(),
    )
    .unwrap();

    let page = repo.find_page(params.predicate(), &params.page).unwrap();

    assert_eq!(page.total_elements(), 2);
    assert_eq!(usernames(page.content()), vec![Some("member4".to_string())]);
    assert!(page.has_next());
}

#[timeout(1000)]
#[test]
fn test_query_string_dotted_field_path() {
    let records: Vec<Record> = sample_members()
        .into_iter()
        .map(|r| {
            let team = r.get("team").cloned().unwrap_or_default();
            r.with("team.name", team)
        })
        .collect();
    let repo = repository(records);
    let config = QueryConfig::default();

    let params = QueryParams::parse(Some("team.name=teamA&age.gt=10"), &config).unwrap();
    assert_eq!(repo.count(params.predicate()).unwrap(), 1);

    let result = QueryParams::parse(Some("age.between=30"), &config);
    assert!(matches!(result, Err(QueryError::InvalidArgument(_))));
}
