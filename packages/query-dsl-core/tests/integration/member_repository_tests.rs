//! Repository paging, slicing, counting and bulk mutation tests.

use ntest::timeout;
use tempfile::tempdir;

use query_dsl_core::predicate::{field, Example, ExampleMatcher};
use query_dsl_core::store::{Mutation, Update};
use query_dsl_core::{
    build_predicate, Direction, Filter, NullOrdering, Order, PageRequest, Predicate, QueryError,
    RecordStore, RepositoryError, Sort,
};

use super::helpers::{repository, round_trip_through_file, sample_members, seven_members, usernames};

fn username_desc(offset: i64, limit: i64) -> PageRequest {
    PageRequest::of(offset, limit)
        .unwrap()
        .sorted_by("username", Direction::Desc, NullOrdering::NullsLast)
}

#[timeout(1000)]
#[test]
fn test_page_of_members_aged_ten() {
    let repo = repository(seven_members());

    let page = repo
        .find_page(field("age").eq(10), &username_desc(1, 3))
        .unwrap();

    assert_eq!(page.content().len(), 3);
    assert_eq!(page.total_elements(), 7);
    assert_eq!(page.number(), 1);
    assert_eq!(page.total_pages(), 3);
    assert!(!page.is_first());
    assert!(page.has_next());
    assert_eq!(
        usernames(page.content()),
        vec![
            Some("member4".to_string()),
            Some("member3".to_string()),
            Some("member2".to_string())
        ]
    );
}

#[timeout(1000)]
#[test]
fn test_last_page_of_members_aged_ten() {
    let repo = repository(seven_members());

    let page = repo
        .find_page(field("age").eq(10), &username_desc(2, 3))
        .unwrap();

    assert_eq!(page.content().len(), 1);
    assert!(!page.has_next());
    assert!(page.is_last());
}

#[timeout(1000)]
#[test]
fn test_slice_of_members_aged_ten() {
    let repo = repository(seven_members());

    let slice = repo
        .find_slice(field("age").eq(10), &username_desc(1, 3))
        .unwrap();

    assert_eq!(slice.content().len(), 3);
    assert_eq!(slice.number(), 1);
    assert!(!slice.is_first());
    assert!(slice.has_next());
}

#[timeout(1000)]
#[test]
fn test_page_maps_to_dto_keeping_metadata() {
    let repo = repository(seven_members());

    let page = repo
        .find_page(field("age").eq(10), &username_desc(0, 3))
        .unwrap()
        .map(|r| r.require_text("username").unwrap().to_uppercase());

    assert_eq!(page.content()[0], "MEMBER7");
    assert_eq!(page.total_elements(), 7);
    assert!(page.has_next());
}

#[timeout(1000)]
#[test]
fn test_offset_and_limit_over_sorted_members() {
    let repo = repository(sample_members());
    let request = username_desc(0, 2);

    let rows = repo
        .store()
        .fetch_page(&Predicate::MatchAll, 1, 2, request.sort())
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        usernames(&rows),
        vec![Some("member3".to_string()), Some("member2".to_string())]
    );

    let count = repo.count(Predicate::MatchAll).unwrap();
    assert_eq!(count, 4);
}

#[timeout(1000)]
#[test]
fn test_fetch_one_first_and_all() {
    let repo = repository(sample_members());

    let one = repo
        .find_one(field("username").eq("member1").and(field("age").between(10, 30)))
        .unwrap()
        .unwrap();
    assert_eq!(one.require_int("age").unwrap(), 10);

    let first = repo
        .find_first(Predicate::MatchAll, &Sort::by(Order::asc("age")))
        .unwrap()
        .unwrap();
    assert_eq!(first.require_text("username").unwrap(), "member1");

    assert_eq!(repo.find_all(Predicate::MatchAll, &Sort::unsorted()).unwrap().len(), 4);

    assert!(matches!(
        repo.find_one(Predicate::MatchAll),
        Err(RepositoryError::Query(QueryError::NonUniqueResult { count: 4 }))
    ));
}

#[timeout(1000)]
#[test]
fn test_username_and_age_greater_than() {
    let repo = repository(vec![
        super::helpers::member("AAA", 10, "teamA"),
        super::helpers::member("AAA", 20, "teamA"),
    ]);

    let found = repo
        .find_all(
            build_predicate([
                Filter::eq("username", Some("AAA")),
                Filter::gt("age", Some(15)),
            ]),
            &Sort::unsorted(),
        )
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].require_int("age").unwrap(), 20);
}

#[timeout(1000)]
#[test]
fn test_bulk_update_bulk_add_bulk_delete() {
    let repo = repository(sample_members());

    let renamed = repo
        .execute(&Update::new(field("age").lt(28)).set("username", "guest").into())
        .unwrap();
    assert_eq!(renamed, 2);

    let bumped = repo
        .execute(&Update::new(Predicate::MatchAll).add("age", 1).into())
        .unwrap();
    assert_eq!(bumped, 4);

    let deleted = repo.execute(&Mutation::delete(field("age").gt(18))).unwrap();
    assert_eq!(deleted, 3);

    let remaining = repo.find_all(Predicate::MatchAll, &Sort::unsorted()).unwrap();
    assert_eq!(usernames(&remaining), vec![Some("guest".to_string())]);
    assert_eq!(remaining[0].require_int("age").unwrap(), 11);
}

#[timeout(1000)]
#[test]
fn test_query_by_example() {
    let repo = repository(sample_members());
    let probe = super::helpers::member("member1", 0, "teamA");
    let matcher = ExampleMatcher::matching().with_ignore_paths(["age"]);

    let found = repo
        .find_by_example(&Example::of(probe, matcher), &Sort::unsorted())
        .unwrap();

    assert_eq!(usernames(&found), vec![Some("member1".to_string())]);
}

#[timeout(2000)]
#[test]
fn test_members_loaded_from_json_file() {
    let dir = tempdir().unwrap();
    let loaded = round_trip_through_file(dir.path(), &sample_members());
    assert_eq!(loaded, sample_members());

    let repo = repository(loaded);
    let page = repo
        .find_page(field("team").eq("teamB"), &PageRequest::of(0, 1).unwrap())
        .unwrap();

    assert_eq!(page.total_elements(), 2);
    assert_eq!(page.total_pages(), 2);
    assert!(page.has_next());
}
