//! Algebraic properties of predicate composition and page metadata.

use proptest::prelude::*;

use query_dsl_core::{
    build_predicate, paginate, slice, Filter, PageRequest, Predicate, Record, Value,
};

const FIELDS: [&str; 3] = ["username", "age", "team"];

fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(FIELDS[0].to_string()),
        Just(FIELDS[1].to_string()),
        Just(FIELDS[2].to_string()),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(Value::Int),
        (-50.0f64..50.0).prop_map(Value::Float),
        "[a-c]{0,3}".prop_map(Value::Text),
    ]
}

fn arb_row() -> impl Strategy<Value = Record> {
    prop::collection::btree_map(arb_field(), arb_value(), 0..=3)
        .prop_map(|fields| fields.into_iter().collect::<Record>())
}

fn arb_filter() -> impl Strategy<Value = Filter> {
    let maybe = || prop::option::of(arb_value());
    prop_oneof![
        (arb_field(), maybe()).prop_map(|(f, v)| Filter::eq(f, v)),
        (arb_field(), maybe()).prop_map(|(f, v)| Filter::ne(f, v)),
        (arb_field(), maybe()).prop_map(|(f, v)| Filter::gt(f, v)),
        (arb_field(), maybe()).prop_map(|(f, v)| Filter::le(f, v)),
        (arb_field(), prop::option::of((arb_value(), arb_value())))
            .prop_map(|(f, b)| Filter::between(f, b)),
        (arb_field(), prop::option::of("[a-c%_]{0,3}"))
            .prop_map(|(f, p)| Filter::like(f, p.as_deref())),
        arb_field().prop_map(|f| Filter::is_null(f)),
    ]
}

fn absent_filter() -> impl Strategy<Value = Filter> {
    prop_oneof![
        arb_field().prop_map(|f| Filter::eq(f, None::<Value>)),
        arb_field().prop_map(|f| Filter::ge(f, None::<Value>)),
        arb_field().prop_map(|f| Filter::between(f, None::<(Value, Value)>)),
        arb_field().prop_map(|f| Filter::is_in(f, None::<Vec<Value>>)),
    ]
}

proptest! {
    #[test]
    fn absent_filters_do_not_change_matches(
        filters in prop::collection::vec(arb_filter(), 0..6),
        row in arb_row(),
    ) {
        let present: Vec<Filter> = filters.iter().filter(|f| !f.is_absent()).cloned().collect();
        prop_assert_eq!(
            build_predicate(filters).matches(&row),
            build_predicate(present).matches(&row)
        );
    }

    #[test]
    fn all_absent_filters_match_every_row(
        filters in prop::collection::vec(absent_filter(), 0..6),
        row in arb_row(),
    ) {
        let combined = build_predicate(filters);
        prop_assert!(combined.is_match_all());
        prop_assert!(combined.matches(&row));
    }

    #[test]
    fn conjunction_is_commutative(a in arb_filter(), b in arb_filter(), row in arb_row()) {
        prop_assert_eq!(
            build_predicate([a.clone(), b.clone()]).matches(&row),
            build_predicate([b, a]).matches(&row)
        );
    }

    #[test]
    fn conjunction_is_associative(
        a in arb_filter(),
        b in arb_filter(),
        c in arb_filter(),
        row in arb_row(),
    ) {
        let left = Predicate::all([a.clone(), b.clone()]).and(Predicate::all([c.clone()]));
        let right = Predicate::all([a]).and(Predicate::all([b, c]));
        prop_assert_eq!(left.matches(&row), right.matches(&row));
    }

    #[test]
    fn double_negation_matches_original(a in arb_filter(), row in arb_row()) {
        let predicate = Predicate::all([a]);
        prop_assert_eq!(predicate.clone().not().not().matches(&row), predicate.matches(&row));
    }
}

proptest! {
    #[test]
    fn page_metadata_is_consistent(total in 0usize..200, limit in 1i64..25, offset in 0i64..15) {
        let request = PageRequest::of(offset, limit).unwrap();
        let start = request.row_offset().unwrap();
        let len = total.saturating_sub(start).min(request.limit());

        let page = paginate(vec![(); len], total, &request).unwrap();

        prop_assert_eq!(page.total_elements(), total);
        prop_assert_eq!(page.total_pages(), total.div_ceil(request.limit()));
        prop_assert_eq!(page.has_next(), start + request.limit() < total);
        prop_assert_eq!(page.is_first(), offset == 0);
        prop_assert!(page.content().len() <= request.limit());
    }

    #[test]
    fn slice_has_next_iff_probe_row_present(rows in 0usize..30, limit in 1i64..25) {
        let request = PageRequest::of(0, limit).unwrap();
        let fetched = rows.min(request.probe_limit());

        let result = slice(vec![(); fetched], &request).unwrap();

        prop_assert_eq!(result.has_next(), fetched > request.limit());
        prop_assert_eq!(result.content().len(), fetched.min(request.limit()));
    }
}
