use pagegrid_query::*;

fn open_high_filters() -> Vec<ColumnFilter> {
    vec![
        ColumnFilter::new("Status").with_filter1(SimpleFilter::equals("Open")),
        ColumnFilter::new("Priority").with_filter1(SimpleFilter::equals("High")),
    ]
}

#[test]
fn end_to_end_query_string() {
    let state = QueryState {
        filters: open_high_filters(),
        sort: SortState::by("CreatedAt", SortDirection::Descending),
        group: GroupState::default(),
        page_index: 0,
        page_size: 10,
    };

    assert_eq!(
        state.to_query_string().unwrap(),
        "sort=CreatedAt-desc&page=1&pageSize=10&filter=Status~eq~'Open'~and~Priority~eq~'High'"
    );
}

#[test]
fn stacked_sort_keeps_only_the_primary_column() {
    let stack = vec![
        SortDescriptor::new("CreatedAt", SortDirection::Descending),
        SortDescriptor::new("Name", SortDirection::Ascending),
    ];
    let sort = SortState::from_descriptors(&stack);
    assert_eq!(serialize_sort(&sort), "CreatedAt-desc");
}

#[test]
fn distinct_union_of_three() {
    let filters = vec![ColumnFilter::new("col").with_distinct(DistinctFilter::of(["A", "B", "C"]))];
    assert_eq!(
        serialize_filter(&filters).unwrap(),
        "(col~eq~'A'~or~col~eq~'B'~or~col~eq~'C')"
    );
}

#[test]
fn single_rule_has_no_parentheses_and_two_rules_have_one_pair() {
    let one = vec![ColumnFilter::new("Name").with_filter1(SimpleFilter::new(
        FilterOperator::StartsWith,
        "Jo",
    ))];
    let one = serialize_filter(&one).unwrap();
    assert!(!one.contains('('));

    let two = vec![
        ColumnFilter::new("Name")
            .with_filter1(SimpleFilter::new(FilterOperator::StartsWith, "Jo"))
            .with_filter2(
                LogicalOp::Or,
                SimpleFilter::new(FilterOperator::EndsWith, "hn"),
            ),
    ];
    let two = serialize_filter(&two).unwrap();
    assert_eq!(two.matches('(').count(), 1);
    assert_eq!(two, "(Name~startswith~'Jo'~or~Name~endswith~'hn')");
}

#[test]
fn serialized_filter_parses_back_to_the_same_clauses() {
    let filters = vec![
        ColumnFilter::new("Status")
            .with_filter1(SimpleFilter::equals("Open"))
            .with_distinct(DistinctFilter::of(["Open", "Blocked"])),
        ColumnFilter::new("Age")
            .with_filter1(SimpleFilter::new(FilterOperator::IsGreaterThan, 18))
            .with_filter2(
                LogicalOp::And,
                SimpleFilter::new(FilterOperator::IsLessThanOrEqualTo, 65),
            ),
        ColumnFilter::new("Owner").with_filter1(SimpleFilter::equals(serde_json::Value::Null)),
    ];

    let clauses = parse_filter(&serialize_filter(&filters).unwrap()).unwrap();

    assert_eq!(
        clauses,
        vec![
            Clause::Simple(Condition::quoted("Status", FilterOperator::IsEqualTo, "Open")),
            Clause::Group {
                logical: LogicalOp::Or,
                conditions: vec![
                    Condition::quoted("Status", FilterOperator::IsEqualTo, "Open"),
                    Condition::quoted("Status", FilterOperator::IsEqualTo, "Blocked"),
                ],
            },
            Clause::Group {
                logical: LogicalOp::And,
                conditions: vec![
                    Condition::quoted("Age", FilterOperator::IsGreaterThan, "18"),
                    Condition::quoted("Age", FilterOperator::IsLessThanOrEqualTo, "65"),
                ],
            },
            Clause::Simple(Condition {
                column: "Owner".into(),
                operator: FilterOperator::IsEqualTo,
                value: ClauseValue::Null,
            }),
        ]
    );
}

#[test]
fn column_order_only_changes_clause_order() {
    let forward = open_high_filters();
    let mut backward = open_high_filters();
    backward.reverse();

    let mut a = parse_filter(&serialize_filter(&forward).unwrap()).unwrap();
    let b = parse_filter(&serialize_filter(&backward).unwrap()).unwrap();
    assert_ne!(a, b);
    a.reverse();
    assert_eq!(a, b);
}

#[test]
fn view_descriptors_load_from_json() {
    let json = r#"{
        "filters": [
            { "column": "Status", "filter1": { "operator": "is_equal_to", "value": "Open" } },
            { "column": "Dept", "distinct": { "is_active": true, "values": [
                { "operator": "is_equal_to", "value": "A" },
                { "operator": "is_equal_to", "value": "B" }
            ] } }
        ],
        "sort": { "column": "Name", "direction": "ascending" },
        "page_index": 2,
        "page_size": 20
    }"#;
    let state: QueryState = serde_json::from_str(json).unwrap();
    assert_eq!(
        state.to_query_string().unwrap(),
        "sort=Name-asc&page=3&pageSize=20&filter=Status~eq~'Open'~and~(Dept~eq~'A'~or~Dept~eq~'B')"
    );
}
