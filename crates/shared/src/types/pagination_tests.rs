use super::*;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(None, None, 1, 20)]
#[case(Some(0), Some(0), 1, 1)]
#[case(Some(3), Some(50), 3, 50)]
#[case(Some(2), Some(1000), 2, 100)]
fn test_page_request_normalized(
    #[case] page: Option<u64>,
    #[case] size: Option<u64>,
    #[case] want_page: u64,
    #[case] want_size: u64,
) {
    let req = PageRequest::normalized(page, size);
    assert_eq!(req.page, want_page);
    assert_eq!(req.page_size, want_size);
}

#[test]
fn test_page_request_offset_and_limit() {
    let req = PageRequest {
        page: 3,
        page_size: 20,
    };
    assert_eq!(req.offset(), 40);
    assert_eq!(req.limit(), 20);
    assert_eq!(PageRequest::default().offset(), 0);
}

#[test]
fn test_sort_order_parse_is_case_sensitive() {
    assert_eq!(SortOrder::parse("asc"), Some(SortOrder::Asc));
    assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Desc));
    assert_eq!(SortOrder::parse("ASC"), None);
    assert_eq!(SortOrder::parse("up"), None);
}

#[test]
fn test_list_params_blank_values_are_absent() {
    let params = ListParams {
        search: Some("   ".into()),
        sort_by: Some(String::new()),
        sort_order: Some(String::new()),
        page: None,
        page_size: None,
    };
    assert_eq!(params.search_term(), None);
    assert_eq!(params.sort_field(), None);
    assert_eq!(params.sort_direction(), None);
}

#[test]
fn test_list_params_trims_search() {
    let params = ListParams {
        search: Some("  drill ".into()),
        ..ListParams::default()
    };
    assert_eq!(params.search_term(), Some("drill"));
}

#[test]
fn test_list_params_deserializes_camel_case() {
    let params: ListParams =
        serde_json::from_str(r#"{"sortBy":"name","sortOrder":"desc","pageSize":5}"#).unwrap();
    assert_eq!(params.sort_field(), Some("name"));
    assert_eq!(params.sort_direction(), Some("desc"));
    assert_eq!(params.page_request().page_size, 5);
}

#[test]
fn test_page_total_pages() {
    let req = PageRequest {
        page: 1,
        page_size: 10,
    };
    assert_eq!(Page::<i32>::new(vec![], req, 0).total_pages, 0);
    assert_eq!(Page::<i32>::new(vec![], req, 10).total_pages, 1);
    assert_eq!(Page::<i32>::new(vec![], req, 25).total_pages, 3);
}

#[test]
fn test_page_serializes_camel_case() {
    let page = Page::new(vec![1], PageRequest::default(), 1);
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["pageSize"], 20);
    assert_eq!(json["totalPages"], 1);
}

#[test]
fn test_page_map_keeps_metadata() {
    let page = Page::new(vec![1, 2], PageRequest::default(), 42).map(|n| n * 10);
    assert_eq!(page.items, vec![10, 20]);
    assert_eq!(page.total, 42);
    assert_eq!(page.total_pages, 3);
}

#[test]
fn test_page_try_map_stops_at_error() {
    let ok: Result<Page<u8>, String> =
        Page::new(vec![1, 2], PageRequest::default(), 2).try_map(|n| Ok(n + 1));
    assert_eq!(ok.unwrap().items, vec![2, 3]);

    let err: Result<Page<u8>, String> = Page::new(vec![1, 2], PageRequest::default(), 2)
        .try_map(|n| if n == 2 { Err(format!("bad {n}")) } else { Ok(n) });
    assert_eq!(err.unwrap_err(), "bad 2");
}

proptest! {
    #[test]
    fn prop_total_pages_covers_total(total in 0u64..100_000, size in 1u64..=100) {
        let page = Page::<()>::new(vec![], PageRequest { page: 1, page_size: size }, total);
        prop_assert!(page.total_pages * size >= total);
        if total > 0 {
            prop_assert!((page.total_pages - 1) * size < total);
        }
    }

    #[test]
    fn prop_normalized_page_size_in_range(page in proptest::option::of(0u64..10_000), size in proptest::option::of(0u64..10_000)) {
        let req = PageRequest::normalized(page, size);
        prop_assert!(req.page >= 1);
        prop_assert!((1..=MAX_PAGE_SIZE).contains(&req.page_size));
    }
}
