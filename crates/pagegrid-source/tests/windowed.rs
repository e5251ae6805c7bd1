mod common;

use std::sync::Arc;

use common::*;
use pagegrid_query::*;
use pagegrid_source::*;
use tokio::sync::oneshot;

type Loader = WindowedLoader<Order, ScriptedTransport>;

fn loader(script: impl IntoIterator<Item = Scripted>) -> (Loader, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new(script));
    (WindowedLoader::new(Arc::clone(&transport), 20, PROVISIONAL_COUNT), transport)
}

fn open_only(v: &mut GridView) -> ViewChange {
    v.set_column_filter(
        ColumnFilter::new("Status").with_filter1(SimpleFilter::equals("Open")),
    )
}

#[tokio::test]
async fn starts_with_provisional_count() {
    let (loader, transport) = loader([]);
    assert_eq!(loader.virtual_count(), 100);
    assert!(loader.get(0).is_none());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn window_sets_authoritative_count() {
    let (loader, transport) = loader([Scripted::Json(page(40..60, 250))]);

    let outcome = loader.on_items_loading(40).await.unwrap();

    assert!(matches!(outcome, LoadOutcome::Applied { written: 20, total: 250, .. }));
    assert_eq!(loader.virtual_count(), 250);
    assert_eq!(loader.get(40).unwrap().id, 40);
    assert_eq!(loader.get(59).unwrap().id, 59);
    let call = &transport.calls()[0];
    assert_eq!(call.param("page"), Some("3"));
    assert_eq!(call.param("pageSize"), Some("20"));
}

#[tokio::test]
async fn unaligned_start_shifts_the_fetched_page() {
    let (loader, transport) = loader([Scripted::Json(page(40..60, 250))]);

    loader.on_items_loading(50).await.unwrap();

    assert_eq!(transport.calls()[0].param("page"), Some("3"));
    assert_eq!(loader.get(50).unwrap().id, 40);
    assert!(loader.get(40).is_none());
}

#[tokio::test]
async fn window_near_the_end_of_a_large_result() {
    let last_window = page(19_999_980..20_000_000, 20_000_000);
    let (loader, transport) = loader([Scripted::Json(last_window)]);

    loader.on_items_loading(19_999_980).await.unwrap();

    assert_eq!(transport.calls()[0].param("page"), Some("1000000"));
    assert_eq!(loader.virtual_count(), 20_000_000);
    assert_eq!(loader.loaded_count(), 20);
    assert_eq!(loader.get(19_999_999).unwrap().id, 19_999_999);
    assert!(loader.get(0).is_none());
    assert_eq!(slot_ids(&loader.window(19_999_979, 2)), vec![None, Some(19_999_980)]);
}

#[tokio::test]
async fn overlapping_windows_both_apply() {
    let (loader, _) = loader([
        Scripted::Json(page(0..20, 250)),
        Scripted::Json(page(20..40, 250)),
    ]);

    let (a, b) = tokio::join!(loader.on_items_loading(0), loader.on_items_loading(20));

    assert!(matches!(a.unwrap(), LoadOutcome::Applied { .. }));
    assert!(matches!(b.unwrap(), LoadOutcome::Applied { .. }));
    assert_eq!(loader.loaded_count(), 40);
}

#[tokio::test]
async fn empty_result_recovers_provisional_count_on_next_filter() {
    let (loader, transport) = loader([Scripted::Json(page(0..0, 0))]);

    assert_eq!(loader.update_view(open_only), LoadOutcome::Deferred);
    assert_eq!(transport.call_count(), 0);
    loader.on_items_loading(0).await.unwrap();
    assert_eq!(loader.virtual_count(), 0);

    loader.update_view(|v| v.set_filters(Vec::new()));
    assert_eq!(loader.virtual_count(), 100);
}

#[tokio::test]
async fn paging_does_not_reset_an_empty_window() {
    let (loader, _) = loader([Scripted::Json(page(0..0, 0))]);
    loader.on_items_loading(0).await.unwrap();

    assert_eq!(loader.update_view(|v| v.move_to_page(3)), LoadOutcome::Ignored);
    assert_eq!(loader.virtual_count(), 0);
}

#[tokio::test]
async fn shape_change_drops_loaded_rows() {
    let (loader, _) = loader([Scripted::Json(page(0..20, 250))]);
    loader.on_items_loading(0).await.unwrap();
    let mut rx = loader.subscribe();

    loader.update_view(open_only);

    assert_eq!(loader.loaded_count(), 0);
    assert_eq!(loader.virtual_count(), 250);
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(
        events.last(),
        Some(CollectionChange::Reset { ticket: Some(_) })
    ));
}

#[tokio::test]
async fn window_of_an_earlier_query_is_dropped() {
    let (tx, rx) = oneshot::channel();
    let (loader, transport) = loader([Scripted::Gated(rx)]);

    let first = loader.on_items_loading(0);
    let second = async {
        while transport.call_count() == 0 {
            tokio::task::yield_now().await;
        }
        loader.update_view(open_only);
        tx.send(page(0..20, 250)).unwrap();
    };
    let (first, ()) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), LoadOutcome::Stale);
    assert_eq!(loader.loaded_count(), 0);
    assert_eq!(loader.virtual_count(), 100);
}
