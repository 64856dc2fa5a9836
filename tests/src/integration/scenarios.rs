//! # Shout Scenarios
//!
//! End-to-end flows through real sessions sharing one in-memory store:
//!
//! ```text
//! [Session A] ──put cell/message──→ [InMemoryPresenceStore] ──snapshot──→ [Session B]
//!      ↑                                                                      │
//!      └──────────────────────────── view-model ←─────────────────────────────┘
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{identity, session, settle, user, WYDM, WYDN};
    use eu_02_shout::testing::wait_for_view;
    use eu_02_shout::{LocationUpdate, ShoutApi, SubscriptionStatus};
    use shared_bus::InMemoryPresenceStore;
    use shared_types::{CellId, PresenceRecord, ShoutMessage, SubscriptionId, Timestamp, SHOUT_TTL};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    // =========================================================================
    // PEER SHOUT LIFECYCLE
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_peer_hello_then_empty_after_ttl() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        let peer = session(&store, "peer@eureka", 1);

        let update = local.update_location(WYDM.0, WYDM.1).await.unwrap();
        assert_eq!(update.cell(), &CellId::new("wydm"));
        peer.update_location(WYDM.0, WYDM.1).await.unwrap();

        peer.shout(Some("Hello".into())).await.unwrap();

        let mut view = local.watch();
        let seen = wait_for_view(&mut view, |v| !v.messages().is_empty())
            .await
            .unwrap();
        assert_eq!(seen.messages().len(), 1);
        assert_eq!(seen.messages()[&user("peer@eureka")], "Hello");
        assert_eq!(seen.entry(&user("peer@eureka")).unwrap().display_name, "peer");

        let cleared = wait_for_view(&mut view, |v| v.messages().is_empty())
            .await
            .unwrap();
        assert_eq!(cleared.subscription, SubscriptionStatus::Live(CellId::new("wydm")));
        assert!(store.record(&user("peer@eureka")).unwrap().message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_absent_after_ttl_without_further_shout() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();

        local.shout(Some("gone soon".into())).await.unwrap();
        settle().await;
        assert!(store.record(&user("me@eureka")).unwrap().message.is_some());

        tokio::time::sleep(SHOUT_TTL + Duration::from_millis(100)).await;

        let record = store.record(&user("me@eureka")).unwrap();
        assert!(record.message.is_none());
        assert_eq!(record.cell_id, Some(CellId::new("wydm")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shout_a_then_b_keeps_b_past_a_deadline() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();

        local.shout(Some("A".into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        local.shout(Some("B".into())).await.unwrap();

        // A's deletion fires here; B has 500 ms left.
        tokio::time::sleep(SHOUT_TTL - Duration::from_millis(250)).await;
        let message = store.record(&user("me@eureka")).unwrap().message.unwrap();
        assert_eq!(message.content, "B");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(store.record(&user("me@eureka")).unwrap().message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_crashed_author_message_leaves_view_at_ttl() {
        let store = Arc::new(InMemoryPresenceStore::new());
        // Shouted two seconds before the local clock's start, then vanished.
        let mut orphan = PresenceRecord::new(user("gone@eureka"));
        orphan.profile = identity("gone@eureka", 4).profile;
        orphan.cell_id = Some(CellId::new("wydm"));
        orphan.message = Some(ShoutMessage::new("anyone?", Timestamp::from_millis(8_000)));
        store.insert_record(orphan);
        let local = session(&store, "me@eureka", 0);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();

        let mut view = local.watch();
        wait_for_view(&mut view, |v| v.message_count() == 1)
            .await
            .unwrap();
        let writes = store.write_count();

        tokio::time::sleep(SHOUT_TTL - Duration::from_secs(3)).await;
        assert_eq!(local.view().messages()[&user("gone@eureka")], "anyone?");

        tokio::time::sleep(Duration::from_secs(2)).await;
        let view = local.view();
        assert!(view.messages().is_empty());
        assert_eq!(view.subscription, SubscriptionStatus::Live(CellId::new("wydm")));
        assert!(store.record(&user("gone@eureka")).unwrap().message.is_some());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_shouts_get_distinct_timestamps() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();

        let first = local.shout(Some("A".into())).await.unwrap();
        let second = local.shout(Some("B".into())).await.unwrap();

        assert!(second.created_at > first.created_at);
        let stored = store.record(&user("me@eureka")).unwrap().message.unwrap();
        assert_eq!(stored.created_at, second.created_at);
    }

    // =========================================================================
    // LOCATION AND SUBSCRIPTIONS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_identical_update_writes_nothing_and_keeps_subscription() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();
        settle().await;
        let writes = store.write_count();

        let update = local.update_location(WYDM.0, WYDM.1).await.unwrap();
        settle().await;

        assert_eq!(update, LocationUpdate::Unchanged(CellId::new("wydm")));
        assert_eq!(store.write_count(), writes);
        assert_eq!(store.subscription_count(), 1);
        assert_eq!(
            store.subscribed_cells(),
            BTreeSet::from([CellId::new("wydm")])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_cell_change_holds_only_new_subscription() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        let peer = session(&store, "peer@eureka", 1);

        // Subscription 1: the peer's wydm.
        peer.update_location(WYDM.0, WYDM.1).await.unwrap();
        // Subscription 2, then 3.
        local.update_location(WYDM.0, WYDM.1).await.unwrap();
        let update = local.update_location(WYDN.0, WYDN.1).await.unwrap();
        assert_eq!(
            update,
            LocationUpdate::Moved {
                from: Some(CellId::new("wydm")),
                to: CellId::new("wydn"),
            }
        );

        assert_eq!(store.subscription_count(), 2);
        assert_eq!(
            store.subscribed_cells(),
            BTreeSet::from([CellId::new("wydm"), CellId::new("wydn")])
        );

        // A late wydm notification cannot reach the torn-down subscription.
        let mut late = PresenceRecord::new(user("peer@eureka"));
        late.cell_id = Some(CellId::new("wydm"));
        late.message = Some(ShoutMessage::new("late", Timestamp::from_millis(10_000)));
        assert!(!store.inject_snapshot(SubscriptionId(2), Ok(vec![late])));

        peer.shout(Some("wydm only".into())).await.unwrap();
        settle().await;

        let view = local.view();
        assert_eq!(view.cell, Some(CellId::new("wydn")));
        assert_eq!(view.subscription, SubscriptionStatus::Live(CellId::new("wydn")));
        assert!(view.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_moving_away_removes_author_from_old_cell_view() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        let peer = session(&store, "peer@eureka", 1);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();
        peer.update_location(WYDM.0, WYDM.1).await.unwrap();
        peer.shout(Some("bye".into())).await.unwrap();

        let mut view = local.watch();
        wait_for_view(&mut view, |v| v.message_count() == 1)
            .await
            .unwrap();

        peer.update_location(WYDN.0, WYDN.1).await.unwrap();

        let after = wait_for_view(&mut view, |v| v.message_count() == 0)
            .await
            .unwrap();
        assert!(after.entry(&user("peer@eureka")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_transport_recovers_with_one_resubscribe() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        let peer = session(&store, "peer@eureka", 1);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();
        peer.update_location(WYDN.0, WYDN.1).await.unwrap();

        assert_eq!(store.drop_subscriptions(Some(&CellId::new("wydm"))), 1);
        settle().await;

        assert_eq!(
            local.view().subscription,
            SubscriptionStatus::Live(CellId::new("wydm"))
        );
        assert_eq!(store.subscription_count(), 2);

        peer.update_location(WYDM.0, WYDM.1).await.unwrap();
        peer.shout(Some("still here".into())).await.unwrap();
        let mut view = local.watch();
        let seen = wait_for_view(&mut view, |v| v.message_count() == 1)
            .await
            .unwrap();
        assert_eq!(seen.messages()[&user("peer@eureka")], "still here");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_store_resources() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        local.update_location(WYDM.0, WYDM.1).await.unwrap();
        local.shout(Some("leaving".into())).await.unwrap();

        local.shutdown().await;
        settle().await;

        assert!(local.is_closed());
        assert_eq!(store.subscription_count(), 0);
        assert!(store.record(&user("me@eureka")).unwrap().message.is_none());
    }
}
