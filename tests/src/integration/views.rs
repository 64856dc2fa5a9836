//! # View Composition
//!
//! Neighbor resolution against the store and the message/neighbor merge that
//! feeds the rendered view.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{session, user, WYDM};
    use eu_02_shout::algorithms::merge_entries;
    use eu_02_shout::service::NeighborResolver;
    use eu_02_shout::testing::wait_for_view;
    use eu_02_shout::{
        EntryKind, MessageEntry, MessageMap, NeighborEntry, NeighborSet, RenderPosition, ShoutApi,
    };
    use shared_bus::InMemoryPresenceStore;
    use shared_types::{AvatarId, CellId, PresenceRecord, UserProfile};
    use std::sync::Arc;

    fn resident(id: &str, cell: &str) -> PresenceRecord {
        let mut record = PresenceRecord::new(user(id));
        record.profile = UserProfile::new(id, AvatarId::round_robin(id.len()));
        record.cell_id = Some(CellId::new(cell));
        record
    }

    #[tokio::test]
    async fn test_resolver_never_returns_requesting_user() {
        let store = Arc::new(InMemoryPresenceStore::new());
        for id in ["me@eureka", "u1@eureka", "u2@eureka"] {
            store.insert_record(resident(id, "wydm"));
        }
        store.insert_record(resident("far@eureka", "wydn"));
        let resolver = NeighborResolver::new(store.clone());

        let neighbors = resolver
            .fetch_neighbors(&CellId::new("wydm"), &user("me@eureka"))
            .await
            .unwrap();

        assert_eq!(neighbors.len(), 2);
        assert!(!neighbors.contains_key(&user("me@eureka")));
        assert!(!neighbors.contains_key(&user("far@eureka")));
    }

    #[test]
    fn test_merge_shows_message_author_once() {
        let mut rng = rand::thread_rng();
        let mut messages = MessageMap::new();
        messages.insert(
            user("u1"),
            MessageEntry {
                content: "hi".into(),
                display_name: "u1".into(),
                avatar: AvatarId::round_robin(0),
                position: RenderPosition::for_message(&mut rng),
            },
        );
        let mut neighbors = NeighborSet::new();
        for id in ["u1", "u2"] {
            neighbors.insert(
                user(id),
                NeighborEntry {
                    display_name: id.into(),
                    avatar: AvatarId::round_robin(1),
                    position: RenderPosition::for_neighbor(&mut rng),
                },
            );
        }

        let merged = merge_entries(&messages, &neighbors);

        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged[&user("u1")].kind,
            EntryKind::Message {
                content: "hi".into()
            }
        );
        assert_eq!(merged[&user("u2")].kind, EntryKind::Neighbor);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shout_reveals_cell_mates_not_self() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        let talker = session(&store, "talker@eureka", 1);
        let lurker = session(&store, "lurker@eureka", 2);
        for s in [&local, &talker, &lurker] {
            s.update_location(WYDM.0, WYDM.1).await.unwrap();
        }
        talker.shout(Some("hi".into())).await.unwrap();

        local.shout(None).await.unwrap();

        let mut view = local.watch();
        let merged = wait_for_view(&mut view, |v| v.neighbor_count() == 1)
            .await
            .unwrap();
        assert_eq!(merged.entries.len(), 2);
        assert!(merged.entry(&user("me@eureka")).is_none());
        assert_eq!(merged.entry(&user("talker@eureka")).unwrap().content(), Some("hi"));
        assert_eq!(
            merged.entry(&user("lurker@eureka")).unwrap().kind,
            EntryKind::Neighbor
        );
    }
}
