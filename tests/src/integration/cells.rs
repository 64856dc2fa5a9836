//! # Cell Clustering
//!
//! Nearby coordinates share a cell and therefore a subscription; distant
//! ones do not.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{session, user};
    use eu_01_geocell::{decode_bounds, encode};
    use eu_02_shout::testing::wait_for_view;
    use eu_02_shout::ShoutApi;
    use proptest::prelude::*;
    use shared_bus::InMemoryPresenceStore;
    use shared_types::CellId;
    use std::sync::Arc;

    // Roughly 1 km apart, well inside one 4-character cell.
    const SEOCHO: (f64, f64) = (37.48, 127.01);
    const GANGNAM: (f64, f64) = (37.49, 127.02);
    const BUSAN: (f64, f64) = (35.18, 129.08);

    #[tokio::test(start_paused = true)]
    async fn test_nearby_users_see_each_other() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        let peer = session(&store, "peer@eureka", 1);

        let a = local.update_location(SEOCHO.0, SEOCHO.1).await.unwrap();
        let b = peer.update_location(GANGNAM.0, GANGNAM.1).await.unwrap();
        assert_eq!(a.cell(), b.cell());

        peer.shout(Some("JMT!".into())).await.unwrap();
        let mut view = local.watch();
        let seen = wait_for_view(&mut view, |v| v.message_count() == 1)
            .await
            .unwrap();
        assert_eq!(seen.messages()[&user("peer@eureka")], "JMT!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_distant_users_are_isolated() {
        let store = Arc::new(InMemoryPresenceStore::new());
        let local = session(&store, "me@eureka", 0);
        let peer = session(&store, "peer@eureka", 1);

        local.update_location(SEOCHO.0, SEOCHO.1).await.unwrap();
        let far = peer.update_location(BUSAN.0, BUSAN.1).await.unwrap();
        assert_ne!(far.cell(), &CellId::new("wydm"));

        peer.shout(Some("Hungry!".into())).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(local.view().messages().is_empty());
        assert_eq!(store.subscribed_cells().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_same_cell_pairs_cluster(
            lat in -85.0f64..85.0,
            lon in -175.0f64..175.0,
            fy in 0.0f64..0.999,
            fx in 0.0f64..0.999,
        ) {
            let cell = encode(lat, lon).unwrap();
            let bounds = decode_bounds(&cell).unwrap();
            let peer_lat = bounds.min_lat + fy * bounds.lat_span();
            let peer_lon = bounds.min_lon + fx * bounds.lon_span();
            prop_assert_eq!(encode(peer_lat, peer_lon).unwrap(), cell);
        }

        #[test]
        fn prop_pairs_beyond_one_cell_split(
            lat in -85.0f64..85.0,
            lon in -170.0f64..170.0,
            distance in 0.36f64..5.0,
        ) {
            // A 4-character cell spans 0.35 degrees of longitude.
            prop_assert_ne!(encode(lat, lon).unwrap(), encode(lat, lon + distance).unwrap());
        }
    }
}
