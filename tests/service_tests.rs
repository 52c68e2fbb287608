//! MapService unit tests

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use map_render_coordinator::error::{MapError, Result};
    use map_render_coordinator::host::{HostAdapter, HostLocation, HostPlayer};
    use map_render_coordinator::markers::MarkerApi;
    use map_render_coordinator::protocol::{subjects, PlayerChat, PlayerJoinQuit, WebBroadcast, WebEvent};
    use map_render_coordinator::relay::WebChannel;
    use map_render_coordinator::service::MapService;
    use map_render_coordinator::types::{
        BlockPos, CoordinatorConfig, HorizontalBounds, JobClass, WorldConfig,
    };
    use map_render_coordinator::MapApi;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Records every publish; can be switched "down".
    #[derive(Default)]
    struct RecordingChannel {
        frames: Mutex<Vec<(String, Bytes)>>,
        down: AtomicBool,
    }

    impl RecordingChannel {
        fn subjects(&self) -> Vec<String> {
            self.frames.lock().iter().map(|(s, _)| s.clone()).collect()
        }
    }

    impl WebChannel for RecordingChannel {
        fn publish(&self, subject: &str, payload: Bytes) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(MapError::RelayFailure("down".into()));
            }
            self.frames.lock().push((subject.to_string(), payload));
            Ok(())
        }
    }

    fn make_service() -> (Arc<MapService>, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::default());
        let config = CoordinatorConfig {
            tile_size: 32,
            worlds: vec![
                WorldConfig::unbounded("world"),
                WorldConfig {
                    name: "arena".into(),
                    min_y: 0,
                    max_y: 127,
                    bounds: Some(HorizontalBounds {
                        min_x: 0,
                        max_x: 95,
                        min_z: 0,
                        max_z: 63,
                    }),
                },
            ],
            ..Default::default()
        };
        let svc = Arc::new(MapService::new(config, channel.clone()));
        (svc, channel)
    }

    fn p(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(x, y, z)
    }

    // -----------------------------------------------------------------------
    // Render triggers
    // -----------------------------------------------------------------------

    #[test]
    fn trigger_volume_counts_tiles() {
        let (svc, _) = make_service();
        assert_eq!(svc.trigger_render_of_volume("world", p(0, 0, 0), p(31, 0, 31)).unwrap(), 1);
        assert_eq!(svc.trigger_render_of_volume("world", p(0, 0, 0), p(63, 0, 31)).unwrap(), 2);
        // Tile (0,0) was already pending: still two tiles queued in total.
        assert_eq!(svc.stats().pending_update, 2);
        assert_eq!(svc.stats().pending_full, 0);
    }

    #[test]
    fn trigger_block_queues_one_tile() {
        let (svc, _) = make_service();
        assert_eq!(svc.trigger_render_of_block("world", -5, 70, 12), 1);
        assert_eq!(svc.queue().pending(JobClass::Update), 1);
    }

    #[test]
    fn trigger_block_outside_build_height_queues_its_column() {
        let (svc, _) = make_service();
        assert_eq!(svc.trigger_render_of_block("world", 0, 400, 0), 1);
        assert_eq!(svc.trigger_render_of_block("world", 0, -100, 0), 1);
        // Arena's max_y is 127; the block still lies within its x/z bounds.
        assert_eq!(svc.trigger_render_of_block("arena", 40, 500, 40), 1);
        assert_eq!(svc.stats().pending_update, 2);
    }

    #[test]
    fn oversized_volume_is_rejected_quickly_and_nothing_queued() {
        let (svc, _) = make_service();
        let started = Instant::now();
        let err = svc
            .trigger_render_of_volume("world", p(-30_000_000, 0, -30_000_000), p(30_000_000, 0, 30_000_000))
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(1));
        match err {
            MapError::VolumeTooLarge { tiles, limit } => {
                assert!(tiles > limit);
                assert_eq!(limit, svc.config().max_tiles_per_request);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(svc.queue().is_empty());
    }

    #[test]
    fn volume_at_the_tile_limit_is_accepted() {
        let channel = Arc::new(RecordingChannel::default());
        let config = CoordinatorConfig {
            max_tiles_per_request: 4,
            ..Default::default()
        };
        let svc = MapService::new(config, channel);
        assert_eq!(svc.trigger_render_of_volume("world", p(0, 0, 0), p(63, 0, 63)).unwrap(), 4);
        assert!(matches!(
            svc.trigger_render_of_volume("world", p(0, 0, 0), p(95, 0, 63)),
            Err(MapError::VolumeTooLarge { tiles: 6, limit: 4 })
        ));
        assert_eq!(svc.stats().pending_update, 4);
    }

    #[test]
    fn invalid_volume_is_rejected_and_nothing_queued() {
        let (svc, _) = make_service();
        let err = svc
            .trigger_render_of_volume("world", p(10, 0, 0), p(0, 0, 0))
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidVolume { axis: 'x', .. }));
        assert!(svc.queue().is_empty());
    }

    #[test]
    fn unknown_world_queues_nothing() {
        let (svc, _) = make_service();
        assert_eq!(svc.trigger_render_of_volume("nether", p(0, 0, 0), p(100, 0, 100)).unwrap(), 0);
        assert_eq!(svc.trigger_render_of_block("nether", 0, 0, 0), 0);
        assert!(svc.queue().is_empty());
    }

    #[test]
    fn full_render_of_bounded_world() {
        let (svc, _) = make_service();
        assert_eq!(svc.queue_full_render("arena").unwrap(), 6);
        assert_eq!(svc.stats().pending_full, 6);
        assert_eq!(svc.queue_full_render("world").unwrap(), 0);
        assert!(matches!(
            svc.queue_full_render("nether"),
            Err(MapError::UnknownWorld(_))
        ));
        assert_eq!(svc.cancel_renders(JobClass::Full), 6);
    }

    // -----------------------------------------------------------------------
    // Pause flags
    // -----------------------------------------------------------------------

    #[test]
    fn pause_flags_are_independent() {
        let (svc, _) = make_service();
        assert!(!svc.get_pause_full_radius_renders());
        assert!(!svc.get_pause_update_renders());

        svc.set_pause_full_radius_renders(true);
        assert!(svc.get_pause_full_radius_renders());
        assert!(!svc.get_pause_update_renders());

        svc.set_pause_update_renders(true);
        svc.set_pause_full_radius_renders(false);
        assert!(!svc.get_pause_full_radius_renders());
        assert!(svc.get_pause_update_renders());
    }

    #[test]
    fn paused_updates_stay_queued() {
        let (svc, _) = make_service();
        svc.set_pause_update_renders(true);
        svc.trigger_render_of_block("world", 0, 0, 0);
        assert!(svc.drain(JobClass::Update, 10).is_empty());
        svc.set_pause_update_renders(false);
        assert_eq!(svc.drain(JobClass::Update, 10).len(), 1);
    }

    // -----------------------------------------------------------------------
    // Visibility + relay
    // -----------------------------------------------------------------------

    #[test]
    fn players_are_visible_by_default() {
        let (svc, _) = make_service();
        assert!(svc.get_player_visibility("alice"));
    }

    #[test]
    fn hidden_player_is_not_relayed() {
        let (svc, channel) = make_service();
        svc.set_player_visibility("alice", false);
        svc.post_player_message_to_web("alice", "Alice", "hi");
        svc.post_player_join_quit_to_web("alice", "Alice", true);
        assert!(channel.frames.lock().is_empty());
        assert_eq!(svc.stats().hidden_players, 1);

        svc.set_player_visibility("alice", true);
        svc.post_player_message_to_web("alice", "Alice", "hi again");
        assert_eq!(channel.subjects(), vec![subjects::PLAYER_CHAT.to_string()]);
        assert_eq!(svc.stats().hidden_players, 0);
    }

    #[test]
    fn player_chat_payload_is_enveloped() {
        let (svc, channel) = make_service();
        svc.post_player_message_to_web("bob", "Bob", "hello");
        svc.post_player_message_to_web("bob", "Bob", "again");

        let frames = channel.frames.lock();
        let first: WebEvent<PlayerChat> = serde_json::from_slice(&frames[0].1).unwrap();
        let second: WebEvent<PlayerChat> = serde_json::from_slice(&frames[1].1).unwrap();
        assert_eq!(first.payload.display_name, "Bob");
        assert_eq!(first.payload.message, "hello");
        assert_eq!(second.seq, first.seq + 1);
    }

    #[test]
    fn join_and_quit_use_separate_subjects() {
        let (svc, channel) = make_service();
        svc.post_player_join_quit_to_web("bob", "Bob", true);
        svc.post_player_join_quit_to_web("bob", "Bob", false);
        assert_eq!(
            channel.subjects(),
            vec![
                subjects::PLAYER_JOIN.to_string(),
                subjects::PLAYER_QUIT.to_string()
            ]
        );
        let quit: WebEvent<PlayerJoinQuit> =
            serde_json::from_slice(&channel.frames.lock()[1].1).unwrap();
        assert!(!quit.payload.joined);
    }

    #[test]
    fn broadcast_ignores_visibility() {
        let (svc, channel) = make_service();
        svc.set_player_visibility("Server", false);
        assert!(svc.send_broadcast_to_web(Some("Server"), "Hello"));
        let msg: WebEvent<WebBroadcast> =
            serde_json::from_slice(&channel.frames.lock()[0].1).unwrap();
        assert_eq!(msg.payload.sender.as_deref(), Some("Server"));
    }

    #[test]
    fn broadcast_with_channel_down_returns_false_and_leaves_state() {
        let (svc, channel) = make_service();
        svc.trigger_render_of_block("world", 0, 0, 0);
        svc.set_pause_full_radius_renders(true);
        channel.down.store(true, Ordering::SeqCst);

        assert!(!svc.send_broadcast_to_web(Some("Server"), "Hello"));

        let stats = svc.stats();
        assert_eq!(stats.pending_update, 1);
        assert!(stats.full_paused);
        assert!(!stats.update_paused);
    }

    #[test]
    fn player_relay_failure_is_swallowed() {
        let (svc, channel) = make_service();
        channel.down.store(true, Ordering::SeqCst);
        svc.post_player_message_to_web("bob", "Bob", "lost");
        svc.post_player_join_quit_to_web("bob", "Bob", true);
        assert!(channel.frames.lock().is_empty());
    }

    #[test]
    fn hidden_by_default_config() {
        let channel = Arc::new(RecordingChannel::default());
        let config = CoordinatorConfig {
            default_player_visible: false,
            ..Default::default()
        };
        let svc = MapService::new(config, channel.clone());
        assert!(!svc.get_player_visibility("carol"));
        svc.post_player_message_to_web("carol", "Carol", "hi");
        assert!(channel.frames.lock().is_empty());

        svc.set_player_visibility("carol", true);
        assert!(svc.get_player_visibility("carol"));
    }

    // -----------------------------------------------------------------------
    // Markers + version
    // -----------------------------------------------------------------------

    struct FixedMarkers;

    impl MarkerApi for FixedMarkers {
        fn marker_set_ids(&self) -> Vec<String> {
            vec!["markers".into()]
        }
    }

    #[test]
    fn marker_api_absent_until_installed() {
        let (svc, _) = make_service();
        assert!(!svc.marker_api_initialized());
        assert!(svc.marker_api().is_none());

        assert!(svc.markers().install(Arc::new(FixedMarkers)));
        assert!(!svc.markers().install(Arc::new(FixedMarkers)));
        assert!(svc.marker_api_initialized());
        let api = svc.marker_api().unwrap();
        assert_eq!(api.marker_set_ids(), vec!["markers".to_string()]);
    }

    #[test]
    fn core_version_has_build_suffix() {
        let (svc, _) = make_service();
        let version = svc.core_version();
        let (numbers, build) = version.split_once('-').unwrap();
        assert!(!build.is_empty());
        let parts: Vec<_> = numbers.split('.').collect();
        assert!(parts.len() == 2 || parts.len() == 3, "bad version {}", version);
        assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
    }

    // -----------------------------------------------------------------------
    // Host adapter
    // -----------------------------------------------------------------------

    #[test]
    fn host_adapter_plugin_version_comes_from_host() {
        let (svc, _) = make_service();
        let host = HostAdapter::new(svc.clone()).with_plugin_version("3.7-beta-2");
        assert_eq!(host.plugin_version(), "3.7-beta-2");
        assert_ne!(host.plugin_version(), svc.core_version());
    }

    #[test]
    fn host_adapter_plugin_version_falls_back_to_core() {
        let (svc, _) = make_service();
        let host = HostAdapter::new(svc.clone());
        assert_eq!(host.plugin_version(), svc.core_version());
    }

    struct Loc(&'static str, i32, i32, i32);

    impl HostLocation for Loc {
        fn world_id(&self) -> &str {
            self.0
        }

        fn block_pos(&self) -> BlockPos {
            BlockPos::new(self.1, self.2, self.3)
        }
    }

    struct Player(&'static str, &'static str);

    impl HostPlayer for Player {
        fn id(&self) -> &str {
            self.0
        }

        fn display_name(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn host_adapter_normalises_corners() {
        let (svc, _) = make_service();
        let host = HostAdapter::new(svc.clone());
        let queued = host
            .trigger_render_between(&Loc("world", 63, 10, 31), Some(&Loc("world", 0, 0, 0)))
            .unwrap();
        assert_eq!(queued, 2);
    }

    #[test]
    fn host_adapter_single_corner_is_a_point() {
        let (svc, _) = make_service();
        let host = HostAdapter::new(svc.clone());
        assert_eq!(host.trigger_render_between(&Loc("world", 5, 5, 5), None).unwrap(), 1);
    }

    #[test]
    fn host_adapter_rejects_mixed_worlds() {
        let (svc, _) = make_service();
        let host = HostAdapter::new(svc.clone());
        let err = host
            .trigger_render_between(&Loc("world", 0, 0, 0), Some(&Loc("arena", 1, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, MapError::WorldMismatch { .. }));
        assert!(svc.queue().is_empty());
    }

    #[test]
    fn host_adapter_player_calls() {
        let (svc, channel) = make_service();
        let host = HostAdapter::new(svc.clone() as Arc<dyn MapApi>);
        let dave = Player("dave", "Dave");

        host.set_player_visibility(&dave, false);
        assert!(!host.get_player_visibility(&dave));
        host.post_player_message_to_web(&dave, "hidden");
        assert!(channel.frames.lock().is_empty());

        host.set_player_visibility(&dave, true);
        host.post_player_join_quit_to_web(&dave, true);
        assert_eq!(channel.subjects(), vec![subjects::PLAYER_JOIN.to_string()]);
    }
}
