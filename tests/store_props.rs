use crablapse::config::TimelapseConfig;
use crablapse::session::SessionLedger;
use crablapse::store::FrameStore;
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> FrameStore {
    let mut config = TimelapseConfig::default();
    config.storage.frames_dir = dir.path().to_string_lossy().into_owned();
    FrameStore::new(&config.storage)
}

fn unique_sequences() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::hash_set(0u32..1000, 1..32)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    /// Listing order depends only on the embedded sequence number, never
    /// on the order frames were written in.
    #[test]
    fn prop_list_frames_sorted_for_any_write_order(sequences in unique_sequences()) {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for &sequence in &sequences {
            let name = format!("session_1_frame_{:04}_20260101_000000.jpg", sequence);
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let listed: Vec<u32> = store
            .list_frames(1)
            .iter()
            .map(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                name.split('_').nth(3).unwrap().parse().unwrap()
            })
            .collect();

        let mut expected = sequences.clone();
        expected.sort_unstable();
        prop_assert_eq!(listed, expected);
    }

    /// Session numbering is always max+1 over whatever is on disk.
    #[test]
    fn prop_next_session_id_is_max_plus_one(
        sessions in proptest::collection::hash_set(1u64..500, 0..12)
    ) {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for &session in &sessions {
            let name = format!("session_{}_frame_0000_20260101_000000.jpg", session);
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let ledger = SessionLedger::new(store);
        let expected = sessions.iter().max().map(|max| max + 1).unwrap_or(1);
        prop_assert_eq!(ledger.next_session_id(), expected);
    }
}
