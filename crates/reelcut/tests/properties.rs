//! Randomized checks of the reducers' invariants.

use std::collections::BTreeSet;

use reelcut_core::{
    Clip, ClipEffect, ClipEvent, ClipTimeline, DatabaseId, FrontendId, IdAllocator, Machine,
    PlaybackEvent, PlaybackState,
};
use reelcut_testing::{fid, row};

const SEEDS: u64 = 200;

#[test]
fn rows_promote_pending_clips_in_detection_order() {
    for seed in 0..SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let ids = IdAllocator::sequential();
        let mut timeline = ClipTimeline::new();
        let total = rng.usize(1..20);
        let (mut detected, mut arrived) = (0, 0);

        while arrived < total {
            let can_detect = detected < total;
            let can_arrive = arrived < detected;
            if can_detect && (!can_arrive || rng.bool()) {
                timeline = timeline
                    .reduce(
                        &ids,
                        &ClipEvent::OptimisticClipDetected {
                            scene: format!("scene-{detected}"),
                        },
                    )
                    .state;
                detected += 1;
            } else {
                let batch = rng.usize(1..=detected - arrived);
                let rows = (arrived..arrived + batch)
                    .map(|n| row(&n.to_string(), n as f64, n as f64 + 1.0))
                    .collect();
                timeline = timeline
                    .reduce(&ids, &ClipEvent::DatabaseClipsArrived { clips: rows })
                    .state;
                arrived += batch;
            }
        }

        assert_eq!(timeline.len(), total, "seed {seed}");
        for (n, clip) in timeline.clips().iter().enumerate() {
            let Clip::Persisted(clip) = clip else {
                panic!("seed {seed}: clip {n} still optimistic");
            };
            assert_eq!(clip.database_id, DatabaseId::new(n.to_string()), "seed {seed}");
            assert_eq!(clip.scene.as_deref(), Some(format!("scene-{n}").as_str()));
            assert_eq!(clip.frontend_id, fid(n as u128 + 1), "frontend id kept");
        }
    }
}

#[test]
fn rows_of_deleted_pending_clips_are_archived_exactly_once() {
    for seed in 0..SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let ids = IdAllocator::sequential();
        let total = rng.usize(1..15);

        let mut timeline = ClipTimeline::new();
        for n in 0..total {
            timeline = timeline
                .reduce(
                    &ids,
                    &ClipEvent::OptimisticClipDetected {
                        scene: format!("scene-{n}"),
                    },
                )
                .state;
        }

        let deleted: Vec<usize> = (0..total).filter(|_| rng.bool()).collect();
        let frontend_ids = deleted.iter().map(|n| fid(*n as u128 + 1)).collect();
        timeline = timeline
            .reduce(&ids, &ClipEvent::ClipsDeleted { frontend_ids })
            .state;
        assert_eq!(timeline.len(), total, "soft delete keeps every pending clip");

        let rows = (0..total)
            .map(|n| row(&n.to_string(), 0.0, 1.0))
            .collect();
        let out = timeline.reduce(&ids, &ClipEvent::DatabaseClipsArrived { clips: rows });

        let archived: Vec<DatabaseId> = out
            .effects
            .iter()
            .filter_map(|effect| match effect {
                ClipEffect::ArchiveClips { database_ids } => Some(database_ids.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        let expected: Vec<DatabaseId> = deleted
            .iter()
            .map(|n| DatabaseId::new(n.to_string()))
            .collect();
        assert_eq!(archived, expected, "seed {seed}");
        assert_eq!(out.state.len(), total - deleted.len(), "seed {seed}");
        assert!(out.state.clips().iter().all(|clip| !clip.is_optimistic()));
    }
}

fn random_playback_event(rng: &mut fastrand::Rng, ids: &[FrontendId]) -> PlaybackEvent {
    match rng.u8(0..13) {
        0 | 1 | 2 => PlaybackEvent::ClickClip {
            clip_id: ids[rng.usize(..ids.len())],
            shift: rng.u8(0..4) == 0,
            ctrl: rng.u8(0..4) == 0,
        },
        3 => PlaybackEvent::PressArrowLeft,
        4 => PlaybackEvent::PressArrowRight,
        5 => PlaybackEvent::PressHome,
        6 => PlaybackEvent::PressEnd,
        7 => PlaybackEvent::PressSpaceBar,
        8 => PlaybackEvent::PressEnter,
        9 => PlaybackEvent::ClipFinished,
        10 => PlaybackEvent::PressK,
        11 => PlaybackEvent::PressL,
        _ => PlaybackEvent::UpdateClipCurrentTime {
            secs: rng.f64() * 10.0,
        },
    }
}

#[test]
fn preload_set_only_grows_and_covers_current_and_selection() {
    for seed in 0..SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let ids: Vec<FrontendId> = (1..=rng.u128(1..12)).map(fid).collect();
        let mut state = PlaybackState::new().starting_at(&ids, ids[0]);

        for _ in 0..60 {
            let event = random_playback_event(&mut rng, &ids);
            let next = state.reduce(&ids, &event).state;

            assert!(
                next.preloaded().is_superset(state.preloaded()),
                "seed {seed}: {event:?} dropped a preloaded clip"
            );
            if let Some(current) = next.current_clip() {
                assert!(next.preloaded().contains(&current), "seed {seed}: {event:?}");
            }
            assert!(next.preloaded().is_superset(next.selected()), "seed {seed}: {event:?}");
            if let Some(anchor) = next.last_selected() {
                assert!(next.selected().contains(&anchor), "seed {seed}: {event:?}");
            }
            state = next;
        }
    }
}

#[test]
fn reducers_are_deterministic() {
    for seed in 0..SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let ids: Vec<FrontendId> = (1..=rng.u128(1..8)).map(fid).collect();
        let mut state = PlaybackState::new().starting_at(&ids, ids[0]);

        for _ in 0..30 {
            let event = random_playback_event(&mut rng, &ids);
            let first = state.reduce(&ids, &event);
            let again = state.reduce(&ids, &event);
            assert_eq!(first, again, "seed {seed}: {event:?}");
            state = first.state;
        }

        let survivors: BTreeSet<FrontendId> = ids.iter().copied().filter(|_| rng.bool()).collect();
        let remaining: Vec<FrontendId> = ids.iter().copied().filter(|id| survivors.contains(id)).collect();
        let pruned = state
            .reduce(
                &remaining,
                &PlaybackEvent::ClipsUpdatedFromExternalSource {
                    ids: remaining.clone(),
                },
            )
            .state;
        assert!(pruned.selected().iter().all(|id| survivors.contains(id)));
        match remaining.first() {
            Some(_) => assert!(pruned
                .current_clip()
                .is_some_and(|current| survivors.contains(&current))),
            None => assert_eq!(pruned.current_clip(), None),
        }
    }
}
