//! Property-based tests for the task store's collection invariants.
//!
//! Uses proptest to drive random sequences of creates, updates, deletes
//! and completion toggles, some of them failing, and verifies after every
//! step:
//! 1. Cached ids stay unique.
//! 2. A successful create grows the list by one, a successful delete
//!    shrinks it by one, everything else leaves the length alone.
//! 3. A failed operation changes no items and records a message.
//! 4. Every cached task matches the service's copy.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use taskdeck::api::ApiError;
use taskdeck::api::memory::{InMemoryTaskApi, Operation};
use taskdeck::auth::AuthFlag;
use taskdeck::store::TaskStore;
use taskdeck_proto::task::{CreateTaskRequest, Task, TaskId, TaskStatus, UpdateTaskRequest};

/// One store call. `fail` injects a service failure for that call.
#[derive(Debug, Clone)]
enum Step {
    Create { title: String, fail: bool },
    Update { pick: usize, title: String, fail: bool },
    Delete { pick: usize, fail: bool },
    Toggle { pick: usize, fail: bool },
}

fn arb_title() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{2,30}"
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (arb_title(), any::<bool>()).prop_map(|(title, fail)| Step::Create { title, fail }),
        (any::<usize>(), arb_title(), any::<bool>())
            .prop_map(|(pick, title, fail)| Step::Update { pick, title, fail }),
        (any::<usize>(), any::<bool>()).prop_map(|(pick, fail)| Step::Delete { pick, fail }),
        (any::<usize>(), any::<bool>()).prop_map(|(pick, fail)| Step::Toggle { pick, fail }),
    ]
}

fn seed(n: usize) -> Vec<Task> {
    (0..n)
        .map(|i| Task::new(format!("seed-{i}"), format!("Seed {i}"), TaskStatus::Todo))
        .collect()
}

/// Picks a cached id, or an id the service has never seen.
fn target(items: &[Task], pick: usize) -> (TaskId, bool) {
    if items.is_empty() {
        (TaskId::new("ghost"), false)
    } else {
        (items[pick % items.len()].id.clone(), true)
    }
}

/// Runs `step` and returns the expected change in length, or `None` if
/// the call was expected to fail.
async fn run_step(
    store: &TaskStore<InMemoryTaskApi, AuthFlag>,
    api: &InMemoryTaskApi,
    step: &Step,
) -> Option<isize> {
    let items = store.tasks();
    match step {
        Step::Create { title, fail } => {
            if *fail {
                api.fail_next(Operation::Create, ApiError::Timeout);
            }
            let ok = store.create(&CreateTaskRequest::new(title.clone())).await.is_ok();
            assert_eq!(ok, !*fail);
            ok.then_some(1)
        }
        Step::Update { pick, title, fail } => {
            let (id, cached) = target(&items, *pick);
            if *fail && cached {
                api.fail_next(Operation::Update, ApiError::Timeout);
            }
            let ok = store
                .update(&id, &UpdateTaskRequest::default().with_title(title.clone()))
                .await
                .is_ok();
            assert_eq!(ok, cached && !*fail);
            ok.then_some(0)
        }
        Step::Delete { pick, fail } => {
            let (id, cached) = target(&items, *pick);
            if *fail && cached {
                api.fail_next(Operation::Delete, ApiError::Timeout);
            }
            let ok = store.delete(&id).await;
            assert_eq!(ok, cached && !*fail);
            ok.then_some(-1)
        }
        Step::Toggle { pick, fail } => {
            let (id, cached) = target(&items, *pick);
            if *fail && cached {
                api.fail_next(Operation::Update, ApiError::Timeout);
            }
            let ok = store.toggle_completion(&id, None).await;
            assert_eq!(ok, cached && !*fail);
            // Toggling an uncached id is a quiet no-op.
            (ok || !cached).then_some(0)
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn collection_invariants_hold(
        seeded in 0usize..8,
        steps in prop::collection::vec(arb_step(), 1..40),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let api = InMemoryTaskApi::with_tasks(seed(seeded));
            let store = TaskStore::new(api.clone(), AuthFlag::new(true));
            store.load_page(1, 50).await;
            assert_eq!(store.tasks().len(), seeded);

            for step in &steps {
                let before = store.tasks();
                store.clear_error();

                let outcome = run_step(&store, &api, step).await;
                let after = store.tasks();

                let unique: HashSet<&TaskId> = after.iter().map(|t| &t.id).collect();
                assert_eq!(unique.len(), after.len(), "duplicate ids after {step:?}");

                match outcome {
                    Some(delta) => {
                        let expected = before.len().checked_add_signed(delta).unwrap();
                        assert_eq!(after.len(), expected, "length after {step:?}");
                    }
                    None => {
                        assert_eq!(after, before, "items changed by failed {step:?}");
                        assert!(store.error().is_some(), "no message after failed {step:?}");
                    }
                }
                assert!(!store.is_loading());

                let remote = api.tasks();
                for task in &after {
                    assert!(remote.contains(task), "cached {task:?} diverged from service");
                }
            }
        });
    }
}
