//! Integration Tests for the Watch API
//!
//! These tests verify that sources, flush timings, cleanup hooks and the
//! scheduler work together correctly.

mod common;

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use lattice_watch::config;
use lattice_watch::error::{ErrorContext, WatchError};
use lattice_watch::prelude::*;
use lattice_watch::scheduler::has_pending_jobs;

use common::init_tracing;

type Calls = Arc<Mutex<Vec<(Value, Value)>>>;

fn recorder() -> (Calls, impl Fn(&Value, &Value, &OnCleanup) + Send + Sync + 'static) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    (calls, move |new: &Value, old: &Value, _: &OnCleanup| {
        sink.lock().push((new.clone(), old.clone()));
    })
}

/// Setting a ref to the value it already holds does not fire; a real change
/// fires once with the new and old values.
#[test]
fn ref_watch_fires_only_on_change() {
    init_tracing();
    let count = Ref::new(1);
    let (calls, callback) = recorder();

    watch(count.clone(), callback, WatchOptions::new(), None);

    count.set(1);
    flush_jobs();
    assert!(calls.lock().is_empty());

    count.set(2);
    flush_jobs();
    assert_eq!(*calls.lock(), vec![(Value::from(2), Value::from(1))]);
}

/// A getter whose result does not change does not fire, even if the state it
/// read did.
#[test]
fn getter_watch_compares_results() {
    init_tracing();
    let count = Ref::new(1);
    let (calls, callback) = recorder();

    let parity = {
        let count = count.clone();
        WatchSource::getter(move || {
            let n = count.get().as_number().unwrap_or(0.0) as i64;
            Value::from(n % 2 == 0)
        })
    };
    watch(parity, callback, WatchOptions::new(), None);

    count.set(3);
    flush_jobs();
    assert!(calls.lock().is_empty());

    count.set(4);
    flush_jobs();
    assert_eq!(*calls.lock(), vec![(Value::from(true), Value::from(false))]);
}

/// Watching a reactive object is deep: a nested write fires once, and the new
/// and old values are the same object.
#[test]
fn reactive_object_watch_is_deep() {
    init_tracing();
    let state = ReactiveObject::new();
    state.set("a", 1);
    let (calls, callback) = recorder();

    watch(state.clone(), callback, WatchOptions::new(), None);

    state.set("a", 2);
    flush_jobs();

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    let (new, old) = &calls[0];
    assert_eq!(new, old);
    assert_eq!(new.to_json(), serde_json::json!({ "a": 2 }));
}

/// `deep` on a getter source tracks everything inside the returned object.
#[test]
fn deep_option_tracks_nested_state() {
    init_tracing();
    let inner = ReactiveObject::new();
    inner.set("x", 1);
    let outer = ReactiveObject::new();
    outer.set("inner", inner.clone());
    let (calls, callback) = recorder();

    let source = {
        let outer = outer.clone();
        WatchSource::getter(move || outer.get("inner"))
    };
    watch(source.clone(), callback, WatchOptions::new().deep(true), None);

    let shallow = Arc::new(AtomicI32::new(0));
    {
        let shallow = shallow.clone();
        watch(
            source,
            move |_, _, _| {
                shallow.fetch_add(1, Ordering::SeqCst);
            },
            WatchOptions::new(),
            None,
        );
    }

    inner.set("x", 2);
    flush_jobs();

    assert_eq!(calls.lock().len(), 1);
    assert_eq!(shallow.load(Ordering::SeqCst), 0);
}

/// A multi-source watch compares position by position and passes the whole
/// previous tuple as the old value.
#[test]
fn multi_source_watch_passes_full_tuples() {
    init_tracing();
    let a = Ref::new(0);
    let b = Ref::new(0);
    let (calls, callback) = recorder();

    watch(
        WatchSource::multi([a.clone(), b.clone()]),
        callback,
        WatchOptions::new(),
        None,
    );

    b.set(5);
    flush_jobs();

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    let (new, old) = &calls[0];
    assert_eq!(new.to_json(), serde_json::json!([0, 5]));
    assert_eq!(old.to_json(), serde_json::json!([0, 0]));
}

/// A plain array of refs converts into a multi-source.
#[test]
fn array_value_converts_to_multi_source() {
    init_tracing();
    let a = Ref::new("x");
    let (calls, callback) = recorder();

    let source = Value::array(vec![a.clone().into(), Ref::new(1).into()]);
    watch(source, callback, WatchOptions::new(), None);

    a.set("y");
    flush_jobs();
    assert_eq!(calls.lock().len(), 1);
}

/// Sync watchers never batch: every write fires.
#[test]
fn sync_watch_fires_per_write() {
    init_tracing();
    let count = Ref::new(0);
    let (calls, callback) = recorder();

    watch(
        count.clone(),
        callback,
        WatchOptions::new().flush(FlushTiming::Sync),
        None,
    );

    for n in 1..=3 {
        count.set(n);
    }

    assert_eq!(calls.lock().len(), 3);
    assert!(!has_pending_jobs());
}

/// Pre and post watchers batch every write in a tick into one run that sees
/// the final state.
#[test]
fn pre_and_post_watches_batch() {
    init_tracing();
    for flush in [FlushTiming::Pre, FlushTiming::Post] {
        let count = Ref::new(0);
        let (calls, callback) = recorder();

        watch(count.clone(), callback, WatchOptions::new().flush(flush), None);

        for n in 1..=3 {
            count.set(n);
        }
        assert!(calls.lock().is_empty());

        flush_jobs();
        assert_eq!(*calls.lock(), vec![(Value::from(3), Value::from(0))]);
    }
}

/// Pre jobs run before post jobs within one flush.
#[test]
fn pre_runs_before_post() {
    init_tracing();
    let count = Ref::new(0);
    let order = Arc::new(Mutex::new(Vec::new()));

    for (label, flush) in [("post", FlushTiming::Post), ("pre", FlushTiming::Pre)] {
        let order = order.clone();
        watch(
            count.clone(),
            move |_, _, _| order.lock().push(label),
            WatchOptions::new().flush(flush),
            None,
        );
    }

    count.set(1);
    flush_jobs();
    assert_eq!(*order.lock(), vec!["pre", "post"]);
}

/// Stopping a watch cancels jobs that are already queued.
#[test]
fn stop_cancels_queued_job() {
    init_tracing();
    let count = Ref::new(0);
    let (calls, callback) = recorder();

    let handle = watch(count.clone(), callback, WatchOptions::new(), None);
    count.set(1);
    assert!(has_pending_jobs());

    handle.stop();
    handle.stop();
    flush_jobs();

    assert!(calls.lock().is_empty());
    assert!(!handle.is_active());
    assert_eq!(count.subscriber_count(), 0);
}

/// `immediate` fires during registration with an `Undefined` old value.
#[test]
fn immediate_fires_on_registration() {
    init_tracing();
    let count = Ref::new(7);
    let (calls, callback) = recorder();

    watch(count, callback, WatchOptions::new().immediate(true), None);

    assert_eq!(*calls.lock(), vec![(Value::from(7), Value::Undefined)]);
}

/// A cleanup registered during one run executes exactly once, before the
/// next run, or when the watch stops.
#[test]
fn cleanup_runs_before_next_invocation_and_on_stop() {
    init_tracing();
    let count = Ref::new(0);
    let log = Arc::new(Mutex::new(Vec::new()));

    let handle = {
        let count = count.clone();
        let log = log.clone();
        watch_effect(
            move |on_cleanup| {
                let n = count.get();
                log.lock().push(format!("run {n}"));
                let log = log.clone();
                on_cleanup.register(move || log.lock().push(format!("cleanup {n}")));
            },
            WatchEffectOptions::new(),
            None,
        )
    };

    count.set(1);
    flush_jobs();
    handle.stop();
    handle.stop();

    assert_eq!(
        *log.lock(),
        vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]
    );
}

/// Callback cleanups follow the same ordering as effect cleanups.
#[test]
fn callback_cleanup_runs_before_next_callback() {
    init_tracing();
    let count = Ref::new(0);
    let log = Arc::new(Mutex::new(Vec::new()));

    {
        let log = log.clone();
        watch(
            count.clone(),
            move |new, _, on_cleanup| {
                log.lock().push(format!("cb {new}"));
                let log = log.clone();
                let new = new.clone();
                on_cleanup.register(move || log.lock().push(format!("cleanup {new}")));
            },
            WatchOptions::new().flush(FlushTiming::Sync),
            None,
        );
    }

    count.set(1);
    count.set(2);
    assert_eq!(*log.lock(), vec!["cb 1", "cleanup 1", "cb 2"]);
}

/// A sync effect re-runs on every write.
#[test]
fn sync_effect_reruns_per_write() {
    init_tracing();
    let count = Ref::new(0);
    let runs = Arc::new(AtomicI32::new(0));

    {
        let count = count.clone();
        let runs = runs.clone();
        watch_sync_effect(
            move |_| {
                count.get();
                runs.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );
    }

    count.set(1);
    count.set(2);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

/// A post effect does not run until the first flush.
#[test]
fn post_effect_first_run_is_deferred() {
    init_tracing();
    let runs = Arc::new(AtomicI32::new(0));

    {
        let runs = runs.clone();
        watch_post_effect(
            move |_| {
                runs.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    flush_jobs();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// A post effect stopped before its deferred first run never runs.
#[test]
fn stopped_post_effect_never_runs() {
    init_tracing();
    let runs = Arc::new(AtomicI32::new(0));

    let handle = {
        let runs = runs.clone();
        watch_post_effect(
            move |_| {
                runs.fetch_add(1, Ordering::SeqCst);
            },
            None,
        )
    };
    handle.stop();
    flush_jobs();

    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

/// An effect that stops itself mid-run drops every dependency, including
/// the ones it reads after stopping.
#[test]
fn effect_stopped_from_its_own_body_releases_dependencies() {
    init_tracing();
    let a = Ref::new(0);
    let b = Ref::new(0);
    let slot: Arc<Mutex<Option<WatchHandle>>> = Arc::new(Mutex::new(None));

    let handle = {
        let (a, b, slot) = (a.clone(), b.clone(), slot.clone());
        watch_sync_effect(
            move |_| {
                if a.get() == Value::from(1) {
                    let own = slot.lock().take();
                    if let Some(own) = own {
                        own.stop();
                    }
                }
                b.get();
            },
            None,
        )
    };
    *slot.lock() = Some(handle.clone());
    assert_eq!(b.subscriber_count(), 1);

    a.set(1);

    assert!(!handle.is_active());
    assert_eq!(a.subscriber_count(), 0);
    assert_eq!(b.subscriber_count(), 0);

    b.set(2);
    assert!(!handle.is_active());
}

/// Reads made by a sync callback are not tracked by the effect whose write
/// fired it.
#[test]
fn sync_callback_reads_stay_out_of_outer_effect() {
    init_tracing();
    let a = Ref::new(0);
    let c = Ref::new(0);
    let callbacks = Arc::new(AtomicI32::new(0));
    let outer_runs = Arc::new(AtomicI32::new(0));

    {
        let c = c.clone();
        let callbacks = callbacks.clone();
        watch(
            a.clone(),
            move |_: &Value, _: &Value, _: &OnCleanup| {
                c.get();
                callbacks.fetch_add(1, Ordering::SeqCst);
            },
            WatchOptions::new().flush(FlushTiming::Sync),
            None,
        );
    }
    {
        let a = a.clone();
        let outer_runs = outer_runs.clone();
        watch_sync_effect(
            move |_| {
                let run = outer_runs.fetch_add(1, Ordering::SeqCst) + 1;
                a.set(run);
            },
            None,
        );
    }
    assert_eq!(outer_runs.load(Ordering::SeqCst), 1);
    assert_eq!(callbacks.load(Ordering::SeqCst), 1);
    assert_eq!(c.subscriber_count(), 0);

    c.set(5);
    assert_eq!(outer_runs.load(Ordering::SeqCst), 1);
    assert_eq!(callbacks.load(Ordering::SeqCst), 1);
}

/// Before its instance mounts, a pre watcher runs synchronously; afterwards
/// it is queued.
#[test]
fn pre_watch_on_unmounted_instance_runs_synchronously() {
    init_tracing();
    let instance = ComponentInstance::new("Counter");
    let count = Ref::new(0);
    let (calls, callback) = recorder();

    watch(count.clone(), callback, WatchOptions::new(), Some(&instance));

    count.set(1);
    assert_eq!(calls.lock().len(), 1);

    instance.mount();
    count.set(2);
    assert_eq!(calls.lock().len(), 1);
    flush_jobs();
    assert_eq!(calls.lock().len(), 2);
}

/// Unmounting an instance stops every watcher it owns; a watcher stopped by
/// hand leaves its scope.
#[test]
fn unmount_stops_owned_watchers() {
    init_tracing();
    let instance = ComponentInstance::new("Panel");
    instance.mount();
    let count = Ref::new(0);

    let (calls, callback) = recorder();
    let kept = watch(count.clone(), callback, WatchOptions::new(), Some(&instance));
    let stopped = watch(count.clone(), |_, _, _| {}, WatchOptions::new(), Some(&instance));
    assert_eq!(instance.scope().len(), 2);

    stopped.stop();
    assert_eq!(instance.scope().len(), 1);

    instance.unmount();
    assert!(!kept.is_active());

    count.set(1);
    flush_jobs();
    assert!(calls.lock().is_empty());
}

/// The body of an effect owned by a destroyed instance is skipped.
#[test]
fn effect_of_destroyed_instance_is_skipped() {
    init_tracing();
    let instance = ComponentInstance::new("Gone");
    let runs = Arc::new(AtomicI32::new(0));

    let handle = {
        let runs = runs.clone();
        watch_effect(
            move |_| {
                runs.fetch_add(1, Ordering::SeqCst);
            },
            WatchEffectOptions::new(),
            Some(&instance),
        )
    };
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    instance.unmount();
    handle.effect().run();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// Watching something that is not a source warns and never fires.
#[test]
fn invalid_source_warns() {
    init_tracing();
    let warnings = Arc::new(Mutex::new(Vec::new()));
    {
        let warnings = warnings.clone();
        config::configure(|config| {
            config.warn_handler = Some(Arc::new(move |error: &WatchError| {
                warnings.lock().push(error.clone());
            }));
        });
    }

    let calls = Arc::new(AtomicI32::new(0));
    {
        let calls = calls.clone();
        watch(
            Value::from(42),
            move |_, _, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            },
            WatchOptions::new(),
            None,
        );
    }
    flush_jobs();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        warnings.lock().as_slice(),
        [WatchError::InvalidSource(_)]
    ));
    config::reset();
}

/// A panicking callback is reported and does not keep the rest of the flush
/// from running.
#[test]
fn panicking_callback_is_isolated() {
    init_tracing();
    let errors = Arc::new(Mutex::new(Vec::new()));
    {
        let errors = errors.clone();
        config::configure(|config| {
            config.error_handler = Some(Arc::new(move |error: &WatchError| {
                errors.lock().push(error.clone());
            }));
        });
    }

    let count = Ref::new(0);
    watch(
        count.clone(),
        |_, _, _| panic!("callback failed"),
        WatchOptions::new(),
        None,
    );
    let (calls, callback) = recorder();
    watch(count.clone(), callback, WatchOptions::new(), None);

    count.set(1);
    flush_jobs();

    assert_eq!(calls.lock().len(), 1);
    assert_eq!(
        *errors.lock(),
        vec![WatchError::UserCode {
            context: ErrorContext::WatchCallback,
            message: "callback failed".to_string(),
        }]
    );
    config::reset();
}

/// Options can be read from JSON.
#[test]
fn options_from_json() {
    let options = WatchOptions::from_json(r#"{ "immediate": true, "flush": "sync" }"#).unwrap();
    assert!(options.immediate);
    assert!(!options.deep);
    assert_eq!(options.flush, FlushTiming::Sync);
}
