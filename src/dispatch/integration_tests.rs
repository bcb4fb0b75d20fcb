use std::sync::{Arc, Mutex};

use crate::dispatch::Dispatcher;
use crate::errors::DispatchError;
use crate::scheduler::{current_kind, SchedulerContext};
use crate::traits::SchedulerKind;

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("negative input {0}")]
struct NegativeInput(i32);

async fn square(x: i32) -> anyhow::Result<i32> {
    if x < 0 {
        return Err(NegativeInput(x).into());
    }
    Ok(x * x)
}

fn explode() -> anyhow::Result<()> {
    panic!("callable blew up")
}

fn running_dispatcher() -> Dispatcher {
    let context = SchedulerContext::new().with_coroutine_workers(2);
    context.start_all().unwrap();
    Dispatcher::new(Arc::new(context))
}

/// A hop returns exactly what a direct call returns, for values and errors.
#[tokio::test]
async fn test_hop_matches_direct_call() {
    let dispatcher = running_dispatcher();

    for target in SchedulerKind::ALL {
        for x in [0, 3, 12, -4] {
            let direct = square(x).await;
            let hopped = dispatcher.call(target, move || square(x)).await;

            match (direct, hopped) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(DispatchError::Callback(b))) => {
                    assert_eq!(
                        a.downcast_ref::<NegativeInput>(),
                        b.downcast_ref::<NegativeInput>()
                    );
                    assert_eq!(b.downcast::<NegativeInput>().unwrap(), NegativeInput(x));
                }
                (direct, hopped) => panic!("mismatch for {}: {:?} vs {:?}", x, direct, hopped),
            }
        }
    }
    dispatcher.context().shutdown_all();
}

#[tokio::test]
async fn test_callable_runs_on_target_scheduler() {
    let dispatcher = running_dispatcher();

    for target in SchedulerKind::ALL {
        let seen = dispatcher
            .call(target, || async { Ok(current_kind()) })
            .await
            .unwrap();
        assert_eq!(seen, Some(target));
    }
    dispatcher.context().shutdown_all();
}

#[tokio::test]
async fn test_nested_hops_between_schedulers() {
    let dispatcher = running_dispatcher();
    let inner = dispatcher.clone();

    let (outer_kind, inner_kind) = dispatcher
        .call(SchedulerKind::Coroutine, move || async move {
            let back = inner
                .call(SchedulerKind::EventLoop, || async { Ok(current_kind()) })
                .await?;
            Ok((current_kind(), back))
        })
        .await
        .unwrap();

    assert_eq!(outer_kind, Some(SchedulerKind::Coroutine));
    assert_eq!(inner_kind, Some(SchedulerKind::EventLoop));
    dispatcher.context().shutdown_all();
}

#[tokio::test]
async fn test_panic_is_delivered_to_caller() {
    let dispatcher = running_dispatcher();

    let result = dispatcher
        .call(SchedulerKind::EventLoop, || async { explode() })
        .await;
    match result {
        Err(DispatchError::Panicked { message }) => assert_eq!(message, "callable blew up"),
        other => panic!("expected panic, got {:?}", other),
    }

    // the scheduler survives the panic
    let after = dispatcher
        .call(SchedulerKind::EventLoop, || async { Ok(1) })
        .await
        .unwrap();
    assert_eq!(after, 1);
    dispatcher.context().shutdown_all();
}

#[test]
fn test_submit_to_stopped_scheduler_fails_immediately() {
    let dispatcher = running_dispatcher();
    dispatcher.context().shutdown(SchedulerKind::Coroutine);

    let result = dispatcher.submit(SchedulerKind::Coroutine, || async { Ok(()) });
    assert!(matches!(
        result,
        Err(DispatchError::SchedulerUnavailable {
            kind: SchedulerKind::Coroutine
        })
    ));

    // the other kind is unaffected
    let value = dispatcher
        .call_blocking(SchedulerKind::EventLoop, || async { Ok("still here") })
        .unwrap();
    assert_eq!(value, "still here");
    dispatcher.context().shutdown_all();
}

#[test]
fn test_in_flight_call_is_abandoned_on_shutdown() {
    let dispatcher = running_dispatcher();
    let pending = dispatcher
        .submit(SchedulerKind::EventLoop, || async {
            std::future::pending::<()>().await;
            Ok(())
        })
        .unwrap();
    let id = pending.id();

    dispatcher.context().shutdown(SchedulerKind::EventLoop);
    match pending.wait_blocking() {
        Err(DispatchError::Abandoned { id: abandoned, kind }) => {
            assert_eq!(abandoned, id);
            assert_eq!(kind, SchedulerKind::EventLoop);
        }
        other => panic!("expected abandoned call, got {:?}", other),
    }
    dispatcher.context().shutdown_all();
}

#[test]
fn test_submissions_start_in_fifo_order() {
    let dispatcher = running_dispatcher();

    for target in SchedulerKind::ALL {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pending: Vec<_> = (0..25)
            .map(|i| {
                let order = Arc::clone(&order);
                dispatcher
                    .submit(target, move || async move {
                        order.lock().unwrap().push(i);
                        Ok(())
                    })
                    .unwrap()
            })
            .collect();
        for call in pending {
            call.wait_blocking().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), (0..25).collect::<Vec<_>>());
    }
    dispatcher.context().shutdown_all();
}

#[test]
fn test_dispatch_runs_completion_hook_on_target() {
    let dispatcher = running_dispatcher();
    let (tx, rx) = std::sync::mpsc::channel();

    let id = dispatcher
        .dispatch(
            SchedulerKind::Coroutine,
            || square(-2),
            move |result| {
                let failed = matches!(result, Err(DispatchError::Callback(_)));
                tx.send((failed, current_kind())).unwrap();
            },
        )
        .unwrap();

    assert!(id > 0);
    assert_eq!(rx.recv().unwrap(), (true, Some(SchedulerKind::Coroutine)));
    dispatcher.context().shutdown_all();
}

#[test]
fn test_pending_call_records_origin() {
    let dispatcher = running_dispatcher();
    let inner = dispatcher.clone();

    let origin = dispatcher
        .call_blocking(SchedulerKind::EventLoop, move || async move {
            let pending = inner.submit(SchedulerKind::Coroutine, || async { Ok(()) })?;
            let origin = pending.origin();
            pending.wait().await?;
            Ok(origin)
        })
        .unwrap();

    assert_eq!(origin, Some(SchedulerKind::EventLoop));
    dispatcher.context().shutdown_all();
}

#[tokio::test]
async fn test_blocking_call_refused_inside_runtime() {
    let dispatcher = running_dispatcher();
    let result = dispatcher.call_blocking(SchedulerKind::EventLoop, || async { Ok(()) });
    assert!(matches!(result, Err(DispatchError::BlockingInsideScheduler)));
    dispatcher.context().shutdown_all();
}
