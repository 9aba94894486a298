use super::*;
use futures::FutureExt;

#[test]
fn zero_expected_is_resolved_and_settled() {
    let barrier = Barrier::new(0);
    assert!(barrier.is_resolved());
    assert!(barrier.is_settled());
    assert_eq!(barrier.settled().now_or_never(), Some(()));
}

#[test]
fn resolves_after_exactly_expected_arrivals() {
    let barrier = Barrier::new(3);
    let mut first = barrier.arrive();
    let mut second = barrier.arrive();
    assert!(!barrier.is_resolved());
    assert_eq!((&mut first).now_or_never(), None);
    assert_eq!((&mut second).now_or_never(), None);

    let third = barrier.arrive();
    assert!(barrier.is_resolved());
    assert_eq!(barrier.arrivals(), 3);
    assert!(!barrier.is_settled(), "arrivals not yet consumed");

    assert_eq!(first.now_or_never(), Some(()));
    assert_eq!(second.now_or_never(), Some(()));
    assert!(!barrier.is_settled());
    assert_eq!(third.now_or_never(), Some(()));
    assert!(barrier.is_settled());
}

#[test]
fn surplus_arrivals_do_not_resolve_twice() {
    let barrier = Barrier::new(1);
    let arrival = barrier.arrive();
    let surplus = barrier.arrive();
    assert_eq!(barrier.arrivals(), 1);
    drop(surplus);
    assert!(!barrier.is_settled(), "surplus arrival must not count as a release");
    drop(arrival);
    assert!(barrier.is_settled());

    let late = barrier.arrive();
    assert_eq!(late.now_or_never(), Some(()));
    assert_eq!(barrier.arrivals(), 1);
}

#[test]
fn forfeit_counts_as_arrival_and_release() {
    let barrier = Barrier::new(2);
    barrier.forfeit();
    assert!(!barrier.is_resolved());
    let arrival = barrier.arrive();
    assert!(barrier.is_resolved());
    assert!(!barrier.is_settled());
    assert_eq!(arrival.now_or_never(), Some(()));
    assert!(barrier.is_settled());
}

#[test]
fn settled_wakes_its_waiter() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingWaker(AtomicUsize);
    impl futures::task::ArcWake for CountingWaker {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
    let waker = futures::task::waker(Arc::clone(&counter));
    let mut cx = Context::from_waker(&waker);

    let barrier = Barrier::new(1);
    let mut settled = barrier.settled();
    assert!(Pin::new(&mut settled).poll(&mut cx).is_pending());
    // Polling again with the same waker must not register it twice.
    assert!(Pin::new(&mut settled).poll(&mut cx).is_pending());

    let arrival = barrier.arrive();
    let woken_on_resolve = counter.0.load(Ordering::SeqCst);
    assert_eq!(woken_on_resolve, 1);
    assert!(Pin::new(&mut settled).poll(&mut cx).is_pending());

    drop(arrival);
    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    assert!(Pin::new(&mut settled).poll(&mut cx).is_ready());
}
