use super::*;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn set_notifies_only_on_change() {
    let value = ObservableValue::new(Some(false));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _subscription = {
        let seen = Rc::clone(&seen);
        value.subscribe(move |v: &Option<bool>| seen.borrow_mut().push(*v))
    };

    assert!(value.set(Some(true)));
    assert!(!value.set(Some(true)));
    assert!(value.set(None));
    assert_eq!(*seen.borrow(), vec![Some(true), None]);
}

#[test]
fn dropping_subscription_unsubscribes() {
    let value = ObservableValue::new(0);
    let hits = Rc::new(RefCell::new(0));
    let subscription = {
        let hits = Rc::clone(&hits);
        value.subscribe(move |_| *hits.borrow_mut() += 1)
    };
    assert_eq!(value.subscriber_count(), 1);
    value.set(1);
    drop(subscription);
    assert_eq!(value.subscriber_count(), 0);
    value.set(2);
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn reader_sees_writes_and_can_subscribe() {
    let value = ObservableValue::new(1);
    let reader = value.reader();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let subscription = {
        let seen = Rc::clone(&seen);
        reader.subscribe(move |v| seen.borrow_mut().push(*v))
    };
    value.set(5);
    assert_eq!(reader.get(), 5);
    subscription.unsubscribe();
    value.set(6);
    assert_eq!(*seen.borrow(), vec![5]);
}

#[test]
fn observer_may_read_and_unsubscribe_during_notification() {
    let value = ObservableValue::new(0);
    let reader = value.reader();
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let subscription = {
        let slot = Rc::clone(&slot);
        let seen = Rc::clone(&seen);
        let reader = reader.clone();
        value.subscribe(move |_| {
            seen.borrow_mut().push(reader.get());
            slot.borrow_mut().take();
        })
    };
    slot.borrow_mut().replace(subscription);

    value.set(1);
    value.set(2);
    assert_eq!(*seen.borrow(), vec![1]);
    assert_eq!(value.subscriber_count(), 0);
}
