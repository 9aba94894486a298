use super::*;

#[test]
fn parse_ignores_whitespace_and_duplicates() {
    let list = ClassList::parse("  fade   fade scale-95 ");
    assert_eq!(list.iter().collect::<Vec<_>>(), vec!["fade", "scale-95"]);
    assert_eq!(list.to_string(), "fade scale-95");
    assert!(ClassList::parse("   ").is_empty());
}

#[test]
fn union_preserves_order_without_duplicates() {
    let base = ClassList::parse("a b");
    let from = ClassList::parse("b c");
    assert_eq!(base.union(&from).to_string(), "a b c");
}

#[test]
fn unset_leave_fields_reverse_enter() {
    let props = TransitionProps::new().enter("a").enter_from("b").enter_to("c");
    let classes = TransitionClasses::derive(&props);
    assert_eq!(classes.leave.base, ClassList::parse("a"));
    assert_eq!(classes.leave.from, ClassList::parse("c"));
    assert_eq!(classes.leave.to, ClassList::parse("b"));
}

#[test]
fn explicit_leave_field_overrides_only_itself() {
    let props = TransitionProps::new()
        .enter("a")
        .enter_from("b")
        .enter_to("c")
        .leave_from("x");
    let classes = TransitionClasses::derive(&props);
    assert_eq!(classes.leave.base, ClassList::parse("a"));
    assert_eq!(classes.leave.from, ClassList::parse("x"));
    assert_eq!(classes.leave.to, ClassList::parse("b"));
}

#[test]
fn explicitly_empty_leave_is_not_unset() {
    let props = TransitionProps::new().enter("a").leave("");
    let classes = TransitionClasses::derive(&props);
    assert!(classes.leave.base.is_empty());
    assert!(classes.leave.is_empty());
    assert!(!classes.enter.is_empty());
}
