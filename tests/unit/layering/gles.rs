use super::*;

#[test]
fn cover_takes_the_hull() {
    let mut w = GlesWindow::EMPTY;
    assert!(w.is_empty());
    w.include(3);
    assert_eq!(w.bounds(), Some((3, 3)));
    w.cover(5, 6);
    assert_eq!(w.bounds(), Some((3, 6)));
    w.include(1);
    assert_eq!(w.bounds(), Some((1, 6)));
    assert_eq!(w.len(), 6);
    assert!(w.contains(4));
    assert!(!w.contains(7));
}

#[test]
fn wire_encoding_uses_minus_one() {
    assert_eq!(GlesWindow::EMPTY.to_wire(), (-1, -1));
    assert_eq!(GlesWindow::from_wire(-1, -1), GlesWindow::EMPTY);
    assert_eq!(GlesWindow::from_wire(2, 4), GlesWindow::new(2, 4));
    assert_eq!(GlesWindow::new(2, 4).to_wire(), (2, 4));
}

#[test]
fn covers_is_superset() {
    let big = GlesWindow::new(1, 5);
    assert!(big.covers(GlesWindow::new(2, 3)));
    assert!(big.covers(GlesWindow::EMPTY));
    assert!(!GlesWindow::EMPTY.covers(big));
    assert!(!GlesWindow::new(2, 3).covers(big));
}

#[test]
fn trace_skips_unchanged_windows() {
    let mut trace = WindowTrace::default();
    trace.record(Stage::Unresolved, GlesWindow::EMPTY);
    trace.record(Stage::Resized, GlesWindow::EMPTY);
    trace.record(Stage::CapacityChecked, GlesWindow::new(3, 5));
    trace.record(Stage::BandwidthSwept, GlesWindow::new(3, 5));
    let stages: Vec<_> = trace.steps().iter().map(|s| s.stage).collect();
    assert_eq!(stages, vec![Stage::Unresolved, Stage::CapacityChecked]);
}

#[test]
fn release_end_only_trims_the_ends() {
    let mut w = GlesWindow::new(1, 4);
    assert!(!w.release_end(2));
    assert_eq!(w.bounds(), Some((1, 4)));
    assert!(w.release_end(1));
    assert!(w.release_end(4));
    assert_eq!(w.bounds(), Some((2, 3)));

    let mut single = GlesWindow::new(5, 5);
    assert!(single.release_end(5));
    assert!(single.is_empty());
    let mut empty = GlesWindow::EMPTY;
    assert!(!empty.release_end(0));
}
