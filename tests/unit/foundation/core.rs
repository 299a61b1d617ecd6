use super::*;

#[test]
fn rect_y_overlap_is_half_open() {
    let a = Rect::new(0, 0, 10, 100);
    let b = Rect::new(0, 100, 10, 50);
    let c = Rect::new(0, 99, 10, 1);
    assert!(!a.overlaps_y(b));
    assert!(a.overlaps_y(c));
    assert!(c.overlaps_y(a));
}

#[test]
fn rect_join_ignores_empty_side() {
    let a = Rect::new(10, 20, 30, 40);
    assert_eq!(a.join(Rect::default()), a);
    assert_eq!(Rect::default().join(a), a);
    assert_eq!(
        a.join(Rect::new(0, 50, 5, 100)),
        Rect::new(0, 20, 40, 130)
    );
}

#[test]
fn pipe_id_rejects_out_of_range() {
    assert_eq!(PipeId::new(3).unwrap(), PipeId(3));
    assert!(PipeId::new(4).is_err());
    assert!(PipeId::new(5).is_err());
    assert!(PipeId::PRIMARY.is_primary());
    assert_eq!(PipeId::SECONDARY.to_string(), "pipe1");
}

#[test]
fn frame_seq_resets_before_the_sentinel() {
    assert_eq!(FrameSeq(0).advance(), FrameSeq(1));
    assert_eq!(FrameSeq(u32::MAX - 1).advance(), FrameSeq(0));
    assert_eq!(FrameSeq(u32::MAX).advance(), FrameSeq(0));
}

#[test]
fn fourcc_is_little_endian() {
    assert_eq!(fourcc(b"AR24"), 0x3432_5241);
}
