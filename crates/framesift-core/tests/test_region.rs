use ndarray::Array2;

use framesift_core::error::FramesiftError;
use framesift_core::region::Region;

#[test]
fn test_region_dimensions() {
    for (h, w) in [(3, 3), (9, 12), (30, 45), (720, 1280), (1080, 1920)] {
        let data = Array2::<u8>::zeros((h, w));
        for region in Region::ALL {
            let view = region.view(&data.view()).unwrap();
            assert_eq!(view.dim(), (h / 3, w / 3), "{region} of {h}x{w}");
        }
    }
}

#[test]
fn test_bottom_region_takes_remainder_rows() {
    // 10 rows: third = 3, so the bottom band spans rows 6..10.
    let (rows, cols) = Region::BottomThirdMiddle.bounds(10, 10).unwrap();
    assert_eq!(rows, 6..10);
    assert_eq!(cols, 3..6);

    let (rows, cols) = Region::TopThirdMiddle.bounds(10, 10).unwrap();
    assert_eq!(rows, 0..3);
    assert_eq!(cols, 3..6);
}

#[test]
fn test_region_view_borrows_parent_samples() {
    let data = Array2::from_shape_fn((6, 9), |(r, c)| (r * 9 + c) as u8);
    let top = Region::TopThirdMiddle.view(&data.view()).unwrap();
    let bottom = Region::BottomThirdMiddle.view(&data.view()).unwrap();

    assert_eq!(top[[0, 0]], 3);
    assert_eq!(top[[1, 2]], 9 + 5);
    assert_eq!(bottom[[0, 0]], 4 * 9 + 3);
    assert_eq!(bottom[[1, 2]], 5 * 9 + 5);
}

#[test]
fn test_region_rejects_small_frames() {
    for (h, w) in [(2, 10), (10, 2), (0, 0)] {
        let err = Region::TopThirdMiddle.bounds(h, w).unwrap_err();
        assert!(matches!(err, FramesiftError::FrameTooSmall { .. }));
    }
}
