use super::*;

fn px(rgba: [u8; 4], premultiplied: bool) -> FrameRGBA {
    FrameRGBA {
        width: 1,
        height: 1,
        data: rgba.to_vec(),
        premultiplied,
    }
}

#[test]
fn flatten_alpha_0_returns_bg() {
    let mut dst = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut dst, &px([0, 0, 0, 0], true), [10, 20, 30, 255]);
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let mut dst = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut dst, &px([1, 2, 3, 255], true), [10, 20, 30, 255]);
    assert_eq!(dst, vec![1, 2, 3, 255]);
}

#[test]
fn flatten_premultiplies_straight_input() {
    let mut straight = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut straight, &px([255, 0, 0, 128], false), [0, 0, 0, 255]);
    let mut premul = vec![0u8; 4];
    flatten_over_bg_to_opaque_rgba8(&mut premul, &px([128, 0, 0, 128], true), [0, 0, 0, 255]);
    assert_eq!(straight, premul);
}

#[test]
fn unpremultiply_restores_color() {
    let mut dst = vec![0u8; 4];
    to_straight_rgba8(&mut dst, &px([64, 32, 0, 128], true));
    assert_eq!(dst, vec![128, 64, 0, 128]);

    to_straight_rgba8(&mut dst, &px([9, 9, 9, 0], true));
    assert_eq!(dst, vec![0, 0, 0, 0]);
}

#[test]
fn intermediate_is_named_by_format() {
    let dir = Path::new("/tmp/job");
    assert_eq!(
        visuals_path(dir, OutputFormat::ProRes),
        PathBuf::from("/tmp/job/visuals.mov")
    );
    let sink = VisualTrackSink::new(dir, OutputFormat::WebM);
    assert_eq!(sink.path(), Path::new("/tmp/job/visuals.webm"));
}
