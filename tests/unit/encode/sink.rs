use super::*;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::whole(30).unwrap(),
    }
}

fn frame(width: u32, height: u32, shade: u8) -> FrameRGBA {
    FrameRGBA {
        width,
        height,
        data: [shade, shade, shade, 255].repeat((width * height) as usize),
        premultiplied: false,
    }
}

#[test]
fn keeps_frames_in_push_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 1)).unwrap();
    sink.push_frame(FrameIndex(0), &frame(2, 1, 10)).unwrap();
    sink.push_frame(FrameIndex(3), &frame(2, 1, 20)).unwrap();
    sink.end().unwrap();

    assert!(sink.is_finished());
    assert_eq!(sink.config().map(|c| c.width), Some(2));
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, [0, 3]);
    assert_eq!(sink.frames()[1].1.data[0], 20);
}

#[test]
fn rejects_contract_violations() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &frame(1, 1, 0)).is_err());
    assert!(sink.begin(cfg(0, 4)).is_err());

    sink.begin(cfg(1, 1)).unwrap();
    sink.push_frame(FrameIndex(5), &frame(1, 1, 0)).unwrap();
    assert!(sink.push_frame(FrameIndex(5), &frame(1, 1, 0)).is_err());
    assert!(sink.push_frame(FrameIndex(6), &frame(2, 1, 0)).is_err());
    sink.end().unwrap();
    assert!(sink.push_frame(FrameIndex(7), &frame(1, 1, 0)).is_err());
    assert_eq!(sink.frames().len(), 1);
}

#[test]
fn begin_starts_a_fresh_run() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(1, 1)).unwrap();
    sink.push_frame(FrameIndex(9), &frame(1, 1, 0)).unwrap();
    sink.end().unwrap();

    sink.begin(cfg(1, 1)).unwrap();
    assert!(!sink.is_finished());
    assert!(sink.frames().is_empty());
    sink.push_frame(FrameIndex(0), &frame(1, 1, 0)).unwrap();
}
