use super::*;

struct CountingExtractor {
    calls: Vec<f64>,
}

impl FrameExtractor for CountingExtractor {
    fn src(&self) -> &str {
        "fake.mp4"
    }

    fn frame_at(&mut self, secs: f64) -> ScenecastResult<FrameRGBA> {
        self.calls.push(secs);
        Ok(FrameRGBA {
            width: 1,
            height: 1,
            data: vec![(secs * 10.0) as u8, 0, 0, 255],
            premultiplied: false,
        })
    }
}

#[test]
fn cache_hits_only_on_exact_time() {
    let mut ex = CachedExtractor::new(CountingExtractor { calls: Vec::new() });
    let a = ex.frame_at(1.0).unwrap();
    let b = ex.frame_at(1.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(ex.decodes(), 1);

    ex.frame_at(1.0 + f64::EPSILON).unwrap();
    ex.frame_at(1.0).unwrap();
    assert_eq!(ex.decodes(), 3);
    assert_eq!(ex.inner().calls.len(), 3);
    assert_eq!(ex.src(), "fake.mp4");
}

#[test]
fn boxed_extractors_are_extractors() {
    let boxed: Box<dyn FrameExtractor> = Box::new(CountingExtractor { calls: Vec::new() });
    let mut ex = CachedExtractor::new(boxed);
    let frame = ex.frame_at(0.5).unwrap();
    assert_eq!(frame.data[0], 5);
}
