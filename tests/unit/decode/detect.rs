use std::cell::Cell;

use super::*;

struct FixedProbe {
    reply: Option<&'static str>,
    fail: bool,
    calls: Cell<u32>,
}

impl FixedProbe {
    fn new(reply: Option<&'static str>) -> Self {
        Self {
            reply,
            fail: false,
            calls: Cell::new(0),
        }
    }
}

impl ContentTypeProbe for FixedProbe {
    fn content_type(&self, _url: &str) -> ScenecastResult<Option<String>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(ScenecastError::media("connection refused"));
        }
        Ok(self.reply.map(str::to_string))
    }
}

#[test]
fn extension_is_checked_before_the_network() {
    let probe = FixedProbe::new(Some("video/webm"));
    assert_eq!(
        detect_format("https://cdn.example/clip.MP4?sig=1", &probe),
        ContainerFormat::Mp4
    );
    assert_eq!(detect_format("assets/intro.webm", &probe), ContainerFormat::WebM);
    assert_eq!(detect_format("live/index.m3u8", &probe), ContainerFormat::Hls);
    assert_eq!(probe.calls.get(), 0);
}

#[test]
fn http_sources_without_extension_use_content_type() {
    let probe = FixedProbe::new(Some("video/webm; codecs=\"vp9\""));
    assert_eq!(
        detect_format("https://cdn.example/stream/42", &probe),
        ContainerFormat::WebM
    );
    assert_eq!(probe.calls.get(), 1);

    let dash = FixedProbe::new(Some("application/dash+xml"));
    assert_eq!(
        detect_format("https://cdn.example/manifest", &dash),
        ContainerFormat::Dash
    );
}

#[test]
fn detection_failures_fall_back_to_mp4() {
    let failing = FixedProbe {
        reply: None,
        fail: true,
        calls: Cell::new(0),
    };
    assert_eq!(
        detect_format("https://cdn.example/blob", &failing),
        ContainerFormat::Mp4
    );
    assert_eq!(
        detect_format("https://cdn.example/blob", &FixedProbe::new(None)),
        ContainerFormat::Mp4
    );
    assert_eq!(
        detect_format("https://cdn.example/blob", &FixedProbe::new(Some("text/html"))),
        ContainerFormat::Mp4
    );
    assert_eq!(detect_format("local/clip.xyz", &NoProbe), ContainerFormat::Mp4);
    assert_eq!(detect_format("blob:1234", &NoProbe), ContainerFormat::Mp4);
}

#[test]
fn families_group_formats() {
    assert_eq!(ContainerFormat::Mov.family(), FormatFamily::Mp4);
    assert_eq!(ContainerFormat::Mkv.family(), FormatFamily::WebM);
    assert_eq!(ContainerFormat::Ogg.family(), FormatFamily::WebM);
    assert_eq!(ContainerFormat::Hls.family(), FormatFamily::Manifest);
}
