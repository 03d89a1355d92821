/// Output container of an export job.
///
/// Determines the file extension and the codecs used for the visual and audio tracks.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
pub enum OutputFormat {
    /// H.264 in MP4.
    #[default]
    #[serde(rename = "mp4")]
    #[value(name = "mp4")]
    Mp4,
    /// VP9 in WebM.
    #[serde(rename = "webm")]
    #[value(name = "webm")]
    WebM,
    /// ProRes 4444 in QuickTime.
    #[serde(rename = "proRes")]
    #[value(name = "proRes")]
    ProRes,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::WebM => "webm",
            Self::ProRes => "mov",
        }
    }

    /// Encoder used for the muxed audio track.
    pub fn audio_codec(self) -> &'static str {
        match self {
            Self::Mp4 | Self::ProRes => "aac",
            Self::WebM => "libopus",
        }
    }

    /// `ffmpeg` output arguments for the visual track.
    pub fn video_args(self) -> &'static [&'static str] {
        match self {
            Self::Mp4 => &[
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ],
            Self::WebM => &[
                "-c:v",
                "libvpx-vp9",
                "-pix_fmt",
                "yuva420p",
                "-b:v",
                "0",
                "-crf",
                "30",
            ],
            Self::ProRes => &[
                "-c:v",
                "prores_ks",
                "-profile:v",
                "4444",
                "-pix_fmt",
                "yuva444p10le",
            ],
        }
    }

    /// `true` when the visual codec keeps an alpha channel.
    pub fn keeps_alpha(self) -> bool {
        !matches!(self, Self::Mp4)
    }

    /// `true` when the codec needs even frame dimensions.
    pub fn needs_even_dimensions(self) -> bool {
        matches!(self, Self::Mp4 | Self::WebM)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Mp4 => "mp4",
            Self::WebM => "webm",
            Self::ProRes => "proRes",
        })
    }
}
