use super::*;
use crate::audio::filters::plan_isolation;

fn asset(key: &str, rate: f64, volume: f64) -> MediaAsset {
    MediaAsset {
        key: key.to_string(),
        src: format!("{key}.wav"),
        kind: MediaKind::Audio,
        start_in_video: 0,
        end_in_video: 29,
        duration: 30,
        playback_rate: rate,
        volume,
        trim_left_in_seconds: 0.0,
        duration_in_seconds: 1.0,
    }
}

fn visuals_fixture(dir: &Path, format: OutputFormat) -> Vec<u8> {
    std::fs::create_dir_all(dir).unwrap();
    let bytes = b"not really a video".to_vec();
    std::fs::write(visuals_path(dir, format), &bytes).unwrap();
    bytes
}

#[test]
fn mix_compensates_for_track_count() {
    let inputs = vec![PathBuf::from("a.wav"), PathBuf::from("b.wav")];
    let args = mix_command(&inputs, Path::new("audio.wav")).to_args();
    assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
    assert!(args.contains(&"amix=inputs=2:duration=longest,volume=2".to_string()));
    assert!(args.contains(&"pcm_s16le".to_string()));
    assert!(args.contains(&"48000".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("audio.wav"));
}

#[test]
fn mux_codec_follows_container() {
    for (format, codec) in [
        (OutputFormat::Mp4, "aac"),
        (OutputFormat::WebM, "libopus"),
        (OutputFormat::ProRes, "aac"),
    ] {
        let args =
            mux_command(Path::new("v"), Path::new("a.wav"), format, Path::new("o")).to_args();
        let i = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[i + 1], codec, "{format}");
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(args.contains(&"-shortest".to_string()));
        assert!(args.windows(2).any(|w| w == ["-map", "1:a"]));
    }
}

#[test]
fn isolation_runs_the_planned_chain() {
    let a = asset("voice", 2.0, 0.5);
    let range = FrameRange::from_inclusive(0, 59).unwrap();
    let plan = plan_isolation(&a, range, Fps::whole(30).unwrap(), 48_000);
    let args = isolation_command(&a, &plan, Path::new("voice.wav")).to_args();
    let i = args.iter().position(|a| a == "-af").unwrap();
    assert_eq!(args[i + 1], plan.filter_chain());
    assert_eq!(args[1], "voice.wav");
    assert!(args.contains(&"-vn".to_string()));
}

#[test]
fn silent_assets_produce_no_tracks() {
    let tmp = tempfile::tempdir().unwrap();
    let job = AudioJob {
        output_dir: tmp.path().join("out"),
        temp_dir: tmp.path().join("work"),
        assets: vec![asset("muted", 1.0, 0.0), asset("frozen", 0.0, 1.0)],
        start_frame: 0,
        end_frame: 29,
        fps: Fps::whole(30).unwrap(),
    };
    let tracks = generate_audio(&job, &CancelToken::new()).unwrap();
    assert!(tracks.is_empty());
    assert!(job.temp_dir.is_dir());
    assert!(!job.temp_dir.join(MIX_FILE_NAME).exists());
}

#[test]
fn reused_temp_dir_drops_a_stale_mix() {
    let tmp = tempfile::tempdir().unwrap();
    let work = tmp.path().join("work");
    let bytes = visuals_fixture(&work, OutputFormat::Mp4);
    std::fs::write(work.join(MIX_FILE_NAME), b"previous job").unwrap();
    let job = AudioJob {
        output_dir: tmp.path().join("out"),
        temp_dir: work.clone(),
        assets: vec![asset("muted", 1.0, 0.0)],
        start_frame: 0,
        end_frame: 29,
        fps: Fps::whole(30).unwrap(),
    };

    assert!(generate_audio(&job, &CancelToken::new()).unwrap().is_empty());
    assert!(!work.join(MIX_FILE_NAME).exists());

    let out = merge_media("final", &job.output_dir, &work, OutputFormat::Mp4, &CancelToken::new())
        .unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), bytes);
}

#[test]
fn colliding_keys_get_distinct_track_files() {
    let mut taken = HashSet::new();
    let stems: Vec<String> = ["clip/1", "clip[1", "audio", "clip-1"]
        .iter()
        .enumerate()
        .map(|(i, key)| track_stem(key, i, &mut taken))
        .collect();
    assert_eq!(stems, ["clip-1", "clip-1-1", "audio-2", "clip-1-3"]);
}

#[test]
fn cancelled_job_stops_before_any_asset() {
    let tmp = tempfile::tempdir().unwrap();
    let job = AudioJob {
        output_dir: tmp.path().join("out"),
        temp_dir: tmp.path().join("work"),
        assets: vec![asset("voice", 1.0, 1.0)],
        start_frame: 0,
        end_frame: 29,
        fps: Fps::whole(30).unwrap(),
    };
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        generate_audio(&job, &cancel),
        Err(ScenecastError::Cancelled)
    ));
}

#[test]
fn mixing_nothing_is_rejected() {
    let err = mix_tracks(&[], Path::new("audio.wav"), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, ScenecastError::Validation(_)));
}

#[test]
fn merge_without_audio_copies_visuals_and_cleans_auto_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let temp_dir = tmp.path().join(format!("job{}", crate::export::TEMP_DIR_SENTINEL));
    let bytes = visuals_fixture(&temp_dir, OutputFormat::WebM);
    let out_dir = tmp.path().join("out");

    let out = merge_media("final", &out_dir, &temp_dir, OutputFormat::WebM, &CancelToken::new())
        .unwrap();
    assert_eq!(out, out_dir.join("final.webm"));
    assert_eq!(std::fs::read(&out).unwrap(), bytes);
    assert!(!temp_dir.exists());
}

#[test]
fn merge_keeps_user_temp_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let temp_dir = tmp.path().join("scratch");
    visuals_fixture(&temp_dir, OutputFormat::Mp4);

    let out = merge_media("final", tmp.path(), &temp_dir, OutputFormat::Mp4, &CancelToken::new())
        .unwrap();
    assert!(out.is_file());
    assert!(temp_dir.join("visuals.mp4").is_file());
}

#[test]
fn merge_requires_a_visual_track() {
    let tmp = tempfile::tempdir().unwrap();
    let err = merge_media("final", tmp.path(), tmp.path(), OutputFormat::Mp4, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ScenecastError::Export(_)));
}
