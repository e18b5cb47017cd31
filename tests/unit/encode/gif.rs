use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 4,
        height: 3,
        fps: Fps::whole(10).unwrap(),
        looping: true,
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glyphwave-gif-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn frame_delay_has_a_floor() {
    assert_eq!(gif_frame_delay_ms(Fps::whole(10).unwrap()), 100);
    assert_eq!(gif_frame_delay_ms(Fps::whole(24).unwrap()), 41);
    assert_eq!(gif_frame_delay_ms(Fps::whole(200).unwrap()), 10);
}

#[test]
fn end_commits_the_partial_file() {
    let dir = scratch_dir("commit");
    let out = dir.join("a.gif");
    let mut sink = GifSink::new(&out);
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &RgbImage::new(4, 3)).unwrap();
    sink.end().unwrap();
    assert!(out.exists());
    assert!(!dir.join("a.gif.partial").exists());
}

#[test]
fn write_failure_at_end_discards_output() {
    let dir = scratch_dir("fail");
    let out = dir.join("b.gif");
    let mut sink = GifSink::new(&out);
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &RgbImage::new(4, 3)).unwrap();
    *sink.failure.lock().unwrap() = Some("disk full".to_owned());

    let err = sink.end().unwrap_err();
    assert!(matches!(err, GlyphwaveError::Export { .. }));
    assert!(!out.exists());
    assert!(!dir.join("b.gif.partial").exists());
}

#[cfg(target_os = "linux")]
#[test]
fn tracked_writer_records_flush_errors() {
    let failure = WriteFailure::default();
    let mut writer = TrackedWriter {
        inner: BufWriter::new(File::options().write(true).open("/dev/full").unwrap()),
        failure: Arc::clone(&failure),
    };
    writer.write_all(b"GIF89a").unwrap();
    drop(writer);
    assert!(failure.lock().unwrap().is_some());
}
