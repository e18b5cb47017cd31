use super::*;
use crate::encode::GifSink;

fn cfg(w: u32, h: u32) -> SinkConfig {
    SinkConfig {
        width: w,
        height: h,
        fps: Fps::whole(10).unwrap(),
        looping: true,
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glyphwave-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn in_memory_sink_keeps_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(4, 3)).unwrap();
    for i in 0..3 {
        sink.push_frame(FrameIndex(i), &RgbImage::new(4, 3)).unwrap();
    }
    sink.end().unwrap();
    assert!(sink.is_finished());
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1, 2]);
    assert_eq!(sink.config(), Some(cfg(4, 3)));
}

#[test]
fn out_of_order_and_wrong_size_frames_are_rejected() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(4, 3)).unwrap();
    sink.push_frame(FrameIndex(1), &RgbImage::new(4, 3)).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &RgbImage::new(4, 3)).is_err());
    assert!(sink.push_frame(FrameIndex(0), &RgbImage::new(4, 3)).is_err());
    let err = sink.push_frame(FrameIndex(2), &RgbImage::new(3, 3)).unwrap_err();
    assert!(matches!(err, GlyphwaveError::Validation(_)));
}

#[test]
fn push_before_begin_fails() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &RgbImage::new(1, 1)).is_err());
}

#[test]
fn zero_sized_config_is_invalid() {
    assert!(cfg(0, 4).validate().is_err());
    assert!(cfg(4, 4).validate().is_ok());
}

#[test]
fn abort_drops_in_memory_frames() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &RgbImage::new(2, 2)).unwrap();
    sink.abort();
    assert!(sink.frames().is_empty());
    assert!(!sink.is_finished());
}

#[test]
fn partial_file_commit_and_discard() {
    let dir = scratch_dir("partial");
    let target = dir.join("nested").join("out.gif");
    let file = PartialFile::new(&target).unwrap();
    assert_eq!(file.partial(), dir.join("nested").join("out.gif.partial"));
    std::fs::write(file.partial(), b"data").unwrap();
    file.commit().unwrap();
    assert!(target.exists());
    assert!(!file.partial().exists());

    std::fs::write(file.partial(), b"junk").unwrap();
    file.discard();
    assert!(!file.partial().exists());
    // Discarding twice is harmless.
    file.discard();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn gif_sink_writes_a_decodable_animation() {
    use image::AnimationDecoder;
    use image::codecs::gif::GifDecoder;

    let dir = scratch_dir("gif");
    let out = dir.join("anim.gif");
    let mut sink = GifSink::new(&out);
    sink.begin(cfg(6, 4)).unwrap();
    for i in 0..3u8 {
        let frame = RgbImage::from_pixel(6, 4, image::Rgb([i * 80, 0, 255 - i * 80]));
        sink.push_frame(FrameIndex(u64::from(i)), &frame).unwrap();
    }
    sink.end().unwrap();
    assert!(out.exists());
    assert!(!dir.join("anim.gif.partial").exists());

    let reader = std::io::BufReader::new(std::fs::File::open(&out).unwrap());
    let frames = GifDecoder::new(reader).unwrap().into_frames().collect_frames().unwrap();
    assert_eq!(frames.len(), 3);
    let (num, den) = frames[0].delay().numer_denom_ms();
    assert_eq!(num / den, 100);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn aborted_gif_leaves_no_file() {
    let dir = scratch_dir("gif-abort");
    let out = dir.join("anim.gif");
    let mut sink = GifSink::new(&out);
    sink.begin(cfg(4, 4)).unwrap();
    sink.push_frame(FrameIndex(0), &RgbImage::new(4, 4)).unwrap();
    sink.abort();
    assert!(!out.exists());
    assert!(!dir.join("anim.gif.partial").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn gif_delay_is_clamped_to_ten_ms() {
    use crate::encode::gif_frame_delay_ms;
    assert_eq!(gif_frame_delay_ms(Fps::whole(10).unwrap()), 100);
    assert_eq!(gif_frame_delay_ms(Fps::whole(30).unwrap()), 33);
    assert_eq!(gif_frame_delay_ms(Fps::whole(240).unwrap()), 10);
    assert_eq!(gif_frame_delay_ms(Fps::new(30000, 1001).unwrap()), 33);
}
