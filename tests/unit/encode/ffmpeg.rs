use super::*;

const LISTING: &str = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC
 V....D mpeg4                MPEG-4 part 2
 A....D libvorbis            libvorbis
 V....D png                  PNG (Portable Network Graphics) image
";

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn listing_parser_keeps_video_encoders_only() {
    let names = parse_encoders(LISTING);
    assert!(names.contains("libx264"));
    assert!(names.contains("mpeg4"));
    assert!(!names.contains("libvorbis"));
    // Legend rows above the separator are not encoders.
    assert!(!names.contains("="));
}

#[test]
fn pick_codec_follows_preference_order() {
    assert_eq!(
        pick_codec(&VideoCodec::PREFERENCE, LISTING),
        Some(VideoCodec::H264)
    );
    assert_eq!(
        pick_codec(&[VideoCodec::Mpeg4, VideoCodec::H264], LISTING),
        Some(VideoCodec::Mpeg4)
    );

    let with_vpx = format!("{LISTING} V....D libvpx-vp9          libvpx VP9\n");
    assert_eq!(
        pick_codec(&VideoCodec::PREFERENCE, &with_vpx),
        Some(VideoCodec::Vp9)
    );
    assert_eq!(pick_codec(&[VideoCodec::Vp8], LISTING), None);
    assert_eq!(pick_codec(&VideoCodec::PREFERENCE, ""), None);
}

#[test]
fn mp4_output_is_fragmented_for_streaming() {
    let args = VideoCodec::H264.output_args(23);
    let joined = args.join(" ");
    assert!(joined.starts_with("-c:v libx264 -pix_fmt yuv420p"));
    assert!(joined.contains("-crf 23"));
    assert!(joined.contains("frag_keyframe+empty_moov"));
    assert!(joined.ends_with("-f mp4"));

    let webm = VideoCodec::Vp9.output_args(30).join(" ");
    assert!(webm.ends_with("-f webm"));
    assert_eq!(VideoCodec::Vp8.format(), VideoFormat::WebM);
}

#[test]
fn missing_binary_is_unsupported_encoder() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        ffmpeg: PathBuf::from("/definitely/not/ffmpeg"),
        ..FfmpegSinkOpts::default()
    });
    assert!(matches!(
        sink.negotiate(),
        Err(EasyAnimError::UnsupportedEncoder(_))
    ));
    assert_eq!(sink.codec(), None);
}

#[test]
fn ffmpeg_roundtrip_when_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let format = match sink.negotiate() {
        Ok(f) => f,
        // A minimal ffmpeg build without any of the preferred encoders.
        Err(EasyAnimError::UnsupportedEncoder(_)) => return,
        Err(e) => panic!("{e}"),
    };
    sink.begin(SinkConfig {
        width: 16,
        height: 16,
        fps: Fps::new(30, 1).unwrap(),
    })
    .unwrap();
    let frame = FrameRGBA {
        width: 16,
        height: 16,
        data: vec![128; 16 * 16 * 4],
        premultiplied: true,
    };
    for i in 0..3 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    let bytes = sink.end().unwrap();
    assert!(!bytes.is_empty());
    match format {
        VideoFormat::WebM => assert_eq!(&bytes[..4], &[0x1a, 0x45, 0xdf, 0xa3]),
        VideoFormat::Mp4 => assert_eq!(&bytes[4..8], b"ftyp"),
        VideoFormat::RawRgba => panic!("ffmpeg never yields raw frames"),
    }
}
