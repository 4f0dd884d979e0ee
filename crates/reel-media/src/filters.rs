//! FFmpeg filter graph construction for vertical segments.

use reel_models::{Caption, Pan, Zoom};

/// Target frame size and rate.
const WIDTH: u32 = 1080;
const HEIGHT: u32 = 1920;
const FPS: u32 = 30;

/// One edit segment resolved against its source clip file.
#[derive(Debug, Clone)]
pub struct SegmentSource {
    /// FFmpeg input index of the clip file
    pub input_index: usize,
    /// Seek offset inside the clip file, seconds
    pub file_offset_s: f64,
    /// Segment duration, seconds
    pub duration_s: f64,
    pub zoom: Zoom,
    pub pan: Pan,
}

/// Crop offset expressions for a pan direction.
///
/// After scaling with `force_original_aspect_ratio=increase` the
/// frame is at least as large as the target on both axes, so extreme
/// offsets stay non-negative.
fn crop_offsets(pan: Pan) -> (String, String) {
    let center_x = format!("(iw-{})/2", WIDTH);
    let center_y = format!("(ih-{})/2", HEIGHT);
    match pan {
        Pan::None => (center_x, center_y),
        Pan::Left => ("0".to_string(), center_y),
        Pan::Right => (format!("iw-{}", WIDTH), center_y),
        Pan::Up => (center_x, "0".to_string()),
        Pan::Down => (center_x, format!("ih-{}", HEIGHT)),
    }
}

/// Build the normalization chain for a single segment:
/// scale (with zoom), pan-derived crop, fps, pixel format, trim and
/// PTS reset, labeled `[seg<n>]`.
pub fn build_segment_chain(index: usize, source: &SegmentSource) -> String {
    let zoom = source.zoom.factor();
    let scale_w = (WIDTH as f64 * zoom).round() as u32;
    let scale_h = (HEIGHT as f64 * zoom).round() as u32;
    let (x, y) = crop_offsets(source.pan);

    format!(
        "[{input}:v]scale={sw}:{sh}:force_original_aspect_ratio=increase,\
crop={w}:{h}:{x}:{y},fps={fps},format=yuv420p,\
trim=start={start:.3}:end={end:.3},setpts=PTS-STARTPTS[seg{index}]",
        input = source.input_index,
        sw = scale_w,
        sh = scale_h,
        w = WIDTH,
        h = HEIGHT,
        x = x,
        y = y,
        fps = FPS,
        start = source.file_offset_s,
        end = source.file_offset_s + source.duration_s,
        index = index,
    )
}

/// Escape text for use inside a drawtext `text=` value.
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push('\u{2019}'), // typographic substitute; raw quotes break filter quoting
            ':' => escaped.push_str("\\:"),
            '%' => escaped.push_str("\\%"),
            ',' => escaped.push_str("\\,"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build the drawtext overlay chain for a caption timeline.
///
/// Each caption is enabled only inside its `[start, end]` window,
/// horizontally centered, floated above the bottom margin. Captions
/// with emphasis render gold at 1.1x size; everything else is white
/// with a black (2,2) shadow.
pub fn build_caption_overlays(captions: &[Caption]) -> String {
    captions
        .iter()
        .map(|caption| {
            let style = &caption.style;
            let (color, size) = if caption.has_emphasis() {
                (
                    style.emphasis_color.as_str(),
                    (style.font_size as f64 * style.emphasis_scale).round() as u32,
                )
            } else {
                (style.color.as_str(), style.font_size)
            };
            format!(
                "drawtext=text='{text}':fontsize={size}:fontcolor={color}:\
shadowcolor=black:shadowx={sx}:shadowy={sy}:\
x=(w-text_w)/2:y=h-text_h-{margin}:\
enable='between(t,{start:.3},{end:.3})'",
                text = escape_drawtext(&caption.text),
                size = size,
                color = color,
                sx = style.shadow_offset.0,
                sy = style.shadow_offset.1,
                margin = style.bottom_margin,
                start = caption.start_ms as f64 / 1000.0,
                end = caption.end_ms as f64 / 1000.0,
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Assemble the full scene graph: per-segment chains, concat into
/// `[video_base]`, then caption overlays into `[video_out]`.
pub fn build_scene_graph(sources: &[SegmentSource], captions: &[Caption]) -> String {
    let mut parts: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(i, s)| build_segment_chain(i, s))
        .collect();

    let concat_inputs: String = (0..sources.len()).map(|i| format!("[seg{}]", i)).collect();
    let overlays = build_caption_overlays(captions);

    if overlays.is_empty() {
        parts.push(format!(
            "{}concat=n={}:v=1:a=0[video_out]",
            concat_inputs,
            sources.len()
        ));
    } else {
        parts.push(format!(
            "{}concat=n={}:v=1:a=0[video_base]",
            concat_inputs,
            sources.len()
        ));
        parts.push(format!("[video_base]{}[video_out]", overlays));
    }

    parts.join(";\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::CaptionStyle;

    fn source(pan: Pan, zoom: Zoom) -> SegmentSource {
        SegmentSource {
            input_index: 0,
            file_offset_s: 0.5,
            duration_s: 1.5,
            zoom,
            pan,
        }
    }

    #[test]
    fn test_segment_chain_center_crop() {
        let chain = build_segment_chain(0, &source(Pan::None, Zoom::None));
        assert!(chain.contains("scale=1080:1920:force_original_aspect_ratio=increase"));
        assert!(chain.contains("crop=1080:1920:(iw-1080)/2:(ih-1920)/2"));
        assert!(chain.contains("fps=30"));
        assert!(chain.contains("trim=start=0.500:end=2.000"));
        assert!(chain.ends_with("[seg0]"));
    }

    #[test]
    fn test_segment_chain_zoom_and_pan() {
        let chain = build_segment_chain(3, &source(Pan::Right, Zoom::Subtle));
        assert!(chain.contains("scale=1134:2016"));
        assert!(chain.contains("crop=1080:1920:iw-1080:"));
        assert!(chain.ends_with("[seg3]"));
    }

    #[test]
    fn test_caption_overlay_styles() {
        let plain = Caption {
            text: "hello world".to_string(),
            start_ms: 0,
            end_ms: 800,
            emphasis_indices: vec![],
            style: CaptionStyle::default(),
        };
        let emphasized = Caption {
            text: "secret".to_string(),
            start_ms: 800,
            end_ms: 1400,
            emphasis_indices: vec![0],
            style: CaptionStyle::default(),
        };

        let overlays = build_caption_overlays(&[plain, emphasized]);
        assert!(overlays.contains("fontcolor=white"));
        assert!(overlays.contains("fontcolor=gold"));
        assert!(overlays.contains("fontsize=79")); // 72 * 1.1 rounded
        assert!(overlays.contains("shadowx=2:shadowy=2"));
        assert!(overlays.contains("enable='between(t,0.000,0.800)'"));
        assert!(overlays.contains("y=h-text_h-60"));
    }

    #[test]
    fn test_drawtext_escaping() {
        assert_eq!(escape_drawtext("50% more"), "50\\% more");
        assert_eq!(escape_drawtext("a:b"), "a\\:b");
    }

    #[test]
    fn test_scene_graph_assembly() {
        let sources = vec![source(Pan::None, Zoom::None), source(Pan::Left, Zoom::None)];
        let graph = build_scene_graph(&sources, &[]);
        assert!(graph.contains("[seg0][seg1]concat=n=2:v=1:a=0[video_out]"));
    }
}
