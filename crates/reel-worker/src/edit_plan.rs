//! Edit plan construction and validation.

use reel_models::{
    Caption, EditPlan, EditSegment, Pan, SegmentReason, VisualClip, WordTimestamp, Zoom, PANS,
};
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};
use crate::gate::GateReport;

/// Hard cap on a single segment.
const MAX_SEGMENT_MS: u64 = 3000;
/// Gap tolerance when tiling the timeline.
const CONTIGUITY_TOLERANCE_MS: u64 = 20;
/// Extra slack allowed at the tail.
const TAIL_TOLERANCE_MS: u64 = 200;
/// A pattern interrupt is mandated inside every window of this size.
const INTERRUPT_WINDOW_MS: u64 = 2500;

/// Working segment before visuals and reasons are attached.
#[derive(Debug, Clone)]
struct Draft {
    start_ms: u64,
    end_ms: u64,
    caption_id: String,
    emphasis: bool,
}

/// Build the edit plan for one scene.
///
/// Deterministic construction: captions map to base segments, long
/// segments split at word boundaries, emphasis words are isolated,
/// silence fills every hole, visuals attach by coverage, and every
/// 2500 ms window receives a pattern interrupt.
pub fn build_edit_plan(
    timestamps: &[WordTimestamp],
    captions: &[Caption],
    clips: &[VisualClip],
    duration_ms: u64,
) -> WorkerResult<EditPlan> {
    // 1. Base segments map captions 1:1.
    let mut drafts: Vec<Draft> = captions
        .iter()
        .enumerate()
        .map(|(i, c)| Draft {
            start_ms: c.start_ms,
            end_ms: c.end_ms,
            caption_id: format!("caption_{}", i),
            emphasis: c.has_emphasis(),
        })
        .collect();

    // 2. Split anything over 3000ms at the nearest prior word boundary.
    drafts = split_long_segments(drafts, timestamps);

    // 3. Isolate emphasis words into their own one-word segments.
    drafts = isolate_emphasis(drafts, timestamps);

    // 4. Fill gaps with synthetic silence segments.
    drafts.sort_by_key(|d| d.start_ms);
    drafts = fill_gaps(drafts, duration_ms);

    // 5-6. Attach visuals and emphasis zoom.
    let mut segments = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let clip = clips
            .iter()
            .find(|c| c.covers(draft.start_ms))
            .or_else(|| {
                // The final segment may start exactly at a clip's end
                // when timelines line up; accept the tail clip.
                clips.iter().find(|c| c.end_ms == draft.start_ms)
            })
            .ok_or_else(|| {
                WorkerError::gate_reject(
                    "edit_plan",
                    vec![format!(
                        "No visual clip covers segment starting at {}ms",
                        draft.start_ms
                    )],
                )
            })?;

        let (zoom, reason) = if draft.emphasis {
            (Zoom::Subtle, SegmentReason::Emphasis)
        } else {
            (Zoom::None, SegmentReason::Cut)
        };

        segments.push(EditSegment {
            start_ms: draft.start_ms,
            end_ms: draft.end_ms,
            clip_id: clip.clip_id.clone(),
            zoom,
            pan: Pan::None,
            caption_id: draft.caption_id.clone(),
            reason,
        });
    }

    // 7. Pattern interrupts: one per 2500ms window.
    apply_pattern_interrupts(&mut segments, duration_ms)?;

    debug!(
        segments = segments.len(),
        duration_ms, "Edit plan constructed"
    );
    Ok(EditPlan {
        segments,
        duration_ms,
    })
}

/// Split segments longer than 3000ms at word boundaries, never
/// mid-word, repeating until every piece fits.
fn split_long_segments(drafts: Vec<Draft>, timestamps: &[WordTimestamp]) -> Vec<Draft> {
    let mut out = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let mut current = draft;
        loop {
            if current.end_ms - current.start_ms <= MAX_SEGMENT_MS {
                out.push(current);
                break;
            }
            let limit = current.start_ms + MAX_SEGMENT_MS;
            // Nearest word start at or before the limit, strictly
            // inside the segment.
            let boundary = timestamps
                .iter()
                .map(|t| t.start_ms)
                .filter(|&s| s > current.start_ms && s <= limit)
                .max()
                .unwrap_or(limit);
            out.push(Draft {
                start_ms: current.start_ms,
                end_ms: boundary,
                caption_id: current.caption_id.clone(),
                emphasis: current.emphasis,
            });
            current.start_ms = boundary;
        }
    }
    out
}

/// Split segments containing emphasis words so each emphasis word is
/// its own one-word segment; the remainder keeps its caption.
fn isolate_emphasis(drafts: Vec<Draft>, timestamps: &[WordTimestamp]) -> Vec<Draft> {
    let mut out = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let emphasis_words: Vec<&WordTimestamp> = timestamps
            .iter()
            .filter(|t| t.emphasis && t.start_ms >= draft.start_ms && t.end_ms <= draft.end_ms)
            .collect();

        if emphasis_words.is_empty() {
            out.push(draft);
            continue;
        }

        let mut cursor = draft.start_ms;
        for word in &emphasis_words {
            if word.start_ms > cursor {
                out.push(Draft {
                    start_ms: cursor,
                    end_ms: word.start_ms,
                    caption_id: draft.caption_id.clone(),
                    emphasis: false,
                });
            }
            out.push(Draft {
                start_ms: word.start_ms,
                end_ms: word.end_ms,
                caption_id: draft.caption_id.clone(),
                emphasis: true,
            });
            cursor = word.end_ms;
        }
        if cursor < draft.end_ms {
            out.push(Draft {
                start_ms: cursor,
                end_ms: draft.end_ms,
                caption_id: draft.caption_id.clone(),
                emphasis: false,
            });
        }
    }
    out
}

/// Insert `silence_k` segments wherever the sorted drafts leave a
/// hole, including the shortfall to the total duration.
fn fill_gaps(drafts: Vec<Draft>, duration_ms: u64) -> Vec<Draft> {
    let mut out: Vec<Draft> = Vec::with_capacity(drafts.len());
    let mut cursor: u64 = 0;
    let mut silence_index = 0usize;

    let push_silence = |from: u64, to: u64, out: &mut Vec<Draft>, index: &mut usize| {
        let mut start = from;
        while start < to {
            let end = (start + MAX_SEGMENT_MS).min(to);
            out.push(Draft {
                start_ms: start,
                end_ms: end,
                caption_id: format!("silence_{}", index),
                emphasis: false,
            });
            *index += 1;
            start = end;
        }
    };

    for draft in drafts {
        if draft.start_ms > cursor + CONTIGUITY_TOLERANCE_MS {
            push_silence(cursor, draft.start_ms, &mut out, &mut silence_index);
        }
        cursor = cursor.max(draft.end_ms);
        out.push(draft);
    }
    if duration_ms > cursor {
        push_silence(cursor, duration_ms, &mut out, &mut silence_index);
    }
    out
}

/// Deterministic pan choice for a pattern interrupt: index derived
/// from the clip ID's character codes, never `Pan::None`.
fn interrupt_pan(clip_id: &str) -> Pan {
    let sum: u64 = clip_id.chars().map(|c| c as u64).sum();
    PANS[(sum % (PANS.len() as u64 - 1) + 1) as usize]
}

/// Mark the first non-emphasis segment in every 2500ms window as a
/// pattern interrupt. A window with no candidate is fatal.
fn apply_pattern_interrupts(segments: &mut [EditSegment], duration_ms: u64) -> WorkerResult<()> {
    let mut window_start = 0u64;
    while window_start < duration_ms {
        let window_end = (window_start + INTERRUPT_WINDOW_MS).min(duration_ms);

        let candidate = segments.iter_mut().find(|s| {
            s.reason != SegmentReason::Emphasis && s.intersects(window_start, window_end)
        });

        match candidate {
            Some(segment) => {
                segment.pan = interrupt_pan(&segment.clip_id);
                segment.reason = SegmentReason::PatternInterrupt;
            }
            None => {
                return Err(WorkerError::gate_reject(
                    "edit_plan",
                    vec![format!(
                        "No pattern interrupt candidate in window {}ms-{}ms",
                        window_start, window_end
                    )],
                ));
            }
        }

        window_start += INTERRUPT_WINDOW_MS;
    }
    Ok(())
}

/// Validate an edit plan against the timeline invariants.
pub fn validate_edit_plan(plan: &EditPlan) -> GateReport {
    let mut report = GateReport::new();
    let segments = &plan.segments;

    if segments.is_empty() {
        report.reject("Edit plan has no segments");
        return report;
    }

    if segments[0].start_ms > CONTIGUITY_TOLERANCE_MS {
        report.reject(format!(
            "Plan starts at {}ms instead of 0",
            segments[0].start_ms
        ));
    }

    for pair in segments.windows(2) {
        let drift = pair[1].start_ms.abs_diff(pair[0].end_ms);
        if drift > CONTIGUITY_TOLERANCE_MS {
            report.reject(format!(
                "Gap/overlap of {}ms between segments at {}ms",
                drift, pair[0].end_ms
            ));
        }
    }

    let last_end = segments.last().unwrap().end_ms;
    if last_end.abs_diff(plan.duration_ms) > TAIL_TOLERANCE_MS {
        report.reject(format!(
            "Plan ends at {}ms, target {}ms",
            last_end, plan.duration_ms
        ));
    }

    for (index, segment) in segments.iter().enumerate() {
        if segment.duration_ms() > MAX_SEGMENT_MS {
            report.reject(format!(
                "Segment {} lasts {}ms (max {}ms)",
                index,
                segment.duration_ms(),
                MAX_SEGMENT_MS
            ));
        }
        if !segment.zoom.is_none() && segment.reason != SegmentReason::Emphasis {
            report.reject(format!(
                "Segment {} has zoom without emphasis reason",
                index
            ));
        }
    }

    let mut window_start = 0u64;
    while window_start < plan.duration_ms {
        let window_end = (window_start + INTERRUPT_WINDOW_MS).min(plan.duration_ms);
        let has_interrupt = segments.iter().any(|s| {
            s.reason == SegmentReason::PatternInterrupt && s.intersects(window_start, window_end)
        });
        if !has_interrupt {
            report.reject(format!(
                "No pattern interrupt in window {}ms-{}ms",
                window_start, window_end
            ));
        }
        window_start += INTERRUPT_WINDOW_MS;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::group_captions;
    use crate::timing::synthesize_scene;
    use reel_models::Transform;

    /// One long clip covering the whole scene plus a helper tiling.
    fn clips_covering(duration_ms: u64) -> Vec<VisualClip> {
        let mut clips = Vec::new();
        let mut start = 0;
        let mut n = 0;
        while start < duration_ms {
            let end = (start + 2500).min(duration_ms);
            clips.push(VisualClip {
                clip_id: format!("clip_{}", n),
                provider: "mock".to_string(),
                local_path: format!("/assets/clips/clip_{}.mp4", n),
                start_ms: start,
                end_ms: end,
                keyword: "k".to_string(),
                transform: Transform::default(),
            });
            start = end;
            n += 1;
        }
        clips
    }

    fn plan_for(text: &str, scene_index: usize) -> EditPlan {
        let timing = synthesize_scene(scene_index, 7, text);
        let captions = group_captions(&timing.timestamps);
        let clips = clips_covering(timing.duration_ms);
        build_edit_plan(&timing.timestamps, &captions, &clips, timing.duration_ms).unwrap()
    }

    #[test]
    fn test_plan_passes_gate_for_plain_scene() {
        let plan = plan_for("plain words fill this body scene with steady rhythm here", 2);
        let report = validate_edit_plan(&plan);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn test_emphasis_words_are_isolated_and_zoomed() {
        let plan = plan_for("the secret is patience but timing matters more", 2);

        let emphasis: Vec<&EditSegment> = plan
            .segments
            .iter()
            .filter(|s| s.reason == SegmentReason::Emphasis)
            .collect();
        assert!(!emphasis.is_empty());
        for segment in emphasis {
            assert_eq!(segment.zoom, Zoom::Subtle);
        }

        // Non-emphasis segments never zoom.
        for segment in &plan.segments {
            if segment.reason != SegmentReason::Emphasis {
                assert!(segment.zoom.is_none());
            }
        }
    }

    #[test]
    fn test_trailing_pause_becomes_silence() {
        // Body scene carries a trailing inter-scene pause.
        let plan = plan_for("short scene text here", 2);
        assert!(plan.segments.iter().any(|s| s.is_silence()));

        let last = plan.segments.last().unwrap();
        assert_eq!(last.end_ms, plan.duration_ms);
    }

    #[test]
    fn test_every_window_has_an_interrupt() {
        let text = vec!["steady"; 30].join(" ");
        let plan = plan_for(&text, 3);

        let mut window_start = 0;
        while window_start < plan.duration_ms {
            let window_end = (window_start + 2500).min(plan.duration_ms);
            assert!(
                plan.segments.iter().any(|s| {
                    s.reason == SegmentReason::PatternInterrupt
                        && s.intersects(window_start, window_end)
                }),
                "window {}..{} lacks interrupt",
                window_start,
                window_end
            );
            window_start += 2500;
        }
    }

    #[test]
    fn test_interrupt_pan_is_deterministic_and_never_none() {
        assert_eq!(interrupt_pan("clip_0"), interrupt_pan("clip_0"));
        for id in ["a", "bc", "def", "clip_12", "pexels_99"] {
            assert_ne!(interrupt_pan(id), Pan::None);
        }
    }

    #[test]
    fn test_plan_construction_is_idempotent() {
        let timing = synthesize_scene(2, 7, "numbers like 42 stop the scroll instantly");
        let captions = group_captions(&timing.timestamps);
        let clips = clips_covering(timing.duration_ms);

        let first =
            build_edit_plan(&timing.timestamps, &captions, &clips, timing.duration_ms).unwrap();
        let second =
            build_edit_plan(&timing.timestamps, &captions, &clips, timing.duration_ms).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_missing_visual_coverage_is_fatal() {
        let timing = synthesize_scene(2, 7, "some words here");
        let captions = group_captions(&timing.timestamps);
        // Clips cover only the first 200ms.
        let clips = vec![VisualClip {
            clip_id: "short".to_string(),
            provider: "mock".to_string(),
            local_path: "/assets/clips/short.mp4".to_string(),
            start_ms: 0,
            end_ms: 200,
            keyword: "k".to_string(),
            transform: Transform::default(),
        }];

        let err =
            build_edit_plan(&timing.timestamps, &captions, &clips, timing.duration_ms).unwrap_err();
        assert_eq!(err.error_type(), "GATE_REJECT");
    }

    #[test]
    fn test_gate_rejects_unzoomed_reason_mismatch() {
        let mut plan = plan_for("plain body words again", 2);
        // Corrupt: zoom on a cut segment.
        if let Some(seg) = plan
            .segments
            .iter_mut()
            .find(|s| s.reason == SegmentReason::Cut)
        {
            seg.zoom = Zoom::Subtle;
        }
        let report = validate_edit_plan(&plan);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("zoom without emphasis reason")));
    }
}
