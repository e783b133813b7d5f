//! Sampling a rectangular window out of a wraparound buffer.
//!
//! The tile grid is stored toroidally: a window whose origin sits near the
//! right or bottom edge continues at the left or top. Reassembling it as a
//! rectangle takes up to four copies, one per quadrant of the seam.

use crate::PixelRect;

/// One piece of a window sampled out of a wraparound buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrapSegment {
    /// Source rectangle inside the buffer, never crossing its edges.
    pub src: PixelRect,
    /// Offset of this piece from the window's top-left corner.
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Split a `width` x `height` window starting at `(origin_x, origin_y)` of a
/// `buffer_width` x `buffer_height` wraparound buffer into at most four
/// non-wrapping segments, ordered top-left, top-right, bottom-left,
/// bottom-right.
///
/// The origin is wrapped into the buffer and the window is clamped to the
/// buffer's extent. Empty pieces are omitted, so a window that never meets
/// the seam yields one segment and an empty window yields none.
pub fn split_wrapped(
    origin_x: u32,
    origin_y: u32,
    width: u32,
    height: u32,
    buffer_width: u32,
    buffer_height: u32,
) -> Vec<WrapSegment> {
    if buffer_width == 0 || buffer_height == 0 {
        return Vec::new();
    }

    let x = origin_x % buffer_width;
    let y = origin_y % buffer_height;
    let width = width.min(buffer_width);
    let height = height.min(buffer_height);

    // Extent before the seam on each axis, then the wrapped remainder.
    let left_w = width.min(buffer_width - x);
    let right_w = width - left_w;
    let top_h = height.min(buffer_height - y);
    let bottom_h = height - top_h;

    let candidates = [
        WrapSegment {
            src: PixelRect::new(x, y, left_w, top_h),
            offset_x: 0,
            offset_y: 0,
        },
        WrapSegment {
            src: PixelRect::new(0, y, right_w, top_h),
            offset_x: left_w,
            offset_y: 0,
        },
        WrapSegment {
            src: PixelRect::new(x, 0, left_w, bottom_h),
            offset_x: 0,
            offset_y: top_h,
        },
        WrapSegment {
            src: PixelRect::new(0, 0, right_w, bottom_h),
            offset_x: left_w,
            offset_y: top_h,
        },
    ];

    candidates
        .into_iter()
        .filter(|segment| !segment.src.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Map every window pixel through the segments back to a buffer pixel.
    fn reassemble(segments: &[WrapSegment], width: u32, height: u32) -> Vec<Option<(u32, u32)>> {
        let mut out = vec![None; (width * height) as usize];
        for segment in segments {
            for dy in 0..segment.src.height {
                for dx in 0..segment.src.width {
                    let wx = segment.offset_x + dx;
                    let wy = segment.offset_y + dy;
                    let slot = &mut out[(wy * width + wx) as usize];
                    assert!(slot.is_none(), "segments overlap at ({wx}, {wy})");
                    *slot = Some((segment.src.x + dx, segment.src.y + dy));
                }
            }
        }
        out
    }

    #[test]
    fn no_wrap_is_single_segment() {
        let segments = split_wrapped(2, 3, 4, 4, 16, 16);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].src, PixelRect::new(2, 3, 4, 4));
    }

    #[test]
    fn horizontal_wrap_is_two_segments() {
        let segments = split_wrapped(14, 0, 6, 4, 16, 16);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].src, PixelRect::new(14, 0, 2, 4));
        assert_eq!(segments[1].src, PixelRect::new(0, 0, 4, 4));
        assert_eq!(segments[1].offset_x, 2);
    }

    #[test]
    fn vertical_wrap_is_two_segments() {
        let segments = split_wrapped(0, 15, 4, 3, 16, 16);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].src, PixelRect::new(0, 0, 4, 2));
        assert_eq!(segments[1].offset_y, 1);
    }

    #[test]
    fn corner_wrap_is_four_segments_covering_window() {
        let segments = split_wrapped(6, 6, 6, 6, 8, 8);
        assert_eq!(segments.len(), 4);

        let pixels = reassemble(&segments, 6, 6);
        for wy in 0..6 {
            for wx in 0..6 {
                let expected = ((6 + wx) % 8, (6 + wy) % 8);
                assert_eq!(pixels[(wy * 6 + wx) as usize], Some(expected));
            }
        }
    }

    #[test]
    fn empty_window_yields_nothing() {
        assert!(split_wrapped(5, 5, 0, 0, 8, 8).is_empty());
        assert!(split_wrapped(5, 5, 3, 0, 8, 8).is_empty());
    }

    #[test]
    fn window_ending_exactly_at_seam_does_not_wrap() {
        let segments = split_wrapped(4, 4, 4, 4, 8, 8);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].src, PixelRect::new(4, 4, 4, 4));
    }

    #[test]
    fn origin_outside_buffer_is_wrapped() {
        let segments = split_wrapped(9, 17, 2, 2, 8, 8);
        assert_eq!(segments[0].src, PixelRect::new(1, 1, 2, 2));
    }

    #[test]
    fn oversized_window_is_clamped_to_buffer() {
        let segments = split_wrapped(3, 0, 20, 2, 8, 8);
        let covered: u32 = segments.iter().map(|s| s.src.width).sum();
        assert_eq!(covered, 8);
    }
}
