//! Conversion of backend readback buffers to the caller's layout.

use crate::backend::{ChannelOrder, PixelLayout, RowOrder};

/// Rewrites `buf` (`width × height` pixels in `native` layout) in place as
/// top-down rows with `wanted` channel order.
pub(crate) fn normalize(
    buf: &mut [u8],
    width: u32,
    height: u32,
    native: PixelLayout,
    wanted: ChannelOrder,
) {
    debug_assert_eq!(buf.len(), width as usize * height as usize * 4);
    if native.rows == RowOrder::BottomUp {
        flip_rows(buf, width as usize * 4);
    }
    if native.channels != wanted {
        swap_red_blue(buf);
    }
}

/// Reverses scanline order.
fn flip_rows(buf: &mut [u8], row_bytes: usize) {
    if row_bytes == 0 {
        return;
    }
    let rows = buf.len() / row_bytes;
    for i in 0..rows / 2 {
        let (head, tail) = buf.split_at_mut((rows - 1 - i) * row_bytes);
        head[i * row_bytes..(i + 1) * row_bytes].swap_with_slice(&mut tail[..row_bytes]);
    }
}

/// RGBA <-> BGRA.
fn swap_red_blue(buf: &mut [u8]) {
    for px in buf.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}
