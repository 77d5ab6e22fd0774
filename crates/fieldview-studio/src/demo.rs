use anyhow::Result;
use fieldview_engine::canvas::CanvasSize;
use fieldview_engine::render::{
    BufferRegion, FIELD_LINE_BYTES, FrameSources, SharedBytes, builtin_line, shared_bytes,
};

/// Lines above the visible frame, left undisplayed.
const BLANKING_LINES: usize = 8;

/// Synthetic field data and direct pixels, animated one tick per frame.
///
/// Both backing stores are shared with the orchestrator's regions; `advance`
/// rewrites them in place between frames.
pub struct Demo {
    size: CanvasSize,
    line_count: usize,
    field: SharedBytes,
    direct: SharedBytes,
    tick: u32,
}

impl Demo {
    pub fn new(size: CanvasSize) -> Self {
        let line_count = BLANKING_LINES + (size.height / builtin_line::LINE_HEIGHT) as usize;
        let mut demo = Self {
            size,
            line_count,
            field: shared_bytes(vec![0; line_count * FIELD_LINE_BYTES]),
            direct: shared_bytes(vec![0; size.pixel_count() as usize]),
            tick: 0,
        };
        demo.write_frame();
        demo
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Regions covering both backing stores in full.
    pub fn sources(&self) -> Result<FrameSources> {
        Ok(FrameSources::both(
            BufferRegion::whole(self.field.clone())?,
            BufferRegion::whole(self.direct.clone())?,
        ))
    }

    pub fn advance(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.write_frame();
    }

    fn write_frame(&self) {
        match self.field.write() {
            Ok(mut bytes) => fill_field(&mut bytes, self.tick),
            Err(_) => log::warn!("field backing store poisoned; frame not updated"),
        }
        match self.direct.write() {
            Ok(mut bytes) => fill_direct(&mut bytes, self.size, self.tick),
            Err(_) => log::warn!("direct backing store poisoned; frame not updated"),
        }
    }
}

fn fill_field(bytes: &mut [u8], tick: u32) {
    for (index, line) in bytes.chunks_exact_mut(FIELD_LINE_BYTES).enumerate() {
        line.fill(0);
        if index < BLANKING_LINES {
            continue;
        }

        let row = index - BLANKING_LINES;
        let mut flags = builtin_line::DISPLAYED;
        // Every 32nd line is a black separator.
        if row % 32 != 0 {
            flags |= builtin_line::HAS_BYTES;
        }
        line[builtin_line::FLAGS] = flags;

        let total_chars = 60 + (row % 17) as u8;
        line[builtin_line::TOTAL_CHARS] = total_chars;
        line[builtin_line::BACK_PORCH] = 4;

        let phase = (tick / 2) as usize;
        let chars = &mut line[builtin_line::CHAR_DATA..];
        for (column, cell) in chars.iter_mut().take(total_chars as usize).enumerate() {
            *cell = if (column + row / 4 + phase) % 8 < 4 {
                0xf0
            } else {
                0x0f
            };
        }
    }
}

fn fill_direct(bytes: &mut [u8], size: CanvasSize, tick: u32) {
    let width = size.width as usize;
    for (index, pixel) in bytes.iter_mut().enumerate() {
        let x = index % width;
        let y = index / width;
        *pixel = (x + y + tick as usize) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_covers_canvas_after_blanking() {
        let demo = Demo::new(CanvasSize::new(640, 512));
        assert_eq!(demo.line_count(), BLANKING_LINES + 256);
        assert_eq!(demo.field.read().unwrap().len() % FIELD_LINE_BYTES, 0);
    }

    #[test]
    fn blanking_lines_are_not_displayed() {
        let demo = Demo::new(CanvasSize::new(64, 16));
        let bytes = demo.field.read().unwrap();
        let flags = |line: usize| bytes[line * FIELD_LINE_BYTES + builtin_line::FLAGS];

        assert_eq!(flags(0), 0);
        assert_eq!(flags(BLANKING_LINES - 1), 0);
        assert_eq!(flags(BLANKING_LINES), builtin_line::DISPLAYED);
        assert_eq!(
            flags(BLANKING_LINES + 1),
            builtin_line::DISPLAYED | builtin_line::HAS_BYTES
        );
    }

    #[test]
    fn direct_pixels_match_canvas() {
        let demo = Demo::new(CanvasSize::new(64, 16));
        assert_eq!(demo.direct.read().unwrap().len(), 64 * 16);
    }

    #[test]
    fn advance_changes_contents_in_place() {
        let mut demo = Demo::new(CanvasSize::new(64, 16));
        let before = demo.direct.read().unwrap().clone();
        demo.advance();
        let after = demo.direct.read().unwrap();
        assert_eq!(before.len(), after.len());
        assert_ne!(before, *after);
    }
}
