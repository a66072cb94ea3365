//! Byte offset to (line, UTF-16 column) conversion.
//!
//! Source map columns are counted in UTF-16 code units, which is what JavaScript
//! tooling indexes strings by.

#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    text: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub fn new(text: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    /// Zero-based line and UTF-16 column of a byte offset. Offsets past the end clamp
    /// to the end of the text.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let col = self.text[line_start..offset].encode_utf16().count();
        (line as u32, col as u32)
    }

    /// Inverse of [`position`](Self::position), for positions inside the text.
    pub fn offset(&self, line: u32, col: u32) -> Option<usize> {
        let line_start = *self.line_starts.get(line as usize)?;
        let line_end = self
            .line_starts
            .get(line as usize + 1)
            .copied()
            .unwrap_or(self.text.len());

        let mut units = 0u32;
        for (i, ch) in self.text[line_start..line_end].char_indices() {
            if units == col {
                return Some(line_start + i);
            }
            units += ch.len_utf16() as u32;
        }
        (units == col).then_some(line_end)
    }
}
