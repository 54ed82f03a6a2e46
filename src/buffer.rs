//! The parser's growable input buffer.
//!
//! spec.md §4.6 describes a buffer of raw pointers (`start`, `current`,
//! `line-start`, `token-start`, `token-end`) that must be "rebased in
//! lockstep" whenever growth reallocates the backing storage. A `Vec<u8>`
//! addressed by `usize` offsets gives the identical guarantee — no saved
//! position is invalidated by growth — without any pointer rebasing at
//! all, because an offset's meaning doesn't change when the `Vec`
//! reallocates. The buffer grows monotonically for the life of a session
//! and is never compacted, matching spec.md §5's resource model.

use crate::error::ParseError;

const LOW_WATER_MARK: usize = 512;
const GROW_PAGE: usize = 4096;

pub(crate) struct Buffer {
    data: Vec<u8>,
    filled: usize,
    pos: usize,
    line: usize,
    line_start: usize,
    token_start: usize,
    end_of_input: bool,
}

impl Buffer {
    pub(crate) fn new() -> Self {
        Buffer {
            data: Vec::new(),
            filled: 0,
            pos: 0,
            line: 1,
            line_start: 0,
            token_start: 0,
            end_of_input: false,
        }
    }

    /// Guarantee at least `min_headroom` bytes of unfilled space past
    /// `filled`, growing by whole pages if not.
    pub(crate) fn ensure_fillable(&mut self, min_headroom: usize) -> Result<(), ParseError> {
        let needed = min_headroom.max(LOW_WATER_MARK);
        if self.headroom() >= needed {
            return Ok(());
        }
        let deficit = needed - self.headroom();
        let grow = deficit.div_ceil(GROW_PAGE) * GROW_PAGE;
        self.data
            .try_reserve(grow)
            .map_err(|_| ParseError::memory(self.line(), self.column()))?;
        let new_len = self.data.len() + grow;
        self.data.resize(new_len, 0);
        Ok(())
    }

    /// The writable region past the filled data, after guaranteeing
    /// `min_headroom` bytes are available.
    pub(crate) fn acquire(&mut self, min_headroom: usize) -> Result<&mut [u8], ParseError> {
        self.ensure_fillable(min_headroom)?;
        Ok(&mut self.data[self.filled..])
    }

    /// Declare `n` bytes written into the region returned by the most
    /// recent [`Buffer::acquire`] call, and optionally mark end-of-input.
    pub(crate) fn commit(&mut self, n: usize, end_of_input: bool) {
        self.filled += n;
        if end_of_input {
            self.end_of_input = true;
        }
    }

    pub(crate) fn headroom(&self) -> usize {
        self.data.len() - self.filled
    }

    pub(crate) fn is_end_of_input(&self) -> bool {
        self.end_of_input
    }

    pub(crate) fn at_end_of_data(&self) -> bool {
        self.pos >= self.filled
    }

    /// True once the end-of-input flag is set and every filled byte has
    /// been consumed.
    pub(crate) fn input_exhausted(&self) -> bool {
        self.end_of_input && self.at_end_of_data()
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn advance(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn start_token(&mut self) {
        self.token_start = self.pos;
    }

    /// The bytes of the token started by [`Buffer::start_token`], up to
    /// but not including the current position.
    pub(crate) fn token_text(&self) -> &[u8] {
        &self.data[self.token_start..self.pos]
    }

    pub(crate) fn set_line_start(&mut self, at: usize) {
        self.line_start = at;
    }

    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn bump_line(&mut self) {
        self.line += 1;
    }

    pub(crate) fn column(&self) -> usize {
        self.pos - self.line_start + 1
    }

    pub(crate) fn column_of(&self, offset: usize) -> usize {
        offset - self.line_start + 1
    }
}
