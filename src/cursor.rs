//! Seekable read cursor over the input bytes.

use crate::error::IffError;

#[derive(Clone, Debug)]
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn seek(&mut self, pos: usize) -> Result<(), IffError> {
        if pos > self.data.len() {
            return Err(IffError::UnexpectedEof);
        }
        self.pos = pos;
        Ok(())
    }

    pub(crate) fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn peek_array<const N: usize>(&self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(N)?)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        Some(buf)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, IffError> {
        let b = self.peek_u8().ok_or(IffError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], IffError> {
        let buf = self.peek_array::<N>().ok_or(IffError::UnexpectedEof)?;
        self.pos += N;
        Ok(buf)
    }

    /// Borrow the next `n` bytes and advance past them.
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], IffError> {
        if n > self.remaining() {
            return Err(IffError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), IffError> {
        let bytes = self.take(buf.len())?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    /// Advance by up to `n` bytes, returning how far it moved.
    pub(crate) fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.remaining());
        self.pos += n;
        n
    }

    /// Copy as many bytes as are available into `buf`, returning the count.
    pub(crate) fn read_up_to(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}
