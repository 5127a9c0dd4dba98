//! Run length decoders: IFF ByteRun1 and the Maya tile RLE.

use crate::cursor::Cursor;
use crate::error::IffError;

/// ByteRun1 (PackBits) decode into `out`, returning the number of bytes
/// written.
///
/// Control byte `n` as i8: `0..=127` copies `n + 1` literal bytes,
/// `-127..=-1` repeats the next byte `1 - n` times. With `run_128` set,
/// `-128` is a 129-byte run like any other negative count; otherwise it is
/// skipped. Decoding stops when `out` is full or the input runs dry; runs
/// that overshoot `out` are clipped.
pub(crate) fn unpack_bits(cur: &mut Cursor<'_>, out: &mut [u8], run_128: bool) -> usize {
    let mut written = 0;
    while written < out.len() {
        let Ok(ctl) = cur.read_u8() else { break };
        let n = ctl as i8;
        if n >= 0 {
            let count = (n as usize + 1).min(out.len() - written);
            let got = cur.read_up_to(&mut out[written..written + count]);
            written += got;
            if got < count {
                break;
            }
            // literal bytes clipped by the end of `out` are still consumed
            cur.skip(n as usize + 1 - count);
        } else if n != -128 || run_128 {
            let Ok(value) = cur.read_u8() else { break };
            let count = (1 - isize::from(n)) as usize;
            let count = count.min(out.len() - written);
            out[written..written + count].fill(value);
            written += count;
        }
    }
    written
}

/// Maya tile RLE decode into `out`, returning the number of bytes written.
///
/// The low 7 bits of a control byte plus one give the count. With the high
/// bit set one value byte follows and is repeated; otherwise `count`
/// literal bytes follow. A run that would overflow `out` ends decoding.
pub(crate) fn unpack_maya_rle(cur: &mut Cursor<'_>, out: &mut [u8]) -> Result<usize, IffError> {
    let mut written = 0;
    while written < out.len() && !cur.at_end() {
        let ctl = cur.read_u8()?;
        let count = usize::from(ctl & 0x7F) + 1;
        if count > out.len() - written {
            break;
        }
        let dst = &mut out[written..written + count];
        if ctl & 0x80 != 0 {
            dst.fill(cur.read_u8()?);
        } else {
            cur.read_exact(dst)?;
        }
        written += count;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpack(input: &[u8], len: usize, run_128: bool) -> alloc::vec::Vec<u8> {
        let mut out = alloc::vec![0u8; len];
        let n = unpack_bits(&mut Cursor::new(input), &mut out, run_128);
        out.truncate(n);
        out
    }

    #[test]
    fn literal_and_repeat_runs() {
        let input = [0x02, 1, 2, 3, 0xFE, 9, 0x00, 7];
        assert_eq!(unpack(&input, 7, true), [1, 2, 3, 9, 9, 9, 7]);
    }

    #[test]
    fn minus_128_is_a_run_when_enabled() {
        let out = unpack(&[0x80, 0xAA], 129, true);
        assert_eq!(out.len(), 129);
        assert!(out.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn minus_128_is_skipped_when_disabled() {
        assert_eq!(unpack(&[0x80, 0x01, 5, 6], 2, false), [5, 6]);
    }

    #[test]
    fn short_input_reports_partial_length() {
        assert_eq!(unpack(&[0x04, 1, 2], 5, true), [1, 2]);
        assert!(unpack(&[0xFD], 4, true).is_empty());
    }

    #[test]
    fn rows_decode_from_one_stream() {
        // the literal of the first row overshoots; the clipped byte is dropped
        let input = [0x02, 1, 2, 3, 0xFF, 4];
        let mut cur = Cursor::new(&input);
        let mut row = [0u8; 2];
        assert_eq!(unpack_bits(&mut cur, &mut row, true), 2);
        assert_eq!(row, [1, 2]);
        assert_eq!(unpack_bits(&mut cur, &mut row, true), 2);
        assert_eq!(row, [4, 4]);
    }

    #[test]
    fn maya_runs() {
        let input = [0x83, 7, 0x01, 1, 2, 0x80, 9];
        let mut out = [0u8; 7];
        let n = unpack_maya_rle(&mut Cursor::new(&input), &mut out).unwrap();
        assert_eq!(n, 7);
        assert_eq!(out, [7, 7, 7, 7, 1, 2, 9]);
    }

    #[test]
    fn maya_run_past_output_stops() {
        let mut out = [0u8; 3];
        let n = unpack_maya_rle(&mut Cursor::new(&[0x81, 5, 0x83, 6]), &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(out, [5, 5, 0]);
    }

    #[test]
    fn maya_short_literal_is_an_error() {
        let mut out = [0u8; 8];
        assert!(matches!(
            unpack_maya_rle(&mut Cursor::new(&[0x03, 1, 2]), &mut out),
            Err(IffError::UnexpectedEof)
        ));
    }
}
