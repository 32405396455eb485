use std::io::{self, Read};

const READ_CHUNK: usize = 4096;

/// forward-only byte cursor over a `Read` with a small lookahead
pub struct SourceReader<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    pos: u64,
    eof: bool,
}

impl<R: Read> SourceReader<R> {
    /// new reader at position 0
    pub fn new(inner: R) -> Self {
        SourceReader {
            inner,
            buf: Vec::with_capacity(READ_CHUNK),
            start: 0,
            pos: 0,
            eof: false,
        }
    }

    /// bytes consumed so far
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// buffered bytes not yet consumed
    pub fn available(&self) -> usize {
        self.buf.len() - self.start
    }

    /// make at least `want` bytes available unless the source ends first,
    /// returns how many are available
    pub fn fill(&mut self, want: usize) -> io::Result<usize> {
        if self.available() >= want || self.eof {
            return Ok(self.available());
        }

        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }

        let mut chunk = [0u8; READ_CHUNK];
        while self.buf.len() < want {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(self.available())
    }

    /// unconsumed lookahead
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// drop `count` bytes of lookahead (clamped to what is buffered)
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.available());
        self.start += count;
        self.pos += count as u64;
        if self.start == self.buf.len() {
            self.buf.clear();
            self.start = 0;
        }
    }

    /// append up to `count` bytes to `out`, returns how many were copied
    pub fn read_into(&mut self, out: &mut Vec<u8>, count: usize) -> io::Result<usize> {
        let available = self.fill(count)?;
        let take = available.min(count);
        out.extend_from_slice(&self.buf[self.start..self.start + take]);
        self.consume(take);
        Ok(take)
    }

    /// discard up to `count` bytes, returns how many were skipped
    pub fn skip(&mut self, count: u64) -> io::Result<u64> {
        let mut skipped = 0u64;
        while skipped < count {
            let want = (count - skipped).min(READ_CHUNK as u64) as usize;
            let available = self.fill(want)?;
            if available == 0 {
                break;
            }
            let take = available.min(want);
            self.consume(take);
            skipped += take as u64;
        }
        Ok(skipped)
    }

    /// discard everything left in the source
    pub fn skip_to_end(&mut self) -> io::Result<u64> {
        self.skip(u64::MAX)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// hands out one byte per read call
    struct Trickle(Vec<u8>, usize);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.1 >= self.0.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[self.1];
            self.1 += 1;
            Ok(1)
        }
    }

    #[test]
    fn test_fill_peek_consume() {
        let mut reader = SourceReader::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        assert!(reader.fill(2).unwrap() >= 2);
        assert_eq!(&reader.peek()[..2], &[1, 2]);
        reader.consume(2);
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.fill(10).unwrap(), 3);
        assert_eq!(reader.peek(), &[3, 4, 5]);
    }

    #[test]
    fn test_fill_across_short_reads() {
        let mut reader = SourceReader::new(Trickle(vec![9, 8, 7, 6], 0));
        assert_eq!(reader.fill(4).unwrap(), 4);
        assert_eq!(reader.peek(), &[9, 8, 7, 6]);
    }

    #[test]
    fn test_read_into_and_skip() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut reader = SourceReader::new(Cursor::new(data));
        assert_eq!(reader.skip(10).unwrap(), 10);

        let mut out = Vec::new();
        assert_eq!(reader.read_into(&mut out, 5).unwrap(), 5);
        assert_eq!(out, vec![10, 11, 12, 13, 14]);
        assert_eq!(reader.position(), 15);

        assert_eq!(reader.skip_to_end().unwrap(), 85);
        assert_eq!(reader.fill(1).unwrap(), 0);
        assert_eq!(reader.position(), 100);
    }

    #[test]
    fn test_read_into_short_at_end() {
        let mut reader = SourceReader::new(Cursor::new(vec![1u8, 2, 3]));
        let mut out = Vec::new();
        assert_eq!(reader.read_into(&mut out, 8).unwrap(), 3);
        assert_eq!(out, vec![1, 2, 3]);
    }
}
