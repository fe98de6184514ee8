use std::io::{self, BufRead};

use crate::error::Error;

/// Longest line the scanner accepts, matching the conventional line-scanner
/// token limit. Longer lines are an I/O error, never a silent truncation.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Splits an input stream into logical lines.
///
/// `\n`, `\r`, and `\r\n` all terminate a line, even when mixed within one
/// stream. Runs of terminators are not collapsed, so an empty line between two
/// terminators is yielded as an empty string. A trailing terminator yields one
/// final empty line; a final chunk without a terminator is yielded as-is.
#[derive(Debug)]
pub struct LineScanner<R> {
    reader: R,
    done: bool,
    terminated: bool,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
            terminated: false,
        }
    }

    /// Yield the next line, terminator stripped, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<String>, Error> {
        if self.done {
            return Ok(None);
        }

        let mut line = Vec::new();
        loop {
            let (used, terminator) = {
                let buf = self.reader.fill_buf()?;
                if buf.is_empty() {
                    self.done = true;
                    if line.is_empty() && !self.terminated {
                        return Ok(None);
                    }
                    self.terminated = false;
                    break;
                }

                match buf.iter().position(|&byte| byte == b'\n' || byte == b'\r') {
                    Some(pos) => {
                        line.extend_from_slice(&buf[..pos]);
                        (pos + 1, Some(buf[pos]))
                    }
                    None => {
                        line.extend_from_slice(buf);
                        (buf.len(), None)
                    }
                }
            };
            self.reader.consume(used);

            if line.len() > MAX_LINE_LEN {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line exceeds maximum length of {MAX_LINE_LEN} bytes"),
                )));
            }

            match terminator {
                Some(b'\r') => {
                    // A CR directly followed by LF is one terminator, and the
                    // LF may sit in the next buffered chunk.
                    let buf = self.reader.fill_buf()?;
                    if buf.first() == Some(&b'\n') {
                        self.reader.consume(1);
                    }
                    self.terminated = true;
                    break;
                }
                Some(_) => {
                    self.terminated = true;
                    break;
                }
                None => continue,
            }
        }

        let line =
            String::from_utf8(line).map_err(|err| Error::InvalidEncoding(err.utf8_error()))?;
        Ok(Some(line))
    }
}

impl<R: BufRead> Iterator for LineScanner<R> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::{LineScanner, MAX_LINE_LEN};
    use crate::error::Error;

    fn scan(input: &str) -> Vec<String> {
        LineScanner::new(input.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .expect("scan should succeed")
    }

    #[test]
    fn lf_split_with_trailing_lf() {
        assert_eq!(scan("aa\nbb\ncc\n"), ["aa", "bb", "cc", ""]);
    }

    #[test]
    fn lf_split_without_trailing_lf() {
        assert_eq!(scan("aa\nbb\ncc"), ["aa", "bb", "cc"]);
    }

    #[test]
    fn cr_split_with_trailing_cr() {
        assert_eq!(scan("aa\rbb\rcc\r"), ["aa", "bb", "cc", ""]);
    }

    #[test]
    fn cr_split_without_trailing_cr() {
        assert_eq!(scan("aa\rbb\rcc"), ["aa", "bb", "cc"]);
    }

    #[test]
    fn crlf_split_with_trailing_crlf() {
        assert_eq!(scan("aa\r\nbb\r\ncc\r\n"), ["aa", "bb", "cc", ""]);
    }

    #[test]
    fn crlf_split_without_trailing_crlf() {
        assert_eq!(scan("aa\r\nbb\r\ncc"), ["aa", "bb", "cc"]);
    }

    #[test]
    fn mixed_line_endings() {
        assert_eq!(scan("aa\r\nbb\ncc\rdd"), ["aa", "bb", "cc", "dd"]);
    }

    #[test]
    fn terminator_runs_are_not_collapsed() {
        assert_eq!(scan("aa\n\nbb"), ["aa", "", "bb"]);
        assert_eq!(scan("\r\n\r\n"), ["", "", ""]);
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert_eq!(scan(""), Vec::<String>::new());
    }

    #[test]
    fn crlf_split_across_buffer_boundary() {
        // BufReader with capacity 4 forces the LF of a CRLF pair into the
        // following chunk.
        let reader = std::io::BufReader::with_capacity(4, "abc\r\ndef\n".as_bytes());
        let lines = LineScanner::new(reader)
            .collect::<Result<Vec<_>, _>>()
            .expect("scan should succeed");
        assert_eq!(lines, ["abc", "def", ""]);
    }

    #[test]
    fn overlong_line_is_an_io_error() {
        let input = "a".repeat(MAX_LINE_LEN + 1);
        let mut scanner = LineScanner::new(input.as_bytes());
        match scanner.next_line() {
            Err(Error::Io(err)) => {
                assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let mut scanner = LineScanner::new(&b"KEY=\xff\xfe\n"[..]);
        match scanner.next_line() {
            Err(Error::InvalidEncoding(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
