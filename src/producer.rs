//! Producer side: one thread per input file streams hostnames into the queue.

use crate::hostname::Hostname;
use crate::queue::{BoundedQueue, PushError};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// What one producer did with its input file.
#[derive(Debug)]
pub struct ProducerReport {
    /// The input file.
    pub path: PathBuf,
    /// Hostnames handed to the queue.
    pub hostnames: usize,
    /// Tokens cut down to the maximum hostname length.
    pub truncated: usize,
    /// Open or read failure. Hostnames pushed before a read failure still
    /// count.
    pub error: Option<io::Error>,
}

impl ProducerReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            hostnames: 0,
            truncated: 0,
            error: None,
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Reads every hostname from `path` and pushes it into `queue`.
///
/// Never fails: an unopenable or unreadable file is logged and reported, and
/// does not affect other producers.
pub fn run_producer(
    path: &Path,
    queue: &BoundedQueue<Hostname>,
    max_len: usize,
) -> ProducerReport {
    let mut report = ProducerReport::new(path);

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Cannot open input file");
            report.error = Some(e);
            return report;
        }
    };

    if let Err(e) = produce_from(BufReader::new(file), queue, max_len, &mut report) {
        tracing::error!(
            path = %path.display(),
            error = %e,
            after = report.hostnames,
            "Failed reading input file"
        );
        report.error = Some(e);
    }

    tracing::info!(
        path = %path.display(),
        hostnames = report.hostnames,
        "Producer finished"
    );
    report
}

/// Pushes every token of `reader` into `queue` as soon as it is complete.
///
/// Stops early, without error, if the queue is closed underneath it.
fn produce_from<R: BufRead>(
    reader: R,
    queue: &BoundedQueue<Hostname>,
    max_len: usize,
    report: &mut ProducerReport,
) -> io::Result<()> {
    let mut tokens = TokenReader::new(reader, max_len);
    while let Some(token) = tokens.next_token()? {
        if token.truncated {
            tracing::warn!(
                path = %report.path.display(),
                hostname = %token.hostname,
                max_len,
                "Hostname exceeds maximum length, truncating"
            );
            report.truncated += 1;
        }
        match queue.push(token.hostname) {
            Ok(()) => report.hostnames += 1,
            Err(PushError::Closed(_)) => {
                tracing::debug!(path = %report.path.display(), "Queue closed, producer stopping");
                return Ok(());
            }
            Err(PushError::Full(lost)) => {
                tracing::warn!(path = %report.path.display(), hostname = %lost, "Hostname dropped");
            }
        }
    }
    Ok(())
}

/// Token separators: the C-locale `isspace` set.
const fn is_separator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')
}

/// One token pulled from the input.
#[derive(Debug, PartialEq, Eq)]
pub struct Token {
    pub hostname: Hostname,
    /// The input token was longer than the maximum and was cut.
    pub truncated: bool,
}

/// Splits a byte stream into hostname tokens without reading ahead more than
/// one buffer.
///
/// Tokens are separated by ASCII whitespace only; any other byte, including
/// non-ASCII whitespace and invalid UTF-8, is part of a token. At most
/// `max_len` bytes of a token are kept; the rest of an over-long token is
/// skipped. A cut that splits a UTF-8 sequence drops the partial sequence.
pub struct TokenReader<R> {
    reader: R,
    max_len: usize,
}

impl<R: BufRead> TokenReader<R> {
    pub const fn new(reader: R, max_len: usize) -> Self {
        Self { reader, max_len }
    }

    /// Returns the next token, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    pub fn next_token(&mut self) -> io::Result<Option<Token>> {
        let mut kept = Vec::new();
        let mut seen = 0usize;

        loop {
            let (used, complete) = {
                let buf = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if buf.is_empty() {
                    break;
                }
                let mut used = 0;
                let mut complete = false;
                for &b in buf {
                    used += 1;
                    if is_separator(b) {
                        if seen > 0 {
                            complete = true;
                            break;
                        }
                        continue;
                    }
                    if kept.len() < self.max_len {
                        kept.push(b);
                    }
                    seen += 1;
                }
                (used, complete)
            };
            self.reader.consume(used);
            if complete {
                break;
            }
        }

        if seen == 0 {
            return Ok(None);
        }
        let truncated = seen > kept.len();
        if truncated {
            trim_split_utf8(&mut kept);
        }
        Ok(Some(Token {
            hostname: Hostname::from_bytes(kept),
            truncated,
        }))
    }
}

/// Drops a UTF-8 sequence left incomplete at the end of `bytes` by a cut.
fn trim_split_utf8(bytes: &mut Vec<u8>) {
    if let Err(e) = std::str::from_utf8(bytes) {
        if e.error_len().is_none() {
            bytes.truncate(e.valid_up_to());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn drain(queue: &BoundedQueue<Hostname>) -> Vec<Hostname> {
        queue.close();
        std::iter::from_fn(|| queue.pop()).collect()
    }

    fn tokens(input: &[u8], max_len: usize) -> Vec<Token> {
        let mut reader = TokenReader::new(Cursor::new(input), max_len);
        std::iter::from_fn(|| reader.next_token().unwrap()).collect()
    }

    #[test]
    fn tokens_split_on_ascii_whitespace() {
        let queue = BoundedQueue::new(16).unwrap();
        let mut r = ProducerReport::new(Path::new("test"));
        let input = "example.com\n  localhost\tfoo.org\n\n\r\nbar.net\x0bbaz.net";
        produce_from(Cursor::new(input), &queue, 1024, &mut r).unwrap();

        assert_eq!(r.hostnames, 5);
        assert_eq!(
            drain(&queue),
            vec!["example.com", "localhost", "foo.org", "bar.net", "baz.net"]
        );
    }

    #[test]
    fn non_ascii_whitespace_and_invalid_utf8_stay_inside_one_token() {
        let queue = BoundedQueue::new(16).unwrap();
        let mut r = ProducerReport::new(Path::new("test"));
        let input = b"ab\xffcd.example\nfoo\xc2\xa0bar.example\n";
        produce_from(Cursor::new(&input[..]), &queue, 1024, &mut r).unwrap();

        assert_eq!(r.hostnames, 2);
        let queued = drain(&queue);
        assert_eq!(queued[0].as_bytes(), b"ab\xffcd.example");
        assert_eq!(queued[0].as_str(), None);
        assert_eq!(queued[1], "foo\u{a0}bar.example");
    }

    #[test]
    fn long_tokens_are_truncated_and_counted() {
        let queue = BoundedQueue::new(4).unwrap();
        let mut r = ProducerReport::new(Path::new("test"));
        produce_from(Cursor::new("abcdefgh ok\n"), &queue, 4, &mut r).unwrap();

        assert_eq!(r.truncated, 1);
        assert_eq!(drain(&queue), vec!["abcd", "ok"]);
    }

    #[test]
    fn truncation_never_splits_a_utf8_sequence() {
        // 'é' is two bytes; a cut at 2 would leave half of it.
        let got = tokens("aéb x".as_bytes(), 2);
        assert_eq!(got[0].hostname, "a");
        assert!(got[0].truncated);
        assert_eq!(got[1].hostname, "x");
    }

    #[test]
    fn tokens_span_buffer_refills() {
        let input = "first.example second.example third.example";
        let mut reader = TokenReader::new(BufReader::with_capacity(3, input.as_bytes()), 1024);
        let mut got = Vec::new();
        while let Some(t) = reader.next_token().unwrap() {
            got.push(t.hostname);
        }
        assert_eq!(got, vec!["first.example", "second.example", "third.example"]);
    }

    /// Endless single line of `h.example ` tokens, never reaching EOF.
    struct EndlessLine {
        pos: usize,
    }

    impl Read for EndlessLine {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            const PATTERN: &[u8] = b"h.example ";
            for b in buf.iter_mut() {
                *b = PATTERN[self.pos % PATTERN.len()];
                self.pos += 1;
            }
            Ok(buf.len())
        }
    }

    #[test]
    fn tokens_reach_the_queue_before_end_of_line() {
        let queue = BoundedQueue::new(1).unwrap();
        let reader = BufReader::with_capacity(64, EndlessLine { pos: 0 });

        std::thread::scope(|s| {
            let producer = s.spawn(|| {
                let mut r = ProducerReport::new(Path::new("endless"));
                produce_from(reader, &queue, 1024, &mut r).unwrap();
                r.hostnames
            });
            for _ in 0..3 {
                assert_eq!(queue.pop().unwrap(), "h.example");
            }
            queue.close();
            // Three popped, at most one sitting in the queue, one refused.
            assert!(producer.join().unwrap() <= 4);
        });
    }

    #[test]
    fn missing_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let queue = BoundedQueue::new(2).unwrap();
        let r = run_producer(&dir.path().join("missing.txt"), &queue, 1024);

        assert!(!r.is_ok());
        assert_eq!(r.hostnames, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn reads_file_into_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        std::fs::write(&path, "one.example\ntwo.example\n").unwrap();

        let queue = BoundedQueue::new(2).unwrap();
        let r = run_producer(&path, &queue, 1024);

        assert!(r.is_ok());
        assert_eq!(r.hostnames, 2);
        assert_eq!(drain(&queue), vec!["one.example", "two.example"]);
    }

    #[test]
    fn stops_when_queue_is_closed() {
        let queue = BoundedQueue::new(4).unwrap();
        queue.close();
        let mut r = ProducerReport::new(Path::new("test"));
        produce_from(Cursor::new("a b c"), &queue, 16, &mut r).unwrap();
        assert_eq!(r.hostnames, 0);
    }
}
