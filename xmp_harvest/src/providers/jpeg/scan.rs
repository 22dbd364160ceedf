use std::{
    io::{ErrorKind, Read, Seek, SeekFrom},
    ops::Range,
};

use winnow::{
    Parser as _,
    binary::{be_u16, u8},
    error::EmptyError,
    token::take,
};

use super::{JpegError, Marker, Segment, SegmentList};

/// Some markers are "standalone" markers and don't have any payload (or the
/// length of that payload).
const STANDALONE_MARKERS: &[u8] = &[
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0x01,
];

/// Limits for [`scan_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// The smallest read we'll make from the stream, in bytes.
    ///
    /// Reads grow past this when a segment is bigger than what's buffered.
    pub read_chunk: usize,

    /// The most we'll pre-allocate up front, in bytes.
    ///
    /// The buffer can still grow past this if a segment needs it.
    pub max_initial_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            read_chunk: 4 * 1024,
            max_initial_capacity: 16 * 1024 * 1024,
        }
    }
}

/// Splits a JPEG stream into its segments.
///
/// `known_len` should be the stream's length. It's only trusted as far as
/// the stream agrees: the scanner never reads past it, and never allocates
/// for more than the stream really has left.
///
/// Scanning starts at the stream's current position. If the stream turns out
/// to be malformed, you'll still get every segment found before the problem.
pub fn scan<R: Read + Seek>(stream: &mut R, known_len: u64) -> SegmentList {
    scan_with(stream, known_len, &ScanConfig::default())
}

/// Like [`scan`], but with custom limits.
pub fn scan_with<R: Read + Seek>(
    stream: &mut R,
    known_len: u64,
    config: &ScanConfig,
) -> SegmentList {
    let remaining: u64 = match remaining_len(stream) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Couldn't measure the JPEG stream before scanning. err: {e}");
            return SegmentList::new(Vec::new(), Some(e.into()));
        }
    };

    if known_len > remaining {
        log::warn!(
            "Given length is longer than the stream. \
            given: `{known_len}` bytes, \
            remaining in stream: `{remaining}` bytes"
        );
    }

    // the length hint only sizes the first allocation
    let capacity: usize = usize::try_from(known_len.min(remaining))
        .unwrap_or(usize::MAX)
        .min(config.max_initial_capacity);
    log::trace!("Scanning JPEG. hint: `{known_len}` bytes, initial buffer: `{capacity}` bytes");

    Scanner {
        reader: stream.by_ref().take(known_len),
        buf: Vec::with_capacity(capacity),
        pos: 0,
        buf_offset: 0,
        at_eof: false,
        read_chunk: config.read_chunk.max(1),
        state: State::Start,
        segments: Vec::new(),
    }
    .run()
}

/// Finds how many bytes are left in `stream`, leaving its position as it
/// was.
fn remaining_len<S: Seek>(stream: &mut S) -> std::io::Result<u64> {
    let here: u64 = stream.stream_position()?;
    let end: u64 = stream.seek(SeekFrom::End(0))?;
    if end != here {
        stream.seek(SeekFrom::Start(here))?;
    }

    Ok(end.saturating_sub(here))
}

/// Where the scanner is in the JPEG's structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Nothing framed yet. The first marker must be `SOI`.
    Start,

    /// Between marker segments.
    Markers,

    /// Inside entropy-coded data, after an `SOS` header.
    ScanData {
        /// How far into the data we've already searched for a marker.
        resume: usize,
    },

    /// Found `EOI`.
    Done,
}

/// Why a framing step couldn't finish.
enum Stop {
    /// The buffer ended partway through a segment.
    NeedMore,

    /// These bytes will never form a segment.
    Malformed(JpegError),
}

impl From<JpegError> for Stop {
    fn from(value: JpegError) -> Self {
        Stop::Malformed(value)
    }
}

/// A segment found at the front of the unframed bytes.
struct Framed {
    marker: Marker,

    /// How many bytes the whole segment takes up.
    consumed: usize,

    /// Where the payload sits, relative to the segment's start.
    payload: Range<usize>,
}

struct Scanner<R> {
    reader: R,

    /// Buffered input. Only `buf[pos..]` is still unframed.
    buf: Vec<u8>,
    pos: usize,

    /// Stream offset of `buf[0]`.
    buf_offset: u64,

    at_eof: bool,
    read_chunk: usize,
    state: State,
    segments: Vec<Segment>,
}

impl<R: Read> Scanner<R> {
    fn run(mut self) -> SegmentList {
        loop {
            let offset: u64 = self.offset();
            let data: &[u8] = &self.buf[self.pos..];

            let step: Result<Framed, Stop> = match self.state {
                State::Done => break,
                State::Start | State::Markers => split_marker(data, offset),
                State::ScanData { resume } => match split_scan_data(data, resume) {
                    Ok(len) => Ok(Framed {
                        marker: Marker::ScanData,
                        consumed: len,
                        payload: 0..len,
                    }),
                    Err(resume) => {
                        self.state = State::ScanData { resume };
                        Err(Stop::NeedMore)
                    }
                },
            };

            match step {
                Ok(framed) => {
                    if let Err(e) = self.accept(offset, framed) {
                        return self.finish(Some(e));
                    }
                }

                Err(Stop::Malformed(e)) => return self.finish(Some(e)),

                // no more input is coming, so whatever's left is unfinished
                Err(Stop::NeedMore) if self.at_eof => {
                    let e = self.end_of_input(offset);
                    return self.finish(Some(e));
                }

                Err(Stop::NeedMore) => {
                    if let Err(e) = self.fill() {
                        log::error!("Failed to read from JPEG stream. err: {e}");
                        return self.finish(Some(e.into()));
                    }
                }
            }
        }

        if self.pos < self.buf.len() {
            log::warn!(
                "Ignoring `{}` buffered bytes after EOI.",
                self.buf.len() - self.pos
            );
        }

        self.finish(None)
    }

    /// Stream offset of the first unframed byte.
    fn offset(&self) -> u64 {
        self.buf_offset + self.pos as u64
    }

    /// Stores a framed segment and moves past it.
    fn accept(&mut self, offset: u64, framed: Framed) -> Result<(), JpegError> {
        let Framed {
            marker,
            consumed,
            payload,
        } = framed;

        if self.state == State::Start && marker != Marker::Soi {
            let marker_code: u8 = marker.code().unwrap_or_default();
            log::error!(
                "The first marker of a JPEG file should be `SOI`, \
                but it wasn't! \
                got: `{marker_code:x?}`"
            );
            return Err(JpegError::FirstMarkerWasNotSoi { marker_code });
        }

        let bytes: Vec<u8> = self.buf[self.pos + payload.start..self.pos + payload.end].to_vec();
        self.pos += consumed;

        self.state = match marker {
            Marker::Eoi => {
                log::trace!("EOI detected! Stopping scan.");
                State::Done
            }

            // for the `SOS` marker, we have to consume tokens until we reach
            // the next marker
            Marker::Sos => State::ScanData { resume: 0 },
            _ => State::Markers,
        };

        // empty scan data isn't worth a segment
        if marker == Marker::ScanData && bytes.is_empty() {
            return Ok(());
        }

        log::trace!(
            "Framed segment. marker: `{marker:?}`, offset: `{offset}`, payload: `{}` bytes",
            bytes.len()
        );
        self.segments.push(Segment::new(marker, offset, bytes));
        Ok(())
    }

    /// Decides what it means that the input ran out at `offset`.
    fn end_of_input(&self, offset: u64) -> JpegError {
        let available: usize = self.buf.len() - self.pos;

        let e = match self.state {
            State::Start if available == 0 => JpegError::Empty,
            State::Markers | State::ScanData { .. } if available == 0 => JpegError::MissingEoi,
            _ => JpegError::Truncated { offset, available },
        };

        log::error!("JPEG input ended early. err: {e}");
        e
    }

    /// Reads more input, growing the buffer.
    ///
    /// Each read is at least as big as what's already buffered, so a huge
    /// segment takes a logarithmic number of reads.
    fn fill(&mut self) -> std::io::Result<()> {
        // forget about framed bytes first
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.buf_offset += self.pos as u64;
            self.pos = 0;
        }

        let want: usize = self.read_chunk.max(self.buf.len());
        let start: usize = self.buf.len();
        self.buf.resize(start + want, 0);

        let read: usize = loop {
            match self.reader.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        };

        self.buf.truncate(start + read);
        if read == 0 {
            log::trace!("Reached end of JPEG input.");
            self.at_eof = true;
        }

        Ok(())
    }

    fn finish(self, error: Option<JpegError>) -> SegmentList {
        log::debug!(
            "Finished JPEG scan with `{}` segments. early stop: {}",
            self.segments.len(),
            error.is_some()
        );
        SegmentList::new(self.segments, error)
    }
}

/// Tries to frame one marker segment at the front of `data`.
fn split_marker(data: &[u8], offset: u64) -> Result<Framed, Stop> {
    let input: &mut &[u8] = &mut &*data;
    let marker_code: u8 = marker(input, offset)?;

    if STANDALONE_MARKERS.contains(&marker_code) {
        let consumed = data.len() - input.len();
        return Ok(Framed {
            marker: Marker::from_code(marker_code),
            consumed,
            payload: consumed..consumed,
        });
    }

    // alright, we've taken care of any standalone markers.
    //
    // let's check the length of the payload
    let original_len: u16 = be_u16
        .parse_next(input)
        .map_err(|_: EmptyError| Stop::NeedMore)?;

    // subtract 2 bytes from that (b/c the length includes its own bytes lol)
    let len: u16 = original_len.checked_sub(2_u16).ok_or_else(|| {
        log::error!("JPEG marker `{marker_code:x?}` had a length below 2: `{original_len}`");
        Stop::Malformed(JpegError::NegativeLength {
            marker_code,
            original_len,
            offset,
        })
    })?;

    let start: usize = data.len() - input.len();
    take::<_, _, EmptyError>(len as usize)
        .void()
        .parse_next(input)
        .map_err(|_: EmptyError| Stop::NeedMore)?;
    let end: usize = data.len() - input.len();

    Ok(Framed {
        marker: Marker::from_code(marker_code),
        consumed: end,
        payload: start..end,
    })
}

/// Tries to parse out a marker code.
fn marker(input: &mut &[u8], offset: u64) -> Result<u8, Stop> {
    // each marker must begin with one `0xFF` byte.
    //
    // let's see if that happened...
    let first_marker_byte: u8 = u8
        .parse_next(input)
        .map_err(|_: EmptyError| Stop::NeedMore)?;
    if first_marker_byte != 0xFF {
        log::error!("JPEG marker's first byte was wrong. got: `{first_marker_byte:x?}`");
        return Err(JpegError::FirstMarkerByteWasWrong {
            byte: first_marker_byte,
            offset,
        }
        .into());
    }

    // a marker may have any number of `0xFF`/255 bytes before its code.
    //
    // try to find its code
    let marker_code: u8 = loop {
        let k: u8 = u8
            .parse_next(input)
            .map_err(|_: EmptyError| Stop::NeedMore)?;

        if k != 0xFF {
            break k;
        }
    };

    if marker_code == 0x00 {
        log::error!("This JPEG marker code was `0`, but that value is disallowed.");
        return Err(JpegError::MarkerCodeDisallowed { offset }.into());
    }

    Ok(marker_code)
}

/// Searches entropy-coded data for the next marker, starting at `resume`.
///
/// Returns the data's length once a marker is found. Otherwise, returns where
/// to resume once more data arrives.
fn split_scan_data(data: &[u8], resume: usize) -> Result<usize, usize> {
    let mut i: usize = resume;

    loop {
        let Some(found) = data
            .get(i..)
            .and_then(|rest| rest.iter().position(|b| *b == 0xFF))
        else {
            return Err(data.len());
        };
        i += found;

        // we need the byte after `0xFF` to know what it means
        let Some(next) = data.get(i + 1) else {
            return Err(i);
        };

        match next {
            // stuffed zero byte, or a restart marker. both belong to the
            // scan, so keep going
            0x00 | 0xD0..=0xD7 => i += 2,

            // fill byte; the marker code comes later
            0xFF => i += 1,

            // otherwise, it's a new marker!
            _ => return Ok(i),
        }
    }
}
