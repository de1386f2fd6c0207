//! Incremental WebSocket frame parser.
//!
//! This is a minimal, sans-I/O parser for the WebSocket framing layer. It
//! does NOT pull in a full WebSocket stack (which would require an async
//! runtime and a transport) but instead implements the essential frame
//! decoding needed for:
//! 1. Extracting opcode, FIN and masking metadata from frame headers
//! 2. Streaming payload fragments to the caller as they arrive, without
//!    buffering whole frames
//! 3. Resuming mid-header, mid-mask or mid-payload when the transport
//!    delivers a chunk that ends inside a field
//! 4. Capturing the masking key so payloads can be unmasked incrementally
//!
//! Reference: RFC 6455 (The WebSocket Protocol), Section 5
//!
//! The parser is deliberately permissive: it extracts bits and lengths and
//! leaves semantic validation (opcode legality, size limits, UTF-8) to the
//! caller, which can reject a frame at any point by returning
//! [`Control::Abort`] from a callback.

use log::{debug, trace};
use thiserror::Error;

use crate::mask;

/// WebSocket frame opcodes (RFC 6455 Section 11.8)
#[allow(dead_code)]
pub mod opcode {
    pub const CONTINUATION: u8 = 0x0;
    pub const TEXT: u8 = 0x1;
    pub const BINARY: u8 = 0x2;
    pub const CLOSE: u8 = 0x8;
    pub const PING: u8 = 0x9;
    pub const PONG: u8 = 0xA;
}

/// FIN flag in the first header byte
pub const FIN_BIT: u8 = 0b1000_0000;
/// Opcode bits in the first header byte
pub const OPCODE_MASK: u8 = 0b0000_1111;
/// MASK flag in the second header byte
pub const MASK_BIT: u8 = 0b1000_0000;
/// Payload length bits in the second header byte (126 and 127 are
/// extended-length sentinels, not literal lengths)
pub const LENGTH_MASK: u8 = 0b0111_1111;

/// Largest payload length a frame may declare.
///
/// RFC 6455 Section 5.2 requires the most significant bit of the 64-bit
/// extended length to be zero, so this is 2^63 - 1. Frames declaring more
/// are rejected with [`ParseError::PayloadOverflow`] rather than truncated.
pub const MAX_PAYLOAD_LEN: u64 = i64::MAX as u64;

/// A parsed frame header, handed to [`FrameSink::on_frame_header`] once all
/// of its fields are known and before any payload byte is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// FIN bit: this frame is the final fragment of its message
    pub fin: bool,
    /// Raw 4-bit opcode; reserved values pass through untouched
    pub opcode: u8,
    /// Masking key, when the MASK bit was set
    pub mask: Option<[u8; 4]>,
    /// Declared payload length in bytes
    pub payload_len: u64,
}

impl FrameHeader {
    /// Check if this is a control frame (close/ping/pong range)
    pub fn is_control(&self) -> bool {
        self.opcode & 0x8 != 0
    }

    /// Check if the payload arrives XOR-masked
    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }
}

/// Verdict returned by every [`FrameSink`] callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep parsing
    Continue,
    /// Stop immediately; [`WsParser::execute`] returns a short consumed count
    Abort,
}

/// Receiver for frame events.
///
/// All methods default to no-ops that keep parsing, so implementors only
/// override the events they care about. Callbacks run synchronously inside
/// [`WsParser::execute`]; any caller context (connection ids, reassembly
/// buffers, ...) lives in the implementing type.
pub trait FrameSink {
    /// Called once per frame, after opcode, flags, length and masking key are
    /// fully known.
    fn on_frame_header(&mut self, header: &FrameHeader) -> Control {
        let _ = header;
        Control::Continue
    }

    /// Called zero or more times per frame with contiguous payload fragments,
    /// masked exactly as they appeared on the wire. The concatenation of all
    /// fragments is the frame payload.
    fn on_frame_body(&mut self, chunk: &[u8]) -> Control {
        let _ = chunk;
        Control::Continue
    }

    /// Called exactly once per frame after the last body fragment, or right
    /// after the header for empty frames.
    fn on_frame_end(&mut self) -> Control {
        Control::Continue
    }
}

/// Unrecoverable parser errors.
///
/// Sticky: once set, [`WsParser::execute`] consumes nothing until
/// [`WsParser::reset`]. A callback abort is not an error in this sense; it
/// is signaled through the short consumed count alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The frame declared a 64-bit payload length with the most significant
    /// bit set, or one wider than this platform can address.
    #[error("declared payload length {declared} is not representable")]
    PayloadOverflow { declared: u64 },
}

/// Parser position within the frame grammar.
///
/// The payload of each variant is the exact number of bytes still needed to
/// finish that phase, so a chunk ending mid-field pauses here and the next
/// call resumes without re-parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Start,
    Head,
    Length {
        needed: u8,
    },
    Mask {
        needed: u8,
    },
    Body {
        remaining: u64,
    },
}

/// Incremental WebSocket frame parser.
///
/// One value per connection, created once and fed the raw post-handshake
/// byte stream in whatever chunks the transport produces. The parser never
/// allocates and never buffers payload: fragments are delivered to the
/// [`FrameSink`] as sub-slices of the caller's input buffer.
#[derive(Debug, Default)]
pub struct WsParser {
    /// Current position in the frame grammar
    phase: Phase,
    /// FIN bit of the current frame
    fin: bool,
    /// Raw 4-bit opcode of the current frame
    opcode: u8,
    /// MASK bit of the current frame
    has_mask: bool,
    /// Declared payload length, accumulated big-endian
    length: u64,
    /// Masking key, filled byte by byte during the Mask phase
    mask_key: [u8; 4],
    /// Rotation cursor into `mask_key`, advanced by [`Self::unmask`]
    mask_pos: u8,
    /// Payload bytes delivered so far for the current frame
    body_delivered: u64,
    /// Sticky fatal error
    error: Option<ParseError>,
}

impl WsParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the parser to the start of a frame, clearing all counters and
    /// any sticky error. Never called implicitly.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed the next chunk of the stream and return how many of its bytes
    /// were consumed.
    ///
    /// The chunk may contain zero, part of, one, or many frames, split at any
    /// byte boundary; the parser resumes exactly where the previous call left
    /// off. The return value equals `data.len()` unless a callback returned
    /// [`Control::Abort`] or the frame declared an unrepresentable length;
    /// in both cases the count stops at the byte whose processing triggered
    /// the stop (for a rejected body fragment, its first byte; for a
    /// completed frame's end event, one past the frame's last byte). After an
    /// abort the stream position is application-defined and the parser should
    /// not simply be re-fed the remainder; after an error, `execute` consumes
    /// nothing until [`Self::reset`].
    pub fn execute<S: FrameSink>(&mut self, sink: &mut S, data: &[u8]) -> usize {
        if self.error.is_some() {
            return 0;
        }

        let len = data.len();
        let mut i = 0;

        while i < len {
            match self.phase {
                Phase::Start => {
                    let byte = data[i];
                    self.fin = byte & FIN_BIT != 0;
                    self.opcode = byte & OPCODE_MASK;
                    self.has_mask = false;
                    self.length = 0;
                    self.body_delivered = 0;
                    self.mask_pos = 0;
                    self.phase = Phase::Head;
                    i += 1;
                }
                Phase::Head => {
                    let byte = data[i];
                    self.has_mask = byte & MASK_BIT != 0;
                    match byte & LENGTH_MASK {
                        126 => self.phase = Phase::Length { needed: 2 },
                        127 => self.phase = Phase::Length { needed: 8 },
                        short => {
                            self.length = u64::from(short);
                            if !self.length_complete(sink) {
                                return i;
                            }
                        }
                    }
                    i += 1;
                }
                Phase::Length { needed } => {
                    self.length = self.length << 8 | u64::from(data[i]);
                    if needed > 1 {
                        self.phase = Phase::Length { needed: needed - 1 };
                    } else if !self.length_complete(sink) {
                        return i;
                    }
                    i += 1;
                }
                Phase::Mask { needed } => {
                    self.mask_key[4 - needed as usize] = data[i];
                    if needed > 1 {
                        self.phase = Phase::Mask { needed: needed - 1 };
                    } else if !self.enter_body(sink) {
                        return i;
                    }
                    i += 1;
                }
                Phase::Body { remaining } => {
                    let take = remaining.min((len - i) as u64) as usize;
                    if sink.on_frame_body(&data[i..i + take]) == Control::Abort {
                        return i;
                    }
                    self.body_delivered += take as u64;
                    i += take;
                    let remaining = remaining - take as u64;
                    if remaining > 0 {
                        self.phase = Phase::Body { remaining };
                    } else {
                        trace!("frame complete: {} payload bytes", self.body_delivered);
                        if sink.on_frame_end() == Control::Abort {
                            return i;
                        }
                        self.phase = Phase::Start;
                    }
                }
            }
        }

        i
    }

    /// Unmask `buf` in place with the current frame's key, continuing from
    /// wherever the previous call stopped.
    ///
    /// This is the parser-bound form of [`mask::apply_mask`]: the rotation
    /// cursor lives in the parser and restarts at 0 for each new frame, so
    /// unmasking a payload fragment-by-fragment yields the same bytes as
    /// unmasking it whole.
    pub fn unmask(&mut self, buf: &mut [u8]) {
        self.mask_pos = mask::apply_mask(buf, self.mask_key, self.mask_pos);
    }

    /// The sticky error, if a frame was rejected as unparseable.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    /// Payload bytes delivered so far for the current frame. Callers
    /// reconstruct absolute payload offsets from this across fragmented
    /// delivery.
    pub fn body_delivered(&self) -> u64 {
        self.body_delivered
    }

    /// Current rotation cursor of the parser-bound unmasker (0-3).
    pub fn mask_rotation(&self) -> u8 {
        self.mask_pos
    }

    /// True while the parser is inside a frame, i.e. a chunk ended mid-header
    /// or mid-payload and more bytes are required.
    pub fn frame_in_progress(&self) -> bool {
        self.phase != Phase::Start
    }

    /// The length value is complete (whether it arrived as 1, 2 or 8 encoded
    /// bytes): validate it, then collect the mask or start the body.
    fn length_complete<S: FrameSink>(&mut self, sink: &mut S) -> bool {
        if self.length > MAX_PAYLOAD_LEN || usize::try_from(self.length).is_err() {
            debug!("rejecting frame: declared payload length {} is not representable", self.length);
            self.error = Some(ParseError::PayloadOverflow { declared: self.length });
            return false;
        }
        if self.has_mask {
            self.phase = Phase::Mask { needed: 4 };
            true
        } else {
            self.enter_body(sink)
        }
    }

    /// Header fully parsed: emit it, then either stream the body or finish
    /// the frame immediately when it has no payload.
    fn enter_body<S: FrameSink>(&mut self, sink: &mut S) -> bool {
        let header = FrameHeader {
            fin: self.fin,
            opcode: self.opcode,
            mask: self.has_mask.then_some(self.mask_key),
            payload_len: self.length,
        };
        trace!(
            "frame header: opcode {:#x}, fin {}, masked {}, payload {}",
            header.opcode,
            header.fin,
            header.is_masked(),
            header.payload_len
        );
        if sink.on_frame_header(&header) == Control::Abort {
            return false;
        }
        if self.length > 0 {
            self.phase = Phase::Body {
                remaining: self.length,
            };
            true
        } else if sink.on_frame_end() == Control::Abort {
            false
        } else {
            self.phase = Phase::Start;
            true
        }
    }
}
