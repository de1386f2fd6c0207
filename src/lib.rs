//! ws-sans-io: A minimal, sans-I/O WebSocket frame parser
//!
//! This crate provides a synchronous, incremental parser for the WebSocket
//! framing layer (RFC 6455 Section 5), designed for environments that cannot
//! use async runtimes (e.g., WebAssembly, embedded systems).
//!
//! # Features
//!
//! - **Sans-I/O Design**: No async runtime dependencies (no tokio)
//! - **Resumable**: Consumes the stream in arbitrarily sized chunks, pausing
//!   mid-length, mid-mask or mid-payload and picking up exactly where the
//!   previous call stopped, with no re-parsing and no internal buffering
//! - **Zero Allocation**: Payload fragments are delivered as sub-slices of
//!   the caller's buffer; parser state is a handful of fixed-size fields
//! - **Callback Driven**: Header, body-fragment and end-of-frame events via
//!   the [`FrameSink`] trait, with cancellation through [`Control::Abort`]
//! - **Masking Codec**: Rotating-key XOR whose rotation state survives chunk
//!   boundaries, as free functions and bound to the parser
//!
//! # Quick Start
//!
//! ```rust
//! use ws_sans_io::{Control, FrameSink, WsParser};
//!
//! #[derive(Default)]
//! struct Collect {
//!     payload: Vec<u8>,
//!     frames: usize,
//! }
//!
//! impl FrameSink for Collect {
//!     fn on_frame_body(&mut self, chunk: &[u8]) -> Control {
//!         self.payload.extend_from_slice(chunk);
//!         Control::Continue
//!     }
//!
//!     fn on_frame_end(&mut self) -> Control {
//!         self.frames += 1;
//!         Control::Continue
//!     }
//! }
//!
//! let mut parser = WsParser::new();
//! let mut sink = Collect::default();
//!
//! // FIN + TEXT, unmasked, 5-byte payload, chunked however the transport likes
//! let frame = [&[0x81, 0x05][..], b"hello"].concat();
//! let consumed = parser.execute(&mut sink, &frame[..4]);
//! let consumed = consumed + parser.execute(&mut sink, &frame[4..]);
//!
//! assert_eq!(consumed, frame.len());
//! assert_eq!(sink.frames, 1);
//! assert_eq!(sink.payload, b"hello");
//! ```
//!
//! # Architecture
//!
//! This crate is intentionally minimal. It provides:
//! - Frame parsing (bytes → events)
//! - Payload masking/unmasking (rotating 4-byte XOR)
//!
//! It does NOT provide:
//! - TCP/UDP transport (you provide the bytes)
//! - The HTTP/1.1 upgrade handshake (use httparse or similar)
//! - Message reassembly, control-frame semantics, UTF-8 validation
//!   (your responsibility)
//!
//! # Use Cases
//!
//! - **Browser-based proxies**: WASM kernels that inspect WebSocket traffic
//! - **Embedded WebSocket endpoints**: Resource-constrained environments
//! - **Testing utilities**: Protocol testing without async complexity

pub mod mask;
pub mod ws_parser;

pub use mask::{apply_mask, apply_mask_into};
pub use ws_parser::{
    opcode, Control, FrameHeader, FrameSink, ParseError, WsParser, FIN_BIT, LENGTH_MASK, MASK_BIT,
    MAX_PAYLOAD_LEN, OPCODE_MASK,
};
