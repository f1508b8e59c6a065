//! Spedec: streaming decoder for Arm Statistical Profiling Extension (SPE)
//! trace data.
//!
//! The crate provides:
//! - A push-based packet decoder tolerant of arbitrary chunking (`spe`)
//! - File-oriented helpers with per-kind statistics (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use spedec::spe::{DecodeContext, PacketKind};
//!
//! // A short PC address packet followed by an End packet.
//! let trace = [0xB0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x01];
//!
//! let mut ctx = DecodeContext::new();
//! ctx.feed(&trace);
//!
//! let address = ctx.decode_next(true).unwrap();
//! assert_eq!(address.kind, PacketKind::Address);
//!
//! let end = ctx.decode_next(true).unwrap();
//! assert_eq!(end.kind, PacketKind::End);
//!
//! assert_eq!(ctx.decode_next(true), None);
//! ```

pub mod io;
pub mod spe;

#[cfg(feature = "cli")]
pub mod cli;
