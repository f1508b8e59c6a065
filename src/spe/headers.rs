// Header classification table.
//
// Each packet encoding is one `(value, mask, width)` rule; a header matches
// when the rule width equals the header width and the masked header equals
// the rule value. The rules are disjoint per width class, but the table is
// scanned in a fixed order so classification is deterministic regardless.

use log::debug;

use super::fail_point;
use super::packet::PacketKind;

/// One header-matching rule.
struct HeaderRule {
    value: u16,
    mask: u16,
    /// Header width in bytes this rule applies to (1 or 2).
    width: u8,
    kind: PacketKind,
}

/// Classification rules, in scan order.
static HEADER_RULES: [HeaderRule; 11] = [
    HeaderRule {
        value: 0x00B0,
        mask: 0x00F8,
        width: 1,
        kind: PacketKind::Address,
    },
    HeaderRule {
        value: 0x20B0,
        mask: 0xFCF8,
        width: 2,
        kind: PacketKind::Address,
    },
    HeaderRule {
        value: 0x0064,
        mask: 0x00FC,
        width: 1,
        kind: PacketKind::Context,
    },
    HeaderRule {
        value: 0x0098,
        mask: 0x00F8,
        width: 1,
        kind: PacketKind::Counter,
    },
    HeaderRule {
        value: 0x2098,
        mask: 0xFCF8,
        width: 2,
        kind: PacketKind::Counter,
    },
    HeaderRule {
        value: 0x0043,
        mask: 0x00CF,
        width: 1,
        kind: PacketKind::DataSource,
    },
    HeaderRule {
        value: 0x0001,
        mask: 0x00FF,
        width: 1,
        kind: PacketKind::End,
    },
    HeaderRule {
        value: 0x0042,
        mask: 0x00CF,
        width: 1,
        kind: PacketKind::Events,
    },
    HeaderRule {
        value: 0x0048,
        mask: 0x00FC,
        width: 1,
        kind: PacketKind::OperationType,
    },
    HeaderRule {
        value: 0x0000,
        mask: 0x00FF,
        width: 1,
        kind: PacketKind::Padding,
    },
    HeaderRule {
        value: 0x0071,
        mask: 0x00FF,
        width: 1,
        kind: PacketKind::Timestamp,
    },
];

/// Classify a header of the given width in bytes.
///
/// Headers matching no rule are `Unknown`. Widths outside the encodable
/// range classify as `Invalid`; the decoder never produces such widths.
pub fn classify(header: u16, width: u8) -> PacketKind {
    if width < 1 || width > 2 {
        debug!("invalid header width {width}");
        fail_point!();
        return PacketKind::Invalid;
    }

    for rule in &HEADER_RULES {
        debug_assert!(rule.width >= 1 && rule.width <= 2);
        if rule.width == width && (header & rule.mask) == rule.value {
            return rule.kind;
        }
    }

    PacketKind::Unknown
}

/// Payload length in bytes implied by a header.
///
/// Headers below 0x20 carry no payload; all others encode the length as a
/// power of two in header bits 5:4.
#[inline]
pub fn payload_len(header: u16) -> usize {
    if header < 0x20 {
        0
    } else {
        1 << ((header >> 4) & 3)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
