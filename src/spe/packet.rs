// Packet model and bit-field extraction.
//
// A `Packet` is the value produced by one decode step: the classified kind,
// the raw header, and the payload word. Interpretation of the payload beyond
// classification is the consumer's business; the helpers below are pure
// functions over the raw header and payload bits for consumers that want the
// documented fields (address index, exception level, operation class, ...).

// ---------------------------------------------------------------------------
// Packet kinds
// ---------------------------------------------------------------------------

/// Classified packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Header width outside the encodable range. Should not occur for
    /// headers produced by the decoder itself.
    Invalid,
    /// Header matched no known encoding.
    Unknown,
    Address,
    Context,
    Counter,
    DataSource,
    End,
    Events,
    OperationType,
    Padding,
    Timestamp,
}

impl PacketKind {
    /// Number of packet kinds, including `Invalid` and `Unknown`.
    pub const COUNT: usize = 11;

    /// All kinds, in stable order.
    pub const ALL: [PacketKind; Self::COUNT] = [
        PacketKind::Invalid,
        PacketKind::Unknown,
        PacketKind::Address,
        PacketKind::Context,
        PacketKind::Counter,
        PacketKind::DataSource,
        PacketKind::End,
        PacketKind::Events,
        PacketKind::OperationType,
        PacketKind::Padding,
        PacketKind::Timestamp,
    ];

    /// Stable display name.
    pub fn name(self) -> &'static str {
        match self {
            PacketKind::Invalid => "invalid",
            PacketKind::Unknown => "unknown",
            PacketKind::Address => "address",
            PacketKind::Context => "context",
            PacketKind::Counter => "counter",
            PacketKind::DataSource => "data-source",
            PacketKind::End => "end",
            PacketKind::Events => "events",
            PacketKind::OperationType => "operation-type",
            PacketKind::Padding => "padding",
            PacketKind::Timestamp => "timestamp",
        }
    }

    /// Index into per-kind tables such as `TraceSummary` counts.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Decoded packet
// ---------------------------------------------------------------------------

/// One decoded packet: `(kind, header, data)` plus the header width in bytes.
///
/// The payload is zero-padded to 64 bits when the packet carries fewer than
/// eight data bytes, and zero for packets with no payload at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketKind,
    /// Raw header value. One-byte headers occupy the low byte; extended
    /// headers place the first byte in the high byte.
    pub header: u16,
    /// Header width in bytes (1 or 2).
    pub header_width: u8,
    /// Payload word, little-endian, zero-padded to 64 bits.
    pub data: u64,
}

impl Packet {
    /// True for the packets that terminate a record (End and Timestamp).
    pub fn is_record_end(&self) -> bool {
        matches!(self.kind, PacketKind::End | PacketKind::Timestamp)
    }
}

// ---------------------------------------------------------------------------
// Address packets
// ---------------------------------------------------------------------------

/// Address packet index: which address space the payload describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressIndex {
    PcVirtual,
    BranchTarget,
    DataVirtual,
    DataPhysical,
    PrevBranchTarget,
}

impl AddressIndex {
    /// Decode the index field of an address (or counter) header. Returns
    /// `None` for reserved index values.
    pub fn from_header(header: u16) -> Option<AddressIndex> {
        match address_index(header) {
            0x00 => Some(AddressIndex::PcVirtual),
            0x01 => Some(AddressIndex::BranchTarget),
            0x02 => Some(AddressIndex::DataVirtual),
            0x03 => Some(AddressIndex::DataPhysical),
            0x04 => Some(AddressIndex::PrevBranchTarget),
            _ => None,
        }
    }
}

/// Raw index field of an address packet header: header bits 9:8 shifted down
/// next to header bits 2:0.
#[inline]
pub fn address_index(header: u16) -> u8 {
    (((header >> 5) & 0x18) | (header & 0x07)) as u8
}

/// Non-secure state, bit 63. Data-physical and instruction addresses.
#[inline]
pub fn address_not_secure(data: u64) -> bool {
    (data >> 63) & 0x1 != 0
}

/// MTE tag checked/unchecked, bit 62. Data-physical addresses only.
#[inline]
pub fn address_checked(data: u64) -> bool {
    (data >> 62) & 0x1 != 0
}

/// Exception level, bits 62:61. Instruction addresses only.
#[inline]
pub fn address_el(data: u64) -> u8 {
    ((data >> 61) & 0x3) as u8
}

/// MTE physical address tag, bits 59:56. Data-physical addresses only.
#[inline]
pub fn address_physical_tag(data: u64) -> u8 {
    ((data >> 56) & 0xf) as u8
}

/// TBI tag, bits 63:56. Data-virtual addresses only.
#[inline]
pub fn address_tag(data: u64) -> u8 {
    ((data >> 56) & 0xff) as u8
}

/// Raw address field, bits 55:0.
#[inline]
pub fn address_bits(data: u64) -> u64 {
    data & 0x00ff_ffff_ffff_ffff
}

/// Address field sign-extended to 64 bits by arithmetic shift.
#[inline]
pub fn address_sign_extended(data: u64) -> u64 {
    (((data << 8) as i64) >> 8) as u64
}

// ---------------------------------------------------------------------------
// Counter packets
// ---------------------------------------------------------------------------

/// Counter packet index. Same header bit extraction as the address index.
#[inline]
pub fn counter_index(header: u16) -> u8 {
    address_index(header)
}

// ---------------------------------------------------------------------------
// Operation-type packets
// ---------------------------------------------------------------------------

/// Operation class from an operation-type header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationClass {
    Other,
    LoadStore,
    Branch,
}

/// Decode the class field (header bits 1:0). Value 3 is reserved.
pub fn operation_class(header: u16) -> Option<OperationClass> {
    match header & 0x3 {
        0x0 => Some(OperationClass::Other),
        0x1 => Some(OperationClass::LoadStore),
        0x2 => Some(OperationClass::Branch),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
