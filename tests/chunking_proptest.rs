// Chunking independence: however the input is split into feeds, the decoded
// packet sequence must match feeding the whole stream at once.

use proptest::prelude::*;
use spedec::spe::{DecodeContext, Packet};

fn decode_whole(bytes: &[u8], skip_padding: bool) -> Vec<Packet> {
    let mut ctx = DecodeContext::new();
    ctx.feed(bytes);
    let mut packets = Vec::new();
    while let Some(pkt) = ctx.decode_next(skip_padding) {
        packets.push(pkt);
    }
    packets
}

fn decode_split(bytes: &[u8], cuts: &[usize], skip_padding: bool) -> Vec<Packet> {
    let mut ctx = DecodeContext::new();
    let mut packets = Vec::new();
    let mut start = 0;
    let mut cuts: Vec<usize> = cuts.iter().map(|&c| c % (bytes.len() + 1)).collect();
    cuts.sort_unstable();
    for cut in cuts.into_iter().chain([bytes.len()]) {
        if cut > start {
            ctx.feed_copied(&bytes[start..cut]);
            start = cut;
        }
        while let Some(pkt) = ctx.decode_next(skip_padding) {
            packets.push(pkt);
        }
    }
    packets
}

/// One well-formed packet: a known header followed by exactly the payload
/// bytes the header declares.
fn valid_packet() -> impl Strategy<Value = Vec<u8>> {
    let headers = prop_oneof![
        Just(vec![0x01u8]),         // end
        Just(vec![0x71u8]),         // timestamp
        Just(vec![0x42u8]),         // events
        Just(vec![0x43u8]),         // data source
        Just(vec![0x64u8]),         // context
        Just(vec![0x48u8]),         // operation type
        Just(vec![0xB0u8]),         // address, short
        Just(vec![0x98u8]),         // counter, short
        Just(vec![0x20u8, 0xB0]),   // address, long
        Just(vec![0x20u8, 0x98]),   // counter, long
    ];
    headers.prop_flat_map(|header| {
        let value = match header.as_slice() {
            [first] => u16::from(*first),
            [first, second] => u16::from(*first) << 8 | u16::from(*second),
            _ => unreachable!(),
        };
        let payload_len = spedec::spe::payload_len(value);
        proptest::collection::vec(any::<u8>(), payload_len).prop_map(move |payload| {
            let mut packet = header.clone();
            packet.extend_from_slice(&payload);
            packet
        })
    })
}

fn valid_stream() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(valid_packet(), 0..32)
        .prop_map(|packets| packets.into_iter().flatten().collect())
}

proptest! {
    #[test]
    fn prop_chunking_independence_arbitrary_bytes(
        bytes in proptest::collection::vec(any::<u8>(), 0..512),
        cuts in proptest::collection::vec(any::<usize>(), 0..24)
    ) {
        // Holds for any byte soup: truncation points never corrupt state.
        let whole = decode_whole(&bytes, true);
        let split = decode_split(&bytes, &cuts, true);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn prop_chunking_independence_valid_streams(
        stream in valid_stream(),
        cuts in proptest::collection::vec(any::<usize>(), 0..24)
    ) {
        let whole = decode_whole(&stream, true);
        let split = decode_split(&stream, &cuts, true);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn prop_valid_streams_decode_fully(stream in valid_stream()) {
        let packets = decode_whole(&stream, false);
        // Well-formed packets are never left half decoded.
        let decoded_len: usize = packets
            .iter()
            .map(|p| p.header_width as usize + spedec::spe::payload_len(p.header))
            .sum();
        prop_assert_eq!(decoded_len, stream.len());
    }

    #[test]
    fn prop_padding_between_packets_is_transparent(
        stream in proptest::collection::vec(valid_packet(), 0..16),
        pad in 1usize..4
    ) {
        // Insert zero filler at every packet boundary; with padding-skip the
        // decoded sequence is unchanged.
        let plain: Vec<u8> = stream.iter().flatten().copied().collect();
        let mut padded = Vec::new();
        for packet in &stream {
            padded.extend(std::iter::repeat_n(0u8, pad));
            padded.extend_from_slice(packet);
        }
        let without_padding = decode_whole(&plain, true);
        let with_padding = decode_whole(&padded, true);
        prop_assert_eq!(without_padding, with_padding);
    }
}
