#![no_main]
use libfuzzer_sys::fuzz_target;
use spedec::spe::{DecodeContext, Packet};

fn decode_whole(bytes: &[u8]) -> Vec<Packet> {
    let mut ctx = DecodeContext::new();
    ctx.feed(bytes);
    let mut packets = Vec::new();
    while let Some(pkt) = ctx.decode_next(true) {
        packets.push(pkt);
    }
    packets
}

fn decode_chunked(bytes: &[u8], step: usize) -> Vec<Packet> {
    let mut ctx = DecodeContext::new();
    let mut packets = Vec::new();
    for chunk in bytes.chunks(step) {
        ctx.feed_copied(chunk);
        while let Some(pkt) = ctx.decode_next(true) {
            packets.push(pkt);
        }
    }
    packets
}

fuzz_target!(|data: &[u8]| {
    // The first byte sizes the chunks; the rest is the trace stream.
    let Some((&seed, payload)) = data.split_first() else {
        return;
    };
    let step = usize::from(seed & 0x0F) + 1;

    // Chunking must never change what gets decoded.
    assert_eq!(decode_whole(payload), decode_chunked(payload, step));
});
