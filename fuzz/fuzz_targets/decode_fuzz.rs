#![no_main]
use libfuzzer_sys::fuzz_target;
use spedec::spe::DecodeContext;

// Pull one flag byte off the front of the input.
fn split_flag(bytes: &mut &[u8]) -> bool {
    match bytes.split_first() {
        Some((&b, rest)) => {
            *bytes = rest;
            b & 1 != 0
        }
        None => false,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut bytes = data;
    // The first two bytes select the feed mode and padding handling; the
    // rest is the trace stream, fed one byte at a time.
    let copy_feed = split_flag(&mut bytes);
    let skip_padding = split_flag(&mut bytes);

    let mut ctx = DecodeContext::new();
    let mut skip = false;
    let mut cursor = 0;
    loop {
        if cursor < bytes.len() {
            let chunk = &bytes[cursor..cursor + 1];
            if copy_feed {
                ctx.feed_copied(chunk);
            } else {
                ctx.feed(chunk);
            }
            cursor += 1;
        }

        let _ = ctx.peek_header();
        if ctx.read_header(skip_padding).is_ok() {
            let _ = ctx.data_len();
            // Alternate both payload paths.
            let ok = if skip {
                ctx.skip().is_ok()
            } else {
                ctx.read_data().is_ok()
            };
            if ok {
                skip = !skip;
                continue;
            }
        }

        // No progress possible; stop once every input byte has been fed.
        if cursor >= bytes.len() {
            break;
        }
    }
});
