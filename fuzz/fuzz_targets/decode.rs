#![no_main]
use finset::{Cursor, Decoder, DecoderOptions, EventKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Erstes Byte wählt die Puffergröße, damit Nachladegrenzen mitgetestet werden
    let Some((&size, input)) = data.split_first() else {
        return;
    };
    let options = DecoderOptions::default().with_buffer_size(usize::from(size) + 1);
    let Ok(mut decoder) = Decoder::with_options(input, options) else {
        return;
    };
    for _ in 0..10_000 {
        match decoder.advance() {
            Ok(EventKind::EndDocument) | Err(_) => break,
            Ok(EventKind::Characters | EventKind::Cdata | EventKind::Comment) => {
                let _ = decoder.text();
                let _ = decoder.algorithm_value();
            }
            Ok(_) => {
                let _ = decoder.peek_next_event_kind();
            }
        }
    }
});
