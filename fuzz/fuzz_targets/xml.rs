#![no_main]
use finset::xml_writer::document_to_string;
use finset::Decoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::from_slice(data);
    let _ = document_to_string(&mut decoder);
});
