#![no_main]
use libfuzzer_sys::fuzz_target;

use seqomplexity::parse_fasta_reader;

fuzz_target!(|data: &[u8]| {
    let input = [b">", data].concat();
    if let Ok(mut reader) = parse_fasta_reader(&input[..]) {
        while let Some(event) = reader.next() {
            if event.is_err() {
                break;
            }
        }
    }
});
