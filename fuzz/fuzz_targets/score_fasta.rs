#![no_main]
use libfuzzer_sys::fuzz_target;

use seqomplexity::{BaseScorer, ComplexityParams, ComplexityScorer, FastaEvent};

fuzz_target!(|data: &[u8]| {
    let params = match ComplexityParams::new(7, &[2, 3]) {
        Ok(p) => p,
        Err(_) => return,
    };
    let mut scorer: ComplexityScorer = ComplexityScorer::new(params);
    let mut reader = match seqomplexity::parse_fasta_reader(data) {
        Ok(r) => r,
        Err(_) => return,
    };
    let mut pushed = 0;
    let mut scored = 0;
    while let Some(event) = reader.next() {
        match event {
            Ok(FastaEvent::Header(_)) => {
                // one score per base, unless the record was too short
                if let Ok(run) = scorer.finish() {
                    assert_eq!(pushed, scored + run.count);
                }
                pushed = 0;
                scored = 0;
                BaseScorer::reset(&mut scorer);
            }
            Ok(FastaEvent::Bases(chunk)) => {
                for &b in chunk {
                    pushed += 1;
                    if let Some(run) = scorer.push(b) {
                        assert!(run.score >= 0.0 && run.score <= 1.0);
                        scored += run.count;
                    }
                }
            }
            Err(_) => break,
        }
    }
});
