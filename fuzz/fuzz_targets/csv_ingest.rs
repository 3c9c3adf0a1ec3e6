#![no_main]

use libfuzzer_sys::fuzz_target;
use peerscope::config::AnalysisConfig;
use peerscope::pipeline::analyze_bytes;

fuzz_target!(|data: &[u8]| {
    // Any byte sequence must produce a report or an error, never a panic
    let _ = analyze_bytes(data, &AnalysisConfig::default());
});
