#![no_main]

use libfuzzer_sys::fuzz_target;

use ostreap::model::StreamTester;

fuzz_target!(|bytes: &[u8]| { StreamTester::run(bytes) });
