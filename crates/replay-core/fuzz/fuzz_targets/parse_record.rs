#![no_main]

use libfuzzer_sys::fuzz_target;
use replay_core::parse_record;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing must never panic, and every accepted record must serialize
    // back into something the parser accepts again.
    if let Ok(record) = parse_record(line, 1) {
        let reparsed = parse_record(&record.to_line(), 1).expect("emitted line must reparse");
        assert_eq!(reparsed.cycles, record.cycles);
        assert_eq!(reparsed.op, record.op);
        assert_eq!(reparsed.value, record.value);
    }
});
