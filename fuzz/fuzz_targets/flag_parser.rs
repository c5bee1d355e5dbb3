#![no_main]

use gcgraph::flag::Flag;
use gcgraph::results::ObservedResult;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither parser may panic, whatever the input
        if let Ok(flag) = Flag::parse(input) {
            assert_eq!(flag.token(), input);
            assert!(!flag.switch().is_empty());
        }
        let observed = ObservedResult::parse(input);
        assert!(!observed.names().is_empty());
    }
});
