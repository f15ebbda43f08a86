#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let value = brokerbench::fuzzing::sys_value_input(data);
    let _ = serde_json::to_string(&value);
});
