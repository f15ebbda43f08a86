#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Some((filter, topic)) = input.split_once('\n') else {
        return;
    };
    let _ = brokerbench::fuzzing::topic_matches_input(filter, topic);
    if !topic.contains(['+', '#']) {
        debug_assert!(brokerbench::fuzzing::topic_matches_input(topic, topic));
    }
    let _ = brokerbench::fuzzing::publisher_id_input(topic);
});
