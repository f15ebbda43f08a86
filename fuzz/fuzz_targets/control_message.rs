#![no_main]

use libfuzzer_sys::fuzz_target;

const TOPICS: [&str; 5] = [
    "request/qos",
    "request/delay",
    "request/messagesize",
    "request/instancecount",
    "request/go",
];

fuzz_target!(|data: &[u8]| {
    let Some((selector, payload)) = data.split_first() else {
        return;
    };
    let topic = TOPICS[usize::from(*selector) % TOPICS.len()];
    if let Ok(message) = brokerbench::fuzzing::parse_control_input(topic, payload) {
        debug_assert_eq!(message.topic(), topic);
        let reparsed = brokerbench::fuzzing::parse_control_input(topic, &message.encode());
        debug_assert!(matches!(reparsed, Ok(again) if again == message));
    }
});
