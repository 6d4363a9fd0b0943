#![no_main]

use libfuzzer_sys::fuzz_target;
use ud_bridge::protocol::{self, Message, Response};

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, whatever arrives on the wire.
    if let Ok(Some((message, consumed))) = protocol::decode_frame::<Message>(data) {
        assert!(consumed <= data.len());
        // Anything that decodes must re-encode.
        let _ = protocol::encode_frame(&message).expect("decoded message must re-encode");
    }
    let _ = protocol::decode_frame::<Response>(data);
});
