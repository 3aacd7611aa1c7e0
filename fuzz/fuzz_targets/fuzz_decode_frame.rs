#![no_main]

use libfuzzer_sys::fuzz_target;
use radar_rs::radar::frame::{decode_frame, encode_frame, parse_frame};

fuzz_target!(|data: &[u8]| {
    let _ = parse_frame(data);

    if let Ok((frame, consumed)) = decode_frame(data) {
        assert!(consumed <= data.len());
        // Whatever decodes must re-encode to the bytes it came from.
        let bytes = encode_frame(frame.control, frame.command, &frame.payload).unwrap();
        assert_eq!(&bytes[..], &data[..consumed]);
    }

    // Force a start marker onto the input to get past the tag check.
    if data.len() > 4 {
        let mut framed = vec![0x53, 0x59];
        framed.extend_from_slice(data);
        let _ = decode_frame(&framed);
    }
});
