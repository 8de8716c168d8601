#![no_main]

use island::OutputLevel;
use island::error::OsStatus;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(bytes) = <[u8; 4]>::try_from(data.get(..4).unwrap_or_default()) else {
        return;
    };

    let raw = f32::from_le_bytes(bytes);
    let clamped = OutputLevel::clamped(raw).value();
    assert!((0.0..=1.0).contains(&clamped));

    if let Ok(level) = OutputLevel::try_from(raw) {
        assert_eq!(level.value(), raw);
        let json = serde_json::to_string(&level).unwrap();
        assert_eq!(serde_json::from_str::<OutputLevel>(&json).ok(), Some(level));
    }

    // Status codes from CoreAudio and IOKit are rendered for any value
    let _ = OsStatus(i32::from_le_bytes(bytes)).to_string();
});
