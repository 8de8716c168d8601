#![no_main]

use island::config::IslandConfig;
use island::control::PlaybackCommand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any accepted config must produce a usable playback command
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(config) = serde_json::from_str::<IslandConfig>(s)
    {
        let command = PlaybackCommand::from(&config.playback);
        assert_eq!(command.args().len(), 2);
    }
});
