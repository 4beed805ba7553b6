/// Fire-and-forget voice output. The app shell hands lines to a TTS engine;
/// the terminal driver just prints them.
pub trait SpeechSink {
    fn speak(&self, text: &str);
}

pub struct ConsoleSpeech;

impl SpeechSink for ConsoleSpeech {
    fn speak(&self, text: &str) {
        println!("🔊 {}", text);
    }
}

/// Discards every prompt.
pub struct SilentSpeech;

impl SpeechSink for SilentSpeech {
    fn speak(&self, _text: &str) {}
}
