// ttsplayer - plays an audio file through the player controller

fn main() -> anyhow::Result<()> {
    ttsplayer_lib::run()
}
