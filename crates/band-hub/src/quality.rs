//! Recording quality presets.

/// Encoder settings for one named quality level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub audio_bits_per_second: u32,
    pub sample_rate: u32,
    pub channel_count: u16,
}

pub const DEFAULT_QUALITY: &str = "lossless";

pub const QUALITY_PRESETS: [QualityPreset; 6] = [
    QualityPreset {
        id: "voice",
        name: "Voice",
        description: "Optimized for speech",
        audio_bits_per_second: 64_000,
        sample_rate: 24_000,
        channel_count: 1,
    },
    QualityPreset {
        id: "standard",
        name: "Standard",
        description: "Good for most uses",
        audio_bits_per_second: 128_000,
        sample_rate: 44_100,
        channel_count: 2,
    },
    QualityPreset {
        id: "high",
        name: "High Quality",
        description: "Great for music practice",
        audio_bits_per_second: 256_000,
        sample_rate: 48_000,
        channel_count: 2,
    },
    QualityPreset {
        id: "studio",
        name: "Studio",
        description: "Professional quality",
        audio_bits_per_second: 320_000,
        sample_rate: 48_000,
        channel_count: 2,
    },
    QualityPreset {
        id: "maximum",
        name: "Maximum",
        description: "Highest possible quality",
        audio_bits_per_second: 512_000,
        sample_rate: 96_000,
        channel_count: 2,
    },
    QualityPreset {
        id: "lossless",
        name: "Lossless",
        description: "Professional studio quality",
        audio_bits_per_second: 1_411_200,
        sample_rate: 44_100,
        channel_count: 2,
    },
];

/// Look up a preset by id, exactly.
pub fn find_preset(id: &str) -> Option<&'static QualityPreset> {
    QUALITY_PRESETS.iter().find(|p| p.id == id)
}

/// Look up a preset by id, falling back to [`DEFAULT_QUALITY`].
pub fn preset(id: &str) -> &'static QualityPreset {
    find_preset(id).unwrap_or_else(default_preset)
}

pub fn default_preset() -> &'static QualityPreset {
    &QUALITY_PRESETS[QUALITY_PRESETS.len() - 1]
}

/// `128000` -> `128kbps`, `1411200` -> `1411.2kbps`.
pub fn format_bitrate(bits_per_second: u32) -> String {
    format!("{}kbps", trim_float(bits_per_second as f64 / 1000.0))
}

/// `44100` -> `44.1kHz`.
pub fn format_sample_rate(sample_rate: u32) -> String {
    format!("{}kHz", trim_float(sample_rate as f64 / 1000.0))
}

/// Rough encoded size for a recording, e.g. `~940 KB` or `~10.1 MB`.
pub fn estimated_file_size(duration_secs: f64, bits_per_second: u32) -> String {
    let bytes = duration_secs.max(0.0) * bits_per_second as f64 / 8.0;
    if bytes < 1024.0 * 1024.0 {
        format!("~{:.0} KB", bytes / 1024.0)
    } else {
        format!("~{:.1} MB", bytes / (1024.0 * 1024.0))
    }
}

fn trim_float(value: f64) -> String {
    let text = format!("{value:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
