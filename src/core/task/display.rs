use crate::report::{Reporter, Tone};
use crate::settings::{ResolvedSettings, SettingSource};

fn tone_for(source: SettingSource) -> Tone {
    match source {
        SettingSource::Default => Tone::Success,
        SettingSource::OverriddenDefault => Tone::Accent,
        SettingSource::Configured => Tone::Info,
    }
}

/// Print every resolved setting sorted by key, colored by where it came from.
pub fn render_settings(settings: &ResolvedSettings, reporter: &mut Reporter) {
    let legend = [
        SettingSource::Default,
        SettingSource::OverriddenDefault,
        SettingSource::Configured,
    ];
    let parts: Vec<(Tone, &str)> = legend.iter().map(|s| (tone_for(*s), s.label())).collect();
    reporter.segments(&parts);

    for (key, value, source) in settings.entries() {
        reporter.line(tone_for(source), format!("{} = {}", key, value));
    }
    reporter.blank();
}
