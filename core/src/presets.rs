//! Built-in title/subtitle presets
//!
//! Presets are keyed either by locale (`de_DE`) or by a short theme id
//! (`bsd`). With no explicit selection the preset matching the system locale
//! is used, falling back to `en_US`.

use activate_types::DrawOptions;
use phf::phf_map;
use tracing::{debug, warn};

/// A pair of strings shown by the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub title: &'static str,
    pub subtitle: &'static str,
}

pub const FALLBACK_PRESET: &str = "en_US";

const EN_US: Preset = Preset {
    title: "Activate Linux",
    subtitle: "Go to Settings to activate Linux.",
};

static PRESETS: phf::Map<&'static str, Preset> = phf_map! {
    // Locales
    "en_US" => EN_US,
    "de_DE" => Preset { title: "Linux aktivieren", subtitle: "Wechseln Sie zu den Einstellungen, um Linux zu aktivieren." },
    "fr_FR" => Preset { title: "Activer Linux", subtitle: "Accédez aux paramètres pour activer Linux." },
    "es_ES" => Preset { title: "Activar Linux", subtitle: "Ve a Configuración para activar Linux." },
    "it_IT" => Preset { title: "Attiva Linux", subtitle: "Passa a Impostazioni per attivare Linux." },
    "pt_BR" => Preset { title: "Ativar o Linux", subtitle: "Acesse Configurações para ativar o Linux." },
    "ru_RU" => Preset { title: "Активация Linux", subtitle: "Чтобы активировать Linux, перейдите в раздел «Параметры»." },
    "uk_UA" => Preset { title: "Активація Linux", subtitle: "Щоб активувати Linux, перейдіть до розділу «Параметри»." },
    "pl_PL" => Preset { title: "Aktywuj system Linux", subtitle: "Przejdź do ustawień, aby aktywować system Linux." },
    "nl_NL" => Preset { title: "Linux activeren", subtitle: "Ga naar Instellingen om Linux te activeren." },
    "ja_JP" => Preset { title: "Linux のライセンス認証", subtitle: "設定を開き、Linux のライセンス認証を行ってください。" },
    "zh_CN" => Preset { title: "激活 Linux", subtitle: "转到“设置”以激活 Linux。" },

    // Themes
    "bsd" => Preset { title: "Activate BSD", subtitle: "Go to Settings to activate BSD." },
    "gnu" => Preset { title: "Activate GNU/Linux", subtitle: "Go to Settings to activate GNU/Linux." },
    "m$" => Preset { title: "Activate Windows", subtitle: "Go to Settings to activate Windows." },
    "macos" => Preset { title: "Activate macOS", subtitle: "Go to System Settings to activate macOS." },
    "deck" => Preset { title: "Activate SteamOS", subtitle: "Go to Settings to activate SteamOS." },
};

/// Look up a preset by its exact id
pub fn lookup(id: &str) -> Option<&'static Preset> {
    PRESETS.get(id)
}

/// All preset ids, sorted
pub fn preset_ids() -> Vec<&'static str> {
    let mut ids: Vec<_> = PRESETS.keys().copied().collect();
    ids.sort_unstable();
    ids
}

/// Turn `de-DE`, `de_DE.UTF-8` or `de_DE@euro` into `de_DE`
pub fn normalize_locale(locale: &str) -> String {
    let base = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    base.replace('-', "_")
}

/// Resolve a locale to a preset: exact match, then same language, then `en_US`
pub fn for_locale(locale: &str) -> &'static Preset {
    let normalized = normalize_locale(locale);

    if let Some(preset) = lookup(&normalized) {
        return preset;
    }

    let language = normalized.split('_').next().unwrap_or_default();
    if !language.is_empty() {
        let prefix = format!("{language}_");
        if let Some(preset) = preset_ids()
            .into_iter()
            .find(|id| id.starts_with(&prefix))
            .and_then(lookup)
        {
            return preset;
        }
    }

    &EN_US
}

/// Preset for the current system locale
pub fn system_default() -> &'static Preset {
    match sys_locale::get_locale() {
        Some(locale) => {
            debug!(locale = %locale, "Resolving preset from system locale");
            for_locale(&locale)
        }
        None => &EN_US,
    }
}

/// Fill title and subtitle from a preset.
///
/// `None` selects the system-locale preset. Returns false (and leaves the
/// options untouched) when the id is unknown.
pub fn apply(id: Option<&str>, options: &mut DrawOptions) -> bool {
    let preset = match id {
        None => system_default(),
        Some(id) => match lookup(id) {
            Some(preset) => preset,
            None => {
                warn!(preset = id, "Unknown text preset, see --text-preset-list");
                return false;
            }
        },
    };

    options.title = Some(preset.title.to_string());
    options.subtitle = Some(preset.subtitle.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("de-DE"), "de_DE");
        assert_eq!(normalize_locale("de_DE.UTF-8"), "de_DE");
        assert_eq!(normalize_locale("fr_FR@euro"), "fr_FR");
        assert_eq!(normalize_locale("en"), "en");
    }

    #[test]
    fn test_for_locale_matching() {
        assert_eq!(for_locale("de_DE.UTF-8").title, "Linux aktivieren");
        // Same language, different region
        assert_eq!(for_locale("de-AT").title, "Linux aktivieren");
        assert_eq!(for_locale("pt_PT").title, "Ativar o Linux");
        // Unknown language falls back to English
        assert_eq!(for_locale("xx_YY").title, "Activate Linux");
        assert_eq!(for_locale("C").title, "Activate Linux");
    }

    #[test]
    fn test_apply_known_preset() {
        let mut options = DrawOptions::default();
        assert!(apply(Some("bsd"), &mut options));
        assert_eq!(options.title.as_deref(), Some("Activate BSD"));
        assert_eq!(
            options.subtitle.as_deref(),
            Some("Go to Settings to activate BSD.")
        );
    }

    #[test]
    fn test_apply_unknown_preset_keeps_text() {
        let mut options = DrawOptions {
            title: Some("Keep".to_string()),
            ..DrawOptions::default()
        };
        assert!(!apply(Some("does-not-exist"), &mut options));
        assert_eq!(options.title.as_deref(), Some("Keep"));
        assert_eq!(options.subtitle, None);
    }

    #[test]
    fn test_apply_system_default_sets_both_lines() {
        let mut options = DrawOptions::default();
        assert!(apply(None, &mut options));
        assert!(options.title.is_some());
        assert!(options.subtitle.is_some());
    }

    #[test]
    fn test_preset_ids_sorted_and_complete() {
        let ids = preset_ids();
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        assert!(ids.contains(&FALLBACK_PRESET));
        assert!(ids.contains(&"m$"));
    }
}
