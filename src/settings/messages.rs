//! Messages shown after saving settings.

use super::SettingsSchema;
use serde::Serialize;

/// A message in every supported UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalizedMessage {
    pub en: &'static str,
    pub nl: &'static str,
}

pub const RE_PAIR_REQUIRED: LocalizedMessage = LocalizedMessage {
    en: "Device settings have been saved, re-pairing (without resetting) the device is required to activate the setting. Wait 30 seconds after removing before re-pairing.",
    nl: "Apparaatinstellingen bijgewerkt, het apparaat moet opnieuw worden toegevoegd om gebruik te maken van de nieuwe instellingen. Wacht 30 seconden na het verwijderen voor het opnieuw toevoegen.",
};

/// Re-pair notice when a structural key is among `changed_keys`.
pub fn custom_save_message(
    schema: &SettingsSchema,
    changed_keys: &[String],
) -> Option<LocalizedMessage> {
    changed_keys
        .iter()
        .any(|key| schema.structural_keys.contains(&key.as_str()))
        .then_some(RE_PAIR_REQUIRED)
}
