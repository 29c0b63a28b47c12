//! Identity descriptor lookup for follow-up generation.

use pixsynth_core::character::Character;
use pixsynth_core::identity::build_identity_descriptor;

/// Where a descriptor used for a follow-up call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorSource {
    Persisted,
    /// The character had no stored descriptor; it was rebuilt from
    /// `input_params`.
    Reconstructed,
}

/// The descriptor to use for calls against an existing character.
///
/// Reconstruction does not write the rebuilt value back; the caller
/// decides whether to persist it.
pub fn resolve_descriptor(character: &Character) -> (String, DescriptorSource) {
    match character.identity_descriptor() {
        Some(d) => (d.to_string(), DescriptorSource::Persisted),
        None => {
            tracing::warn!(
                character_id = %character.id,
                "Identity descriptor missing, reconstructing from input params",
            );
            let rebuilt =
                build_identity_descriptor(&character.input_params, character.input_params.width());
            (rebuilt, DescriptorSource::Reconstructed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixsynth_core::form::CharacterForm;

    fn character() -> Character {
        Character::new(CharacterForm {
            name: "Kage".into(),
            character_class: Some("ninja".into()),
            ..Default::default()
        })
    }

    #[test]
    fn persisted_descriptor_is_used_verbatim() {
        let mut c = character();
        c.set_identity_descriptor("stored dna".into()).unwrap();
        assert_eq!(
            resolve_descriptor(&c),
            ("stored dna".to_string(), DescriptorSource::Persisted)
        );
    }

    #[test]
    fn missing_descriptor_is_reconstructed() {
        let c = character();
        let (dna, source) = resolve_descriptor(&c);
        assert_eq!(source, DescriptorSource::Reconstructed);
        assert_eq!(dna, build_identity_descriptor(&c.input_params, 64));
    }
}
