use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        EasyAnimError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        EasyAnimError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(
        EasyAnimError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        EasyAnimError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        EasyAnimError::unsupported_encoder("none")
            .to_string()
            .contains("unsupported encoder:")
    );
}

#[test]
fn asset_load_names_the_asset() {
    let err = EasyAnimError::asset_load(AssetId::new("logo"), "file not found");
    let msg = err.to_string();
    assert!(msg.contains("'logo'"));
    assert!(msg.contains("file not found"));
}

#[test]
fn empty_animation_message_is_user_facing() {
    assert!(
        EasyAnimError::EmptyAnimation
            .to_string()
            .contains("add keyframes")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = EasyAnimError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
