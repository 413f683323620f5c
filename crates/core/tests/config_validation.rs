use hexfog::{Color4, FogConfig, LodConfig, RenderConfig};
use validator::{Validate, ValidationErrors};

#[test]
fn test_default_config_valid() {
    let config = FogConfig::default();
    config.validate().unwrap();
    config.grid().unwrap();
}

#[test]
fn test_config_validation() {
    let config = FogConfig {
        resolution: 16,       // invalid (too fine)
        bbox_samples: 0,      // invalid
        viewport_samples: 50, // valid
        lod: LodConfig {
            medium_min_zoom: 12,       // valid
            high_min_zoom: 40,         // invalid
            low_threshold: 0,          // valid (but weird)
            medium_threshold: 0,       // valid (but weird)
            high_threshold: 0,         // valid (but weird)
            coarse_bucket_degrees: 5.0, // invalid
            fine_bucket_degrees: 0.005, // valid
            min_render_zoom: 12,       // valid
        },
        render: RenderConfig {
            settle_delay_ms: 0,  // valid, fade starts immediately
            fade_duration_ms: 0, // invalid
            view_padding: 0.1,   // valid
            moving_fog: Color4 {
                red: 2.0, // invalid
                green: 0.5,
                blue: 0.5,
                alpha: 0.9,
            },
            settled_fog: Color4::new_int(100, 100, 100, 0.85),
        },
    };

    // This is a bit of a lazy check but it works well enough
    let err = config.grid().unwrap_err();
    let validation_errors = err.downcast::<ValidationErrors>().unwrap();
    let mut error_fields = validation_errors
        .errors()
        .keys()
        .copied()
        .collect::<Vec<&str>>();
    error_fields.sort_unstable();
    assert_eq!(
        error_fields,
        vec!["bbox_samples", "lod", "render", "resolution"],
        "incorrect validation errors in {:#?}",
        validation_errors
    );
}

#[test]
fn test_partial_config_uses_defaults() {
    let config: FogConfig = serde_json::from_str(
        r#"{"render": {"fade_duration_ms": 400}, "lod": {"min_render_zoom": 14}}"#,
    )
    .unwrap();
    assert_eq!(config.render.fade_duration_ms, 400);
    assert_eq!(
        config.render.settle_delay_ms,
        RenderConfig::default().settle_delay_ms
    );
    assert_eq!(config.lod.min_render_zoom, 14);
    assert_eq!(config.lod.high_min_zoom, 16);
    assert_eq!(config.resolution, 9);
    config.validate().unwrap();
}
