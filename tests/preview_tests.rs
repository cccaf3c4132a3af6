use image::GrayImage;
use qirust_live::normalize::RenderOptions;
use qirust_live::SymbolMatrix;

fn sample_modules(img: &GrayImage, size: usize, options: &RenderOptions) -> Vec<bool> {
    let (scale, margin) = (options.scale, options.margin);
    (0..size as u32)
        .flat_map(|y| (0..size as u32).map(move |x| (x, y)))
        .map(|(x, y)| {
            let px = (margin + x) * scale + scale / 2;
            let py = (margin + y) * scale + scale / 2;
            img.get_pixel(px, py).0[0] == 0x11
        })
        .collect()
}

fn modules(matrix: &SymbolMatrix) -> Vec<bool> {
    let side = matrix.size() as i32;
    (0..side)
        .flat_map(|y| (0..side).map(move |x| (x, y)))
        .map(|(x, y)| matrix.get_module(x, y))
        .collect()
}

#[cfg(test)]
mod preview_proptests {

    use proptest::prelude::*;

    use qirust_live::normalize::{clamp, normalize, MAX_MARGIN, MAX_SCALE, MIN_MARGIN, MIN_SCALE};
    use qirust_live::{render, Encoder, ErrorLevel, QrCodeGenEncoder, RenderOptions};

    use super::{modules, sample_modules};

    proptest! {
        #[test]
        fn proptest_clamp_idempotent(v in any::<i64>(), a in -100i64..100, b in -100i64..100) {
            let (min, max) = (a.min(b), a.max(b));
            let once = clamp(v, min, max);
            prop_assert_eq!(clamp(once, min, max), once);
            prop_assert!(min <= once && once <= max);
        }

        #[test]
        fn proptest_normalized_options_in_range(scale in ".{0,6}", margin in ".{0,6}") {
            let input = normalize("x", None, "L", &scale, &margin).unwrap();
            prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&input.options.scale));
            prop_assert!((MIN_MARGIN..=MAX_MARGIN).contains(&input.options.margin));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn proptest_geometry_only(scale in 2u32..=20, margin in 0u32..=10) {
            let matrix = QrCodeGenEncoder::default()
                .encode("HELLO WORLD", ErrorLevel::Quartile, None)
                .unwrap();
            let options = RenderOptions::new(ErrorLevel::Quartile, scale.into(), margin.into());
            let result = render(&matrix, &options);

            let side = (matrix.size() as u32 + 2 * margin) * scale;
            prop_assert_eq!(result.image.dimensions(), (side, side));
            prop_assert_eq!(sample_modules(&result.image, matrix.size(), &options), modules(&matrix));
        }
    }
}

#[cfg(test)]
mod preview_tests {
    use test_case::test_case;

    use qirust_live::meta::PLACEHOLDER;
    use qirust_live::preview::{
        FormEvent, FormField, FormState, ImageSurface, LivePreview, MetaPanel, StatusLine, PROMPT,
    };
    use qirust_live::{Encoder, ErrorLevel, PreviewConfig, PreviewState, QrCodeGenEncoder};

    type Preview = LivePreview<QrCodeGenEncoder, ImageSurface, MetaPanel, StatusLine>;

    fn preview(config: PreviewConfig) -> Preview {
        LivePreview::new(
            config,
            ImageSurface::default(),
            MetaPanel::default(),
            StatusLine::default(),
        )
    }

    fn form(text: &str, ecl: &str, scale: &str, margin: &str) -> FormState {
        FormState {
            text: text.to_owned(),
            error_level: ecl.to_owned(),
            scale: scale.to_owned(),
            margin: margin.to_owned(),
            ..FormState::default()
        }
    }

    fn assert_cleared(preview: &Preview) {
        assert!(preview.surface().image().is_none());
        assert_eq!(preview.surface().dimensions(), (0, 0));
        let fields = preview.meta().fields();
        assert_eq!(fields.version, PLACEHOLDER);
        assert_eq!(fields.size, PLACEHOLDER);
        assert_eq!(fields.error_level, PLACEHOLDER);
        assert_eq!(fields.mask, PLACEHOLDER);
    }

    #[test]
    fn test_hello_low() {
        let mut preview = preview(PreviewConfig::default());
        let state = preview.load(form("HELLO", "L", "10", "4"));

        let PreviewState::Rendering(meta) = state else {
            panic!("expected a render");
        };
        let matrix = QrCodeGenEncoder::default()
            .encode("HELLO", ErrorLevel::Low, None)
            .unwrap();
        let side = (matrix.size() as u32 + 8) * 10;
        assert_eq!(preview.surface().dimensions(), (side, side));
        assert_eq!(meta.size, matrix.size());
        assert_eq!(meta.version, matrix.version());
        assert_eq!(meta.mask, matrix.mask());
        assert_eq!(meta.error_level_label, "Low");

        let fields = preview.meta().fields();
        assert_eq!(fields.size, format!("{0} × {0}", matrix.size()));
        assert_eq!(fields.error_level, "Low");
        assert_eq!(fields.mask, matrix.mask().to_string());
        assert_eq!(
            preview.status().text(),
            "QR code generated with Low error correction."
        );
    }

    #[test]
    fn test_boost_is_opt_in() {
        let config = PreviewConfig {
            boost_error_correction: true,
            ..PreviewConfig::default()
        };
        let mut preview = preview(config);
        let PreviewState::Rendering(meta) = preview.load(form("HELLO", "L", "10", "4")) else {
            panic!("expected a render");
        };
        // Five alphanumeric characters fit version 1 even at High.
        assert_eq!(meta.version, 1);
        assert_eq!(meta.error_level_label, "High");
        assert_eq!(
            preview.status().text(),
            "QR code generated with Low error correction."
        );
    }

    #[test_case("1", "4", 2, 4; "scale below range")]
    #[test_case("25", "4", 20, 4; "scale above range")]
    #[test_case("abc", "", 8, 4; "non numeric defaults")]
    #[test_case("12", "-3", 12, 0; "negative margin")]
    #[test_case("3", "42", 3, 10; "margin above range")]
    #[test_case("5px", "0", 5, 0; "leading integer")]
    #[test_case("0", "4", 2, 4; "zero scale clamps")]
    fn test_clamped_geometry(scale: &str, margin: &str, expected_scale: u32, expected_margin: u32) {
        let mut preview = preview(PreviewConfig::default());
        preview.load(form("HELLO", "M", scale, margin));

        let result = preview.surface().current().unwrap();
        assert_eq!(result.options.scale, expected_scale);
        assert_eq!(result.options.margin, expected_margin);
        let side = (result.matrix.size() as u32 + 2 * expected_margin) * expected_scale;
        assert_eq!(result.image.dimensions(), (side, side));
    }

    #[test_case("L", "Low")]
    #[test_case("M", "Medium")]
    #[test_case("Q", "Quartile")]
    #[test_case("H", "High")]
    #[test_case("?", "Low")]
    fn test_status_names_requested_level(code: &str, label: &str) {
        let mut preview = preview(PreviewConfig::default());
        preview.load(form("https://example.com", code, "8", "4"));
        assert_eq!(
            preview.status().text(),
            format!("QR code generated with {label} error correction.")
        );
    }

    #[test]
    fn test_over_capacity_clears_previous_render() {
        let mut preview = preview(PreviewConfig::default());
        preview.load(form("HELLO", "H", "8", "4"));
        assert!(preview.surface().image().is_some());

        let long = "a".repeat(1300);
        let state = preview.handle(&FormEvent::input(FormField::Text, long.as_str()));
        let expected = QrCodeGenEncoder::default()
            .encode(&long, ErrorLevel::High, None)
            .unwrap_err();

        assert_eq!(
            state,
            PreviewState::EncodeFailed {
                reason: expected.message().to_owned()
            }
        );
        assert_eq!(
            preview.status().text(),
            format!("Unable to generate QR code: {expected}")
        );
        assert_cleared(&preview);

        // The same text fits at Low; the next edit recovers.
        let state = preview.handle(&FormEvent::change(FormField::ErrorLevel, "L"));
        assert!(matches!(state, PreviewState::Rendering(_)));
    }

    #[test]
    fn test_whitespace_message_resets() {
        let mut preview = preview(PreviewConfig::default());
        preview.load(form("HELLO", "L", "8", "4"));
        let state = preview.handle(&FormEvent::input(FormField::Text, " \t "));
        assert_eq!(state, PreviewState::Idle);
        assert_eq!(preview.status().text(), PROMPT);
        assert_cleared(&preview);
    }

    #[test]
    fn test_every_edit_replaces_the_raster() {
        let mut preview = preview(PreviewConfig::default());
        preview.load(form("HELLO", "L", "8", "4"));
        let first = preview.surface().current().unwrap().clone();

        preview.handle(&FormEvent::input(FormField::Scale, "3"));
        let second = preview.surface().current().unwrap().clone();
        assert_eq!(second.matrix, first.matrix);
        assert_eq!(second.image.width(), (first.matrix.size() as u32 + 8) * 3);

        preview.handle(&FormEvent::input(FormField::Margin, "0"));
        let third = preview.surface().current().unwrap();
        assert_eq!(third.image.width(), first.matrix.size() as u32 * 3);
    }

    #[test]
    fn test_timestamp_shown_when_enabled() {
        let config = PreviewConfig {
            timestamp: true,
            ..PreviewConfig::default()
        };
        let mut preview = preview(config);
        let state = preview.load(form("HELLO", "L", "8", "4"));

        let PreviewState::Rendering(meta) = state else {
            panic!("expected a render");
        };
        let stamp = meta.timestamp.unwrap();
        // "YYYY-MM-DD HH:MM:SS UTC+H"
        assert!(stamp.len() >= 25, "{stamp}");
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
        assert_eq!(&stamp[19..23], " UTC");
        assert!(matches!(&stamp[23..24], "+" | "-"));
        assert_eq!(preview.meta().fields().timestamp, stamp);
    }

    #[test]
    fn test_timestamp_hidden_by_default() {
        let mut preview = preview(PreviewConfig::default());
        let state = preview.load(form("HELLO", "L", "8", "4"));
        let PreviewState::Rendering(meta) = state else {
            panic!("expected a render");
        };
        assert_eq!(meta.timestamp, None);
        assert_eq!(preview.meta().fields().timestamp, PLACEHOLDER);
    }
}
