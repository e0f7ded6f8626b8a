use base64::Engine;
use rgb::RGBA8;
use svg2png::{Error, Options, RenderError, Session, Status};

use crate::{load_png, session_with, RED_SQUARE};

#[test]
fn red_square() {
    let mut session = session_with(RED_SQUARE);
    let image = session.convert().unwrap();
    assert_eq!(image.width(), 10);
    assert_eq!(image.height(), 10);
    assert_eq!(image.pixel(0, 0), Some(RGBA8::new(255, 0, 0, 255)));

    let (width, height, pixels) = load_png(image.png());
    assert_eq!((width, height), (10, 10));
    assert_eq!(pixels[0], RGBA8::new(255, 0, 0, 255));
    assert!(pixels.iter().all(|p| *p == RGBA8::new(255, 0, 0, 255)));

    assert_eq!(session.status(), Status::Succeeded);
    assert!(session.error().is_none());
    assert!(!session.is_converting());
}

#[test]
fn size_matches_declared_size() {
    for (w, h) in [(1, 1), (7, 3), (64, 32), (300, 150)] {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"/>"#,
            w, h
        );
        let mut session = session_with(&svg);
        let image = session.convert().unwrap();
        assert_eq!((image.width(), image.height()), (w, h));

        let (width, height, _) = load_png(image.png());
        assert_eq!((width, height), (w, h));
    }
}

#[test]
fn size_ignores_view_box() {
    let svg = r#"<svg width="20" height="10" viewBox="0 0 200 100">
        <rect width="200" height="100" fill="blue"/>
    </svg>"#;
    let mut session = session_with(svg);
    let image = session.convert().unwrap();
    assert_eq!((image.width(), image.height()), (20, 10));
    assert_eq!(image.pixel(19, 9), Some(RGBA8::new(0, 0, 255, 255)));
}

#[test]
fn missing_size_uses_default_size() {
    let mut session = session_with(r#"<svg><rect width="5" height="5"/></svg>"#);
    let image = session.convert().unwrap();
    assert_eq!((image.width(), image.height()), (100, 100));
}

#[test]
fn transparent_background() {
    let svg = r#"<svg width="4" height="4"><rect width="2" height="2" fill="lime"/></svg>"#;
    let mut session = session_with(svg);
    let image = session.convert().unwrap();
    assert_eq!(image.pixel(0, 0), Some(RGBA8::new(0, 255, 0, 255)));
    assert_eq!(image.pixel(3, 3).map(|p| p.a), Some(0));
}

#[test]
fn deterministic_output() {
    let mut session = session_with(
        r#"<svg width="32" height="32"><circle cx="16" cy="16" r="12" fill="teal"/></svg>"#,
    );
    let png1 = session.convert().unwrap().png().to_vec();
    let png2 = session.convert().unwrap().png().to_vec();
    assert_eq!(png1, png2);
}

#[test]
fn empty_input() {
    let mut session = session_with("");
    assert_eq!(session.convert().unwrap_err(), Error::EmptyOrMalformedInput);
    assert!(session.image().is_none());
    assert_eq!(
        session.error_message().as_deref(),
        Some("Please enter valid SVG code.")
    );
    assert_eq!(session.status(), Status::Invalid);
    assert!(session.blobs().is_empty());
}

#[test]
fn invalid_input_clears_image() {
    let mut session = session_with(RED_SQUARE);
    session.convert().unwrap();
    assert!(session.image().is_some());

    for text in ["", "   ", "hello", "<?xml version='1.0'?><svg/>", "<div>", "svg"] {
        session.on_text_edited(text);
        assert_eq!(session.convert().unwrap_err(), Error::EmptyOrMalformedInput);
        assert!(session.image().is_none());
        assert_eq!(session.error(), Some(&Error::EmptyOrMalformedInput));
    }
}

#[test]
fn surrounding_whitespace_is_allowed() {
    let mut session = session_with(&format!("\n\t  {}  \n", RED_SQUARE));
    assert!(session.convert().is_ok());
}

#[test]
fn malformed_svg_keeps_previous_image() {
    let mut session = session_with(RED_SQUARE);
    let png = session.convert().unwrap().png().to_vec();

    session.on_text_edited("<svg width='10' height='10'><rect");
    let e = session.convert().unwrap_err();
    assert!(matches!(e, Error::ConversionFailure(RenderError::ParsingFailed(_))));
    assert_eq!(
        session.error_message().as_deref(),
        Some("An error occurred during conversion. Please try again.")
    );
    assert_eq!(session.status(), Status::Failed);
    assert!(!session.is_converting());
    assert_eq!(session.image().map(|img| img.png()), Some(png.as_slice()));
}

#[test]
fn failure_releases_object_url() {
    let mut session = session_with("<svg width='0' height='0'/>");
    assert!(session.convert().is_err());
    assert!(session.blobs().is_empty());

    session.on_text_edited(RED_SQUARE);
    assert!(session.convert().is_ok());
    assert!(session.blobs().is_empty());
}

#[test]
fn huge_circle_does_not_hang() {
    let mut session = session_with(r#"<svg><circle r="9999999999"/></svg>"#);
    match session.convert() {
        Ok(image) => assert!(image.width() > 0 && image.height() > 0),
        Err(e) => assert!(matches!(e, Error::ConversionFailure(_))),
    }
    assert!(!session.is_converting());
}

#[test]
fn huge_bitmap_fails() {
    let mut session = session_with(r#"<svg width="100000" height="100000"/>"#);
    assert_eq!(
        session.convert().unwrap_err(),
        Error::ConversionFailure(RenderError::TooLarge {
            width: 100000,
            height: 100000
        })
    );
    assert!(!session.is_converting());
}

#[test]
fn custom_default_size() {
    let opt = Options {
        default_size: usvg::Size::from_wh(30.0, 20.0).unwrap(),
        ..Options::default()
    };
    let mut session = Session::with_options(opt);
    session.on_text_edited("<svg/>");
    let image = session.convert().unwrap();
    assert_eq!((image.width(), image.height()), (30, 20));
}

#[test]
fn data_uri() {
    let mut session = session_with(RED_SQUARE);
    let image = session.convert().unwrap();
    let uri = image.data_uri();
    let encoded = uri.strip_prefix("data:image/png;base64,").unwrap();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(decoded, image.png());
    assert_eq!(image.file_name(), "converted.png");
}

#[test]
fn stale_image_survives_edits() {
    let mut session = session_with(RED_SQUARE);
    session.convert().unwrap();
    session.on_text_edited("<svg width='2' height='2'/>");
    assert_eq!(session.image().map(|img| img.width()), Some(10));
}

#[test]
fn preview_pixels() {
    let mut session = session_with(RED_SQUARE);
    let image = session.convert().unwrap();
    let preview = image.preview();
    assert_eq!(preview.len(), 100);
    assert_eq!(preview[99], RGBA8::new(255, 0, 0, 255));
}
