use rgb::{FromSlice, RGBA8};

mod convert;
mod view;

const RED_SQUARE: &str =
    r#"<svg width="10" height="10"><rect width="10" height="10" fill="red"/></svg>"#;

/// Decodes PNG data into RGBA pixels.
fn load_png(data: &[u8]) -> (u32, u32, Vec<RGBA8>) {
    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info().unwrap();
    let mut img_data = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut img_data).unwrap();

    match info.color_type {
        png::ColorType::Rgba => {}
        c => panic!("{:?} PNG is not supported.", c),
    }

    img_data.truncate(info.buffer_size());
    (info.width, info.height, img_data.as_rgba().to_vec())
}

fn session_with(markup: &str) -> svg2png::Session {
    let mut session = svg2png::Session::new();
    session.on_text_edited(markup);
    session
}
