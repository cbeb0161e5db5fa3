mod font;
mod kerx;
mod morx;
mod tables;
mod trak;

use std::str::FromStr;

struct Args {
    direction: Option<aat_layout::Direction>,
    font_ptem: Option<f32>,
    features: Vec<String>,
    no_positions: bool,
    no_advances: bool,
    no_clusters: bool,
    show_flags: bool,
}

fn parse_args(args: Vec<std::ffi::OsString>) -> Result<Args, pico_args::Error> {
    let mut parser = pico_args::Arguments::from_vec(args);
    let args = Args {
        direction: parser.opt_value_from_str("--direction")?,
        font_ptem: parser.opt_value_from_str("--font-ptem")?,
        features: parser
            .opt_value_from_fn("--features", parse_string_list)?
            .unwrap_or_default(),
        no_positions: parser.contains("--no-positions"),
        no_advances: parser.contains("--no-advances"),
        no_clusters: parser.contains("--no-clusters"),
        show_flags: parser.contains("--show-flags"),
    };

    parser.finish()?;

    Ok(args)
}

fn parse_string_list(s: &str) -> Result<Vec<String>, String> {
    Ok(s.split(',').map(|s| s.to_string()).collect())
}

/// Shapes glyph ids with a font and serializes the result
/// as `glyph=cluster@x_offset,y_offset+x_advance,y_advance`.
pub fn shape(font_data: &[u8], glyphs: &[u32], options: &str) -> String {
    let args = options
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(std::ffi::OsString::from)
        .collect();
    let args = parse_args(args).unwrap();

    let face = aat_layout::Face::from_slice(font_data, 0).unwrap();
    let mut font = aat_layout::Font::new(&face);
    font.set_points_per_em(args.font_ptem);

    let mut buffer = aat_layout::Buffer::new();
    for (i, glyph) in glyphs.iter().enumerate() {
        buffer.add_glyph(*glyph, i as u32);
    }

    if let Some(d) = args.direction {
        buffer.set_direction(d);
    }

    let features: Vec<_> = args
        .features
        .iter()
        .map(|s| aat_layout::Feature::from_str(s).unwrap())
        .collect();

    aat_layout::shape(&font, &features, &mut buffer);

    serialize(&buffer, &args)
}

fn serialize(buffer: &aat_layout::Buffer, args: &Args) -> String {
    use std::fmt::Write;

    let mut s = String::new();
    for (info, pos) in buffer.glyph_infos().iter().zip(buffer.glyph_positions()) {
        if !s.is_empty() {
            s.push('|');
        }

        write!(&mut s, "{}", info.glyph_id).unwrap();

        if !args.no_clusters {
            write!(&mut s, "={}", info.cluster).unwrap();
        }

        if !args.no_positions {
            if pos.x_offset != 0 || pos.y_offset != 0 {
                write!(&mut s, "@{},{}", pos.x_offset, pos.y_offset).unwrap();
            }

            if !args.no_advances {
                write!(&mut s, "+{}", pos.x_advance).unwrap();
                if pos.y_advance != 0 {
                    write!(&mut s, ",{}", pos.y_advance).unwrap();
                }
            }
        }

        if args.show_flags && info.flags().contains(aat_layout::GlyphFlags::UNSAFE_TO_BREAK) {
            s.push_str("#1");
        }
    }

    s
}
