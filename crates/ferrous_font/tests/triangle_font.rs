use std::io::Cursor;

use ferrous_font::{FontAsset, FontAtlas, FontError, PackSettings, TrueTypeFont};

/// One-contour glyph using 16-bit coordinate deltas.
fn glyph(points: &[(i16, i16)]) -> Vec<u8> {
    let xs = points.iter().map(|p| p.0);
    let ys = points.iter().map(|p| p.1);
    let mut g = Vec::new();
    g.extend(1i16.to_be_bytes());
    g.extend(xs.clone().min().unwrap_or(0).to_be_bytes());
    g.extend(ys.clone().min().unwrap_or(0).to_be_bytes());
    g.extend(xs.max().unwrap_or(0).to_be_bytes());
    g.extend(ys.max().unwrap_or(0).to_be_bytes());
    g.extend((points.len() as u16 - 1).to_be_bytes());
    g.extend(0u16.to_be_bytes());
    g.extend(std::iter::repeat(0x01u8).take(points.len()));
    let mut prev = 0;
    for &(x, _) in points {
        g.extend((x - prev).to_be_bytes());
        prev = x;
    }
    prev = 0;
    for &(_, y) in points {
        g.extend((y - prev).to_be_bytes());
        prev = y;
    }
    if g.len() % 2 == 1 {
        g.push(0);
    }
    g
}

/// A font with `.notdef` (empty) and a triangle mapped to 'A'.
fn triangle_font() -> Vec<u8> {
    let triangle = glyph(&[(100, 0), (600, 1400), (1100, 0)]);

    let mut cmap = Vec::new();
    cmap.extend(0u16.to_be_bytes());
    cmap.extend(1u16.to_be_bytes());
    cmap.extend(3u16.to_be_bytes());
    cmap.extend(1u16.to_be_bytes());
    cmap.extend(12u32.to_be_bytes());
    let sub_start = cmap.len();
    cmap.extend(4u16.to_be_bytes());
    cmap.extend(0u16.to_be_bytes());
    cmap.extend(0u16.to_be_bytes());
    cmap.extend(4u16.to_be_bytes()); // segCountX2
    cmap.extend([0u8; 6]);
    cmap.extend((b'A' as u16).to_be_bytes());
    cmap.extend(0xFFFFu16.to_be_bytes());
    cmap.extend(0u16.to_be_bytes());
    cmap.extend((b'A' as u16).to_be_bytes());
    cmap.extend(0xFFFFu16.to_be_bytes());
    cmap.extend((1i16 - b'A' as i16).to_be_bytes());
    cmap.extend(1i16.to_be_bytes());
    cmap.extend([0u8; 4]);
    let len = (cmap.len() - sub_start) as u16;
    cmap[sub_start + 2..sub_start + 4].copy_from_slice(&len.to_be_bytes());

    let mut head = vec![0u8; 54];
    head[18..20].copy_from_slice(&2048u16.to_be_bytes());
    // short loca

    let mut maxp = vec![0u8; 6];
    maxp[4..6].copy_from_slice(&2u16.to_be_bytes());

    let mut hhea = vec![0u8; 36];
    hhea[34..36].copy_from_slice(&1u16.to_be_bytes());
    // one long metric, glyph 1 reuses its advance
    let mut hmtx = Vec::new();
    hmtx.extend(1200u16.to_be_bytes());
    hmtx.extend(0i16.to_be_bytes());
    hmtx.extend(100i16.to_be_bytes());

    let mut loca = Vec::new();
    for off in [0u16, 0, triangle.len() as u16 / 2] {
        loca.extend(off.to_be_bytes());
    }

    let tables = [
        (*b"cmap", cmap),
        (*b"glyf", triangle),
        (*b"head", head),
        (*b"hhea", hhea),
        (*b"hmtx", hmtx),
        (*b"loca", loca),
        (*b"maxp", maxp),
    ];
    let mut data = vec![0, 1, 0, 0];
    data.extend((tables.len() as u16).to_be_bytes());
    data.extend([0u8; 6]);
    let mut offset = 12 + tables.len() * 16;
    for (tag, table) in &tables {
        data.extend(tag);
        data.extend(0u32.to_be_bytes());
        data.extend((offset as u32).to_be_bytes());
        data.extend((table.len() as u32).to_be_bytes());
        offset += table.len();
    }
    for (_, table) in &tables {
        data.extend(table);
    }
    data
}

fn pixel(atlas: &FontAtlas, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * atlas.edge + x) * 4) as usize;
    [
        atlas.pixels[i],
        atlas.pixels[i + 1],
        atlas.pixels[i + 2],
        atlas.pixels[i + 3],
    ]
}

fn median(p: [u8; 4]) -> u8 {
    let (r, g, b) = (p[0], p[1], p[2]);
    r.min(g).max(r.max(g).min(b))
}

#[test]
fn triangle_glyph_field_crosses_the_outline() {
    let mut font = TrueTypeFont::from_bytes(triangle_font()).unwrap();
    let settings = PackSettings::default().with_font_size(64.0);
    let atlas = FontAtlas::build(&mut font, "A".chars(), &settings).unwrap();

    let a = atlas.glyph('A').unwrap();
    let x0 = (a.uv_rect[0] * atlas.edge as f32).round() as u32;
    let y0 = (a.uv_rect[1] * atlas.edge as f32).round() as u32;
    // 1000x1400 units at 64px per 2048 units, plus the border
    assert_eq!(a.width, 32 + 8);
    assert_eq!(a.height, 44 + 8);
    assert!((a.advance - 1200.0 * 64.0 / 2048.0).abs() < 1e-4);
    assert!((a.left_bearing - 100.0 * 64.0 / 2048.0).abs() < 1e-4);

    // walk down the vertical centre line: outside above the apex, inside
    // the body, outside again below the base
    let cx = x0 + a.width as u32 / 2;
    let top = pixel(&atlas, cx, y0);
    let middle = pixel(&atlas, cx, y0 + a.height as u32 * 2 / 3);
    let bottom = pixel(&atlas, cx, y0 + a.height as u32 - 1);
    assert!(top[3] < 128 && median(top) < 128, "{top:?}");
    assert!(middle[3] > 127 && median(middle) > 127, "{middle:?}");
    assert!(bottom[3] < 128 && median(bottom) < 128, "{bottom:?}");

    // the corners of the glyph box are far outside the triangle
    assert!(pixel(&atlas, x0, y0)[3] < 128);
    assert!(pixel(&atlas, x0 + a.width as u32 - 1, y0)[3] < 128);
}

#[test]
fn asset_round_trip() {
    let mut font = TrueTypeFont::from_bytes(triangle_font()).unwrap();
    let atlas = FontAtlas::build(&mut font, ['A', 'B'], &PackSettings::default()).unwrap();
    assert_eq!(atlas.glyphs.len(), 1);

    let asset = FontAsset::new("Triangle", atlas);
    let mut bytes = Vec::new();
    asset.write_to(&mut bytes).unwrap();
    let back = FontAsset::read_from(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(back, asset);
}

#[test]
fn broken_glyph_aborts_the_build() {
    let mut data = triangle_font();
    // corrupt the triangle's point flags into a repeat that overruns
    // glyf is the second directory record
    let rec = 12 + 16;
    let glyf_offset = u32::from_be_bytes([data[rec + 8], data[rec + 9], data[rec + 10], data[rec + 11]]) as usize;
    let flags = glyf_offset + 10 + 2 + 2;
    data[flags] = 0x09;
    data[flags + 1] = 0x05;
    let mut font = TrueTypeFont::from_bytes(data).unwrap();
    let result = FontAtlas::build(&mut font, "A".chars(), &PackSettings::default());
    assert!(matches!(result, Err(FontError::Format(_))));
}
