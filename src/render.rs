//! Top-down raster previews of the terrain, one RGBA pixel per grid cell.

use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use rayon::prelude::*;

use crate::grid::Grid;
use crate::mesh::Band;

const RISK_LOW: [u8; 4] = [34, 187, 34, 255];
const RISK_MID: [u8; 4] = [255, 238, 0, 255];
const RISK_HIGH: [u8; 4] = [255, 34, 34, 255];

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
        255,
    ]
}

/// Elevation bands as seen from above, same colours as the mesh.
pub fn render_elevation(height: &Grid<f32>) -> Vec<u8> {
    let (min, max) = height.min_max();
    let w = height.w;
    let mut rgba = vec![0u8; w * height.h * 4];

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let [r, g, b] = Band::for_elevation(height.get(x, y), min, max).rgb8();
            row[x * 4..x * 4 + 4].copy_from_slice(&[r, g, b, 255]);
        }
    });

    rgba
}

/// Risk heat map: green at 0, yellow at 0.5, red at 1.
pub fn render_risk(risk: &Grid<f32>) -> Vec<u8> {
    let w = risk.w;
    let mut rgba = vec![0u8; w * risk.h * 4];

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let p = risk.get(x, y);
            let color = if p < 0.5 {
                lerp_color(RISK_LOW, RISK_MID, p / 0.5)
            } else {
                lerp_color(RISK_MID, RISK_HIGH, (p - 0.5) / 0.5)
            };
            row[x * 4..x * 4 + 4].copy_from_slice(&color);
        }
    });

    rgba
}

/// Diagnostic: grayscale heightmap.
pub fn render_heightmap(height: &Grid<f32>) -> Vec<u8> {
    let (min_h, max_h) = height.min_max();
    let range = max_h - min_h;
    let mut rgba = vec![0u8; height.len() * 4];
    for (i, &v) in height.data.iter().enumerate() {
        let t = if range > 0.0 { (v - min_h) / range } else { 0.5 };
        let v = (t * 255.0).clamp(0.0, 255.0) as u8;
        rgba[i * 4..i * 4 + 4].copy_from_slice(&[v, v, v, 255]);
    }
    rgba
}

pub fn encode_png(rgba: &[u8], w: usize, h: usize) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        rgba,
        w as u32,
        h as u32,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

pub fn png_data_url(rgba: &[u8], w: usize, h: usize) -> image::ImageResult<String> {
    let png = encode_png(rgba, w, h)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(format!("data:image/png;base64,{}", b64))
}
