use std::path::PathBuf;

use anyhow::{Context, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rockview::pick::Tone;
use rockview::terrain;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "rockview=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let Some(input) = args.get(1).map(PathBuf::from) else {
        bail!("usage: rockview <terrain.json> [out_dir]");
    };
    let out_dir: PathBuf = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let terrain = terrain::load_file(&input)
        .with_context(|| format!("loading {}", input.display()))?;
    info!(size = terrain.size(), "processing terrain");

    let (report, timings) = rockview::process(&terrain);

    // Print timings
    eprintln!("\nTimings:");
    for t in &timings {
        eprintln!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    eprintln!(
        "\nMesh: {} surface vertices, {} triangles, {} grid lines",
        report.mesh.surface().vertices().len(),
        report.mesh.surface().indices().len() / 3,
        report.mesh.wireframe().edges().len()
    );

    match &report.summary {
        Some(s) => eprintln!(
            "Risk: level={} ({}) min={:.2} max={:.2} avg={:.2}",
            s.level.label(),
            Tone::for_level(s.level).hex(),
            s.min,
            s.max,
            s.mean
        ),
        None => eprintln!("Risk: no overlay"),
    }

    let n = report.size as u32;
    let save = |name: &str, rgba: &[u8]| -> anyhow::Result<()> {
        let path = out_dir.join(name);
        image::save_buffer(&path, rgba, n, n, image::ColorType::Rgba8)
            .with_context(|| format!("saving {}", path.display()))?;
        eprintln!("Saved {}", path.display());
        Ok(())
    };

    save("elevation.png", &report.elevation_rgba)?;
    save(
        "heightmap.png",
        &rockview::render::render_heightmap(terrain.elevation.grid()),
    )?;
    if let Some(risk_rgba) = &report.risk_rgba {
        save("risk.png", risk_rgba)?;
    }

    let mesh_path = out_dir.join("mesh.json");
    let file = std::fs::File::create(&mesh_path)
        .with_context(|| format!("creating {}", mesh_path.display()))?;
    serde_json::to_writer(std::io::BufWriter::new(file), &report.mesh)?;
    eprintln!("Saved {}", mesh_path.display());

    eprintln!("\nDone.");
    Ok(())
}
