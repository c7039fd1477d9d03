/// Example: Render one frame of an OBJ model as plain ASCII
///
/// Usage: cargo run --example snapshot -- path/to/model.obj [columns rows]
use anyhow::{Context, Result};
use pvr3d_core::{Config, Mesh, Renderer};
use pvr3d_terminal::TerminalApp;
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut renderer = Renderer::new(Config::default())?;
    renderer.initialize();

    let model = match args.get(1) {
        Some(path) => renderer
            .models
            .load_obj(path, None, false)
            .with_context(|| format!("Failed to load model: {}", path))?,
        None => {
            eprintln!("No OBJ file provided, using default cube...");
            renderer.models.insert(Mesh::cube(2.0), None, false)?
        }
    };

    let columns: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(80);
    let rows: usize = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(30);

    let mut app = TerminalApp::new(renderer, model, None, columns, rows);
    app.draw_frame();

    let sink = app.sink();
    for y in 0..sink.height() {
        let line: String = (0..sink.width())
            .filter_map(|x| sink.cell(x, y))
            .map(|cell| cell.character)
            .collect();
        println!("{}", line.trim_end());
    }

    let info = app.renderer().vram_info();
    println!("{} vertices, {} bytes of display list", info.vertex_count, info.vertex_memory);
    Ok(())
}
