//! Headless demo entry point (native).
//!
//! Builds an editor on an in-memory surface, loads the start-up scene and
//! draws one connector, logging what the canvas ends up holding.

#[cfg(feature = "native")]
fn main() {
    use diagramkit_app::{Catalog, Editor, EditorConfig, ShortcutRegistry};
    use diagramkit_core::input::PointerEvent;
    use diagramkit_render::{CanvasSync, FactoryRegistry, RecordingSurface};

    env_logger::init();
    log::info!("Starting DiagramKit");

    let config = match std::env::args().nth(1) {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{err}; using defaults");
                EditorConfig::default()
            }
        },
        None => EditorConfig::default(),
    };

    let sync = CanvasSync::attach(RecordingSurface::new(), FactoryRegistry::with_builtins());
    let mut editor = match Editor::new(config, sync, Catalog::builtin()) {
        Ok(editor) => editor,
        Err(err) => {
            log::error!("failed to start editor: {err}");
            std::process::exit(1);
        }
    };

    let run = |editor: &mut Editor<RecordingSurface, Catalog>| -> diagramkit_app::EditorResult<()> {
        editor.load_sample()?;
        editor.set_connector_mode()?;
        editor.pointer(&PointerEvent::down(150.0, 150.0))?;
        editor.pointer(&PointerEvent::moved(220.0, 220.0))?;
        editor.pointer(&PointerEvent::up(250.0, 250.0))?;
        editor.set_pointer_mode()
    };
    if let Err(err) = run(&mut editor) {
        log::error!("demo failed: {err}");
        std::process::exit(1);
    }

    ShortcutRegistry::print_all();
    println!("[{}] {} shapes", editor.tr("MENU_FILE"), editor.shapes().len());
    for shape in editor.shapes() {
        println!("  {} {} at ({}, {})", shape.kind, shape.id(), shape.position.x, shape.position.y);
    }
    for connector in editor.connectors() {
        println!("  connector {} -> {}", connector.source(), connector.target());
    }
    let surface = editor.canvas().surface();
    println!(
        "canvas: {} objects, {} redraws",
        surface.len(),
        surface.redraw_count()
    );
    if let Some(grid) = surface.grid() {
        let (xs, ys) = grid.lines(kurbo::Rect::new(0.0, 0.0, 400.0, 400.0));
        println!("grid: {} x {} lines every {}", xs.len(), ys.len(), grid.cell_size);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
