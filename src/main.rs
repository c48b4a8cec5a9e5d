use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use globe_explorer::app::App;
use globe_explorer::config::{Cli, Command, Settings};
use globe_explorer::export::{write_download, Download};
use globe_explorer::map::MapRenderer;
use globe_explorer::server::{self, AppState};
use globe_explorer::state;
use globe_explorer::{data, telemetry, ui};
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings.clone();

    match cli.command() {
        Command::Tui => run_tui(&settings),
        Command::Serve => run_server(&settings),
        Command::Export { city, out } => run_export(&settings, city.as_deref(), out),
    }
}

fn run_server(settings: &Settings) -> Result<()> {
    telemetry::init_stderr(settings.debug);
    let dataset = settings.load_dataset()?;
    let addr = settings.bind_addr()?;
    let state = AppState::new(Arc::new(dataset), settings.figure_style());

    tokio::runtime::Runtime::new()
        .context("Failed to start async runtime")?
        .block_on(server::serve(addr, state))
}

fn run_export(settings: &Settings, city: Option<&str>, out: Option<std::path::PathBuf>) -> Result<()> {
    telemetry::init_stderr(settings.debug);
    let dataset = settings.load_dataset()?;

    let download = match city {
        Some(name) => {
            let id = dataset
                .find_by_name(name)
                .with_context(|| format!("No city named {name:?}"))?;
            let record = dataset.get(id).context("City id out of range")?;
            Download::for_city(record)?
        }
        None => Download::for_dataset(&dataset)?,
    };

    let path = match out {
        Some(path) => {
            std::fs::write(&path, &download.content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path
        }
        None => write_download(&settings.export_dir, &download)?,
    };
    println!("{}", path.display());
    Ok(())
}

fn run_tui(settings: &Settings) -> Result<()> {
    telemetry::init_tui(settings.debug, &settings.export_dir)?;
    let dataset = Arc::new(settings.load_dataset()?);

    // Load all available GeoJSON data at different resolutions
    let mut map_renderer = MapRenderer::new();
    if settings.data_dir.exists() {
        if let Err(e) = data::load_all_geojson(&mut map_renderer, &settings.data_dir) {
            tracing::warn!(error = %e, dir = %settings.data_dir.display(), "GeoJSON load failed");
        }
    }

    // Fall back to simple world if no data loaded
    if !map_renderer.has_data() {
        data::generate_simple_world(&mut map_renderer);
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = start(&mut terminal, dataset, map_renderer, settings);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn start(
    terminal: &mut DefaultTerminal,
    dataset: Arc<data::Dataset>,
    map_renderer: MapRenderer,
    settings: &Settings,
) -> Result<()> {
    let size = terminal.size()?;
    let map_area = ui::map_inner(Rect::new(0, 0, size.width, size.height));
    let mut app = App::new(
        dataset,
        settings.figure_style(),
        map_renderer,
        settings.export_dir.clone(),
        map_area,
    );
    run(terminal, &mut app)
}

/// Mouse: hover, click to open, drag to pan/rotate, wheel to zoom
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.set_mouse_pos(mouse.column, mouse.row),
        // Scroll wheel scrolls the panel when open, otherwise zooms towards the mouse
        MouseEventKind::ScrollUp if app.detail.is_some() => app.scroll_detail(-1),
        MouseEventKind::ScrollDown if app.detail.is_some() => app.scroll_detail(1),
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.begin_press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_press(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    let panel_open = app.detail.is_some();
    match code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Backspace if panel_open => app.dispatch(state::Event::ClosePanel),
        KeyCode::Esc => app.quit(),

        // View mode and continent filter
        KeyCode::Char('g') => app.dispatch(state::Event::SelectGlobe),
        KeyCode::Char('m') => app.dispatch(state::Event::SelectFlatMap),
        KeyCode::Tab => app.cycle_filter(true),
        KeyCode::BackTab => app.cycle_filter(false),

        // City selection and export
        KeyCode::Char('n') => app.step_hover(true),
        KeyCode::Char('N') => app.step_hover(false),
        KeyCode::Enter => app.open_hovered(),
        KeyCode::Char('e') => app.dispatch(state::Event::ExportCity),
        KeyCode::Char('x') => app.dispatch(state::Event::ExportAll),

        // Scroll the open panel
        KeyCode::Up | KeyCode::Char('k') if panel_open => app.scroll_detail(-1),
        KeyCode::Down | KeyCode::Char('j') if panel_open => app.scroll_detail(1),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Reset view
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    // Main loop
    loop {
        app.prepare();
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key.code),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => {
                    app.set_map_area(ui::map_inner(Rect::new(0, 0, width, height)));
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
