use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::detail::DetailView;
use crate::figure::{HoverCard, ViewMode};
use crate::format::{parse_color, truncate_label};
use crate::map::MapLayers;
use crate::state::filter_options;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
    Frame,
};

const CONTROLS_HEIGHT: u16 = 3;
const TOOLTIP_WIDTH: u16 = 44;
const MUTED: Color = Color::DarkGray;

/// Controls bar, map block and status bar
fn layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(CONTROLS_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn map_block(mode: ViewMode) -> Block<'static> {
    let title = match mode {
        ViewMode::Globe => " 🌍 Globe ",
        ViewMode::FlatMap => " 🗺  Flat Map ",
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Map area inside its border for a terminal of the given size
pub fn map_inner(area: Rect) -> Rect {
    map_block(ViewMode::Globe).inner(layout(area)[1])
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let [controls, map, status] = layout(frame.area());

    render_controls(frame, app, controls);
    render_map(frame, app, map);
    render_legend(frame, app, map);
    if let Some(detail) = &app.detail {
        render_detail(frame, app, detail, map);
    } else {
        render_tooltip(frame, app, map);
    }
    render_status_bar(frame, app, status);
}

/// `#rrggbb` / `rgba(..)` to a terminal color, alpha-blended over `bg`
fn to_color(color: &str, bg: &str) -> Color {
    let Ok((r, g, b, a)) = parse_color(color) else {
        return Color::Cyan;
    };
    let (br, bgc, bb, _) = parse_color(bg).unwrap_or((0, 0, 0, 1.0));
    let mix = |fg: u8, back: u8| (fg as f64 * a + back as f64 * (1.0 - a)).round() as u8;
    Color::Rgb(mix(r, br), mix(g, bgc), mix(b, bb))
}

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
    let active = Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD);
    let idle = Style::default().fg(Color::Gray);
    let ocean = &app.style.palette.ocean;

    let mut spans = vec![
        Span::styled(
            " 🌍 Globe [g] ",
            if app.state.view_mode == ViewMode::Globe { active } else { idle },
        ),
        Span::raw(" "),
        Span::styled(
            " 🗺  Flat [m] ",
            if app.state.view_mode == ViewMode::FlatMap { active } else { idle },
        ),
        Span::styled("  │  ", Style::default().fg(MUTED)),
    ];

    for option in filter_options(&app.dataset) {
        let selected = option.value == app.state.continent_filter;
        let color = match option.value.as_str() {
            "All" => Color::Cyan,
            name => to_color(app.dataset.color_for(name), ocean),
        };
        let style = if selected {
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        spans.push(Span::styled(format!(" {} ", option.label), style));
        spans.push(Span::raw(" "));
    }

    let (shown, total) = app.counts();
    spans.push(Span::styled("│  ", Style::default().fg(MUTED)));
    spans.push(Span::styled(
        format!("{shown}/{total} cities"),
        Style::default().fg(Color::Yellow),
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .title(Span::styled(
            " World Cities Explorer ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block(app.state.view_mode);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let palette = &app.style.palette;
    let cursor_pos = app
        .mouse_pos
        .filter(|_| app.hovered.is_none())
        .filter(|&(col, row)| inner.contains((col, row).into()));

    frame.render_widget(
        MapWidget {
            layers: &app.layers,
            ocean: to_color(&palette.ocean, &palette.ocean),
            coastline: to_color(&palette.coastline, &palette.ocean),
            country: to_color(&palette.country, &palette.ocean),
            land: to_color(&palette.land, &palette.ocean),
            outline: to_color(&palette.lake, &palette.ocean),
            ocean_hex: &palette.ocean,
            cursor_pos,
        },
        inner,
    );
}

/// Braille map with colored layers and labels overlaid
struct MapWidget<'a> {
    layers: &'a MapLayers,
    ocean: Color,
    coastline: Color,
    country: Color,
    /// Background of cells crossed by country borders
    land: Color,
    outline: Color,
    ocean_hex: &'a str,
    /// Absolute terminal cell of the mouse cursor
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget<'_> {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        Self::render_layer_on(canvas, color, None, area, buf);
    }

    /// Like `render_layer`, also painting the background of drawn cells
    fn render_layer_on(
        canvas: &BrailleCanvas,
        color: Color,
        bg: Option<Color>,
        area: Rect,
        buf: &mut Buffer,
    ) {
        for row in 0..area.height.min(canvas.height() as u16) {
            for col in 0..area.width.min(canvas.width() as u16) {
                if let Some(ch) = canvas.glyph(col as usize, row as usize) {
                    let cell = &mut buf[(area.x + col, area.y + row)];
                    cell.set_char(ch).set_fg(color);
                    if let Some(bg) = bg {
                        cell.set_bg(bg);
                    }
                }
            }
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(self.ocean));

        let layers = self.layers;
        Self::render_layer(&layers.outline, self.outline, area, buf);
        Self::render_layer(&layers.coastlines, self.coastline, area, buf);
        Self::render_layer_on(&layers.borders, self.country, Some(self.land), area, buf);
        for halo in &layers.halos {
            Self::render_layer(&halo.canvas, to_color(&halo.color, self.ocean_hex), area, buf);
        }
        for marker in &layers.markers {
            Self::render_layer(&marker.canvas, to_color(&marker.color, self.ocean_hex), area, buf);
        }
        Self::render_layer(&layers.highlight, Color::White, area, buf);

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - *lx) as usize;
            buf.set_stringn(area.x + *lx, area.y + *ly, text, max_len.min(24), label_style);
        }

        if let Some((x, y)) = self.cursor_pos {
            buf[(x, y)].set_char('╋').set_fg(Color::Red);
        }
    }
}

fn render_legend(frame: &mut Frame, app: &App, map: Rect) {
    let legend = &app.figure.legend;
    if legend.entries.is_empty() {
        return;
    }
    let width = legend
        .entries
        .iter()
        .map(|e| Line::from(e.label.as_str()).width() as u16 + 4)
        .max()
        .unwrap_or(0)
        .max(legend.title.len() as u16 + 4);
    let height = legend.entries.len() as u16 + 2;
    if map.width < width + 4 || map.height < height + 2 {
        return;
    }
    let area = Rect::new(map.right() - width - 2, map.bottom() - height - 1, width, height);

    let lines: Vec<Line> = legend
        .entries
        .iter()
        .map(|e| {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(to_color(&e.color, &app.style.palette.ocean))),
                Span::raw(e.label.clone()),
            ])
        })
        .collect();

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED))
                .title(Span::styled(format!(" {} ", legend.title), Style::default().fg(Color::Gray))),
        ),
        area,
    );
}

fn render_tooltip(frame: &mut Frame, app: &App, map: Rect) {
    let Some((point, (col, row))) = app.hover_point() else {
        return;
    };
    let card = &point.hover;
    let accent = to_color(&card.accent, &app.style.palette.ocean);
    let lines = tooltip_lines(card, accent);

    let height = lines.len() as u16 + 2;
    let width = TOOLTIP_WIDTH.min(map.width);
    // Prefer right of and below the marker, flipping at the edges
    let x = if col + 2 + width <= map.right() {
        col + 2
    } else {
        col.saturating_sub(width + 1).max(map.x)
    };
    let y = if row + 1 + height <= map.bottom() {
        row + 1
    } else {
        row.saturating_sub(height).max(map.y)
    };
    let area = Rect::new(x, y, width, height.min(map.height)).intersection(map);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent)),
        ),
        area,
    );
}

fn tooltip_lines(card: &HoverCard, accent: Color) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            card.title.clone(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(card.subtitle.clone(), Style::default().fg(Color::Gray))),
        Line::from(vec![
            Span::raw(format!("👥 {}  ", card.population)),
            Span::styled(card.population_bar.clone(), Style::default().fg(accent)),
        ]),
        Line::from(format!("⭐ {}", card.famous_for)),
        Line::from(format!("📍 {}", card.top_attraction)),
        Line::from(Span::styled(
            card.hint.clone(),
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        )),
    ]
}

/// Centered rectangle covering the given percentages of `area`
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn render_detail(frame: &mut Frame, app: &App, detail: &DetailView, map: Rect) {
    let ocean = &app.style.palette.ocean;
    let accent = to_color(&detail.header.accent, ocean);
    let area = centered(map, 90, 94);

    let header = &detail.header;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            format!(" {}  {} ", header.flag, header.name),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            " e: export CSV · x: export all · Esc: close · ↑↓: scroll ",
            Style::default().fg(MUTED),
        ));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // country · continent
            Constraint::Length(3), // description
            Constraint::Length(1), // tags
            Constraint::Length(1), // population gauge
            Constraint::Length(2), // chips
            Constraint::Min(6),    // charts
            Constraint::Min(4),    // lists
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(header.country.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  ·  {}", header.continent), Style::default().fg(accent)),
        ])),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new(detail.description.clone())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Gray)),
        rows[1],
    );

    let mut tags = Vec::new();
    for tag in &detail.tags {
        tags.push(Span::styled(
            format!(" {tag} "),
            Style::default().fg(Color::Black).bg(accent),
        ));
        tags.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(tags)), rows[2]);

    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(accent).bg(Color::Black))
            .ratio((detail.population.fill_percent / 100.0).clamp(0.0, 1.0))
            .label(Span::styled(
                format!("👥 {}", detail.population.display),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
        rows[3],
    );

    let chip_lines: Vec<Line> = detail
        .chips
        .chunks(3)
        .map(|chunk| {
            Line::from(
                chunk
                    .iter()
                    .flat_map(|chip| {
                        [
                            Span::raw(format!("{} ", chip.icon)),
                            Span::styled(format!("{}: ", chip.label), Style::default().fg(MUTED)),
                            Span::raw(format!("{}   ", chip.value)),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(chip_lines), rows[4]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[5]);
    render_comparison(frame, detail, ocean, charts[0]);
    render_attraction_scores(frame, detail, ocean, charts[1]);
    render_lists(frame, app, detail, accent, rows[6]);
}

fn render_comparison(frame: &mut Frame, detail: &DetailView, ocean: &str, area: Rect) {
    let chart = &detail.comparison;
    let bars: Vec<Bar> = chart
        .bars
        .iter()
        .map(|b| {
            let color = to_color(&b.color, ocean);
            let mut style = Style::default().fg(color);
            if b.highlighted {
                style = style.add_modifier(Modifier::BOLD);
            }
            Bar::default()
                .value(b.population)
                .label(Line::from(truncate_label(&b.city, 12)))
                .text_value(b.label.clone())
                .style(style)
                .value_style(Style::default().fg(Color::White).bg(color))
        })
        .collect();

    frame.render_widget(
        BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(MUTED))
                    .title(format!(" {} ", chart.title)),
            )
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars)),
        area,
    );
}

fn render_attraction_scores(frame: &mut Frame, detail: &DetailView, ocean: &str, area: Rect) {
    let chart = &detail.attractions_chart;
    let bars: Vec<Bar> = chart
        .bars
        .iter()
        .map(|b| {
            Bar::default()
                .value(u64::from(b.score))
                .label(Line::from(b.label.clone()))
                .style(Style::default().fg(to_color(&b.color, ocean)))
        })
        .collect();

    frame.render_widget(
        BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(MUTED))
                    .title(format!(" {} ", chart.title)),
            )
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .max(100)
            .data(BarGroup::default().bars(&bars)),
        area,
    );
}

fn render_lists(frame: &mut Frame, app: &App, detail: &DetailView, accent: Color, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        "Top Attractions",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(detail.attractions.iter().map(|a| {
        Line::from(vec![
            Span::styled(format!(" {} ", a.marker), Style::default().fg(accent)),
            Span::raw(a.text.clone()),
        ])
    }));

    if let Some(facts) = &detail.fun_facts {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Did You Know?",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(facts.iter().map(|f| {
            Line::from(vec![
                Span::styled(" 💡 ", Style::default().fg(accent)),
                Span::raw(f.clone()),
            ])
        }));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .scroll((app.detail_scroll, 0)),
        area,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(MUTED)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(MUTED)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") | ", Style::default().fg(MUTED)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];
    if let Some(status) = &app.status {
        spans.push(Span::styled(" | ", Style::default().fg(MUTED)));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }
    spans.push(Span::styled(
        " | Tab:continent n:next ⏎:open e/x:export hjkl:move +/-:zoom r:reset q:quit",
        Style::default().fg(MUTED),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
