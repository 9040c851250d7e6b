//! Rendering of the interactive view. Pure function of the session state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph},
    Frame,
};

use crate::error::DeviceError;
use crate::focus::Focus;
use crate::models::light_state::{Brightness, DeviceState, Kelvin};
use crate::router::Session;
use crate::selection::SelectionMode;

// ── Palette ─────────────────────────────────────────────────────────

const ACCENT: Color = Color::Rgb(225, 53, 255);
const CYAN: Color = Color::Rgb(128, 255, 234);
const GREEN: Color = Color::Rgb(80, 250, 123);
const YELLOW: Color = Color::Rgb(241, 250, 140);
const RED: Color = Color::Rgb(255, 99, 99);
const DIM: Color = Color::Rgb(98, 114, 164);
const WARM: Color = Color::Rgb(255, 184, 108);

fn title_style() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

fn border(focused: bool) -> Style {
    Style::default().fg(if focused { ACCENT } else { DIM })
}

fn button_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(CYAN)
    }
}

/// Power indicator: ● on, ○ off or unknown, ◐ some of several on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indicator {
    On,
    Off,
    Partial,
    Offline,
    Unknown,
}

impl Indicator {
    fn span(self) -> Span<'static> {
        match self {
            Indicator::On => Span::styled("●", Style::default().fg(GREEN)),
            Indicator::Off => Span::styled("○", Style::default().fg(CYAN)),
            Indicator::Partial => Span::styled("◐", Style::default().fg(YELLOW)),
            Indicator::Offline => Span::styled("○", Style::default().fg(RED)),
            Indicator::Unknown => Span::styled("○", Style::default().fg(DIM)),
        }
    }
}

fn indicator(state: Option<&Result<DeviceState, DeviceError>>) -> Indicator {
    match state {
        Some(Ok(state)) if state.on => Indicator::On,
        Some(Ok(_)) => Indicator::Off,
        Some(Err(_)) => Indicator::Offline,
        None => Indicator::Unknown,
    }
}

fn combined(indicators: &[Indicator]) -> Indicator {
    let on = indicators.iter().filter(|i| **i == Indicator::On).count();
    match on {
        0 if indicators.iter().all(|i| *i == Indicator::Unknown) => Indicator::Unknown,
        0 => Indicator::Off,
        n if n == indicators.len() => Indicator::On,
        _ => Indicator::Partial,
    }
}

pub fn render(frame: &mut Frame, session: &Session) {
    let registry = session.registry();
    let area = frame.area();

    let [title, lights, buttons, brightness, temperature, help, message] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(u16::try_from(registry.len()).unwrap_or(9).min(9) + 3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " Elgato Key Light Controller",
            title_style(),
        ))),
        title,
    );
    render_lights(frame, lights, session);
    render_buttons(frame, buttons, session.focus().focus());
    render_brightness(frame, brightness, session);
    render_temperature(frame, temperature, session);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " a all · 1-9 select · ←↑↓→/hjkl move · enter activate · d discover · q quit",
            Style::default().fg(DIM),
        ))),
        help,
    );

    let message_style = if session.message().starts_with('✗') {
        Style::default().fg(RED)
    } else if session.message().starts_with('⚠') {
        Style::default().fg(YELLOW)
    } else {
        Style::default().fg(GREEN)
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", session.message()),
            message_style,
        ))),
        message,
    );
}

fn render_lights(frame: &mut Frame, area: Rect, session: &Session) {
    let registry = session.registry();
    let mode = session.selection().mode();
    let statuses = session.statuses();
    let state_of = |address: &str| {
        statuses
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, state)| state)
    };

    let per_light: Vec<Indicator> = registry
        .targets()
        .map(|t| indicator(state_of(&t.address)))
        .collect();

    let arrow = |selected: bool| if selected { "▶ " } else { "  " };
    let mut lines = vec![Line::from(vec![
        Span::raw(arrow(mode == SelectionMode::All)),
        combined(&per_light).span(),
        Span::styled(" All lights", Style::default().add_modifier(Modifier::BOLD)),
    ])];

    for (target, light) in registry.targets().zip(&per_light) {
        let selected = mode == SelectionMode::ByOrdinal(target.ordinal);
        let detail = match state_of(&target.address) {
            Some(Ok(state)) => format!(
                "  {} · {} · {}",
                if state.on { "On" } else { "Off" },
                state.brightness,
                state.temperature
            ),
            Some(Err(_)) => "  Offline".to_string(),
            None => String::new(),
        };
        let name_style = if selected {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(arrow(selected)),
            light.span(),
            Span::styled(format!(" {}. {}", target.ordinal, target.name), name_style),
            Span::styled(detail, Style::default().fg(DIM)),
        ]));
    }

    let title = if session.is_discovering() {
        " Lights (discovering…) "
    } else {
        " Lights "
    };
    let block = Block::default()
        .title(title)
        .title_style(title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_buttons(frame: &mut Frame, area: Rect, focus: Focus) {
    let buttons = [
        (Focus::Toggle, "  Toggle  "),
        (Focus::TurnOff, "  Turn Off  "),
        (Focus::TurnOn, "  Turn On  "),
    ];
    let mut spans = vec![Span::raw(" ")];
    for (control, label) in buttons {
        spans.push(Span::styled(label, button_style(focus == control)));
        spans.push(Span::raw("  "));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border(focus.is_button()));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_brightness(frame: &mut Frame, area: Rect, session: &Session) {
    let focused = session.focus().focus() == Focus::Brightness;
    let value = session.focus().pending_brightness();
    let ratio = f64::from(value.value() - Brightness::MIN)
        / f64::from(Brightness::MAX - Brightness::MIN);
    render_gauge(frame, area, " Brightness ", focused, ratio, value.to_string(), YELLOW);
}

fn render_temperature(frame: &mut Frame, area: Rect, session: &Session) {
    let focused = session.focus().focus() == Focus::Temperature;
    let value = session.focus().pending_temperature();
    let ratio =
        f64::from(value.value() - Kelvin::MIN) / f64::from(Kelvin::MAX - Kelvin::MIN);
    render_gauge(frame, area, " Temperature ", focused, ratio, value.to_string(), WARM);
}

fn render_gauge(
    frame: &mut Frame,
    area: Rect,
    title: &'static str,
    focused: bool,
    ratio: f64,
    label: String,
    color: Color,
) {
    let block = Block::default()
        .title(title)
        .title_style(if focused { button_style(true) } else { title_style() })
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border(focused));
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}
