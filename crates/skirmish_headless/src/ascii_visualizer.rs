//! ASCII field visualizer.
//!
//! Renders unit frames as ASCII art for quick terminal review.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use skirmish_core::config::FieldConfig;
use skirmish_core::math::Fixed;
use skirmish_core::render::{FrameSink, UnitFrame};
use skirmish_core::units::Team;

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Width of the ASCII viewport.
    pub width: usize,
    /// Height of the ASCII viewport.
    pub height: usize,
    /// Show unit counts legend.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            show_legend: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BLUE: &str = "\x1b[34m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
}

fn unit_char(frame: &UnitFrame) -> char {
    if frame.highlighted {
        return '@';
    }
    match frame.team {
        Team::Blue => 'b',
        Team::Green => 'g',
    }
}

fn team_color(team: Team) -> &'static str {
    match team {
        Team::Blue => colors::BLUE,
        Team::Green => colors::GREEN,
    }
}

fn team_name(team: Team) -> &'static str {
    match team {
        Team::Blue => "Blue",
        Team::Green => "Green",
    }
}

fn unit_color(frame: &UnitFrame, max_health: i32) -> String {
    if frame.highlighted {
        let health = if frame.health <= 0 {
            colors::RED
        } else {
            colors::YELLOW
        };
        return format!("{}{health}", colors::BOLD);
    }
    let mut color = String::new();
    if frame.long_range {
        color.push_str(colors::DIM);
    }
    if i64::from(frame.health) * 3 < i64::from(max_health) {
        color.push_str(colors::RED);
    } else {
        color.push_str(team_color(frame.team));
    }
    color
}

/// Map a field coordinate onto `cells` columns or rows.
fn cell(coord: Fixed, extent: Fixed, cells: usize) -> usize {
    if cells == 0 || extent <= Fixed::ZERO || coord <= Fixed::ZERO {
        return 0;
    }
    let scaled = coord.saturating_mul(Fixed::from_num(cells)) / extent;
    scaled.to_num::<usize>().min(cells - 1)
}

fn horizontal_rule(output: &mut String, left: char, right: char, width: usize) {
    output.push(left);
    for _ in 0..width {
        output.push('═');
    }
    output.push(right);
    output.push('\n');
}

/// Render one frame of the field as ASCII art.
///
/// Later frames in `frames` overdraw earlier ones sharing a cell, except
/// that the protected unit is always drawn on top.
#[must_use]
pub fn render_ascii(
    tick: u64,
    frames: &[UnitFrame],
    field: &FieldConfig,
    max_health: i32,
    config: &AsciiConfig,
) -> String {
    let width = config.width.max(1);
    let height = config.height.max(1);
    let mut output = String::new();

    let mut grid: Vec<Vec<(char, String)>> = vec![vec![('.', String::new()); width]; height];
    let mut team_counts: BTreeMap<Team, (usize, usize)> = BTreeMap::new(); // (units, long range)

    let ordered = frames
        .iter()
        .filter(|f| !f.highlighted)
        .chain(frames.iter().filter(|f| f.highlighted));
    for frame in ordered {
        let x = cell(frame.position.x, field.width, width);
        let y = cell(frame.position.y, field.height, height);
        let color = if config.use_color {
            unit_color(frame, max_health)
        } else {
            String::new()
        };
        grid[y][x] = (unit_char(frame), color);

        if !frame.highlighted {
            let entry = team_counts.entry(frame.team).or_insert((0, 0));
            entry.0 += 1;
            if frame.long_range {
                entry.1 += 1;
            }
        }
    }

    // y grows downwards on screen; flip so the origin corner is bottom-left
    grid.reverse();

    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };
    output.push_str(&format!(
        "{bold}╔══ Tick: {tick} │ Units: {} ══╗{reset}\n",
        frames.len()
    ));

    horizontal_rule(&mut output, '║', '║', width);
    for row in &grid {
        output.push('║');
        for (ch, color) in row {
            if config.use_color && !color.is_empty() {
                output.push_str(color);
                output.push(*ch);
                output.push_str(colors::RESET);
            } else {
                output.push(*ch);
            }
        }
        output.push_str("║\n");
    }
    horizontal_rule(&mut output, '║', '║', width);

    if config.show_legend {
        output.push_str("║ @=protected b=Blue g=Green");
        if config.use_color {
            output.push_str(" (dim=long range)");
        }
        output.push('\n');

        output.push_str("║ ");
        for (team, (total, long_range)) in &team_counts {
            let (color, reset) = if config.use_color {
                (team_color(*team), colors::RESET)
            } else {
                ("", "")
            };
            output.push_str(&format!(
                "{color}{}{reset}:{total} units ({long_range} long range) ",
                team_name(*team)
            ));
        }
        output.push('\n');
    }

    horizontal_rule(&mut output, '╚', '╝', width);
    output
}

/// Frame sink printing ASCII frames to a writer.
///
/// An optional pace sleeps after each frame so a human can follow along.
/// Pacing only delays presentation; the caller decides when to tick.
pub struct AsciiSink<W: Write> {
    writer: W,
    field: FieldConfig,
    max_health: i32,
    config: AsciiConfig,
    pace: Option<Duration>,
}

impl<W: Write> AsciiSink<W> {
    /// Create a sink for a field of the given size.
    pub fn new(writer: W, field: FieldConfig, max_health: i32, config: AsciiConfig) -> Self {
        Self {
            writer,
            field,
            max_health,
            config,
            pace: None,
        }
    }

    /// Sleep for `pace` after each presented frame.
    #[must_use]
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace).filter(|p| !p.is_zero());
        self
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for AsciiSink<W> {
    type Error = io::Error;

    fn present(&mut self, tick: u64, frame: &[UnitFrame]) -> Result<(), Self::Error> {
        let text = render_ascii(tick, frame, &self.field, self.max_health, &self.config);
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()?;
        if let Some(pace) = self.pace {
            thread::sleep(pace);
        }
        Ok(())
    }
}
