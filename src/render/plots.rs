use std::path::{Path, PathBuf};

use super::axes::{
    Axis, LABEL_SCALE, PlotArea, TICK_SCALE, draw_axes, draw_category_axis, draw_labels,
    draw_x_axis, draw_y_axis,
};
use super::canvas::{BLACK, Canvas, SERIES_BLUE, WHITE};
use super::colormap::Colormap;
use super::font::{text_height, text_width};
use super::{COMPARISON_SIZE, PLOT_SIZE, RenderError};
use crate::analysis::AudioSignal;
use crate::analysis::frequency_domain::{PITCH_CLASS_COUNT, PITCH_CLASS_NAMES, Spectrogram};

const TITLE_SCALE: u32 = 3;
const PANEL_TITLE_SCALE: u32 = 2;
const MARGIN_LEFT: u32 = 120;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_RIGHT_COLORBAR: u32 = 140;
const MARGIN_TOP: u32 = 50;
const MARGIN_BOTTOM: u32 = 80;
const COLORBAR_GAP: u32 = 20;
const COLORBAR_WIDTH: u32 = 20;
const SPECTROGRAM_FLOOR_DB: f32 = 80.0;

/// Amplitude over time, one min/max stroke per pixel column.
pub fn plot_waveform(signal: &AudioSignal, title: &str, path: &Path) -> Result<PathBuf, RenderError> {
    tracing::info!("Rendering waveform {}", path.display());
    let (width, height) = PLOT_SIZE;
    let mut canvas = Canvas::new(width, height);
    draw_title(&mut canvas, title, 12, TITLE_SCALE);
    let area = plot_area(width, height, MARGIN_RIGHT);

    let columns = sample_columns(signal.samples(), area.width);
    let peak = columns
        .iter()
        .map(|(min, max)| min.abs().max(max.abs()))
        .fold(0.0_f32, f32::max)
        .max(1e-3) as f64
        * 1.1;
    let x_axis = Axis::linear(0.0, signal.duration_seconds());
    let y_axis = Axis::linear(-peak, peak);
    draw_axes(&mut canvas, area, &x_axis, &y_axis, "Time (s)", "Amplitude", true);

    for (column, (min, max)) in columns.iter().enumerate() {
        let x = area.left as i64 + column as i64;
        let top = area.y_at(y_axis.fraction(*max as f64));
        let bottom = area.y_at(y_axis.fraction(*min as f64));
        canvas.vline(x, top, bottom, SERIES_BLUE);
    }
    frame(&mut canvas, area);
    canvas.save_png(path)
}

/// Spectral centroid per STFT frame against time, with a legend.
pub fn plot_spectral_centroid(
    signal: &AudioSignal,
    title: &str,
    path: &Path,
) -> Result<PathBuf, RenderError> {
    tracing::info!("Rendering spectral centroid {}", path.display());
    let (width, height) = PLOT_SIZE;
    let mut canvas = Canvas::new(width, height);
    draw_title(&mut canvas, title, 12, TITLE_SCALE);
    let area = plot_area(width, height, MARGIN_RIGHT);

    let spectrogram = Spectrogram::compute(signal);
    let centroids = spectrogram.spectral_centroids();
    let last_time = spectrogram.frame_time(centroids.len().saturating_sub(1)) as f64;
    let top_hz = centroids.iter().copied().fold(0.0_f32, f32::max).max(1.0) as f64 * 1.05;
    let x_axis = Axis::linear(0.0, last_time);
    let y_axis = Axis::linear(0.0, top_hz);
    draw_axes(&mut canvas, area, &x_axis, &y_axis, "Time (s)", "Frequency (Hz)", true);

    let points: Vec<(i64, i64)> = centroids
        .iter()
        .enumerate()
        .map(|(frame, &hz)| {
            let time = spectrogram.frame_time(frame) as f64;
            (
                area.x_at(x_axis.fraction(time)),
                area.y_at(y_axis.fraction(hz as f64)),
            )
        })
        .collect();
    match points.as_slice() {
        [single] => canvas.fill_rect(single.0 - 1, single.1 - 1, 3, 3, SERIES_BLUE),
        _ => {
            for pair in points.windows(2) {
                canvas.line(pair[0], pair[1], SERIES_BLUE);
            }
        }
    }
    draw_legend(&mut canvas, area, "Spectral Centroid", SERIES_BLUE);
    frame(&mut canvas, area);
    canvas.save_png(path)
}

/// Pitch-class heatmap (C at the bottom) with a viridis color bar.
pub fn plot_chromagram(signal: &AudioSignal, title: &str, path: &Path) -> Result<PathBuf, RenderError> {
    tracing::info!("Rendering chromagram {}", path.display());
    let (width, height) = PLOT_SIZE;
    let mut canvas = Canvas::new(width, height);
    draw_title(&mut canvas, title, 12, TITLE_SCALE);
    let area = plot_area(width, height, MARGIN_RIGHT_COLORBAR);

    let spectrogram = Spectrogram::compute(signal);
    let chroma = spectrogram.chroma_frames();
    let frames = chroma.len().max(1);
    for column in 0..area.width {
        let frame = column_index(column, area.width, frames);
        let values = chroma.get(frame).copied().unwrap_or([0.0; PITCH_CLASS_COUNT]);
        for row in 0..area.height {
            // Row 0 is the top pixel; pitch class 0 sits at the bottom.
            let from_bottom = area.height - 1 - row;
            let class = column_index(from_bottom, area.height, PITCH_CLASS_COUNT);
            canvas.put(
                (area.left + column) as i64,
                (area.top + row) as i64,
                Colormap::Viridis.color(values[class]),
            );
        }
    }

    let duration = frames as f64 * spectrogram.hop_size() as f64 / spectrogram.sample_rate() as f64;
    draw_x_axis(&mut canvas, area, &Axis::linear(0.0, duration), false);
    let widest = draw_category_axis(&mut canvas, area, &PITCH_CLASS_NAMES);
    draw_labels(&mut canvas, area, "Time (s)", "Pitch class", widest);
    frame(&mut canvas, area);
    draw_colorbar(&mut canvas, area, Colormap::Viridis, &Axis::linear(0.0, 1.0), "");
    canvas.save_png(path)
}

/// Two stacked log-frequency spectrograms, each in dB relative to its own peak.
pub fn plot_spectrogram_comparison(
    first: &AudioSignal,
    second: &AudioSignal,
    title: &str,
    path: &Path,
) -> Result<PathBuf, RenderError> {
    tracing::info!("Rendering spectrogram comparison {}", path.display());
    let (width, height) = COMPARISON_SIZE;
    let mut canvas = Canvas::new(width, height);
    draw_title(&mut canvas, title, 12, TITLE_SCALE);

    let panel_height = (height - MARGIN_TOP) / 2;
    let panels = [
        (first, "Spectrogram of Audio 1"),
        (second, "Spectrogram of Audio 2"),
    ];
    for (index, (signal, panel_title)) in panels.into_iter().enumerate() {
        let panel_top = MARGIN_TOP + index as u32 * panel_height;
        let title_width = text_width(panel_title, PANEL_TITLE_SCALE) as i64;
        canvas.text(
            (width as i64 - title_width) / 2,
            panel_top as i64 + 4,
            panel_title,
            PANEL_TITLE_SCALE,
            BLACK,
        );
        let area = PlotArea {
            left: MARGIN_LEFT,
            top: panel_top + 30,
            width: width - MARGIN_LEFT - MARGIN_RIGHT_COLORBAR,
            height: panel_height - 30 - MARGIN_BOTTOM + 10,
        };
        draw_spectrogram_panel(&mut canvas, area, signal);
    }
    canvas.save_png(path)
}

fn draw_spectrogram_panel(canvas: &mut Canvas, area: PlotArea, signal: &AudioSignal) {
    let spectrogram = Spectrogram::compute(signal);
    let db = spectrogram.decibels_relative_to_peak(SPECTROGRAM_FLOOR_DB);
    let bins = spectrogram.bin_count();
    let low_hz = spectrogram.bin_frequency(1) as f64;
    let y_axis = Axis::log(low_hz, spectrogram.nyquist() as f64);

    let row_bins: Vec<usize> = (0..area.height)
        .map(|row| {
            let fraction = (area.height - 1 - row) as f64 / area.height.saturating_sub(1).max(1) as f64;
            let hz = y_axis.value_at(fraction);
            let bin = (hz / low_hz).round() as usize;
            bin.clamp(1, bins - 1)
        })
        .collect();
    let frames = db.len().max(1);
    for column in 0..area.width {
        let frame = column_index(column, area.width, frames);
        let Some(values) = db.get(frame) else {
            continue;
        };
        for (row, &bin) in row_bins.iter().enumerate() {
            let t = (values[bin] + SPECTROGRAM_FLOOR_DB) / SPECTROGRAM_FLOOR_DB;
            canvas.put(
                (area.left + column) as i64,
                (area.top + row as u32) as i64,
                Colormap::Magma.color(t),
            );
        }
    }

    let duration = signal.duration_seconds();
    draw_x_axis(canvas, area, &Axis::linear(0.0, duration), false);
    let widest = draw_y_axis(canvas, area, &y_axis, false);
    draw_labels(canvas, area, "Time (s)", "Hz", widest);
    frame(canvas, area);
    draw_colorbar(
        canvas,
        area,
        Colormap::Magma,
        &Axis::linear(-(SPECTROGRAM_FLOOR_DB as f64), 0.0),
        "dB",
    );
}

fn plot_area(width: u32, height: u32, right_margin: u32) -> PlotArea {
    PlotArea {
        left: MARGIN_LEFT,
        top: MARGIN_TOP,
        width: width.saturating_sub(MARGIN_LEFT + right_margin).max(1),
        height: height.saturating_sub(MARGIN_TOP + MARGIN_BOTTOM).max(1),
    }
}

fn draw_title(canvas: &mut Canvas, title: &str, y: i64, scale: u32) {
    let x = (canvas.width() as i64 - text_width(title, scale) as i64) / 2;
    canvas.text(x, y, title, scale, BLACK);
}

fn frame(canvas: &mut Canvas, area: PlotArea) {
    canvas.stroke_rect(area.left as i64, area.top as i64, area.width, area.height, BLACK);
}

/// Index into `count` buckets for pixel `pixel` of `extent`.
fn column_index(pixel: u32, extent: u32, count: usize) -> usize {
    let index = (pixel as u64 * count as u64 / extent.max(1) as u64) as usize;
    index.min(count.saturating_sub(1))
}

/// Min/max of the samples falling into each of `width` columns.
fn sample_columns(samples: &[f32], width: u32) -> Vec<(f32, f32)> {
    let width = width.max(1) as usize;
    let total = samples.len();
    if total == 0 {
        return vec![(0.0, 0.0); width];
    }
    (0..width)
        .map(|x| {
            let start = (x * total / width).min(total - 1);
            let end = ((x + 1) * total).div_ceil(width).clamp(start + 1, total);
            samples[start..end]
                .iter()
                .fold((f32::MAX, f32::MIN), |(min, max), &s| (min.min(s), max.max(s)))
        })
        .collect()
}

fn draw_legend(canvas: &mut Canvas, area: PlotArea, label: &str, color: image::Rgb<u8>) {
    let text_w = text_width(label, LABEL_SCALE);
    let text_h = text_height(LABEL_SCALE);
    let swatch = 30u32;
    let padding = 8u32;
    let box_width = padding * 3 + swatch + text_w;
    let box_height = padding * 2 + text_h;
    let left = area.right() as i64 - 10 - box_width as i64;
    let top = area.top as i64 + 10;
    canvas.fill_rect(left, top, box_width, box_height, WHITE);
    canvas.stroke_rect(left, top, box_width, box_height, BLACK);
    let line_y = top + (box_height / 2) as i64;
    let swatch_left = left + padding as i64;
    canvas.hline(swatch_left, swatch_left + swatch as i64, line_y, color);
    canvas.hline(swatch_left, swatch_left + swatch as i64, line_y + 1, color);
    canvas.text(
        swatch_left + (swatch + padding) as i64,
        top + padding as i64,
        label,
        LABEL_SCALE,
        BLACK,
    );
}

fn draw_colorbar(canvas: &mut Canvas, area: PlotArea, colormap: Colormap, axis: &Axis, label: &str) {
    let bar = PlotArea {
        left: area.right() + COLORBAR_GAP,
        top: area.top,
        width: COLORBAR_WIDTH,
        height: area.height,
    };
    for row in 0..bar.height {
        let fraction = (bar.height - 1 - row) as f32 / bar.height.saturating_sub(1).max(1) as f32;
        canvas.hline(
            bar.left as i64,
            bar.right() as i64,
            (bar.top + row) as i64,
            colormap.color(fraction),
        );
    }
    frame(canvas, bar);
    let tick_height = text_height(TICK_SCALE) as i64;
    for (value, text) in axis.ticks() {
        let y = bar.y_at(axis.fraction(value));
        canvas.hline(bar.right() as i64, bar.right() as i64 + 4, y, BLACK);
        canvas.text(bar.right() as i64 + 8, y - tick_height / 2, &text, TICK_SCALE, BLACK);
    }
    if !label.is_empty() {
        let width = text_width(label, TICK_SCALE) as i64;
        canvas.text(
            bar.left as i64 + COLORBAR_WIDTH as i64 / 2 - width / 2,
            bar.top as i64 - tick_height - 6,
            label,
            TICK_SCALE,
            BLACK,
        );
    }
}
