use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::drivers::error::SpecanError;
use crate::drivers::DisplayRange;
use crate::types::Frame;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub trace: RGBColor,
    pub max_hold: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(0, 0, 0),
            trace: WHITE,
            max_hold: GREEN,
        }
    }
}
/// Snapshot of the current sweep and max-hold traces, in MHz / dBm.
pub fn render_sweep_png(
    frame: &Frame,
    max_hold: &[(u64, f32)],
    range: &DisplayRange,
    style: PlotStyle,
) -> Result<Vec<u8>, SpecanError> {
    if frame.is_empty() {
        return Err(SpecanError::Plot("sweep has no bins".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let x_bounds = (range.low_hz / 1e6) as f32..(range.high_hz / 1e6) as f32;
        let y_bounds = range.low_dbm as f32..range.high_dbm as f32;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Spectrum", ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_bounds, y_bounds)?;
        chart
            .configure_mesh()
            .x_desc("MHz")
            .y_desc("dBm")
            .axis_desc_style(("sans-serif", 12).into_font().color(&WHITE))
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        let to_mhz = |(hz, dbm): (u64, f32)| (hz as f32 / 1e6, dbm);
        chart
            .draw_series(LineSeries::new(max_hold.iter().copied().map(to_mhz), &style.max_hold))?
            .label("max hold")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &style.max_hold));
        chart
            .draw_series(LineSeries::new(frame.iter().map(to_mhz), &style.trace))?
            .label("current")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &style.trace));
        chart
            .configure_series_labels()
            .label_font(("sans-serif", 12).into_font().color(&WHITE))
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(style.width, style.height, buffer)
        .ok_or_else(|| {
            SpecanError::Plot(format!(
                "snapshot buffer does not fit {}x{} pixels",
                style.width, style.height
            ))
        })?;
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn empty_sweep_is_rejected() {
        let frame = Frame::from_pairs(std::iter::empty());
        let err = render_sweep_png(&frame, &[], &DisplayRange::default(), PlotStyle::default());
        assert!(matches!(err, Err(SpecanError::Plot(_))));
    }
    #[test]
    fn full_band_sweep_renders_png() {
        let range = DisplayRange::default();
        let frame = Frame::from_pairs(
            range
                .bin_frequencies()
                .enumerate()
                .map(|(i, hz)| (hz, -90.0 + (i % 7) as f32 * 5.0)),
        );
        let max_hold: Vec<(u64, f32)> = frame.iter().map(|(hz, dbm)| (hz, dbm + 10.0)).collect();
        let style = PlotStyle {
            width: 320,
            height: 160,
            ..PlotStyle::default()
        };
        let png = render_sweep_png(&frame, &max_hold, &range, style).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
