//! Terminal rendering of palette swatches.

use crossterm::style::{Color, Stylize};
use crowdmap_palette::{CongestionLevel, PaletteDefinition, PaletteId, Rgb};

/// Map a palette color onto a truecolor terminal color.
pub fn terminal_color(color: Rgb) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// One cell per level. Colored output paints the level number with the
/// palette's foreground on its background; plain output lists hex values.
pub fn swatch(definition: &PaletteDefinition, colored: bool) -> String {
    if !colored {
        return definition
            .colors
            .iter()
            .map(Rgb::to_string)
            .collect::<Vec<_>>()
            .join(" ");
    }

    CongestionLevel::all()
        .map(|level| {
            let background = terminal_color(definition.color_at(level));
            let foreground = terminal_color(definition.text_rule.foreground(level));
            format!("{:^4}", level.get()).with(foreground).on(background).to_string()
        })
        .collect()
}

/// Palette listing, one line per palette, with the active one marked `*` and
/// the description after the swatch.
pub fn palette_table(palettes: &[PaletteDefinition], active: PaletteId, colored: bool) -> String {
    let id_width = palettes.iter().map(|definition| definition.id.as_str().len()).max().unwrap_or(0);
    let label_width = palettes
        .iter()
        .map(|definition| definition.label.chars().count())
        .max()
        .unwrap_or(0);

    palettes
        .iter()
        .map(|definition| {
            let marker = if definition.id == active { '*' } else { ' ' };
            let label_padding = label_width - definition.label.chars().count();
            format!(
                "{marker} {id:<id_width$}  {label}{pad}  {swatch}  {description}",
                id = definition.id.as_str(),
                label = definition.label,
                pad = " ".repeat(label_padding),
                swatch = swatch(definition, colored),
                description = definition.description,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
