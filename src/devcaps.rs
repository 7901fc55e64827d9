use std::collections::BTreeSet;

use bitflags::bitflags;

use crate::constants;

/// Physical scan origins, in the order in which they are enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Flatbed,
    AdfSimplex,
    AdfDuplex,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Flatbed,
        SourceKind::AdfSimplex,
        SourceKind::AdfDuplex,
    ];

    fn index(self) -> usize {
        match self {
            SourceKind::Flatbed => 0,
            SourceKind::AdfSimplex => 1,
            SourceKind::AdfDuplex => 2,
        }
    }

    /// The SANE name of the source
    pub fn sane_name(self) -> &'static str {
        match self {
            SourceKind::Flatbed => "Flatbed",
            SourceKind::AdfSimplex => "ADF",
            SourceKind::AdfDuplex => "ADF Duplex",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sane_name())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColorModes: u8 {
        const BW1 = 1;
        const GRAYSCALE = 1 << 1;
        const COLOR = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Formats: u8 {
        const JPEG = 1;
        const PDF = 1 << 1;
        const PNG = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MmRange {
    pub min: f64,
    pub max: f64,
}

/// Converts a size at the given resolution into millimeters
pub fn px_to_mm(px: u32, resolution: u32) -> f64 {
    f64::from(px) * 25.4 / f64::from(resolution)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceCapabilities {
    /// Resolutions valid for both axes at once
    pub resolutions: BTreeSet<u32>,
    pub discrete_resolutions: bool,
    pub color_modes: ColorModes,
    pub formats: Formats,
    pub min_width_px: u32,
    pub max_width_px: u32,
    pub min_height_px: u32,
    pub max_height_px: u32,
    pub window_x_range_mm: MmRange,
    pub window_y_range_mm: MmRange,
}

impl SourceCapabilities {
    /// Derives the scan window ranges from the maximum size, expressed at `units`
    pub fn update_window(&mut self, units: u32) {
        self.window_x_range_mm = MmRange {
            min: 0.0,
            max: px_to_mm(self.max_width_px, units),
        };

        self.window_y_range_mm = MmRange {
            min: 0.0,
            max: px_to_mm(self.max_height_px, units),
        };
    }

    /// Combines two sources into one that only contains what both of them support.
    ///
    /// Returns `None` when nothing usable is left: no common resolution, no common
    /// color mode, or size ranges that don't overlap.
    pub fn merge(&self, other: &SourceCapabilities, units: u32) -> Option<SourceCapabilities> {
        let resolutions = self
            .resolutions
            .intersection(&other.resolutions)
            .copied()
            .collect::<BTreeSet<_>>();

        let color_modes = self.color_modes & other.color_modes;

        let min_width_px = self.min_width_px.max(other.min_width_px);
        let max_width_px = self.max_width_px.min(other.max_width_px);
        let min_height_px = self.min_height_px.max(other.min_height_px);
        let max_height_px = self.max_height_px.min(other.max_height_px);

        if resolutions.is_empty()
            || color_modes.is_empty()
            || min_width_px > max_width_px
            || min_height_px > max_height_px
        {
            return None;
        }

        let mut merged = SourceCapabilities {
            resolutions,
            discrete_resolutions: self.discrete_resolutions && other.discrete_resolutions,
            color_modes,
            formats: self.formats & other.formats,
            min_width_px,
            max_width_px,
            min_height_px,
            max_height_px,
            window_x_range_mm: MmRange::default(),
            window_y_range_mm: MmRange::default(),
        };

        merged.update_window(units);

        Some(merged)
    }
}

/// Device capabilities, shared by all protocol handlers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceCapabilities {
    pub vendor: Option<Box<str>>,
    pub model: Option<Box<str>>,
    pub protocol_name: Option<&'static str>,
    pub resolution_units: u32,
    sources: [Option<SourceCapabilities>; 3],
    pub enumerable_source_names: Vec<&'static str>,
}

impl DeviceCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything, back to the state of `DeviceCapabilities::new()`
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn source(&self, kind: SourceKind) -> Option<&SourceCapabilities> {
        self.sources[kind.index()].as_ref()
    }

    /// Stores `source` unless that slot is already taken.
    ///
    /// Returns whether the source was stored.
    pub fn insert_source(&mut self, kind: SourceKind, source: SourceCapabilities) -> bool {
        let slot = &mut self.sources[kind.index()];

        if slot.is_some() {
            return false;
        }

        *slot = Some(source);

        true
    }

    pub fn replace_source(&mut self, kind: SourceKind, source: Option<SourceCapabilities>) {
        self.sources[kind.index()] = source;
    }

    pub fn take_source(&mut self, kind: SourceKind) -> Option<SourceCapabilities> {
        self.sources[kind.index()].take()
    }

    pub fn sources(&self) -> impl Iterator<Item = (SourceKind, &SourceCapabilities)> {
        SourceKind::ALL
            .into_iter()
            .filter_map(|kind| self.source(kind).map(|source| (kind, source)))
    }

    pub fn sources_mut(&mut self) -> impl Iterator<Item = &mut SourceCapabilities> {
        self.sources.iter_mut().flatten()
    }

    /// Rebuilds the list of source names from the populated slots.
    ///
    /// Returns whether there was at least one source.
    pub fn rebuild_source_names(&mut self) -> bool {
        self.enumerable_source_names = SourceKind::ALL
            .into_iter()
            .filter(|&kind| self.source(kind).is_some())
            .map(SourceKind::sane_name)
            .collect();

        !self.enumerable_source_names.is_empty()
    }
}

impl std::fmt::Display for DeviceCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {} ({})",
            self.vendor.as_deref().unwrap_or(constants::FALLBACK_VENDOR),
            self.model.as_deref().unwrap_or(constants::FALLBACK_MODEL),
            self.protocol_name.unwrap_or("-"),
        )?;

        for (kind, source) in self.sources() {
            writeln!(f, "  {}:", kind)?;
            writeln!(f, "    resolutions: {:?}", source.resolutions)?;
            writeln!(f, "    color modes: {:?}", source.color_modes)?;
            writeln!(f, "    formats:     {:?}", source.formats)?;
            writeln!(
                f,
                "    width:       {}..={} px ({:.1} mm)",
                source.min_width_px, source.max_width_px, source.window_x_range_mm.max
            )?;
            writeln!(
                f,
                "    height:      {}..={} px ({:.1} mm)",
                source.min_height_px, source.max_height_px, source.window_y_range_mm.max
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use crate::devcaps::{
        ColorModes, DeviceCapabilities, Formats, MmRange, SourceCapabilities, SourceKind, px_to_mm,
    };

    fn build_source(resolutions: &[u32], color_modes: ColorModes) -> SourceCapabilities {
        let mut source = SourceCapabilities {
            resolutions: resolutions.iter().copied().collect::<BTreeSet<_>>(),
            discrete_resolutions: true,
            color_modes,
            formats: Formats::JPEG | Formats::PNG,
            min_width_px: 100,
            max_width_px: 8500,
            min_height_px: 100,
            max_height_px: 11_700,
            window_x_range_mm: MmRange::default(),
            window_y_range_mm: MmRange::default(),
        };

        source.update_window(1000);

        source
    }

    #[test]
    fn px_to_mm_at_thousandth_inch() {
        assert!((px_to_mm(1000, 1000) - 25.4).abs() < 1e-9);
        assert!(px_to_mm(0, 1000).abs() < 1e-9);
    }

    #[test]
    fn window_is_derived_from_maximum() {
        let source = build_source(&[300], ColorModes::COLOR);

        assert!((source.window_x_range_mm.max - 215.9).abs() < 1e-9);
        assert!((source.window_y_range_mm.max - 297.18).abs() < 1e-9);
        assert!(source.window_x_range_mm.min.abs() < f64::EPSILON);
    }

    #[test]
    fn merge_intersects() {
        let front = build_source(&[300, 600], ColorModes::COLOR | ColorModes::GRAYSCALE);
        let mut back = build_source(&[300], ColorModes::COLOR);
        back.formats = Formats::JPEG;
        back.max_width_px = 8000;
        back.min_height_px = 200;

        let merged = front.merge(&back, 1000).unwrap();

        assert_eq!(merged.resolutions, BTreeSet::from([300]));
        assert_eq!(merged.color_modes, ColorModes::COLOR);
        assert_eq!(merged.formats, Formats::JPEG);
        assert_eq!(merged.min_width_px, 100);
        assert_eq!(merged.max_width_px, 8000);
        assert_eq!(merged.min_height_px, 200);
        assert_eq!(merged.max_height_px, 11_700);
        assert!((merged.window_x_range_mm.max - 203.2).abs() < 1e-9);
    }

    #[test]
    fn merge_is_commutative() {
        let front = build_source(&[150, 300, 600], ColorModes::COLOR | ColorModes::GRAYSCALE);
        let back = build_source(&[300, 1200], ColorModes::GRAYSCALE);

        assert_eq!(front.merge(&back, 1000), back.merge(&front, 1000));
    }

    #[test]
    fn merge_with_self_is_identity() {
        let source = build_source(&[300, 600], ColorModes::COLOR | ColorModes::GRAYSCALE);

        assert_eq!(source.merge(&source, 1000), Some(source));
    }

    #[test]
    fn merge_without_common_resolution() {
        let front = build_source(&[300], ColorModes::COLOR);
        let back = build_source(&[600], ColorModes::COLOR);

        assert_eq!(front.merge(&back, 1000), None);
    }

    #[test]
    fn merge_without_common_color_mode() {
        let front = build_source(&[300], ColorModes::COLOR);
        let back = build_source(&[300], ColorModes::GRAYSCALE);

        assert_eq!(front.merge(&back, 1000), None);
    }

    #[test]
    fn first_source_wins() {
        let mut caps = DeviceCapabilities::new();

        assert!(caps.insert_source(SourceKind::Flatbed, build_source(&[300], ColorModes::COLOR)));
        assert!(!caps.insert_source(SourceKind::Flatbed, build_source(&[600], ColorModes::COLOR)));

        assert_eq!(
            caps.source(SourceKind::Flatbed).map(|s| s.resolutions.clone()),
            Some(BTreeSet::from([300]))
        );
    }

    #[test]
    fn source_names_are_ordered() {
        let mut caps = DeviceCapabilities::new();

        assert!(!caps.rebuild_source_names());

        caps.insert_source(SourceKind::AdfDuplex, build_source(&[300], ColorModes::COLOR));
        caps.insert_source(SourceKind::Flatbed, build_source(&[300], ColorModes::COLOR));

        assert!(caps.rebuild_source_names());
        assert_eq!(caps.enumerable_source_names, ["Flatbed", "ADF Duplex"]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut caps = DeviceCapabilities::new();
        caps.vendor = Some(Box::from("vendor"));
        caps.insert_source(SourceKind::Flatbed, build_source(&[300], ColorModes::COLOR));
        caps.rebuild_source_names();

        caps.reset();

        assert_eq!(caps, DeviceCapabilities::new());
    }
}
