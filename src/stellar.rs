//! Stellar classification table
//!
//! Built once with `StellarCatalog::standard()` and passed around by reference.
//! Lookup uses the longest known class prefix of a spectral string, so "DA2"
//! resolves to DA and "G2V" to G.

use serde::Serialize;

use crate::model::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HydrogenLines {
    VeryWeak,
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StellarClass {
    pub code: &'static str,
    /// Chromaticity as 0-255 RGB
    pub chromaticity: [u8; 3],
    pub color_name: &'static str,
    pub temperature: (f64, f64),
    pub mass: (f64, f64),
    pub radius: (f64, f64),
    pub luminosity: (f64, f64),
    pub lines: HydrogenLines,
    /// Share of main-sequence stars, in percent
    pub sequence_fraction: f64,
}

impl StellarClass {
    pub fn color(&self) -> Color {
        let [r, g, b] = self.chromaticity;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

#[derive(Debug, Clone)]
pub struct StellarCatalog {
    classes: Vec<StellarClass>,
}

const BLUE: [u8; 3] = [157, 180, 254];
const BLUE_WHITE: [u8; 3] = [202, 216, 255];

#[allow(clippy::too_many_arguments)]
fn class(
    code: &'static str,
    chromaticity: [u8; 3],
    color_name: &'static str,
    temperature: (f64, f64),
    mass: (f64, f64),
    radius: (f64, f64),
    luminosity: (f64, f64),
    lines: HydrogenLines,
    sequence_fraction: f64,
) -> StellarClass {
    StellarClass {
        code,
        chromaticity,
        color_name,
        temperature,
        mass,
        radius,
        luminosity,
        lines,
        sequence_fraction,
    }
}

fn white_dwarf(code: &'static str, temperature: (f64, f64), lines: HydrogenLines, fraction: f64) -> StellarClass {
    class(
        code,
        BLUE_WHITE,
        "white",
        temperature,
        (0.08, 0.45),
        (0.1, 0.7),
        (0.001, 0.08),
        lines,
        fraction,
    )
}

impl StellarCatalog {
    pub fn standard() -> Self {
        use HydrogenLines::*;
        let f_class = class(
            "F",
            [255, 255, 255],
            "yellow white",
            (6000.0, 7500.0),
            (1.04, 1.4),
            (1.15, 1.4),
            (1.5, 5.0),
            Medium,
            3.0,
        );
        let q_class = StellarClass {
            code: "Q",
            ..f_class.clone()
        };

        let classes = vec![
            class("O", BLUE, "blue", (30000.0, 70000.0), (16.0, 400.0), (6.6, 45.0), (30000.0, 1.0e7), Weak, 0.00003),
            class("B", [170, 191, 255], "blue white", (10000.0, 30000.0), (2.1, 16.0), (1.8, 6.6), (25.0, 30000.0), Medium, 0.13),
            class("A", BLUE_WHITE, "white", (7500.0, 10000.0), (1.4, 2.1), (1.4, 1.8), (5.0, 25.0), Strong, 0.6),
            f_class,
            class("G", [255, 244, 232], "yellow", (5200.0, 6000.0), (0.8, 1.04), (0.96, 1.15), (0.6, 1.5), Weak, 7.6),
            class("K", [255, 222, 180], "orange", (3700.0, 5200.0), (0.45, 0.8), (0.7, 0.96), (0.06, 0.6), VeryWeak, 12.1),
            class("M", BLUE, "red", (2400.0, 3700.0), (0.08, 0.45), (0.1, 0.7), (0.001, 0.08), VeryWeak, 76.45),
            class("L", BLUE, "red", (1300.0, 2400.0), (0.07, 0.085), (0.088, 0.11), (0.00006, 0.00031), VeryWeak, 14.45),
            class("T", BLUE, "magenta", (700.0, 1300.0), (0.07, 0.085), (0.088, 0.11), (0.00006, 0.00031), VeryWeak, 12.45),
            class("Y", BLUE, "infrared", (500.0, 700.0), (0.04, 0.065), (0.05, 0.08), (0.00001, 0.00006), VeryWeak, 10.45),
            q_class,
            white_dwarf("DA", (6000.0, 50000.0), Strong, 29.0),
            white_dwarf("DB", (6000.0, 50000.0), Strong, 5.1),
            white_dwarf("DO", (6000.0, 50000.0), Medium, 76.45),
            white_dwarf("DQ", (12000.0, 18000.0), Weak, 0.02),
            white_dwarf("DZ", (6000.0, 50000.0), Weak, 76.45),
            white_dwarf("DC", (6000.0, 50000.0), Medium, 3.8),
            white_dwarf("DX", (6000.0, 50000.0), VeryWeak, 76.45),
        ];
        Self { classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Exact class code lookup
    pub fn get(&self, code: &str) -> Option<&StellarClass> {
        self.classes.iter().find(|c| c.code == code)
    }

    /// Class of a spectral string by its longest known prefix
    pub fn classify(&self, spectral: &str) -> Option<&StellarClass> {
        let spectral = spectral.trim();
        self.classes
            .iter()
            .filter(|c| spectral.starts_with(c.code))
            .max_by_key(|c| c.code.len())
    }

    pub fn color_for(&self, spectral: &str) -> Option<Color> {
        self.classify(spectral).map(StellarClass::color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_has_all_classes() {
        let table = StellarCatalog::standard();
        assert_eq!(table.len(), 18);
        for code in ["O", "B", "A", "F", "G", "K", "M", "L", "T", "Y", "Q", "DA", "DB", "DO", "DQ", "DZ", "DC", "DX"] {
            assert!(table.get(code).is_some(), "{}", code);
        }
    }

    #[test]
    fn test_classify_longest_prefix() {
        let table = StellarCatalog::standard();
        assert_eq!(table.classify("G2V").unwrap().code, "G");
        assert_eq!(table.classify("DA2").unwrap().code, "DA");
        assert_eq!(table.classify("DQ6").unwrap().code, "DQ");
        assert_eq!(table.classify(" M4.5Ve").unwrap().code, "M");
        assert!(table.classify("sdB").is_none());
        assert!(table.classify("").is_none());
    }

    #[test]
    fn test_q_copies_f() {
        let table = StellarCatalog::standard();
        let f = table.get("F").unwrap();
        let q = table.get("Q").unwrap();
        assert_eq!(q.temperature, f.temperature);
        assert_eq!(q.chromaticity, f.chromaticity);
    }

    #[test]
    fn test_color_for() {
        let table = StellarCatalog::standard();
        assert_eq!(table.color_for("F5"), Some([1.0, 1.0, 1.0]));
        let k = table.color_for("K1V").unwrap();
        assert!((k[2] - 180.0 / 255.0).abs() < 1e-6);
        assert!(table.color_for("X").is_none());
    }
}
