//! Font family resolution for text overlays.
//!
//! A [`FontBook`] turns a CSS-like family list plus a weight into a parsed
//! `ab_glyph` face. Faces registered explicitly (from `[[fonts.faces]]` in the
//! config) are searched first; with the `system-fonts` feature and system
//! lookup enabled, the installed fonts are tried next through `font-kit`.

use super::params::{FontSpec, FontWeight};
use super::surface::RenderError;
use ab_glyph::FontArc;
use std::path::Path;

#[cfg(feature = "system-fonts")]
use std::collections::HashMap;
#[cfg(feature = "system-fonts")]
use std::sync::Mutex;

struct RegisteredFace {
    family: String,
    weight: FontWeight,
    font: FontArc,
}

/// Registry of font faces keyed by family name and weight.
pub struct FontBook {
    faces: Vec<RegisteredFace>,
    system: bool,
    #[cfg(feature = "system-fonts")]
    system_cache: Mutex<HashMap<(String, u16), Option<FontArc>>>,
}

impl FontBook {
    /// Empty book with system lookup disabled.
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            system: false,
            #[cfg(feature = "system-fonts")]
            system_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Enable or disable the system font fallback.
    ///
    /// Has no effect unless the crate is built with `system-fonts`.
    pub fn with_system_fonts(mut self, enabled: bool) -> Self {
        self.system = enabled;
        self
    }

    /// Register a face from a TrueType/OpenType file.
    pub fn add_face_file(
        &mut self,
        family: &str,
        weight: FontWeight,
        path: &Path,
    ) -> Result<(), RenderError> {
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| RenderError::FontParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.add_face(family, weight, font);
        Ok(())
    }

    /// Register an already parsed face.
    pub fn add_face(&mut self, family: &str, weight: FontWeight, font: FontArc) {
        tracing::debug!(family, weight = weight.value(), "registered font face");
        self.faces.push(RegisteredFace {
            family: family.trim().to_string(),
            weight,
            font,
        });
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether resolution will fall back to installed fonts.
    pub fn system_fonts_enabled(&self) -> bool {
        self.system && cfg!(feature = "system-fonts")
    }

    /// Resolve the first family in `spec` that has a usable face.
    pub fn resolve(&self, spec: &FontSpec) -> Result<FontArc, RenderError> {
        for family in spec.families() {
            if let Some(font) = self.registered(family, spec.weight) {
                return Ok(font);
            }
            if let Some(font) = self.system_face(family, spec.weight) {
                return Ok(font);
            }
        }
        if self.system && !cfg!(feature = "system-fonts") {
            return Err(RenderError::SystemFontsUnavailable(spec.family.clone()));
        }
        Err(RenderError::FontUnavailable(spec.family.clone()))
    }

    fn registered(&self, family: &str, weight: FontWeight) -> Option<FontArc> {
        self.closest(family, weight).map(|f| f.font.clone())
    }

    /// Registered face of `family` whose weight is closest to `weight`.
    /// Ties go to the face registered first.
    fn closest(&self, family: &str, weight: FontWeight) -> Option<&RegisteredFace> {
        self.faces
            .iter()
            .filter(|f| f.family.eq_ignore_ascii_case(family))
            .min_by_key(|f| f.weight.value().abs_diff(weight.value()))
    }

    #[cfg(feature = "system-fonts")]
    fn system_face(&self, family: &str, weight: FontWeight) -> Option<FontArc> {
        if !self.system {
            return None;
        }
        let key = (family.to_ascii_lowercase(), weight.value());
        let mut cache = self.system_cache.lock().ok()?;
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }
        let loaded = load_system_font(family, weight);
        if loaded.is_none() {
            tracing::debug!(family, "no system font match");
        }
        cache.insert(key, loaded.clone());
        loaded
    }

    #[cfg(not(feature = "system-fonts"))]
    fn system_face(&self, _family: &str, _weight: FontWeight) -> Option<FontArc> {
        None
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a font by family name and weight from the system font database.
#[cfg(feature = "system-fonts")]
fn load_system_font(family: &str, weight: FontWeight) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let name = match family.to_ascii_lowercase().as_str() {
        "sans-serif" => FamilyName::SansSerif,
        "serif" => FamilyName::Serif,
        "monospace" => FamilyName::Monospace,
        "cursive" => FamilyName::Cursive,
        "fantasy" => FamilyName::Fantasy,
        _ => FamilyName::Title(family.to_string()),
    };
    let mut props = Properties::new();
    props.weight = Weight(weight.value() as f32);

    let handle = SystemSource::new()
        .select_best_match(&[name], &props)
        .ok()?;
    let data = handle.load().ok()?.copy_font_data()?;
    FontArc::try_from_vec((*data).clone()).ok()
}
